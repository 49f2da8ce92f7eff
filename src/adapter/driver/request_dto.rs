use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// カテゴリ作成・名前変更用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

/// 商品登録用のリクエストDTO
/// 数値はドメイン層で検証するため符号付きで受け取る
#[derive(Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub category_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub stock: i64,
}

/// 商品情報更新用のリクエストDTO
/// 在庫数は含まない（在庫補充エンドポイントを使う）
#[derive(Serialize, Deserialize)]
pub struct UpdateProductRequest {
    pub category_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
}

/// 在庫補充用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct RestockRequest {
    pub stock: i64,
}

/// 注文明細作成用のリクエストDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderItemRequest {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
}

/// 注文明細更新用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct UpdateOrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i64,
}

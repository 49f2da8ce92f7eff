use crate::application::service::OrderDetails;
use crate::domain::model::{Category, Order, OrderItem, Product};
use serde::{Deserialize, Serialize};

/// カテゴリ用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
}

/// 商品用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub price: u32,
    pub stock: u32,
    pub is_available: bool,
}

/// 注文用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub checked_out: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// 注文詳細用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

/// 注文明細用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: u32,
}

/// チェックアウト結果のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: String,
    pub checked_out: bool,
}

impl CategoryResponse {
    pub fn from_category(category: &Category) -> Self {
        Self {
            id: category.id().to_string(),
            name: category.name().to_string(),
        }
    }
}

impl ProductResponse {
    /// ドメインオブジェクトからProductResponseを作成
    /// `is_available` は在庫数から導出した値
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id().to_string(),
            category_id: product.category_id().to_string(),
            name: product.name().to_string(),
            description: product.description().to_string(),
            price: product.price().amount(),
            stock: product.stock(),
            is_available: product.is_available(),
        }
    }
}

impl OrderResponse {
    pub fn from_order(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            user_id: order.user_id().to_string(),
            checked_out: order.is_checked_out(),
            created_at: order.created_at().to_rfc3339(),
            updated_at: order.updated_at().to_rfc3339(),
        }
    }
}

impl OrderDetailResponse {
    pub fn from_details(details: &OrderDetails) -> Self {
        Self {
            order: OrderResponse::from_order(&details.order),
            items: details
                .items
                .iter()
                .map(OrderItemResponse::from_order_item)
                .collect(),
        }
    }
}

impl OrderItemResponse {
    pub fn from_order_item(item: &OrderItem) -> Self {
        Self {
            id: item.id().to_string(),
            order_id: item.order_id().to_string(),
            product_id: item.product_id().to_string(),
            quantity: item.quantity().value(),
        }
    }
}

// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::model::{
    Category, CategoryId, Order, OrderId, OrderItem, OrderItemId, Product, ProductId, UserId,
};
use async_trait::async_trait;
use thiserror::Error;

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
    /// 在庫の非負制約に違反する書き込み
    #[error("Stock of product {0} would become negative")]
    StockConstraintViolation(ProductId),
    /// 他の行から参照されているため削除できない
    #[error("Still referenced: {0}")]
    StillReferenced(String),
}

/// 作業単位（トランザクション）
///
/// 在庫に触れる操作はすべてこの中で行う。`commit` されずにドロップされた
/// 作業単位は、途中の書き込みをすべてロールバックする。
#[async_trait]
pub trait UnitOfWork: Send {
    /// 商品行をロックし、最新の状態を読み直す
    async fn lock_product(&mut self, product_id: ProductId)
        -> Result<Option<Product>, RepositoryError>;

    /// 在庫数に差分を適用し、更新後の商品を返す
    /// 在庫が負になる、または `MAX_STOCK` を超える書き込みは `StockConstraintViolation` で失敗する
    async fn apply_stock_delta(
        &mut self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<Product, RepositoryError>;

    /// 在庫数を指定値で上書きする（管理者による補充）
    async fn set_stock(&mut self, product_id: ProductId, stock: u32)
        -> Result<Product, RepositoryError>;

    /// 商品を予約している明細の数量合計
    /// 商品行をロックした後に呼ぶこと（予約の増減はすべて商品行のロックを経由する）
    async fn reserved_stock(&mut self, product_id: ProductId) -> Result<u64, RepositoryError>;

    /// 注文行をロックして取得する
    async fn lock_order(&mut self, order_id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// チェックアウト状態を保存する（他の列には触れない）
    async fn save_checkout(&mut self, order: &Order) -> Result<(), RepositoryError>;

    /// 注文を削除する（明細はカスケード削除される）
    async fn delete_order(&mut self, order_id: OrderId) -> Result<(), RepositoryError>;

    /// 注文明細をロックせずに読む
    /// 所属する注文を先にロックするために使う（明細の所属注文は変わらない）
    async fn find_order_item(
        &mut self,
        item_id: OrderItemId,
    ) -> Result<Option<OrderItem>, RepositoryError>;

    /// 注文明細行をロックして取得する
    async fn lock_order_item(
        &mut self,
        item_id: OrderItemId,
    ) -> Result<Option<OrderItem>, RepositoryError>;

    /// 注文に属する明細をロックして取得する
    async fn lock_order_items_of(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError>;

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<(), RepositoryError>;

    async fn update_order_item(&mut self, item: &OrderItem) -> Result<(), RepositoryError>;

    async fn delete_order_item(&mut self, item_id: OrderItemId) -> Result<(), RepositoryError>;

    /// 作業単位をコミットする
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// 作業単位を開始するファクトリ
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError>;
}

/// カタログリポジトリトレイト
/// カテゴリと商品の永続化を抽象化する
/// 在庫数の変更は扱わない（作業単位を経由する）
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// カテゴリを保存する（新規作成または名前の更新）
    async fn save_category(&self, category: &Category) -> Result<(), RepositoryError>;

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    /// すべてのカテゴリを名前順で取得する
    async fn find_all_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    /// カテゴリを削除する（所属商品もカスケード削除される）
    ///
    /// # Returns
    /// * `Ok(true)` - 削除した
    /// * `Ok(false)` - 存在しなかった
    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError>;

    /// 新しい商品を登録する
    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError>;

    /// 商品の名前・説明・価格・カテゴリを更新する（在庫数には触れない）
    ///
    /// # Returns
    /// * `Ok(true)` - 更新した
    /// * `Ok(false)` - 存在しなかった
    async fn update_product(&self, product: &Product) -> Result<bool, RepositoryError>;

    /// 商品を削除する
    /// 注文明細から参照されている場合は `StillReferenced` で失敗する
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// すべての商品を取得する（名前・説明・価格の順）
    async fn find_all_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// 販売可能な商品のみを取得する（名前・説明・価格の順）
    async fn find_available_products(&self) -> Result<Vec<Product>, RepositoryError>;
}

/// 注文リポジトリトレイト
/// 注文の作成と読み取りを抽象化する
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 新しい注文を保存する
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// すべての注文を作成日時の昇順で取得する
    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError>;

    /// 指定ユーザーの注文を作成日時の昇順で取得する
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// 注文に属する明細を取得する
    async fn find_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError>;

    async fn find_item(&self, item_id: OrderItemId) -> Result<Option<OrderItem>, RepositoryError>;

    /// すべての明細をID順で取得する
    async fn find_all_items(&self) -> Result<Vec<OrderItem>, RepositoryError>;

    /// 指定ユーザーの注文に属する明細をID順で取得する
    async fn find_items_by_user(&self, user_id: UserId)
        -> Result<Vec<OrderItem>, RepositoryError>;

    /// 新しい一意の注文IDを生成する
    fn next_identity(&self) -> OrderId;
}

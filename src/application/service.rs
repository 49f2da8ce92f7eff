mod catalog_query_service;
mod order_query_service;

pub use catalog_query_service::CatalogQueryService;
pub use order_query_service::{OrderDetails, OrderQueryService};

use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    Caller, Category, CategoryId, CheckoutOutcome, Order, OrderId, OrderItem, OrderItemId, Price,
    Product, ProductId, Quantity, MAX_STOCK,
};
use crate::domain::port::{CatalogRepository, OrderRepository, UnitOfWork, UnitOfWorkFactory};
use crate::domain::service::InventoryLedger;
use std::sync::Arc;

/// 管理者以外を拒否する
fn require_admin(caller: &Caller) -> Result<(), ApplicationError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(ApplicationError::Forbidden(
            "この操作には管理者権限が必要です".to_string(),
        ))
    }
}

/// 在庫数の入力値を検証する（0以上 `MAX_STOCK` 以下）
fn parse_stock(stock: i64) -> Result<u32, DomainError> {
    u32::try_from(stock)
        .ok()
        .filter(|stock| *stock <= MAX_STOCK)
        .ok_or_else(|| {
            DomainError::InvalidValue(format!(
                "在庫数は0以上{}以下である必要があります: {}",
                MAX_STOCK, stock
            ))
        })
}

fn product_not_found(product_id: ProductId) -> ApplicationError {
    ApplicationError::NotFound(format!("商品が見つかりません: {}", product_id))
}

fn category_not_found(category_id: CategoryId) -> ApplicationError {
    ApplicationError::NotFound(format!("カテゴリが見つかりません: {}", category_id))
}

fn order_not_found(order_id: OrderId) -> ApplicationError {
    ApplicationError::NotFound(format!("注文が見つかりません: {}", order_id))
}

fn order_item_not_found(item_id: OrderItemId) -> ApplicationError {
    ApplicationError::NotFound(format!("注文明細が見つかりません: {}", item_id))
}

/// 作業単位の中で注文行をロックする
/// 呼び出し元が参照できない注文は存在しないものとして扱う
///
/// ロックは常に 注文 → 明細 → 商品（ID順）の順で取得する。
async fn lock_accessible_order(
    uow: &mut dyn UnitOfWork,
    caller: &Caller,
    order_id: OrderId,
) -> Result<Option<Order>, ApplicationError> {
    Ok(uow
        .lock_order(order_id)
        .await?
        .filter(|order| order.is_accessible_by(caller)))
}

/// 注文明細とその注文をロックする
/// 明細の所属注文を読み、注文行をロックしてから明細行をロックし直す
async fn lock_accessible_item(
    uow: &mut dyn UnitOfWork,
    caller: &Caller,
    item_id: OrderItemId,
) -> Result<(Order, OrderItem), ApplicationError> {
    let order_id = uow
        .find_order_item(item_id)
        .await?
        .ok_or_else(|| order_item_not_found(item_id))?
        .order_id();
    let order = lock_accessible_order(uow, caller, order_id)
        .await?
        .ok_or_else(|| order_item_not_found(item_id))?;
    // 注文のロック待ちの間に削除されている場合がある
    let item = uow
        .lock_order_item(item_id)
        .await?
        .ok_or_else(|| order_item_not_found(item_id))?;
    Ok((order, item))
}

/// 注文明細アプリケーションサービス
///
/// 明細の作成・更新・削除と在庫台帳の呼び出しを1つの作業単位にまとめる。
/// どの段階で失敗しても作業単位はコミットされず、在庫も明細も変更されない。
pub struct OrderItemApplicationService {
    unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
}

impl OrderItemApplicationService {
    /// 新しい注文明細アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `unit_of_work_factory` - 作業単位ファクトリ
    pub fn new(unit_of_work_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self {
            unit_of_work_factory,
        }
    }

    /// 注文明細を作成し、在庫を予約する
    ///
    /// # Arguments
    /// * `caller` - 呼び出し元（注文の所有者または管理者）
    /// * `order_id` - 明細を追加する注文
    /// * `product_id` - 予約する商品
    /// * `quantity` - 数量（生の入力値）
    ///
    /// # Returns
    /// * `Ok(OrderItem)` - 作成された明細
    /// * `Err(ApplicationError)` - 数量不正、注文が見つからない、チェックアウト済み、在庫切れなど
    #[tracing::instrument(skip(self, caller), fields(user_id = %caller.user_id()))]
    pub async fn create_order_item(
        &self,
        caller: &Caller,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<OrderItem, ApplicationError> {
        let quantity = Quantity::new(quantity)?;

        let mut uow = self.unit_of_work_factory.begin().await?;
        let order = lock_accessible_order(uow.as_mut(), caller, order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;
        order.ensure_open()?;

        InventoryLedger::new(uow.as_mut())
            .reserve(product_id, quantity)
            .await?;

        let item = OrderItem::new(OrderItemId::new(), order_id, product_id, quantity);
        uow.insert_order_item(&item).await?;
        uow.commit().await?;

        tracing::info!(item_id = %item.id(), "order item created");
        Ok(item)
    }

    /// 注文明細の商品・数量を変更し、在庫を調整する
    ///
    /// 同じ商品なら差分を調整し、商品が変わる場合は旧商品を解放してから新商品を予約する。
    /// 2つの商品に触れる場合は商品IDの順にロックを取得する。
    #[tracing::instrument(skip(self, caller), fields(user_id = %caller.user_id()))]
    pub async fn update_order_item(
        &self,
        caller: &Caller,
        item_id: OrderItemId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<OrderItem, ApplicationError> {
        let quantity = Quantity::new(quantity)?;

        let mut uow = self.unit_of_work_factory.begin().await?;
        let (order, mut item) = lock_accessible_item(uow.as_mut(), caller, item_id).await?;
        order.ensure_open()?;

        let previous_product = item.product_id();
        let previous_quantity = item.quantity();

        if previous_product == product_id {
            InventoryLedger::new(uow.as_mut())
                .adjust(product_id, previous_quantity, quantity)
                .await?;
        } else {
            let (first, second) = if previous_product < product_id {
                (previous_product, product_id)
            } else {
                (product_id, previous_product)
            };
            uow.lock_product(first).await?;
            uow.lock_product(second).await?;

            let mut ledger = InventoryLedger::new(uow.as_mut());
            ledger.release(previous_product, previous_quantity).await?;
            ledger.reserve(product_id, quantity).await?;
        }

        item.change(product_id, quantity);
        uow.update_order_item(&item).await?;
        uow.commit().await?;

        tracing::info!(
            item_id = %item.id(),
            from_quantity = previous_quantity.value(),
            to_quantity = quantity.value(),
            "order item updated"
        );
        Ok(item)
    }

    /// 注文明細を削除し、予約していた在庫を戻す
    #[tracing::instrument(skip(self, caller), fields(user_id = %caller.user_id()))]
    pub async fn delete_order_item(
        &self,
        caller: &Caller,
        item_id: OrderItemId,
    ) -> Result<(), ApplicationError> {
        let mut uow = self.unit_of_work_factory.begin().await?;
        let (order, item) = lock_accessible_item(uow.as_mut(), caller, item_id).await?;
        order.ensure_open()?;

        InventoryLedger::new(uow.as_mut())
            .release(item.product_id(), item.quantity())
            .await?;
        uow.delete_order_item(item_id).await?;
        uow.commit().await?;

        tracing::info!(item_id = %item_id, "order item deleted");
        Ok(())
    }
}

/// 注文アプリケーションサービス
pub struct OrderApplicationService {
    order_repository: Arc<dyn OrderRepository>,
    unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
}

impl OrderApplicationService {
    /// 新しいアプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `order_repository` - 注文リポジトリ
    /// * `unit_of_work_factory` - 作業単位ファクトリ
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
    ) -> Self {
        Self {
            order_repository,
            unit_of_work_factory,
        }
    }

    /// 呼び出し元を所有者とする新しい注文を作成
    #[tracing::instrument(skip(self, caller), fields(user_id = %caller.user_id()))]
    pub async fn create_order(&self, caller: &Caller) -> Result<Order, ApplicationError> {
        let order = Order::new(self.order_repository.next_identity(), caller.user_id());
        self.order_repository.insert(&order).await?;
        tracing::info!(order_id = %order.id(), "order created");
        Ok(order)
    }

    /// 注文をチェックアウトする
    ///
    /// # Returns
    /// * `Ok(CheckoutOutcome::CheckedOut)` - 今回チェックアウトした
    /// * `Ok(CheckoutOutcome::AlreadyCheckedOut)` - 既にチェックアウト済み（何も書き込まない）
    /// * `Err(ApplicationError)` - 注文が見つからない、または永続化の失敗
    #[tracing::instrument(skip(self, caller), fields(user_id = %caller.user_id()))]
    pub async fn check_out(
        &self,
        caller: &Caller,
        order_id: OrderId,
    ) -> Result<CheckoutOutcome, ApplicationError> {
        let mut uow = self.unit_of_work_factory.begin().await?;
        let mut order = lock_accessible_order(uow.as_mut(), caller, order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;

        let outcome = order.check_out();
        match outcome {
            CheckoutOutcome::CheckedOut => {
                uow.save_checkout(&order).await?;
                uow.commit().await?;
                tracing::info!(order_id = %order_id, "order checked out");
            }
            CheckoutOutcome::AlreadyCheckedOut => {
                tracing::info!(order_id = %order_id, "order is already checked out");
            }
        }
        Ok(outcome)
    }

    /// 注文を削除する
    ///
    /// 未チェックアウトの注文のみ削除できる。すべての明細の在庫を戻してから
    /// 注文を削除し（明細はカスケード削除）、1つの作業単位としてコミットする。
    #[tracing::instrument(skip(self, caller), fields(user_id = %caller.user_id()))]
    pub async fn delete_order(
        &self,
        caller: &Caller,
        order_id: OrderId,
    ) -> Result<(), ApplicationError> {
        let mut uow = self.unit_of_work_factory.begin().await?;
        let order = lock_accessible_order(uow.as_mut(), caller, order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;
        order.ensure_open()?;

        let mut items = uow.lock_order_items_of(order_id).await?;
        items.sort_by_key(OrderItem::product_id);

        let mut ledger = InventoryLedger::new(uow.as_mut());
        for item in &items {
            ledger.release(item.product_id(), item.quantity()).await?;
        }
        uow.delete_order(order_id).await?;
        uow.commit().await?;

        tracing::info!(order_id = %order_id, released_items = items.len(), "order deleted");
        Ok(())
    }
}

/// カタログアプリケーションサービス
/// カテゴリ・商品の管理者向け操作を提供する
pub struct CatalogApplicationService {
    catalog_repository: Arc<dyn CatalogRepository>,
    unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
}

impl CatalogApplicationService {
    /// 新しいカタログアプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `catalog_repository` - カタログリポジトリ
    /// * `unit_of_work_factory` - 作業単位ファクトリ（在庫補充に使用）
    pub fn new(
        catalog_repository: Arc<dyn CatalogRepository>,
        unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
    ) -> Self {
        Self {
            catalog_repository,
            unit_of_work_factory,
        }
    }

    pub async fn create_category(
        &self,
        caller: &Caller,
        name: String,
    ) -> Result<Category, ApplicationError> {
        require_admin(caller)?;
        let category = Category::new(CategoryId::new(), name)?;
        self.catalog_repository.save_category(&category).await?;
        tracing::info!(category_id = %category.id(), "category created");
        Ok(category)
    }

    pub async fn rename_category(
        &self,
        caller: &Caller,
        category_id: CategoryId,
        name: String,
    ) -> Result<Category, ApplicationError> {
        require_admin(caller)?;
        let mut category = self
            .catalog_repository
            .find_category(category_id)
            .await?
            .ok_or_else(|| category_not_found(category_id))?;
        category.rename(name)?;
        self.catalog_repository.save_category(&category).await?;
        Ok(category)
    }

    /// カテゴリを削除する（所属商品も削除される）
    pub async fn delete_category(
        &self,
        caller: &Caller,
        category_id: CategoryId,
    ) -> Result<(), ApplicationError> {
        require_admin(caller)?;
        if !self.catalog_repository.delete_category(category_id).await? {
            return Err(category_not_found(category_id));
        }
        tracing::info!(category_id = %category_id, "category deleted");
        Ok(())
    }

    /// 商品を登録する
    ///
    /// # Arguments
    /// * `caller` - 呼び出し元（管理者のみ）
    /// * `category_id` - 所属カテゴリ
    /// * `name` - 商品名
    /// * `description` - 説明
    /// * `price` - 価格（生の入力値）
    /// * `stock` - 初期在庫数（生の入力値）
    pub async fn create_product(
        &self,
        caller: &Caller,
        category_id: CategoryId,
        name: String,
        description: String,
        price: i64,
        stock: i64,
    ) -> Result<Product, ApplicationError> {
        require_admin(caller)?;
        let price = Price::new(price)?;
        let stock = parse_stock(stock)?;

        if self
            .catalog_repository
            .find_category(category_id)
            .await?
            .is_none()
        {
            return Err(category_not_found(category_id));
        }

        let product = Product::new(ProductId::new(), category_id, name, description, price, stock)?;
        self.catalog_repository.insert_product(&product).await?;
        tracing::info!(product_id = %product.id(), stock, "product created");
        Ok(product)
    }

    /// 在庫を補充する（在庫数を指定値で上書きし、販売可否を導出し直す）
    #[tracing::instrument(skip(self, caller), fields(user_id = %caller.user_id()))]
    pub async fn restock(
        &self,
        caller: &Caller,
        product_id: ProductId,
        stock: i64,
    ) -> Result<Product, ApplicationError> {
        require_admin(caller)?;
        let stock = parse_stock(stock)?;

        let mut uow = self.unit_of_work_factory.begin().await?;
        if uow.lock_product(product_id).await?.is_none() {
            return Err(product_not_found(product_id));
        }
        // 予約済み数量を戻しても上限を超えない範囲に限る
        let reserved = uow.reserved_stock(product_id).await?;
        if u64::from(stock) + reserved > u64::from(MAX_STOCK) {
            return Err(DomainError::InvalidValue(format!(
                "在庫数と予約済み数量の合計は{}以下である必要があります: {} + {}",
                MAX_STOCK, stock, reserved
            ))
            .into());
        }
        let product = uow.set_stock(product_id, stock).await?;
        uow.commit().await?;

        tracing::info!(product_id = %product_id, stock, reserved, "product restocked");
        Ok(product)
    }

    /// 商品情報（カテゴリ・名前・説明・価格）を更新する
    /// 在庫数は変更しない
    pub async fn update_product(
        &self,
        caller: &Caller,
        product_id: ProductId,
        category_id: CategoryId,
        name: String,
        description: String,
        price: i64,
    ) -> Result<Product, ApplicationError> {
        require_admin(caller)?;
        let price = Price::new(price)?;

        let mut product = self
            .catalog_repository
            .find_product(product_id)
            .await?
            .ok_or_else(|| product_not_found(product_id))?;
        if self
            .catalog_repository
            .find_category(category_id)
            .await?
            .is_none()
        {
            return Err(category_not_found(category_id));
        }
        product.update_details(category_id, name, description, price)?;

        if !self.catalog_repository.update_product(&product).await? {
            return Err(product_not_found(product_id));
        }
        // 在庫数は保存済みの最新値を返す
        let product = self
            .catalog_repository
            .find_product(product_id)
            .await?
            .ok_or_else(|| product_not_found(product_id))?;
        tracing::info!(product_id = %product_id, "product updated");
        Ok(product)
    }

    /// 商品を削除する
    /// 注文明細から参照されている商品は削除できない
    pub async fn delete_product(
        &self,
        caller: &Caller,
        product_id: ProductId,
    ) -> Result<(), ApplicationError> {
        require_admin(caller)?;
        if !self.catalog_repository.delete_product(product_id).await? {
            return Err(product_not_found(product_id));
        }
        tracing::info!(product_id = %product_id, "product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::InMemoryStore;
    use crate::domain::model::UserId;
    use crate::domain::port::RepositoryError;

    struct Fixture {
        store: InMemoryStore,
        items: OrderItemApplicationService,
        orders: OrderApplicationService,
        catalog: CatalogApplicationService,
        admin: Caller,
        customer: Caller,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let shared = Arc::new(store.clone());
        Fixture {
            items: OrderItemApplicationService::new(shared.clone()),
            orders: OrderApplicationService::new(shared.clone(), shared.clone()),
            catalog: CatalogApplicationService::new(shared.clone(), shared),
            store,
            admin: Caller::admin(UserId::new()),
            customer: Caller::customer(UserId::new()),
        }
    }

    async fn product_with_stock(fx: &Fixture, stock: i64) -> ProductId {
        let category = fx
            .catalog
            .create_category(&fx.admin, "Electronics".to_string())
            .await
            .unwrap();
        fx.catalog
            .create_product(
                &fx.admin,
                category.id(),
                "Laptop".to_string(),
                "A powerful laptop".to_string(),
                150_000,
                stock,
            )
            .await
            .unwrap()
            .id()
    }

    #[tokio::test]
    async fn test_create_order_item_reserves_stock() {
        let fx = fixture();
        let product_id = product_with_stock(&fx, 10).await;
        let order = fx.orders.create_order(&fx.customer).await.unwrap();

        let item = fx
            .items
            .create_order_item(&fx.customer, order.id(), product_id, 6)
            .await
            .unwrap();

        assert_eq!(item.quantity().value(), 6);
        assert_eq!(fx.store.product_stock(product_id).await, Some(4));
    }

    #[tokio::test]
    async fn test_create_order_item_rejects_invalid_quantity_before_ledger() {
        let fx = fixture();
        let product_id = product_with_stock(&fx, 10).await;
        let order = fx.orders.create_order(&fx.customer).await.unwrap();

        let result = fx
            .items
            .create_order_item(&fx.customer, order.id(), product_id, 0)
            .await;

        assert_eq!(
            result,
            Err(ApplicationError::Domain(DomainError::InvalidQuantity(0)))
        );
        assert_eq!(fx.store.product_stock(product_id).await, Some(10));
    }

    #[tokio::test]
    async fn test_other_customers_order_is_not_found() {
        let fx = fixture();
        let product_id = product_with_stock(&fx, 10).await;
        let order = fx.orders.create_order(&fx.customer).await.unwrap();
        let stranger = Caller::customer(UserId::new());

        let result = fx
            .items
            .create_order_item(&stranger, order.id(), product_id, 1)
            .await;

        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
        assert_eq!(fx.store.product_stock(product_id).await, Some(10));
    }

    #[tokio::test]
    async fn test_update_order_item_to_other_product_moves_reservation() {
        let fx = fixture();
        let laptop = product_with_stock(&fx, 5).await;
        let mouse = product_with_stock(&fx, 5).await;
        let order = fx.orders.create_order(&fx.customer).await.unwrap();
        let item = fx
            .items
            .create_order_item(&fx.customer, order.id(), laptop, 3)
            .await
            .unwrap();

        let updated = fx
            .items
            .update_order_item(&fx.customer, item.id(), mouse, 4)
            .await
            .unwrap();

        assert_eq!(updated.product_id(), mouse);
        assert_eq!(fx.store.product_stock(laptop).await, Some(5));
        assert_eq!(fx.store.product_stock(mouse).await, Some(1));
    }

    #[tokio::test]
    async fn test_failed_product_change_rolls_back_release() {
        let fx = fixture();
        let laptop = product_with_stock(&fx, 5).await;
        let mouse = product_with_stock(&fx, 2).await;
        let order = fx.orders.create_order(&fx.customer).await.unwrap();
        let item = fx
            .items
            .create_order_item(&fx.customer, order.id(), laptop, 3)
            .await
            .unwrap();

        let result = fx
            .items
            .update_order_item(&fx.customer, item.id(), mouse, 3)
            .await;

        assert!(result.as_ref().is_err_and(ApplicationError::is_out_of_stock));
        assert_eq!(fx.store.product_stock(laptop).await, Some(2));
        assert_eq!(fx.store.product_stock(mouse).await, Some(2));
        let stored = fx.store.find_item(item.id()).await.unwrap().unwrap();
        assert_eq!(stored.product_id(), laptop);
    }

    #[tokio::test]
    async fn test_checked_out_order_items_are_frozen() {
        let fx = fixture();
        let product_id = product_with_stock(&fx, 5).await;
        let order = fx.orders.create_order(&fx.customer).await.unwrap();
        let item = fx
            .items
            .create_order_item(&fx.customer, order.id(), product_id, 2)
            .await
            .unwrap();
        fx.orders.check_out(&fx.customer, order.id()).await.unwrap();

        let frozen = Err(ApplicationError::Domain(DomainError::OrderCheckedOut(
            order.id(),
        )));
        assert_eq!(
            fx.items
                .create_order_item(&fx.customer, order.id(), product_id, 1)
                .await
                .map(|_| ()),
            frozen
        );
        assert_eq!(
            fx.items
                .update_order_item(&fx.customer, item.id(), product_id, 1)
                .await
                .map(|_| ()),
            frozen
        );
        assert_eq!(
            fx.items.delete_order_item(&fx.customer, item.id()).await,
            frozen
        );
        assert_eq!(fx.orders.delete_order(&fx.customer, order.id()).await, frozen);
        assert_eq!(fx.store.product_stock(product_id).await, Some(3));
    }

    #[tokio::test]
    async fn test_check_out_twice() {
        let fx = fixture();
        let order = fx.orders.create_order(&fx.customer).await.unwrap();

        assert_eq!(
            fx.orders.check_out(&fx.customer, order.id()).await,
            Ok(CheckoutOutcome::CheckedOut)
        );
        assert_eq!(
            fx.orders.check_out(&fx.admin, order.id()).await,
            Ok(CheckoutOutcome::AlreadyCheckedOut)
        );
        let stored = fx.store.find_by_id(order.id()).await.unwrap().unwrap();
        assert!(stored.is_checked_out());
    }

    #[tokio::test]
    async fn test_delete_order_releases_every_item() {
        let fx = fixture();
        let laptop = product_with_stock(&fx, 5).await;
        let mouse = product_with_stock(&fx, 3).await;
        let order = fx.orders.create_order(&fx.customer).await.unwrap();
        fx.items
            .create_order_item(&fx.customer, order.id(), laptop, 5)
            .await
            .unwrap();
        fx.items
            .create_order_item(&fx.customer, order.id(), mouse, 1)
            .await
            .unwrap();

        fx.orders.delete_order(&fx.customer, order.id()).await.unwrap();

        assert_eq!(fx.store.product_stock(laptop).await, Some(5));
        assert_eq!(fx.store.product_stock(mouse).await, Some(3));
        assert!(fx.store.find_items(order.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_management_requires_admin() {
        let fx = fixture();

        let result = fx
            .catalog
            .create_category(&fx.customer, "Books".to_string())
            .await;
        assert!(matches!(result, Err(ApplicationError::Forbidden(_))));

        let product_id = product_with_stock(&fx, 1).await;
        let result = fx.catalog.restock(&fx.customer, product_id, 10).await;
        assert!(matches!(result, Err(ApplicationError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_restock_rederives_availability() {
        let fx = fixture();
        let product_id = product_with_stock(&fx, 0).await;

        let product = fx.catalog.restock(&fx.admin, product_id, 7).await.unwrap();
        assert!(product.is_available());
        assert_eq!(fx.store.product_stock(product_id).await, Some(7));

        let product = fx.catalog.restock(&fx.admin, product_id, 0).await.unwrap();
        assert!(!product.is_available());

        let result = fx.catalog.restock(&fx.admin, product_id, -1).await;
        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::InvalidValue(_)))
        ));
    }

    #[tokio::test]
    async fn test_create_product_in_unknown_category() {
        let fx = fixture();

        let result = fx
            .catalog
            .create_product(
                &fx.admin,
                CategoryId::new(),
                "Laptop".to_string(),
                String::new(),
                100,
                1,
            )
            .await;

        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rename_and_delete_category() {
        let fx = fixture();
        let category = fx
            .catalog
            .create_category(&fx.admin, "Electornics".to_string())
            .await
            .unwrap();

        let renamed = fx
            .catalog
            .rename_category(&fx.admin, category.id(), " Electronics ".to_string())
            .await
            .unwrap();
        assert_eq!(renamed.name(), "Electronics");

        fx.catalog
            .delete_category(&fx.admin, category.id())
            .await
            .unwrap();
        let result = fx.catalog.delete_category(&fx.admin, category.id()).await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stock_beyond_column_range_is_invalid() {
        let fx = fixture();
        let product_id = product_with_stock(&fx, 1).await;

        let result = fx
            .catalog
            .restock(&fx.admin, product_id, i64::from(u32::MAX))
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::InvalidValue(_)))
        ));

        let category = fx
            .catalog
            .create_category(&fx.admin, "Books".to_string())
            .await
            .unwrap();
        let result = fx
            .catalog
            .create_product(
                &fx.admin,
                category.id(),
                "Novel".to_string(),
                String::new(),
                100,
                i64::from(MAX_STOCK) + 1,
            )
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::InvalidValue(_)))
        ));
        assert_eq!(fx.store.product_stock(product_id).await, Some(1));
    }

    #[tokio::test]
    async fn test_restock_keeps_room_for_releasing_reservations() {
        let fx = fixture();
        let product_id = product_with_stock(&fx, 10).await;
        let order = fx.orders.create_order(&fx.customer).await.unwrap();
        let item = fx
            .items
            .create_order_item(&fx.customer, order.id(), product_id, 5)
            .await
            .unwrap();

        let result = fx
            .catalog
            .restock(&fx.admin, product_id, i64::from(MAX_STOCK))
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::InvalidValue(_)))
        ));
        assert_eq!(fx.store.product_stock(product_id).await, Some(5));

        fx.catalog
            .restock(&fx.admin, product_id, i64::from(MAX_STOCK) - 5)
            .await
            .unwrap();
        fx.items
            .delete_order_item(&fx.customer, item.id())
            .await
            .unwrap();

        assert_eq!(fx.store.product_stock(product_id).await, Some(MAX_STOCK));
    }

    #[tokio::test]
    async fn test_update_product_changes_details_but_not_stock() {
        let fx = fixture();
        let product_id = product_with_stock(&fx, 4).await;
        let books = fx
            .catalog
            .create_category(&fx.admin, "Books".to_string())
            .await
            .unwrap();

        let updated = fx
            .catalog
            .update_product(
                &fx.admin,
                product_id,
                books.id(),
                "Rust in Action".to_string(),
                "Systems programming".to_string(),
                4_800,
            )
            .await
            .unwrap();

        assert_eq!(updated.name(), "Rust in Action");
        assert_eq!(updated.category_id(), books.id());
        assert_eq!(updated.price().amount(), 4_800);
        assert_eq!(updated.stock(), 4);
        assert_eq!(fx.store.product_stock(product_id).await, Some(4));

        let result = fx
            .catalog
            .update_product(
                &fx.customer,
                product_id,
                books.id(),
                "Cheap".to_string(),
                String::new(),
                1,
            )
            .await;
        assert!(matches!(result, Err(ApplicationError::Forbidden(_))));

        let result = fx
            .catalog
            .update_product(
                &fx.admin,
                product_id,
                CategoryId::new(),
                "Rust in Action".to_string(),
                String::new(),
                4_800,
            )
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_product_referenced_by_order_item_fails() {
        let fx = fixture();
        let product_id = product_with_stock(&fx, 4).await;
        let order = fx.orders.create_order(&fx.customer).await.unwrap();
        let item = fx
            .items
            .create_order_item(&fx.customer, order.id(), product_id, 1)
            .await
            .unwrap();

        let result = fx.catalog.delete_product(&fx.admin, product_id).await;
        assert!(matches!(
            result,
            Err(ApplicationError::Repository(RepositoryError::StillReferenced(_)))
        ));

        fx.items
            .delete_order_item(&fx.customer, item.id())
            .await
            .unwrap();
        fx.catalog
            .delete_product(&fx.admin, product_id)
            .await
            .unwrap();
        assert_eq!(fx.store.product_stock(product_id).await, None);

        let result = fx.catalog.delete_product(&fx.admin, product_id).await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }
}

use crate::domain::model::{
    Category, CategoryId, Order, OrderId, OrderItem, OrderItemId, Product, ProductId, UserId,
    MAX_STOCK,
};
use crate::domain::port::{
    CatalogRepository, OrderRepository, RepositoryError, UnitOfWork, UnitOfWorkFactory,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// ストアが保持するテーブル群
#[derive(Debug, Clone, Default)]
struct StoreState {
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    order_items: HashMap<OrderItemId, OrderItem>,
}

impl StoreState {
    fn sorted_products<'a>(products: impl Iterator<Item = &'a Product>) -> Vec<Product> {
        let mut result: Vec<Product> = products.cloned().collect();
        result.sort_by(|a, b| {
            (a.name(), a.description(), a.price()).cmp(&(b.name(), b.description(), b.price()))
        });
        result
    }

    fn sorted_orders<'a>(orders: impl Iterator<Item = &'a Order>) -> Vec<Order> {
        let mut result: Vec<Order> = orders.cloned().collect();
        result.sort_by_key(|order| (order.created_at(), order.id()));
        result
    }

    fn items_matching(&self, filter: impl Fn(&OrderItem) -> bool) -> Vec<OrderItem> {
        let mut result: Vec<OrderItem> = self
            .order_items
            .values()
            .filter(|item| filter(item))
            .cloned()
            .collect();
        result.sort_by_key(|item| item.id());
        result
    }

    fn items_of(&self, order_id: OrderId) -> Vec<OrderItem> {
        self.items_matching(|item| item.order_id() == order_id)
    }

    fn reserved_by_items(&self, product_id: ProductId) -> u64 {
        self.order_items
            .values()
            .filter(|item| item.product_id() == product_id)
            .map(|item| u64::from(item.quantity().value()))
            .sum()
    }

    fn is_referenced_by_items(&self, product_id: ProductId) -> bool {
        self.order_items
            .values()
            .any(|item| item.product_id() == product_id)
    }

    /// 外部キー制約の確認
    fn check_item_references(&self, item: &OrderItem) -> Result<(), RepositoryError> {
        if !self.orders.contains_key(&item.order_id()) {
            return Err(RepositoryError::OperationFailed(format!(
                "注文が存在しません: {}",
                item.order_id()
            )));
        }
        if !self.products.contains_key(&item.product_id()) {
            return Err(RepositoryError::OperationFailed(format!(
                "商品が存在しません: {}",
                item.product_id()
            )));
        }
        Ok(())
    }
}

/// インメモリストア
///
/// MySQLアダプターと同じ意味論をメモリ上で提供する。作業単位はストア全体の
/// ロックを保持したまま作業用コピーに書き込み、コミット時にのみ反映する。
/// そのため作業単位同士は直列化され、コミットされずに破棄された書き込みは残らない。
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 作業単位を経由せずにカテゴリを登録する（初期データ・テスト用）
    pub async fn seed_category(&self, category: Category) {
        let mut state = self.state.lock().await;
        state.categories.insert(category.id(), category);
    }

    /// 作業単位を経由せずに商品を登録する（初期データ・テスト用）
    pub async fn seed_product(&self, product: Product) {
        let mut state = self.state.lock().await;
        state.products.insert(product.id(), product);
    }

    /// コミット済みの在庫数を取得する
    pub async fn product_stock(&self, product_id: ProductId) -> Option<u32> {
        let state = self.state.lock().await;
        state.products.get(&product_id).map(Product::stock)
    }

    /// 指定商品を予約しているコミット済み明細の数量合計
    pub async fn reserved_quantity(&self, product_id: ProductId) -> u64 {
        let state = self.state.lock().await;
        state.reserved_by_items(product_id)
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(InMemoryUnitOfWork { guard, working }))
    }
}

/// インメモリの作業単位
struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
}

impl InMemoryUnitOfWork {
    fn product_mut(&mut self, product_id: ProductId) -> Result<&mut Product, RepositoryError> {
        self.working.products.get_mut(&product_id).ok_or_else(|| {
            RepositoryError::OperationFailed(format!("商品が存在しません: {}", product_id))
        })
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn lock_product(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        Ok(self.working.products.get(&product_id).cloned())
    }

    async fn apply_stock_delta(
        &mut self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<Product, RepositoryError> {
        let product = self.product_mut(product_id)?;
        let next = i64::from(product.stock()) + delta;
        // CHECK (stock >= 0) と INT の範囲に相当
        let next = u32::try_from(next)
            .ok()
            .filter(|next| *next <= MAX_STOCK)
            .ok_or(RepositoryError::StockConstraintViolation(product_id))?;
        product.restock(next);
        Ok(product.clone())
    }

    async fn set_stock(
        &mut self,
        product_id: ProductId,
        stock: u32,
    ) -> Result<Product, RepositoryError> {
        if stock > MAX_STOCK {
            return Err(RepositoryError::StockConstraintViolation(product_id));
        }
        let product = self.product_mut(product_id)?;
        product.restock(stock);
        Ok(product.clone())
    }

    async fn reserved_stock(&mut self, product_id: ProductId) -> Result<u64, RepositoryError> {
        Ok(self.working.reserved_by_items(product_id))
    }

    async fn lock_order(&mut self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.working.orders.get(&order_id).cloned())
    }

    async fn save_checkout(&mut self, order: &Order) -> Result<(), RepositoryError> {
        let stored = self.working.orders.get_mut(&order.id()).ok_or_else(|| {
            RepositoryError::OperationFailed(format!("注文が存在しません: {}", order.id()))
        })?;
        *stored = Order::reconstruct(
            stored.id(),
            stored.user_id(),
            order.is_checked_out(),
            stored.created_at(),
            order.updated_at(),
        );
        Ok(())
    }

    async fn delete_order(&mut self, order_id: OrderId) -> Result<(), RepositoryError> {
        self.working.orders.remove(&order_id);
        self.working
            .order_items
            .retain(|_, item| item.order_id() != order_id);
        Ok(())
    }

    async fn find_order_item(
        &mut self,
        item_id: OrderItemId,
    ) -> Result<Option<OrderItem>, RepositoryError> {
        Ok(self.working.order_items.get(&item_id).cloned())
    }

    async fn lock_order_item(
        &mut self,
        item_id: OrderItemId,
    ) -> Result<Option<OrderItem>, RepositoryError> {
        Ok(self.working.order_items.get(&item_id).cloned())
    }

    async fn lock_order_items_of(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        Ok(self.working.items_of(order_id))
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<(), RepositoryError> {
        self.working.check_item_references(item)?;
        self.working.order_items.insert(item.id(), item.clone());
        Ok(())
    }

    async fn update_order_item(&mut self, item: &OrderItem) -> Result<(), RepositoryError> {
        self.working.check_item_references(item)?;
        match self.working.order_items.get_mut(&item.id()) {
            Some(stored) => {
                *stored = item.clone();
                Ok(())
            }
            None => Err(RepositoryError::OperationFailed(format!(
                "注文明細が存在しません: {}",
                item.id()
            ))),
        }
    }

    async fn delete_order_item(&mut self, item_id: OrderItemId) -> Result<(), RepositoryError> {
        self.working.order_items.remove(&item_id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let InMemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn save_category(&self, category: &Category) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.categories.insert(category.id(), category.clone());
        Ok(())
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.categories.get(&id).cloned())
    }

    async fn find_all_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let state = self.state.lock().await;
        let mut result: Vec<Category> = state.categories.values().cloned().collect();
        result.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(result)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.categories.contains_key(&id) {
            return Ok(false);
        }

        let product_ids: Vec<ProductId> = state
            .products
            .values()
            .filter(|product| product.category_id() == id)
            .map(Product::id)
            .collect();
        let referenced = product_ids
            .iter()
            .any(|product_id| state.is_referenced_by_items(*product_id));
        if referenced {
            return Err(RepositoryError::StillReferenced(format!(
                "カテゴリ {} の商品は注文明細から参照されています",
                id
            )));
        }

        state.products.retain(|_, product| product.category_id() != id);
        state.categories.remove(&id);
        Ok(true)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.categories.contains_key(&product.category_id()) {
            return Err(RepositoryError::OperationFailed(format!(
                "カテゴリが存在しません: {}",
                product.category_id()
            )));
        }
        state.products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.categories.contains_key(&product.category_id()) {
            return Err(RepositoryError::OperationFailed(format!(
                "カテゴリが存在しません: {}",
                product.category_id()
            )));
        }
        let Some(stored) = state.products.get_mut(&product.id()) else {
            return Ok(false);
        };
        // 在庫数は保存済みの値を残す
        *stored = Product::reconstruct(
            stored.id(),
            product.category_id(),
            product.name().to_string(),
            product.description().to_string(),
            product.price(),
            stored.stock(),
        );
        Ok(true)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.is_referenced_by_items(id) {
            return Err(RepositoryError::StillReferenced(format!(
                "商品 {} は注文明細から参照されています",
                id
            )));
        }
        Ok(state.products.remove(&id).is_some())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.products.get(&id).cloned())
    }

    async fn find_all_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(StoreState::sorted_products(state.products.values()))
    }

    async fn find_available_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(StoreState::sorted_products(
            state.products.values().filter(|product| product.is_available()),
        ))
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.orders.get(&order_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(StoreState::sorted_orders(state.orders.values()))
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(StoreState::sorted_orders(
            state.orders.values().filter(|order| order.user_id() == user_id),
        ))
    }

    async fn find_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.items_of(order_id))
    }

    async fn find_item(&self, item_id: OrderItemId) -> Result<Option<OrderItem>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.order_items.get(&item_id).cloned())
    }

    async fn find_all_items(&self) -> Result<Vec<OrderItem>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.items_matching(|_| true))
    }

    async fn find_items_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.items_matching(|item| {
            state
                .orders
                .get(&item.order_id())
                .is_some_and(|order| order.user_id() == user_id)
        }))
    }

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }
}

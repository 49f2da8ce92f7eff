// 在庫予約の統合テスト
// インメモリストアに対してアプリケーションサービスを通しで実行する

use shop_inventory::adapter::driven::InMemoryStore;
use shop_inventory::application::service::{
    CatalogApplicationService, CatalogQueryService, OrderApplicationService,
    OrderItemApplicationService, OrderQueryService,
};
use shop_inventory::application::ApplicationError;
use shop_inventory::domain::error::DomainError;
use shop_inventory::domain::model::{Caller, CheckoutOutcome, OrderId, ProductId, UserId};
use shop_inventory::domain::port::CatalogRepository;
use std::sync::Arc;

struct Shop {
    store: InMemoryStore,
    items: Arc<OrderItemApplicationService>,
    orders: Arc<OrderApplicationService>,
    catalog: CatalogApplicationService,
    catalog_query: CatalogQueryService,
    order_query: OrderQueryService,
    admin: Caller,
}

impl Shop {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let shared = Arc::new(store.clone());
        Self {
            items: Arc::new(OrderItemApplicationService::new(shared.clone())),
            orders: Arc::new(OrderApplicationService::new(
                shared.clone(),
                shared.clone(),
            )),
            catalog: CatalogApplicationService::new(shared.clone(), shared.clone()),
            catalog_query: CatalogQueryService::new(shared.clone()),
            order_query: OrderQueryService::new(shared),
            store,
            admin: Caller::admin(UserId::new()),
        }
    }

    async fn product(&self, name: &str, stock: i64) -> ProductId {
        let category = self
            .catalog
            .create_category(&self.admin, "Electronics".to_string())
            .await
            .unwrap();
        self.catalog
            .create_product(
                &self.admin,
                category.id(),
                name.to_string(),
                String::new(),
                10_000,
                stock,
            )
            .await
            .unwrap()
            .id()
    }

    async fn open_order(&self, caller: &Caller) -> OrderId {
        self.orders.create_order(caller).await.unwrap().id()
    }

    async fn stock(&self, product_id: ProductId) -> u32 {
        self.store.product_stock(product_id).await.unwrap()
    }

    async fn is_available(&self, product_id: ProductId) -> bool {
        self.store
            .find_product(product_id)
            .await
            .unwrap()
            .unwrap()
            .is_available()
    }
}

fn is_out_of_stock<T>(result: &Result<T, ApplicationError>) -> bool {
    matches!(
        result,
        Err(ApplicationError::Domain(DomainError::OutOfStock { .. }))
    )
}

#[tokio::test]
async fn test_reservation_within_stock_then_beyond_remaining() {
    let shop = Shop::new();
    let customer = Caller::customer(UserId::new());
    let product_id = shop.product("Laptop", 10).await;
    let order_id = shop.open_order(&customer).await;

    shop.items
        .create_order_item(&customer, order_id, product_id, 6)
        .await
        .unwrap();
    assert_eq!(shop.stock(product_id).await, 4);
    assert!(shop.is_available(product_id).await);

    let result = shop
        .items
        .create_order_item(&customer, order_id, product_id, 5)
        .await;
    assert!(is_out_of_stock(&result));
    assert_eq!(shop.stock(product_id).await, 4);

    let details = shop
        .order_query
        .get_order(&customer, order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(details.items.len(), 1);
}

#[tokio::test]
async fn test_reserving_entire_stock_hides_product_until_released() {
    let shop = Shop::new();
    let customer = Caller::customer(UserId::new());
    let product_id = shop.product("Laptop", 5).await;
    let order_id = shop.open_order(&customer).await;

    let item = shop
        .items
        .create_order_item(&customer, order_id, product_id, 5)
        .await
        .unwrap();
    assert_eq!(shop.stock(product_id).await, 0);
    assert!(!shop.is_available(product_id).await);
    assert!(shop
        .catalog_query
        .get_product(Some(&customer), product_id)
        .await
        .unwrap()
        .is_none());

    shop.items
        .delete_order_item(&customer, item.id())
        .await
        .unwrap();
    assert_eq!(shop.stock(product_id).await, 5);
    assert!(shop.is_available(product_id).await);
    assert!(shop
        .catalog_query
        .get_product(None, product_id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_sold_out_product_rejects_reservation() {
    let shop = Shop::new();
    let customer = Caller::customer(UserId::new());
    let product_id = shop.product("Laptop", 0).await;
    let order_id = shop.open_order(&customer).await;

    let result = shop
        .items
        .create_order_item(&customer, order_id, product_id, 1)
        .await;

    assert!(is_out_of_stock(&result));
    assert_eq!(
        result.unwrap_err().to_string(),
        "The requested product is not available at this time."
    );
}

#[tokio::test]
async fn test_decreasing_quantity_returns_difference_to_stock() {
    let shop = Shop::new();
    let customer = Caller::customer(UserId::new());
    let product_id = shop.product("Laptop", 5).await;
    let order_id = shop.open_order(&customer).await;
    let item = shop
        .items
        .create_order_item(&customer, order_id, product_id, 3)
        .await
        .unwrap();
    assert_eq!(shop.stock(product_id).await, 2);

    let updated = shop
        .items
        .update_order_item(&customer, item.id(), product_id, 1)
        .await
        .unwrap();

    assert_eq!(updated.quantity().value(), 1);
    assert_eq!(shop.stock(product_id).await, 4);
}

#[tokio::test]
async fn test_increasing_quantity_beyond_stock_changes_nothing() {
    let shop = Shop::new();
    let customer = Caller::customer(UserId::new());
    let product_id = shop.product("Laptop", 4).await;
    let order_id = shop.open_order(&customer).await;
    let item = shop
        .items
        .create_order_item(&customer, order_id, product_id, 2)
        .await
        .unwrap();
    assert_eq!(shop.stock(product_id).await, 2);

    let result = shop
        .items
        .update_order_item(&customer, item.id(), product_id, 100)
        .await;

    assert!(is_out_of_stock(&result));
    assert_eq!(shop.stock(product_id).await, 2);
    let details = shop
        .order_query
        .get_order(&customer, order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(details.items[0].quantity().value(), 2);
}

#[tokio::test]
async fn test_update_with_invalid_quantity_is_rejected() {
    let shop = Shop::new();
    let customer = Caller::customer(UserId::new());
    let product_id = shop.product("Laptop", 4).await;
    let order_id = shop.open_order(&customer).await;
    let item = shop
        .items
        .create_order_item(&customer, order_id, product_id, 2)
        .await
        .unwrap();

    let result = shop
        .items
        .update_order_item(&customer, item.id(), product_id, -1)
        .await;

    assert_eq!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidQuantity(-1)))
    );
    assert_eq!(shop.stock(product_id).await, 2);
}

#[tokio::test]
async fn test_check_out_twice_keeps_flag() {
    let shop = Shop::new();
    let customer = Caller::customer(UserId::new());
    let order_id = shop.open_order(&customer).await;

    assert_eq!(
        shop.orders.check_out(&customer, order_id).await,
        Ok(CheckoutOutcome::CheckedOut)
    );
    assert_eq!(
        shop.orders.check_out(&customer, order_id).await,
        Ok(CheckoutOutcome::AlreadyCheckedOut)
    );

    let details = shop
        .order_query
        .get_order(&customer, order_id)
        .await
        .unwrap()
        .unwrap();
    assert!(details.order.is_checked_out());
}

#[tokio::test]
async fn test_restock_makes_product_visible_again() {
    let shop = Shop::new();
    let customer = Caller::customer(UserId::new());
    let product_id = shop.product("Laptop", 0).await;

    assert!(shop
        .catalog_query
        .list_products(Some(&customer))
        .await
        .unwrap()
        .is_empty());

    shop.catalog
        .restock(&shop.admin, product_id, 3)
        .await
        .unwrap();

    let visible = shop
        .catalog_query
        .list_products(Some(&customer))
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].stock(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_never_oversell() {
    let shop = Shop::new();
    let product_id = shop.product("Limited Edition", 5).await;

    let mut handles = Vec::new();
    for _ in 0..12 {
        let customer = Caller::customer(UserId::new());
        let order_id = shop.open_order(&customer).await;
        let items = shop.items.clone();
        handles.push(tokio::spawn(async move {
            items
                .create_order_item(&customer, order_id, product_id, 1)
                .await
        }));
    }

    let mut succeeded = 0;
    let mut out_of_stock = 0;
    for handle in handles {
        let result = handle.await.unwrap();
        if result.is_ok() {
            succeeded += 1;
        } else {
            assert!(is_out_of_stock(&result));
            out_of_stock += 1;
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(out_of_stock, 7);
    assert_eq!(shop.stock(product_id).await, 0);
    assert!(!shop.is_available(product_id).await);
    assert_eq!(shop.store.reserved_quantity(product_id).await, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reserve_and_release_keep_stock_consistent() {
    let shop = Shop::new();
    let customer = Caller::customer(UserId::new());
    let product_id = shop.product("Laptop", 6).await;
    let order_id = shop.open_order(&customer).await;

    let mut existing = Vec::new();
    for _ in 0..3 {
        existing.push(
            shop.items
                .create_order_item(&customer, order_id, product_id, 2)
                .await
                .unwrap()
                .id(),
        );
    }
    assert_eq!(shop.stock(product_id).await, 0);

    let mut handles = Vec::new();
    for item_id in existing {
        let items = shop.items.clone();
        handles.push(tokio::spawn(async move {
            items.delete_order_item(&customer, item_id).await.map(|_| ())
        }));
    }
    for _ in 0..3 {
        let items = shop.items.clone();
        handles.push(tokio::spawn(async move {
            items
                .create_order_item(&customer, order_id, product_id, 2)
                .await
                .map(|_| ())
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.is_ok() || is_out_of_stock(&result));
    }

    let stock = shop.stock(product_id).await;
    let reserved = shop.store.reserved_quantity(product_id).await;
    assert_eq!(u64::from(stock) + reserved, 6);
    assert_eq!(shop.is_available(product_id).await, stock > 0);
}

#[tokio::test]
async fn test_deleting_order_releases_all_reservations() {
    let shop = Shop::new();
    let customer = Caller::customer(UserId::new());
    let laptop = shop.product("Laptop", 3).await;
    let mouse = shop.product("Mouse", 10).await;
    let order_id = shop.open_order(&customer).await;
    shop.items
        .create_order_item(&customer, order_id, laptop, 3)
        .await
        .unwrap();
    shop.items
        .create_order_item(&customer, order_id, mouse, 4)
        .await
        .unwrap();

    let stranger = Caller::customer(UserId::new());
    let result = shop.orders.delete_order(&stranger, order_id).await;
    assert!(matches!(result, Err(ApplicationError::NotFound(_))));

    shop.orders.delete_order(&customer, order_id).await.unwrap();

    assert_eq!(shop.stock(laptop).await, 3);
    assert_eq!(shop.stock(mouse).await, 10);
    assert!(shop
        .order_query
        .get_order(&shop.admin, order_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deleting_order_while_items_change_restores_stock() {
    let shop = Shop::new();
    let customer = Caller::customer(UserId::new());
    let product_id = shop.product("Laptop", 12).await;
    let order_id = shop.open_order(&customer).await;

    let mut existing = Vec::new();
    for _ in 0..4 {
        existing.push(
            shop.items
                .create_order_item(&customer, order_id, product_id, 3)
                .await
                .unwrap()
                .id(),
        );
    }
    assert_eq!(shop.stock(product_id).await, 0);

    let mut handles = Vec::new();
    for (index, item_id) in existing.into_iter().enumerate() {
        let items = shop.items.clone();
        handles.push(tokio::spawn(async move {
            if index % 2 == 0 {
                items
                    .update_order_item(&customer, item_id, product_id, 1)
                    .await
                    .map(|_| ())
            } else {
                items.delete_order_item(&customer, item_id).await
            }
        }));
    }
    let orders = shop.orders.clone();
    handles.push(tokio::spawn(async move {
        orders.delete_order(&customer, order_id).await
    }));

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(
            result.is_ok() || matches!(result, Err(ApplicationError::NotFound(_))),
            "{:?}",
            result
        );
    }

    assert_eq!(shop.stock(product_id).await, 12);
    assert_eq!(shop.store.reserved_quantity(product_id).await, 0);
}

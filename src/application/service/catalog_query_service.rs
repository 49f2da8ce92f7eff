use crate::application::ApplicationError;
use crate::domain::model::{Caller, Category, Product, ProductId};
use crate::domain::port::CatalogRepository;
use std::sync::Arc;

/// カタログクエリサービス
/// 呼び出し元のロールに応じて見える商品を絞り込む
pub struct CatalogQueryService {
    catalog_repository: Arc<dyn CatalogRepository>,
}

impl CatalogQueryService {
    /// 新しいカタログクエリサービスを作成
    ///
    /// # Arguments
    /// * `catalog_repository` - カタログリポジトリ
    pub fn new(catalog_repository: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog_repository }
    }

    /// すべてのカテゴリを名前順で取得
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApplicationError> {
        self.catalog_repository
            .find_all_categories()
            .await
            .map_err(ApplicationError::from)
    }

    /// 呼び出し元に見える商品を取得
    /// 管理者はすべての商品、それ以外（匿名を含む）は販売可能な商品のみ
    ///
    /// # Arguments
    /// * `caller` - 呼び出し元（匿名の場合は `None`）
    ///
    /// # Returns
    /// * `Ok(Vec<Product>)` - 名前・説明・価格の順に並んだ商品のリスト
    /// * `Err(ApplicationError)` - 取得失敗
    pub async fn list_products(
        &self,
        caller: Option<&Caller>,
    ) -> Result<Vec<Product>, ApplicationError> {
        let products = if caller.is_some_and(Caller::is_admin) {
            self.catalog_repository.find_all_products().await?
        } else {
            self.catalog_repository.find_available_products().await?
        };
        Ok(products)
    }

    /// 商品IDで商品を取得
    /// 販売不可の商品は管理者以外には存在しないものとして扱う
    ///
    /// # Returns
    /// * `Ok(Some(Product))` - 呼び出し元に見える商品が見つかった
    /// * `Ok(None)` - 見つからなかった、または見えない
    /// * `Err(ApplicationError)` - 取得失敗
    pub async fn get_product(
        &self,
        caller: Option<&Caller>,
        product_id: ProductId,
    ) -> Result<Option<Product>, ApplicationError> {
        let product = self.catalog_repository.find_product(product_id).await?;
        let is_admin = caller.is_some_and(Caller::is_admin);
        Ok(product.filter(|product| is_admin || product.is_available()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::InMemoryStore;
    use crate::domain::model::{CategoryId, Price, UserId};

    async fn seeded() -> (CatalogQueryService, ProductId, ProductId) {
        let store = InMemoryStore::new();
        let category_id = CategoryId::new();
        let in_stock = Product::new(
            ProductId::new(),
            category_id,
            "Mouse".to_string(),
            String::new(),
            Price::new(3_000).unwrap(),
            8,
        )
        .unwrap();
        let sold_out = Product::new(
            ProductId::new(),
            category_id,
            "Keyboard".to_string(),
            String::new(),
            Price::new(9_000).unwrap(),
            0,
        )
        .unwrap();
        let ids = (in_stock.id(), sold_out.id());
        store.seed_product(in_stock).await;
        store.seed_product(sold_out).await;
        (CatalogQueryService::new(Arc::new(store)), ids.0, ids.1)
    }

    #[tokio::test]
    async fn test_admin_sees_every_product() {
        let (service, _, _) = seeded().await;
        let admin = Caller::admin(UserId::new());

        let products = service.list_products(Some(&admin)).await.unwrap();

        let names: Vec<&str> = products.iter().map(Product::name).collect();
        assert_eq!(names, vec!["Keyboard", "Mouse"]);
    }

    #[tokio::test]
    async fn test_customers_and_anonymous_see_available_products_only() {
        let (service, in_stock, _) = seeded().await;
        let customer = Caller::customer(UserId::new());

        for caller in [Some(&customer), None] {
            let products = service.list_products(caller).await.unwrap();
            assert_eq!(products.len(), 1);
            assert_eq!(products[0].id(), in_stock);
        }
    }

    #[tokio::test]
    async fn test_unavailable_product_is_hidden_from_customers() {
        let (service, _, sold_out) = seeded().await;
        let admin = Caller::admin(UserId::new());
        let customer = Caller::customer(UserId::new());

        assert!(service.get_product(None, sold_out).await.unwrap().is_none());
        assert!(service
            .get_product(Some(&customer), sold_out)
            .await
            .unwrap()
            .is_none());
        assert!(service
            .get_product(Some(&admin), sold_out)
            .await
            .unwrap()
            .is_some());
    }
}

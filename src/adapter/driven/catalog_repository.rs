use super::mysql_rows::{
    category_from_row, map_rows, product_from_row, CATEGORY_COLUMNS, PRODUCT_COLUMNS,
};
use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Category, CategoryId, Product, ProductId};
use crate::domain::port::{CatalogRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::{MySql, Pool};

/// MySQLカタログリポジトリ
/// カテゴリと商品をMySQLに永続化する
#[derive(Clone)]
pub struct MySqlCatalogRepository {
    pool: Pool<MySql>,
}

impl MySqlCatalogRepository {
    /// 新しいMySQLカタログリポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    ///
    /// # Returns
    /// * MySqlCatalogRepositoryのインスタンス
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    async fn fetch_products(&self, filter: &str) -> Result<Vec<Product>, RepositoryError> {
        // 名前・説明・価格の順に並べる
        let sql = format!(
            "SELECT {} FROM products {} ORDER BY name ASC, description ASC, price ASC",
            PRODUCT_COLUMNS, filter
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "商品一覧の取得に失敗しました"))?;

        map_rows(&rows, product_from_row)
    }
}

#[async_trait]
impl CatalogRepository for MySqlCatalogRepository {
    async fn save_category(&self, category: &Category) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name)
            "#,
        )
        .bind(category.id().to_string())
        .bind(category.name())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "カテゴリの保存に失敗しました"))?;

        Ok(())
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let sql = format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "カテゴリの取得に失敗しました"))?;

        row.as_ref().map(category_from_row).transpose()
    }

    async fn find_all_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let sql = format!("SELECT {} FROM categories ORDER BY name ASC", CATEGORY_COLUMNS);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "カテゴリ一覧の取得に失敗しました"))?;

        map_rows(&rows, category_from_row)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        // 商品はカスケード削除される。注文明細から参照されている商品があれば外部キーが拒否する
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "カテゴリの削除に失敗しました"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, category_id, name, description, price, stock)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(product.id().to_string())
        .bind(product.category_id().to_string())
        .bind(product.name())
        .bind(product.description())
        .bind(i64::from(product.price().amount()))
        .bind(product.stock())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "商品の保存に失敗しました"))?;

        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool, RepositoryError> {
        // 在庫数は作業単位だけが書き込む
        let result = sqlx::query(
            r#"
            UPDATE products
            SET category_id = ?, name = ?, description = ?, price = ?
            WHERE id = ?
            "#,
        )
        .bind(product.category_id().to_string())
        .bind(product.name())
        .bind(product.description())
        .bind(i64::from(product.price().amount()))
        .bind(product.id().to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "商品の更新に失敗しました"))?;

        // 値が変わらない更新でも見つかった行として数える
        if result.rows_affected() > 0 {
            return Ok(true);
        }
        Ok(self.find_product(product.id()).await?.is_some())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "商品の削除に失敗しました"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "商品の取得に失敗しました"))?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn find_all_products(&self) -> Result<Vec<Product>, RepositoryError> {
        self.fetch_products("").await
    }

    async fn find_available_products(&self) -> Result<Vec<Product>, RepositoryError> {
        self.fetch_products("WHERE is_available = TRUE").await
    }
}

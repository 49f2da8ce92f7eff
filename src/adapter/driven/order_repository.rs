use super::mysql_rows::{
    map_rows, order_from_row, order_item_from_row, ORDER_COLUMNS, ORDER_ITEM_COLUMNS,
};
use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Order, OrderId, OrderItem, OrderItemId, UserId};
use crate::domain::port::{OrderRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::{MySql, Pool};

/// MySQL注文リポジトリ
/// 注文の作成と読み取りを行う。明細の変更は作業単位を経由する
#[derive(Clone)]
pub struct MySqlOrderRepository {
    pool: Pool<MySql>,
}

impl MySqlOrderRepository {
    /// 新しいMySQL注文リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    ///
    /// # Returns
    /// * MySqlOrderRepositoryのインスタンス
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for MySqlOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, checked_out, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.id().to_string())
        .bind(order.user_id().to_string())
        .bind(order.is_checked_out())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "注文の保存に失敗しました"))?;

        Ok(())
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(order_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文の取得に失敗しました"))?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        // 作成日時の昇順で並べる
        let sql = format!(
            "SELECT {} FROM orders ORDER BY created_at ASC, id ASC",
            ORDER_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文一覧の取得に失敗しました"))?;

        map_rows(&rows, order_from_row)
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM orders WHERE user_id = ? ORDER BY created_at ASC, id ASC",
            ORDER_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::from_sqlx(e, "ユーザー別注文一覧の取得に失敗しました")
            })?;

        map_rows(&rows, order_from_row)
    }

    async fn find_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM order_items WHERE order_id = ? ORDER BY id ASC",
            ORDER_ITEM_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(order_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文明細の取得に失敗しました"))?;

        map_rows(&rows, order_item_from_row)
    }

    async fn find_item(&self, item_id: OrderItemId) -> Result<Option<OrderItem>, RepositoryError> {
        let sql = format!("SELECT {} FROM order_items WHERE id = ?", ORDER_ITEM_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(item_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文明細の取得に失敗しました"))?;

        row.as_ref().map(order_item_from_row).transpose()
    }

    async fn find_all_items(&self) -> Result<Vec<OrderItem>, RepositoryError> {
        let sql = format!("SELECT {} FROM order_items ORDER BY id ASC", ORDER_ITEM_COLUMNS);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文明細一覧の取得に失敗しました"))?;

        map_rows(&rows, order_item_from_row)
    }

    async fn find_items_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, oi.quantity
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = ?
            ORDER BY oi.id ASC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "ユーザー別注文明細の取得に失敗しました"))?;

        map_rows(&rows, order_item_from_row)
    }

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }
}

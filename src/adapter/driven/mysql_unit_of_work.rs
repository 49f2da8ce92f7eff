use super::mysql_rows::{
    order_from_row, order_item_from_row, product_from_row, ORDER_COLUMNS, ORDER_ITEM_COLUMNS,
    PRODUCT_COLUMNS,
};
use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Order, OrderId, OrderItem, OrderItemId, Product, ProductId};
use crate::domain::port::{RepositoryError, UnitOfWork, UnitOfWorkFactory};
use async_trait::async_trait;
use sqlx::{MySql, Pool, Transaction};

/// MySQLの作業単位ファクトリ
#[derive(Clone)]
pub struct MySqlUnitOfWorkFactory {
    pool: Pool<MySql>,
}

impl MySqlUnitOfWorkFactory {
    /// 新しいファクトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkFactory for MySqlUnitOfWorkFactory {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "トランザクション開始に失敗しました"))?;
        Ok(Box::new(MySqlUnitOfWork { tx }))
    }
}

/// MySQLトランザクションによる作業単位
///
/// 行ロックは `SELECT ... FOR UPDATE` で取得する。コミットされずにドロップされた場合、
/// sqlxがトランザクションをロールバックする。
pub struct MySqlUnitOfWork {
    tx: Transaction<'static, MySql>,
}

impl MySqlUnitOfWork {
    async fn fetch_product(&mut self, product_id: ProductId) -> Result<Product, RepositoryError> {
        self.lock_product(product_id).await?.ok_or_else(|| {
            RepositoryError::OperationFailed(format!("商品が存在しません: {}", product_id))
        })
    }
}

#[async_trait]
impl UnitOfWork for MySqlUnitOfWork {
    async fn lock_product(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM products WHERE id = ? FOR UPDATE",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(product_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "商品のロックに失敗しました"))?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn apply_stock_delta(
        &mut self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query("UPDATE products SET stock = stock + ? WHERE id = ?")
            .bind(delta)
            .bind(product_id.to_string())
            .execute(&mut *self.tx)
            .await;

        match result.map_err(|e| DatabaseError::from_sqlx(e, "在庫の更新に失敗しました")) {
            Ok(_) => self.fetch_product(product_id).await,
            Err(DatabaseError::CheckViolation(_)) => {
                Err(RepositoryError::StockConstraintViolation(product_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_stock(
        &mut self,
        product_id: ProductId,
        stock: u32,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query("UPDATE products SET stock = ? WHERE id = ?")
            .bind(stock)
            .bind(product_id.to_string())
            .execute(&mut *self.tx)
            .await;

        match result.map_err(|e| DatabaseError::from_sqlx(e, "在庫の更新に失敗しました")) {
            Ok(_) => self.fetch_product(product_id).await,
            Err(DatabaseError::CheckViolation(_)) => {
                Err(RepositoryError::StockConstraintViolation(product_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn reserved_stock(&mut self, product_id: ProductId) -> Result<u64, RepositoryError> {
        // 商品行のロック中は予約数量が変わらないため、非ロック読み取りで足りる
        let reserved: u64 = sqlx::query_scalar(
            "SELECT CAST(COALESCE(SUM(quantity), 0) AS UNSIGNED) FROM order_items WHERE product_id = ?",
        )
        .bind(product_id.to_string())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "予約数量の取得に失敗しました"))?;

        Ok(reserved)
    }

    async fn lock_order(&mut self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {} FROM orders WHERE id = ? FOR UPDATE", ORDER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(order_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文のロックに失敗しました"))?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn save_checkout(&mut self, order: &Order) -> Result<(), RepositoryError> {
        // チェックアウト状態のみを書き込む
        sqlx::query("UPDATE orders SET checked_out = ?, updated_at = ? WHERE id = ?")
            .bind(order.is_checked_out())
            .bind(order.updated_at())
            .bind(order.id().to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文の更新に失敗しました"))?;
        Ok(())
    }

    async fn delete_order(&mut self, order_id: OrderId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(order_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文の削除に失敗しました"))?;
        Ok(())
    }

    async fn find_order_item(
        &mut self,
        item_id: OrderItemId,
    ) -> Result<Option<OrderItem>, RepositoryError> {
        let sql = format!("SELECT {} FROM order_items WHERE id = ?", ORDER_ITEM_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(item_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文明細の取得に失敗しました"))?;

        row.as_ref().map(order_item_from_row).transpose()
    }

    async fn lock_order_item(
        &mut self,
        item_id: OrderItemId,
    ) -> Result<Option<OrderItem>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM order_items WHERE id = ? FOR UPDATE",
            ORDER_ITEM_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(item_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文明細のロックに失敗しました"))?;

        row.as_ref().map(order_item_from_row).transpose()
    }

    async fn lock_order_items_of(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM order_items WHERE order_id = ? ORDER BY id FOR UPDATE",
            ORDER_ITEM_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(order_id.to_string())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文明細のロックに失敗しました"))?;

        rows.iter().map(order_item_from_row).collect()
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, quantity) VALUES (?, ?, ?, ?)",
        )
        .bind(item.id().to_string())
        .bind(item.order_id().to_string())
        .bind(item.product_id().to_string())
        .bind(item.quantity().value())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "注文明細の保存に失敗しました"))?;
        Ok(())
    }

    async fn update_order_item(&mut self, item: &OrderItem) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE order_items SET product_id = ?, quantity = ? WHERE id = ?")
            .bind(item.product_id().to_string())
            .bind(item.quantity().value())
            .bind(item.id().to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文明細の更新に失敗しました"))?;
        Ok(())
    }

    async fn delete_order_item(&mut self, item_id: OrderItemId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM order_items WHERE id = ?")
            .bind(item_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文明細の削除に失敗しました"))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let MySqlUnitOfWork { tx } = *self;
        tx.commit()
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "トランザクションのコミットに失敗しました"))?;
        Ok(())
    }
}

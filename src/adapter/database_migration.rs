use crate::adapter::database_error::DatabaseError;
use sqlx::{MySql, Pool};

/// マイグレーションファイル（適用順）
const MIGRATIONS: [(&str, &str); 4] = [
    (
        "001_create_categories_table",
        include_str!("../../migrations/001_create_categories_table.sql"),
    ),
    (
        "002_create_products_table",
        include_str!("../../migrations/002_create_products_table.sql"),
    ),
    (
        "003_create_orders_table",
        include_str!("../../migrations/003_create_orders_table.sql"),
    ),
    (
        "004_create_order_items_table",
        include_str!("../../migrations/004_create_order_items_table.sql"),
    ),
];

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<MySql>,
}

impl DatabaseMigration {
    /// 新しいDatabaseMigrationインスタンスを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// マイグレーションを実行
    /// べき等性を保証（CREATE TABLE IF NOT EXISTS）
    pub async fn run(&self) -> Result<(), DatabaseError> {
        for (name, migration_sql) in MIGRATIONS {
            tracing::info!(migration = name, "running migration");
            sqlx::query(migration_sql)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DatabaseError::MigrationError(format!("Migration {} failed: {}", name, e))
                })?;
        }

        tracing::info!(count = MIGRATIONS.len(), "all migrations completed");
        Ok(())
    }
}

// MySQLの行とドメインモデルの相互変換

use crate::domain::model::{
    Category, CategoryId, Order, OrderId, OrderItem, OrderItemId, Price, Product, ProductId,
    Quantity, UserId,
};
use crate::domain::port::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::Row;

pub(super) const CATEGORY_COLUMNS: &str = "id, name";
pub(super) const PRODUCT_COLUMNS: &str = "id, category_id, name, description, price, stock";
pub(super) const ORDER_COLUMNS: &str = "id, user_id, checked_out, created_at, updated_at";
pub(super) const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity";

fn fetch_failed(what: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::FetchFailed(format!("{}の解析に失敗しました: {}", what, e))
}

fn column<'r, T>(row: &'r MySqlRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
{
    row.try_get(name).map_err(|e| fetch_failed(name, e))
}

pub(super) fn category_from_row(row: &MySqlRow) -> Result<Category, RepositoryError> {
    let id = CategoryId::from_string(&column::<String>(row, "id")?)
        .map_err(|e| fetch_failed("カテゴリID", e))?;
    Ok(Category::reconstruct(id, column(row, "name")?))
}

pub(super) fn product_from_row(row: &MySqlRow) -> Result<Product, RepositoryError> {
    let id = ProductId::from_string(&column::<String>(row, "id")?)
        .map_err(|e| fetch_failed("商品ID", e))?;
    let category_id = CategoryId::from_string(&column::<String>(row, "category_id")?)
        .map_err(|e| fetch_failed("カテゴリID", e))?;
    let price = Price::new(column::<i64>(row, "price")?).map_err(|e| fetch_failed("価格", e))?;
    let stock = u32::try_from(column::<i32>(row, "stock")?).map_err(|e| fetch_failed("在庫数", e))?;

    Ok(Product::reconstruct(
        id,
        category_id,
        column(row, "name")?,
        column(row, "description")?,
        price,
        stock,
    ))
}

pub(super) fn order_from_row(row: &MySqlRow) -> Result<Order, RepositoryError> {
    let id = OrderId::from_string(&column::<String>(row, "id")?)
        .map_err(|e| fetch_failed("注文ID", e))?;
    let user_id = UserId::from_string(&column::<String>(row, "user_id")?)
        .map_err(|e| fetch_failed("ユーザーID", e))?;

    Ok(Order::reconstruct(
        id,
        user_id,
        column(row, "checked_out")?,
        column::<DateTime<Utc>>(row, "created_at")?,
        column::<DateTime<Utc>>(row, "updated_at")?,
    ))
}

pub(super) fn order_item_from_row(row: &MySqlRow) -> Result<OrderItem, RepositoryError> {
    let id = OrderItemId::from_string(&column::<String>(row, "id")?)
        .map_err(|e| fetch_failed("注文明細ID", e))?;
    let order_id = OrderId::from_string(&column::<String>(row, "order_id")?)
        .map_err(|e| fetch_failed("注文ID", e))?;
    let product_id = ProductId::from_string(&column::<String>(row, "product_id")?)
        .map_err(|e| fetch_failed("商品ID", e))?;
    let quantity = Quantity::new(i64::from(column::<u32>(row, "quantity")?))
        .map_err(|e| fetch_failed("数量", e))?;

    Ok(OrderItem::new(id, order_id, product_id, quantity))
}

/// 複数行をまとめて変換する
pub(super) fn map_rows<T>(
    rows: &[MySqlRow],
    map: fn(&MySqlRow) -> Result<T, RepositoryError>,
) -> Result<Vec<T>, RepositoryError> {
    rows.iter().map(map).collect()
}

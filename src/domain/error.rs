use crate::domain::model::{OrderId, ProductId};
use thiserror::Error;

/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// 在庫切れ（販売不可の商品、または予約で在庫が負になる）
    #[error("The requested product is not available at this time.")]
    OutOfStock { product_id: ProductId },
    /// 無効な数量（1未満）
    #[error("Invalid quantity: {0} (must be at least 1)")]
    InvalidQuantity(i64),
    /// チェックアウト済みの注文に対する変更
    #[error("Order {0} is already checked out")]
    OrderCheckedOut(OrderId),
    /// 無効な値
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl DomainError {
    /// クライアントの入力不備によるエラーかどうか
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidQuantity(_) | DomainError::InvalidValue(_)
        )
    }
}

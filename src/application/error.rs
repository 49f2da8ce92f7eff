use crate::domain::error::DomainError;
use crate::domain::port::RepositoryError;
use crate::domain::service::LedgerError;
use thiserror::Error;

/// アプリケーション層のエラー型
/// ドメインエラー、リポジトリエラー、参照・権限のエラーをまとめる
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    /// ドメインエラー（ビジネスルール違反）
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// リポジトリエラー（永続化の失敗）
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    /// エンティティが見つからない（呼び出し元から見えない場合を含む）
    #[error("Not found: {0}")]
    NotFound(String),
    /// 呼び出し元のロールでは実行できない
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl ApplicationError {
    /// 在庫切れによる失敗かどうか
    pub fn is_out_of_stock(&self) -> bool {
        matches!(self, ApplicationError::Domain(DomainError::OutOfStock { .. }))
    }
}

impl From<LedgerError> for ApplicationError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Domain(e) => ApplicationError::Domain(e),
            LedgerError::ProductNotFound(product_id) => {
                ApplicationError::NotFound(format!("商品が見つかりません: {}", product_id))
            }
            LedgerError::Repository(e) => ApplicationError::Repository(e),
        }
    }
}

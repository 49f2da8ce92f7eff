use crate::domain::port::RepositoryError;
use sqlx::mysql::MySqlDatabaseError;
use thiserror::Error;

/// MySQLのエラー番号
const ER_ROW_IS_REFERENCED_2: u16 = 1451;
const ER_WARN_DATA_OUT_OF_RANGE: u16 = 1264;
const ER_DATA_OUT_OF_RANGE: u16 = 1690;
const ER_CHECK_CONSTRAINT_VIOLATED: u16 = 3819;

/// データベースエラー型
/// データベース操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    /// データベース接続エラー
    #[error("Database connection error: {0}")]
    ConnectionError(String),
    /// SQLクエリエラー
    #[error("Database query error: {0}")]
    QueryError(String),
    /// CHECK制約・値域違反
    #[error("Check constraint violated: {0}")]
    CheckViolation(String),
    /// 参照されている親行の削除
    #[error("Row is still referenced: {0}")]
    StillReferenced(String),
    /// マイグレーションエラー
    #[error("Migration error: {0}")]
    MigrationError(String),
}

/// 制約違反の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintKind {
    Check,
    Referenced,
}

impl ConstraintKind {
    fn into_error(self, message: String) -> DatabaseError {
        match self {
            ConstraintKind::Check => DatabaseError::CheckViolation(message),
            ConstraintKind::Referenced => DatabaseError::StillReferenced(message),
        }
    }
}

/// MySQLのエラー番号から制約違反の種類を判定する
fn constraint_kind(number: u16) -> Option<ConstraintKind> {
    match number {
        ER_CHECK_CONSTRAINT_VIOLATED | ER_DATA_OUT_OF_RANGE | ER_WARN_DATA_OUT_OF_RANGE => {
            Some(ConstraintKind::Check)
        }
        ER_ROW_IS_REFERENCED_2 => Some(ConstraintKind::Referenced),
        _ => None,
    }
}

impl DatabaseError {
    /// sqlxのエラーを分類する
    ///
    /// # Arguments
    /// * `err` - sqlxのエラー
    /// * `context` - 失敗した操作の説明（エラーメッセージに含める）
    pub fn from_sqlx(err: sqlx::Error, context: &str) -> Self {
        let message = format!("{}: {}", context, err);
        match &err {
            sqlx::Error::Database(db_err) => {
                let kind = db_err
                    .try_downcast_ref::<MySqlDatabaseError>()
                    .and_then(|mysql_err| constraint_kind(mysql_err.number()));
                match kind {
                    Some(kind) => kind.into_error(message),
                    None if db_err.is_check_violation() => DatabaseError::CheckViolation(message),
                    None => DatabaseError::QueryError(message),
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => DatabaseError::ConnectionError(message),
            _ => DatabaseError::QueryError(message),
        }
    }
}

/// DatabaseErrorからRepositoryErrorへの変換
/// 在庫の制約違反は対象商品を知る呼び出し側で `StockConstraintViolation` に変換する
impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionError(msg) => RepositoryError::ConnectionFailed(msg),
            DatabaseError::StillReferenced(msg) => RepositoryError::StillReferenced(msg),
            DatabaseError::QueryError(msg)
            | DatabaseError::CheckViolation(msg)
            | DatabaseError::MigrationError(msg) => RepositoryError::OperationFailed(msg),
        }
    }
}

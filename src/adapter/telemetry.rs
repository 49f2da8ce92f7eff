use crate::adapter::database_config::LogFormat;
use tracing_subscriber::{prelude::*, EnvFilter};

/// `RUST_LOG` が未設定の場合のフィルタ
pub const DEFAULT_FILTER: &str = "shop_inventory=info,tower_http=info";

/// ログ出力を初期化する
///
/// 既に初期化済みの場合（テストなど）は何もしない。
pub fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(filter)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(filter)
            .try_init(),
    };

    if result.is_ok() {
        tracing::info!(?format, "tracing initialized");
    }
}

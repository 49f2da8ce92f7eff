use shop_inventory::adapter::driven::{
    MySqlCatalogRepository, MySqlOrderRepository, MySqlUnitOfWorkFactory,
};
use shop_inventory::adapter::driver::{create_router, AppState};
use shop_inventory::adapter::telemetry::init_tracing;
use shop_inventory::adapter::{AppConfig, DatabaseMigration};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.server.log_format);
    tracing::info!(
        host = %config.database.host,
        port = config.database.port,
        database = %config.database.database,
        "configuration loaded"
    );

    // 接続プールを作成
    let pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.connection_string())
        .await?;

    DatabaseMigration::new(pool.clone()).run().await?;

    let app_state = AppState::new(
        Arc::new(MySqlUnitOfWorkFactory::new(pool.clone())),
        Arc::new(MySqlCatalogRepository::new(pool.clone())),
        Arc::new(MySqlOrderRepository::new(pool)),
    );

    let app = create_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, "REST API server started");

    axum::serve(listener, app).await?;

    Ok(())
}

pub mod database_config;
pub mod database_error;
pub mod database_migration;
pub mod driven;
pub mod driver;
pub mod telemetry;

pub use database_config::{AppConfig, ConfigError, DatabaseConfig, LogFormat, ServerConfig};
pub use database_migration::DatabaseMigration;

// 駆動される側アダプター（リポジトリ・作業単位の実装）

mod catalog_repository;
mod in_memory_store;
mod mysql_rows;
mod mysql_unit_of_work;
mod order_repository;

pub use catalog_repository::MySqlCatalogRepository;
pub use in_memory_store::InMemoryStore;
pub use mysql_unit_of_work::{MySqlUnitOfWork, MySqlUnitOfWorkFactory};
pub use order_repository::MySqlOrderRepository;

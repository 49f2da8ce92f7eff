// ドメインモデル（エンティティと値オブジェクト）

mod availability;
mod order;
mod product;
mod value_objects;

pub use availability::availability;

pub use value_objects::{
    Caller,
    CategoryId, OrderId, OrderItemId, ProductId, UserId,
    Price,
    Quantity, MAX_STOCK,
    UserRole,
};

pub use order::{CheckoutOutcome, Order, OrderItem};
pub use product::{Category, Product};

// 駆動する側アダプター（REST API）

pub mod caller;
pub mod json_body;
pub mod request_dto;
pub mod response_dto;
pub mod rest_api;

pub use caller::AuthenticatedCaller;
pub use json_body::JsonBody;
pub use rest_api::{create_router, AppState};

// ドメイン層
// ビジネスルールと、外部に依存する機能のポートを定義する

pub mod error;
pub mod model;
pub mod port;
pub mod service;

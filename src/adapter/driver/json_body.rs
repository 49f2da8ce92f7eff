// リクエストボディのJSONエクストラクタ
// 解析できないボディも他のエラーと同じ形式（ApiError）で400として返す

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;

use crate::adapter::driver::rest_api::ApiError;

/// JSONボディを取り出すエクストラクタ
///
/// 型が合わない値（数量に `1.5` や `"x"` など）や壊れたJSONは
/// `INVALID_REQUEST_BODY` の400になる。Content-Typeが無い場合のみ415のまま返す。
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

fn rejection_to_api_error(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    let status = match &rejection {
        JsonRejection::MissingJsonContentType(_) => rejection.status(),
        _ => StatusCode::BAD_REQUEST,
    };
    tracing::debug!(error = %rejection.body_text(), "request body rejected");
    (
        status,
        Json(ApiError {
            error: rejection.body_text(),
            code: "INVALID_REQUEST_BODY".to_string(),
        }),
    )
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_api_error)?;
        Ok(JsonBody(value))
    }
}

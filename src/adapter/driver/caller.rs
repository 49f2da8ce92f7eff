// 呼び出し元の識別
// 認証は上流のゲートウェイが行い、検証済みの識別情報をヘッダーで受け取る

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};

use crate::adapter::driver::rest_api::ApiError;
use crate::domain::model::{Caller, UserId, UserRole};

/// ユーザーIDのヘッダー名
pub const USER_ID_HEADER: &str = "x-user-id";
/// ロールのヘッダー名（省略時は customer）
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// 認証済みの呼び出し元を取り出すエクストラクタ
///
/// 識別情報が無い、または不正な場合は401を返す。
/// 匿名アクセスを許すハンドラーでは `Option<AuthenticatedCaller>` として使う。
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedCaller(pub Caller);

fn unauthorized(message: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiError {
            error: message.to_string(),
            code: "UNAUTHORIZED".to_string(),
        }),
    )
}

/// ヘッダーから呼び出し元を組み立てる
fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, (StatusCode, Json<ApiError>)> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| unauthorized("Authentication credentials were not provided."))?;
    let user_id =
        UserId::from_string(user_id).map_err(|_| unauthorized("Invalid user identifier."))?;

    let role = match headers.get(USER_ROLE_HEADER) {
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|role| UserRole::from_string(role).ok())
            .ok_or_else(|| unauthorized("Invalid user role."))?,
        None => UserRole::Customer,
    };

    Ok(Caller::new(user_id, role))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedCaller
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers).map(AuthenticatedCaller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(user_id: Option<&str>, role: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(user_id) = user_id {
            headers.insert(USER_ID_HEADER, HeaderValue::from_str(user_id).unwrap());
        }
        if let Some(role) = role {
            headers.insert(USER_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        }
        headers
    }

    #[test]
    fn test_admin_caller() {
        let user_id = UserId::new();
        let caller =
            caller_from_headers(&headers(Some(&user_id.to_string()), Some("admin"))).unwrap();

        assert_eq!(caller.user_id(), user_id);
        assert!(caller.is_admin());
    }

    #[test]
    fn test_role_defaults_to_customer() {
        let user_id = UserId::new();
        let caller = caller_from_headers(&headers(Some(&user_id.to_string()), None)).unwrap();

        assert_eq!(caller.role(), UserRole::Customer);
    }

    #[test]
    fn test_missing_or_invalid_identity_is_unauthorized() {
        let (status, Json(error)) = caller_from_headers(&headers(None, None)).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error.code, "UNAUTHORIZED");

        let (status, _) = caller_from_headers(&headers(Some("bob"), None)).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let user_id = UserId::new().to_string();
        let (status, _) =
            caller_from_headers(&headers(Some(&user_id), Some("superuser"))).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

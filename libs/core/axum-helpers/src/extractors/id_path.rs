//! Integer path parameter extractor.

use crate::errors::{AppError, ErrorCode};
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};

/// Extractor for a single integer path parameter such as `/users/{id}`.
///
/// Anything that does not parse as an `i64` (including `12abc`, `1.5` and
/// the empty string) is rejected with `400 INVALID_ID`.
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use axum::routing::get;
/// use axum_helpers::extractors::IdPath;
///
/// async fn get_user(IdPath(id): IdPath) -> String {
///     format!("User ID: {}", id)
/// }
///
/// let app = Router::new().route("/users/{id}", get(get_user));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPath(pub i64);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected undecodable id");
                invalid_id()
            })?;

        raw.parse::<i64>().map(IdPath).map_err(|_| {
            tracing::debug!(raw_id = %raw, "Rejected non-numeric id");
            invalid_id()
        })
    }
}

fn invalid_id() -> Response {
    AppError::InvalidId(ErrorCode::InvalidId.default_message().to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().route(
            "/users/{id}",
            get(|IdPath(id): IdPath| async move { id.to_string() }),
        )
    }

    async fn call(uri: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_parses_integer() {
        assert_eq!(call("/users/42").await, (StatusCode::OK, "42".to_string()));
        assert_eq!(call("/users/-7").await, (StatusCode::OK, "-7".to_string()));
    }

    #[tokio::test]
    async fn test_rejects_non_numeric() {
        for uri in ["/users/abc", "/users/12abc", "/users/1.5", "/users/%FF"] {
            let (status, body) = call(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            let json: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(json["error"], "INVALID_ID");
            assert_eq!(json["message"], "Invalid id, must be a number");
        }
    }

    #[tokio::test]
    async fn test_rejects_overflow() {
        let (status, _) = call("/users/99999999999999999999").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

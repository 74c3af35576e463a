//! API routes module
//!
//! Assembles the users API, health/readiness endpoints and the browser client.

pub mod health;
pub mod ui;
pub mod users;

use axum::Router;
use axum_helpers::server::health_router;
use std::io;

use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes(state: &AppState) -> Router {
    Router::new().nest("/users", users::router(state))
}

/// Full application router: API with docs, `/health`, `/ready` and `/`
pub async fn app(state: &AppState) -> io::Result<Router> {
    let router = axum_helpers::create_router::<ApiDoc>(routes(state)).await?;

    Ok(router
        .merge(health_router(state.config.app))
        .merge(health::router(state.clone()))
        .merge(ui::router()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Environment};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use core_config::{app_info, server::ServerConfig};
    use database::mongodb::MongoConfig;
    use http_body_util::BodyExt;
    use mongodb::Client;
    use serde_json::Value;
    use tower::ServiceExt;

    // Nothing listens on port 1; the short timeout keeps /ready fast.
    const UNREACHABLE: &str = "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200&connectTimeoutMS=200";

    async fn test_app() -> Router {
        let config = Config {
            app: app_info!(),
            mongodb: MongoConfig::new(UNREACHABLE),
            server: ServerConfig::default(),
            environment: Environment::Development,
            collection: "users".to_string(),
        };
        // Client construction is lazy and does not contact the server
        let mongo_client = Client::with_uri_str(UNREACHABLE).await.unwrap();
        let state = AppState {
            db: mongo_client.database("users_test"),
            mongo_client,
            config,
        };

        app(&state).await.unwrap()
    }

    async fn body_bytes(body: Body) -> Vec<u8> {
        body.collect().await.unwrap().to_bytes().to_vec()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_index_serves_client_page() {
        let response = test_app().await.oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));

        let html = String::from_utf8(body_bytes(response.into_body()).await).unwrap();
        assert!(html.contains("\"/api/users\""));
        assert!(html.contains("\"/api/users/add\""));
        assert!(html.contains("\"/api/users/delete/\""));
    }

    #[tokio::test]
    async fn test_health_reports_app_info() {
        let response = test_app().await.oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response.into_body()).await).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["name"], "users_api");
    }

    #[tokio::test]
    async fn test_ready_without_mongodb_is_unavailable() {
        let response = test_app().await.oneshot(get("/ready")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = serde_json::from_slice(&body_bytes(response.into_body()).await).unwrap();
        assert_eq!(body["mongodb"], "disconnected");
    }

    #[tokio::test]
    async fn test_invalid_id_rejected_before_storage() {
        let response = test_app().await.oneshot(get("/api/users/abc")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body_bytes(response.into_body()).await).unwrap();
        assert_eq!(body["message"], "Invalid id, must be a number");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let response = test_app().await.oneshot(get("/nope")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_slice(&body_bytes(response.into_body()).await).unwrap();
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_openapi_lists_user_routes() {
        let response = test_app()
            .await
            .oneshot(get("/api-docs/openapi.json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response.into_body()).await).unwrap();
        assert!(body["paths"]["/api/users/add"].is_object());
        assert!(body["paths"]["/api/users/delete/{id}"].is_object());
    }
}

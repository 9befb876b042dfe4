//! API Routes
//!
//! Configures the Axum router with all verification endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, send_code_handler, verify_code_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /api/auth/send-code` - Email a new verification code
/// - `POST /api/auth/verify-code` - Check a verification code
/// - `GET /api/health` - Health check with cache diagnostics
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/send-code", post(send_code_handler))
        .route("/api/auth/verify-code", post(verify_code_handler))
        .route("/api/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlStore;
    use crate::config::{Environment, VerifyCodeConfig};
    use crate::delivery::LogMailer;
    use crate::relay::BroadcastRelay;
    use crate::verification::VerificationService;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let service = VerificationService::new(
            TtlStore::shared(),
            Arc::new(BroadcastRelay::new(8)),
            VerifyCodeConfig::default(),
            Environment::Test,
        );
        create_router(AppState::new(service, Arc::new(LogMailer::new())))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_send_code_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/send-code")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":"a@b.io"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_verify_code_not_found() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/verify-code")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":"a@b.io","code":"123456"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/get/anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

//! API Handlers
//!
//! HTTP request handlers for the verification endpoints.

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::info;

use crate::delivery::CodeMailer;
use crate::error::{AppError, Result};
use crate::models::{
    ApiResponse, HealthData, SendCodeData, SendCodeRequest, VerifyCodeData, VerifyCodeRequest,
};
use crate::verification::{mask_email, VerificationService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub verification: VerificationService,
    pub mailer: Arc<dyn CodeMailer>,
}

impl AppState {
    pub fn new(verification: VerificationService, mailer: Arc<dyn CodeMailer>) -> Self {
        Self {
            verification,
            mailer,
        }
    }
}

/// Handler for POST /api/auth/send-code
///
/// Refuses with 429 inside the send interval. The code is stored only after
/// the mail went out, so a failed delivery leaves no half-issued code behind.
pub async fn send_code_handler(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> Result<Json<ApiResponse<SendCodeData>>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }
    let email = req.normalized_email();
    let service = &state.verification;

    let check = service.check_send_interval(&email).await;
    if !check.can_send {
        let remaining_secs = check.remaining_secs.unwrap_or(1);
        return Err(AppError::RateLimited {
            message: check.message.unwrap_or_else(|| {
                format!("Please wait {} seconds before retrying", remaining_secs)
            }),
            remaining_secs,
        });
    }

    let code = service.generate_code();
    let expires_in = service.config().expire_time();

    let message_id = state
        .mailer
        .send_verification_code(&email, &code, expires_in)
        .await?;

    service.set_code(&email, &code).await;
    service.record_send_time(&email).await;

    info!(
        email = %mask_email(&email),
        provider = state.mailer.provider_name(),
        message_id = %message_id,
        "Verification code sent"
    );

    Ok(Json(ApiResponse::ok(
        SendCodeData {
            email,
            expires_in: expires_in.as_secs(),
        },
        "Verification code sent",
    )))
}

/// Handler for POST /api/auth/verify-code
pub async fn verify_code_handler(
    State(state): State<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<ApiResponse<VerifyCodeData>>> {
    let service = &state.verification;

    if let Some(error_msg) = req.validate(service.config().length) {
        return Err(AppError::InvalidRequest(error_msg));
    }
    let email = req.normalized_email();

    let outcome = service.verify(&email, req.normalized_code()).await;
    if !outcome.success {
        return Err(AppError::VerificationFailed(outcome.message));
    }

    Ok(Json(ApiResponse::ok(
        VerifyCodeData {
            email,
            verified: true,
        },
        outcome.message,
    )))
}

/// Handler for GET /api/health
///
/// Reports service status along with store size and keys.
pub async fn health_handler(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    let cache = state.verification.stats().await;

    Json(ApiResponse::ok(
        HealthData {
            status: "OK".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_secs: cache.uptime_secs,
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: state.verification.environment().to_string(),
            cache,
        },
        "Service is healthy",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlStore;
    use crate::config::{Environment, VerifyCodeConfig};
    use crate::delivery::LogMailer;
    use crate::relay::BroadcastRelay;

    /// State on a relay with no other workers; writes stay local.
    fn test_state(mailer: LogMailer) -> AppState {
        let config = VerifyCodeConfig {
            bypass_code: None,
            ..VerifyCodeConfig::default()
        };
        let service = VerificationService::new(
            TtlStore::shared(),
            Arc::new(BroadcastRelay::new(8)),
            config,
            Environment::Test,
        );
        AppState::new(service, Arc::new(mailer))
    }

    fn send_request(email: &str) -> Json<SendCodeRequest> {
        Json(SendCodeRequest {
            email: email.to_string(),
        })
    }

    #[tokio::test]
    async fn test_send_then_verify() {
        let mailer = LogMailer::new();
        let state = test_state(mailer.clone());

        let response = send_code_handler(State(state.clone()), send_request("a@b.io"))
            .await
            .unwrap();
        assert_eq!(response.data.as_ref().unwrap().expires_in, 300);

        let code = mailer.last_code("a@b.io").unwrap();
        let req = VerifyCodeRequest {
            email: "a@b.io".to_string(),
            code,
        };
        let response = verify_code_handler(State(state), Json(req)).await.unwrap();
        assert!(response.data.as_ref().unwrap().verified);
    }

    #[tokio::test]
    async fn test_send_twice_is_rate_limited() {
        let state = test_state(LogMailer::new());

        send_code_handler(State(state.clone()), send_request("a@b.io"))
            .await
            .unwrap();
        let result = send_code_handler(State(state), send_request("A@B.io")).await;

        match result {
            Err(AppError::RateLimited { remaining_secs, .. }) => assert!(remaining_secs > 0),
            other => panic!("expected rate limit, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_delivery_failure_stores_nothing() {
        let mailer = LogMailer::new();
        mailer.set_simulate_failure(true);
        let state = test_state(mailer);

        let result = send_code_handler(State(state.clone()), send_request("a@b.io")).await;
        assert!(matches!(result, Err(AppError::Delivery(_))));

        assert!(state.verification.get_code("a@b.io").await.is_none());
        assert!(state.verification.check_send_interval("a@b.io").await.can_send);
    }

    #[tokio::test]
    async fn test_send_invalid_email() {
        let state = test_state(LogMailer::new());

        let result = send_code_handler(State(state), send_request("nope")).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_verify_without_code() {
        let state = test_state(LogMailer::new());

        let req = VerifyCodeRequest {
            email: "a@b.io".to_string(),
            code: "123456".to_string(),
        };
        let result = verify_code_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(AppError::VerificationFailed(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let state = test_state(LogMailer::new());

        let response = health_handler(State(state)).await;
        let data = response.data.as_ref().unwrap();
        assert_eq!(data.status, "OK");
        assert_eq!(data.environment, "test");
        assert_eq!(data.cache.size, 0);
        assert_eq!(data.uptime_secs, data.cache.uptime_secs);
    }
}

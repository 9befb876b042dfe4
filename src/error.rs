//! Error types for the verification cache service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ApiResponse;

// == App Error Enum ==
/// Unified error type for the verification cache service.
///
/// Policy outcomes (wrong code, expired code, rate limit) are normally carried
/// as values by the verification module; the HTTP layer lifts them into this
/// type only when building a response.
#[derive(Error, Debug)]
pub enum AppError {
    /// Required configuration is missing or invalid. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The relay could not deliver a mutation event
    #[error("Relay unavailable: {0}")]
    RelayUnavailable(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A code was requested before the send interval elapsed
    #[error("{message}")]
    RateLimited {
        message: String,
        remaining_secs: u64,
    },

    /// Verification code rejected
    #[error("{0}")]
    VerificationFailed(String),

    /// Mail delivery failed
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) | AppError::VerificationFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Configuration(_)
            | AppError::RelayUnavailable(_)
            | AppError::Delivery(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the end user. Faults collapse to a generic message.
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidRequest(msg) => format!("Invalid request: {}", msg),
            AppError::RateLimited { message, .. } => message.clone(),
            AppError::VerificationFailed(msg) => msg.clone(),
            AppError::Delivery(_) => "Failed to send email, please try again later".to_string(),
            AppError::Configuration(_) | AppError::RelayUnavailable(_) | AppError::Internal(_) => {
                "System error, please try again later".to_string()
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let data = match &self {
            AppError::RateLimited { remaining_secs, .. } => {
                Some(serde_json::json!({ "remaining_time": remaining_secs }))
            }
            _ => None,
        };

        let body = Json(ApiResponse::fail(status, self.public_message(), data));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the service.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (AppError::InvalidRequest("bad".to_string()), StatusCode::BAD_REQUEST),
            (
                AppError::RateLimited {
                    message: "wait".to_string(),
                    remaining_secs: 10,
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (AppError::VerificationFailed("nope".to_string()), StatusCode::BAD_REQUEST),
            (AppError::Delivery("smtp".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Configuration("cfg".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Internal("error".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected_status) in test_cases {
            let response = error.into_response();
            assert_eq!(response.status(), expected_status);
        }
    }

    #[test]
    fn test_faults_hide_details() {
        let err = AppError::Internal("lock poisoned at store.rs".to_string());
        assert!(!err.public_message().contains("store.rs"));

        let err = AppError::Delivery("smtp 550".to_string());
        assert!(!err.public_message().contains("550"));
    }

    #[test]
    fn test_rate_limited_message_passthrough() {
        let err = AppError::RateLimited {
            message: "Please wait 42 seconds before retrying".to_string(),
            remaining_secs: 42,
        };
        assert_eq!(err.public_message(), "Please wait 42 seconds before retrying");
        assert_eq!(err.to_string(), "Please wait 42 seconds before retrying");
    }
}

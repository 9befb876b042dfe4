//! Response DTOs for the verification API
//!
//! Every endpoint answers with the same envelope:
//! `{ success, code, message, data, timestamp }`.

use axum::http::StatusCode;
use serde::Serialize;

use crate::verification::CacheSnapshot;

/// Response envelope shared by all endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    /// HTTP status code, repeated for clients that only see the body
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: StatusCode::OK.as_u16(),
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn fail(
        status: StatusCode,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            success: false,
            code: status.as_u16(),
            message: message.into(),
            data,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Data returned by POST /api/auth/send-code
#[derive(Debug, Clone, Serialize)]
pub struct SendCodeData {
    pub email: String,
    /// Code lifetime in seconds
    pub expires_in: u64,
}

/// Data returned by POST /api/auth/verify-code
#[derive(Debug, Clone, Serialize)]
pub struct VerifyCodeData {
    pub email: String,
    pub verified: bool,
}

/// Data returned by GET /api/health
#[derive(Debug, Clone, Serialize)]
pub struct HealthData {
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub uptime_secs: u64,
    pub version: String,
    pub environment: String,
    pub cache: CacheSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope() {
        let resp = ApiResponse::ok(
            SendCodeData {
                email: "a@b.io".to_string(),
                expires_in: 300,
            },
            "Verification code sent",
        );
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["code"], 200);
        assert_eq!(json["data"]["expires_in"], 300);
        assert!(json["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_fail_envelope() {
        let resp = ApiResponse::fail(StatusCode::TOO_MANY_REQUESTS, "slow down", None);
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["code"], 429);
        assert_eq!(json["message"], "slow down");
        assert!(json["data"].is_null());
    }
}

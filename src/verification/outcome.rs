//! Results returned by the verification policy.

use serde::Serialize;

// == Verify Status ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyStatus {
    /// Code matched; code and attempt counter are gone
    Verified,
    /// The configured bypass code was accepted
    Bypassed,
    /// No live code for this email
    NotFound,
    /// Attempt limit exceeded; code and attempt counter are gone
    TooManyAttempts,
    /// Wrong code; the stored code survives
    Mismatch { remaining: u32 },
}

impl VerifyStatus {
    pub fn is_success(self) -> bool {
        matches!(self, VerifyStatus::Verified | VerifyStatus::Bypassed)
    }

    pub fn message(self) -> String {
        match self {
            VerifyStatus::Verified => "Verification code verified".to_string(),
            VerifyStatus::Bypassed => "Test verification code accepted".to_string(),
            VerifyStatus::NotFound => "Verification code not found or expired".to_string(),
            VerifyStatus::TooManyAttempts => {
                "Too many attempts, please request a new code".to_string()
            }
            VerifyStatus::Mismatch { remaining } => format!(
                "Incorrect verification code, {} attempts remaining",
                remaining
            ),
        }
    }
}

// == Verify Outcome ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyOutcome {
    #[serde(flatten)]
    pub status: VerifyStatus,
    pub success: bool,
    pub message: String,
}

impl From<VerifyStatus> for VerifyOutcome {
    fn from(status: VerifyStatus) -> Self {
        Self {
            status,
            success: status.is_success(),
            message: status.message(),
        }
    }
}

// == Send Interval Check ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendIntervalCheck {
    pub can_send: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SendIntervalCheck {
    pub fn allowed() -> Self {
        Self {
            can_send: true,
            remaining_secs: None,
            message: None,
        }
    }

    pub fn wait(remaining_secs: u64) -> Self {
        Self {
            can_send: false,
            remaining_secs: Some(remaining_secs),
            message: Some(format!(
                "Please wait {} seconds before requesting another code",
                remaining_secs
            )),
        }
    }
}

// == Cache Snapshot ==
/// Store diagnostics reported by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    pub initialized: bool,
    pub relay: &'static str,
    pub size: usize,
    pub keys: Vec<String>,
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub hit_rate: f64,
    /// RFC 3339 time the snapshot was taken
    pub timestamp: String,
    pub uptime_secs: u64,
}

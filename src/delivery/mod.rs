//! Delivery Module
//!
//! Outbound channel for verification codes.

mod log_mailer;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use log_mailer::LogMailer;

/// Sends verification codes to users.
///
/// Implementations wrap a concrete provider (SMTP relay, transactional mail
/// API); [`LogMailer`] writes to the log instead.
#[async_trait]
pub trait CodeMailer: Send + Sync {
    /// Sends a message and returns the provider's message id.
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<String>;

    /// Sends a verification code using the standard message template.
    async fn send_verification_code(
        &self,
        email: &str,
        code: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let body = verification_body(code, expires_in);
        let id = self.send_mail(email, VERIFICATION_SUBJECT, &body).await?;
        self.code_delivered(email, code);
        Ok(id)
    }

    /// Called after a verification code went out. No-op by default.
    fn code_delivered(&self, _email: &str, _code: &str) {}

    /// Provider name for logs.
    fn provider_name(&self) -> &str;
}

pub const VERIFICATION_SUBJECT: &str = "Your login verification code";

pub fn verification_body(code: &str, expires_in: Duration) -> String {
    let minutes = expires_in.as_secs().div_ceil(60).max(1);
    format!(
        "Your verification code is {}. It expires in {} minute{}. \
         If you did not request this code, you can ignore this email.",
        code,
        minutes,
        if minutes == 1 { "" } else { "s" }
    )
}

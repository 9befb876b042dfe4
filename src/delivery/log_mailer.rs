//! Log-only mailer for development and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{info, warn};

use super::CodeMailer;
use crate::error::{AppError, Result};
use crate::verification::mask_email;

/// Mailer that writes messages to the log instead of sending them.
///
/// Keeps the last code sent to each address so tests can complete a login.
#[derive(Clone, Default)]
pub struct LogMailer {
    message_count: Arc<AtomicU64>,
    simulate_failure: Arc<AtomicBool>,
    last_codes: Arc<Mutex<HashMap<String, String>>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    /// Makes every following send fail (or succeed again).
    pub fn set_simulate_failure(&self, simulate: bool) {
        self.simulate_failure.store(simulate, Ordering::SeqCst);
    }

    /// Last code sent to `email`.
    pub fn last_code(&self, email: &str) -> Option<String> {
        self.last_codes
            .lock()
            .ok()
            .and_then(|codes| codes.get(email).cloned())
    }
}

#[async_trait]
impl CodeMailer for LogMailer {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<String> {
        if self.simulate_failure.load(Ordering::SeqCst) {
            warn!(to = %mask_email(to), "Simulated mail delivery failure");
            return Err(AppError::Delivery("simulated failure".to_string()));
        }

        let id = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            to = %mask_email(to),
            subject = %subject,
            body = %body,
            message_id = id,
            "Mail logged instead of sent"
        );

        Ok(format!("log-{}", id))
    }

    fn code_delivered(&self, email: &str, code: &str) {
        if let Ok(mut codes) = self.last_codes.lock() {
            codes.insert(email.to_string(), code.to_string());
        }
    }

    fn provider_name(&self) -> &str {
        "log"
    }
}

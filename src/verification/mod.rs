//! Verification Module
//!
//! Email one-time-code policy: generation, send-rate limiting, attempt
//! limiting and expiry, layered on the TTL store and the relay.

mod code;
mod outcome;
mod service;

pub use code::{code_key, generate_code, mask_email, send_interval_key, try_count_key};
pub use outcome::{CacheSnapshot, SendIntervalCheck, VerifyOutcome, VerifyStatus};
pub use service::VerificationService;

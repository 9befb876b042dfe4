//! Verify Cache - email verification codes over a relayed in-memory cache
//!
//! Each worker process keeps its own TTL store; a relay broadcasts every
//! mutation so all workers converge on the same codes, send times and
//! attempt counters.

pub mod api;
pub mod cache;
pub mod config;
pub mod delivery;
pub mod error;
pub mod models;
pub mod relay;
pub mod tasks;
pub mod verification;

pub use api::AppState;
pub use config::Config;
pub use error::{AppError, Result};
pub use tasks::{spawn_cleanup_task, spawn_relay_sync_task};
pub use verification::VerificationService;

//! Background Tasks Module
//!
//! # Tasks
//! - Relay sync: applies relay events to the local store
//! - TTL Cleanup: removes expired entries at a configured interval

mod cleanup;
mod relay_sync;

pub use cleanup::spawn_cleanup_task;
pub use relay_sync::spawn_relay_sync_task;

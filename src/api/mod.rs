//! API Module
//!
//! HTTP handlers and routing for the verification flow.
//!
//! # Endpoints
//! - `POST /api/auth/send-code` - Email a new verification code
//! - `POST /api/auth/verify-code` - Check a verification code
//! - `GET /api/health` - Health check with cache diagnostics

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

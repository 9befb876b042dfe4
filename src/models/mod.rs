//! Request and Response models for the verification API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{normalize_email, SendCodeRequest, VerifyCodeRequest};
pub use responses::{ApiResponse, HealthData, SendCodeData, VerifyCodeData};

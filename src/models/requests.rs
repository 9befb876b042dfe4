//! Request DTOs for the verification API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Longest accepted email address
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Request body for POST /api/auth/send-code
#[derive(Debug, Clone, Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
}

impl SendCodeRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_email(&self.email)
    }

    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }
}

/// Request body for POST /api/auth/verify-code
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

impl VerifyCodeRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self, code_length: usize) -> Option<String> {
        if let Some(msg) = validate_email(&self.email) {
            return Some(msg);
        }
        let code = self.code.trim();
        if code.len() != code_length || !code.chars().all(|c| c.is_ascii_digit()) {
            return Some(format!("Code must be {} digits", code_length));
        }
        None
    }

    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }

    pub fn normalized_code(&self) -> &str {
        self.code.trim()
    }
}

/// Lowercases and trims so rate limits cannot be dodged by changing case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn validate_email(email: &str) -> Option<String> {
    let email = email.trim();
    if email.is_empty() {
        return Some("Email cannot be empty".to_string());
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Some(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LENGTH
        ));
    }
    if !is_valid_email(email) {
        return Some("Email format is invalid".to_string());
    }
    None
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

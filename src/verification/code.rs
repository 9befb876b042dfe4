//! Code generation and cache key layout.

use rand::Rng;

const CODE_PREFIX: &str = "verify_code";
const SEND_INTERVAL_PREFIX: &str = "send_interval";
const TRY_COUNT_PREFIX: &str = "try_count";

/// Generates a numeric code of `length` digits, each uniform in 0-9.
///
/// Not suitable for secrets: the codes are short-lived and rate limited.
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

pub fn code_key(email: &str) -> String {
    format!("{}:{}", CODE_PREFIX, email)
}

pub fn send_interval_key(email: &str) -> String {
    format!("{}:{}", SEND_INTERVAL_PREFIX, email)
}

pub fn try_count_key(email: &str) -> String {
    format!("{}:{}", TRY_COUNT_PREFIX, email)
}

/// Masks the local part of an email for logging: `alice@x.io` -> `al***@x.io`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{}***@{}", visible, domain)
        }
        None => "***".to_string(),
    }
}

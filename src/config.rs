//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Longest code the generator will produce.
pub const MAX_CODE_LENGTH: usize = 12;

// == Environment ==
/// Deployment environment. Only `Production` disables the bypass code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "test" | "unittest" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(AppError::Configuration(format!("unknown environment '{}'", other))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Verification Code Config ==
#[derive(Debug, Clone)]
pub struct VerifyCodeConfig {
    /// Number of digits in a generated code
    pub length: usize,
    /// Lifetime of a stored code and its attempt counter, in milliseconds
    pub expire_time_ms: u64,
    /// Minimum gap between two sends to the same email, in milliseconds
    pub send_interval_ms: u64,
    /// Wrong attempts allowed per code
    pub max_tries: u32,
    /// Code accepted unconditionally outside production
    pub bypass_code: Option<String>,
}

impl VerifyCodeConfig {
    pub fn expire_time(&self) -> Duration {
        Duration::from_millis(self.expire_time_ms)
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }
}

impl Default for VerifyCodeConfig {
    fn default() -> Self {
        Self {
            length: 6,
            expire_time_ms: 5 * 60 * 1000,
            send_interval_ms: 60 * 1000,
            max_tries: 5,
            bypass_code: Some("000000".to_string()),
        }
    }
}

// == Relay Config ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayMode {
    /// Single OS process; workers share a tokio broadcast channel
    #[default]
    Broadcast,
    /// Separate processes exchanging UDP datagrams
    Udp,
}

impl FromStr for RelayMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "broadcast" | "local" => Ok(RelayMode::Broadcast),
            "udp" => Ok(RelayMode::Udp),
            other => Err(AppError::Configuration(format!("unknown relay mode '{}'", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub mode: RelayMode,
    /// Local UDP address (udp mode only)
    pub bind_addr: SocketAddr,
    /// Peer worker addresses (udp mode only)
    pub peers: Vec<SocketAddr>,
    /// Buffered events per subscriber before it lags
    pub channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mode: RelayMode::Broadcast,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 39011)),
            peers: Vec::new(),
            channel_capacity: 1024,
        }
    }
}

// == Service Config ==
/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// HTTP server port
    pub server_port: u16,
    /// Expired-entry sweep interval in seconds, 0 disables the sweep
    pub cleanup_interval: u64,
    pub verify_code: VerifyCodeConfig,
    pub relay: RelayConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Numeric values that fail to parse fall back to their defaults. Values
    /// with no sensible fallback (environment, relay mode, peer list) are
    /// reported as configuration errors.
    ///
    /// # Environment Variables
    /// - `APP_ENV` - development | test | production (default: development)
    /// - `SERVER_PORT` - HTTP server port (default: 39010)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `VERIFY_CODE_LENGTH` - Code digits (default: 6)
    /// - `VERIFY_CODE_EXPIRE_MS` - Code lifetime (default: 300000)
    /// - `VERIFY_CODE_SEND_INTERVAL_MS` - Resend gap (default: 60000)
    /// - `VERIFY_CODE_MAX_TRIES` - Attempts per code (default: 5)
    /// - `VERIFY_CODE_BYPASS` - Bypass code, empty disables (default: all zeros)
    /// - `RELAY_MODE` - broadcast | udp (default: broadcast)
    /// - `RELAY_BIND_ADDR` - UDP bind address (default: 127.0.0.1:39011)
    /// - `RELAY_PEERS` - Comma separated peer addresses
    /// - `RELAY_CHANNEL_CAPACITY` - Subscriber buffer (default: 1024)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let environment = match env::var("APP_ENV") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.environment,
        };

        let length = parse_or("VERIFY_CODE_LENGTH", defaults.verify_code.length);

        // Unset means all zeros at the configured length
        let bypass_code = match env::var("VERIFY_CODE_BYPASS") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(value.trim().to_string()),
            Err(_) => Some("0".repeat(length)),
        };

        let verify_code = VerifyCodeConfig {
            length,
            expire_time_ms: parse_or("VERIFY_CODE_EXPIRE_MS", defaults.verify_code.expire_time_ms),
            send_interval_ms: parse_or(
                "VERIFY_CODE_SEND_INTERVAL_MS",
                defaults.verify_code.send_interval_ms,
            ),
            max_tries: parse_or("VERIFY_CODE_MAX_TRIES", defaults.verify_code.max_tries),
            bypass_code,
        };

        let relay = RelayConfig {
            mode: match env::var("RELAY_MODE") {
                Ok(value) => value.parse()?,
                Err(_) => defaults.relay.mode,
            },
            bind_addr: parse_or("RELAY_BIND_ADDR", defaults.relay.bind_addr),
            peers: match env::var("RELAY_PEERS") {
                Ok(value) => parse_peers(&value)?,
                Err(_) => Vec::new(),
            },
            channel_capacity: parse_or("RELAY_CHANNEL_CAPACITY", defaults.relay.channel_capacity),
        };

        let config = Self {
            environment,
            server_port: parse_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: parse_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            verify_code,
            relay,
        }
        .normalized();

        config.validate()?;
        Ok(config)
    }

    /// Drops settings that must never be active in the current environment.
    pub fn normalized(mut self) -> Self {
        if self.environment.is_production() {
            self.verify_code.bypass_code = None;
        }
        self
    }

    /// Rejects values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        let code = &self.verify_code;

        if code.length == 0 || code.length > MAX_CODE_LENGTH {
            return Err(AppError::Configuration(format!(
                "verify code length must be between 1 and {}, got {}",
                MAX_CODE_LENGTH, code.length
            )));
        }
        if code.max_tries == 0 {
            return Err(AppError::Configuration(
                "verify code max tries must be at least 1".to_string(),
            ));
        }
        if code.expire_time_ms == 0 || code.send_interval_ms == 0 {
            return Err(AppError::Configuration(
                "verify code expiry and send interval must be non-zero".to_string(),
            ));
        }
        if self.relay.channel_capacity == 0 {
            return Err(AppError::Configuration(
                "relay channel capacity must be non-zero".to_string(),
            ));
        }
        if let Some(bypass) = &code.bypass_code {
            if bypass.len() != code.length || !bypass.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AppError::Configuration(format!(
                    "bypass code must be {} digits to pass request validation",
                    code.length
                )));
            }
        }
        if self.environment.is_production() && code.bypass_code.is_some() {
            return Err(AppError::Configuration(
                "bypass code must not be enabled in production".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            server_port: 39010,
            cleanup_interval: 60,
            verify_code: VerifyCodeConfig::default(),
            relay: RelayConfig::default(),
        }
    }
}

fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses a comma separated list of socket addresses.
pub fn parse_peers(value: &str) -> Result<Vec<SocketAddr>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| AppError::Configuration(format!("invalid relay peer address '{}'", s)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.server_port, 39010);
        assert_eq!(config.cleanup_interval, 60);
        assert_eq!(config.verify_code.length, 6);
        assert_eq!(config.verify_code.expire_time_ms, 300_000);
        assert_eq!(config.verify_code.send_interval_ms, 60_000);
        assert_eq!(config.verify_code.max_tries, 5);
        assert_eq!(config.relay.mode, RelayMode::Broadcast);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_drops_bypass_code() {
        let config = Config {
            environment: Environment::Production,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = config.normalized();
        assert!(config.verify_code.bypass_code.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.verify_code.length = 0;
        assert!(matches!(config.validate(), Err(AppError::Configuration(_))));

        let mut config = Config::default();
        config.verify_code.length = MAX_CODE_LENGTH + 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.verify_code.max_tries = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.verify_code.send_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.relay.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bypass_code_format() {
        let mut config = Config::default();
        config.verify_code.bypass_code = Some("0000".to_string());
        assert!(matches!(config.validate(), Err(AppError::Configuration(_))));

        config.verify_code.bypass_code = Some("00000a".to_string());
        assert!(config.validate().is_err());

        config.verify_code.length = 8;
        config.verify_code.bypass_code = Some("00000000".to_string());
        assert!(config.validate().is_ok());

        config.verify_code.bypass_code = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("local".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Test);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_relay_mode_parse() {
        assert_eq!("udp".parse::<RelayMode>().unwrap(), RelayMode::Udp);
        assert_eq!("Broadcast".parse::<RelayMode>().unwrap(), RelayMode::Broadcast);
        assert!("redis".parse::<RelayMode>().is_err());
    }

    #[test]
    fn test_parse_peers() {
        let peers = parse_peers("127.0.0.1:4000, 10.0.0.2:4001,").unwrap();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[1], "10.0.0.2:4001".parse().unwrap());

        assert!(parse_peers("").unwrap().is_empty());
        assert!(matches!(
            parse_peers("localhost"),
            Err(AppError::Configuration(_))
        ));
    }
}

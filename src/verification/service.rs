//! Verification code policy.
//!
//! Per email the flow moves `NoCode -> CodeActive -> Verified | Expired |
//! AttemptsExhausted`, tracked by three store entries: the code, the last
//! send time and the attempt counter.
//!
//! Every write lands in the local store first and is then published so other
//! workers converge. Reads come from the local store, so a worker always sees
//! its own writes. A failed publish is logged and the local write stands.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::code::{code_key, generate_code, mask_email, send_interval_key, try_count_key};
use super::outcome::{CacheSnapshot, SendIntervalCheck, VerifyOutcome, VerifyStatus};
use crate::cache::{current_timestamp_ms, CacheValue, SharedStore};
use crate::config::{Environment, VerifyCodeConfig};
use crate::relay::{CacheMutationEvent, CacheRelay};

#[derive(Clone)]
pub struct VerificationService {
    store: SharedStore,
    relay: Arc<dyn CacheRelay>,
    config: VerifyCodeConfig,
    environment: Environment,
    started_at: Instant,
}

impl VerificationService {
    pub fn new(
        store: SharedStore,
        relay: Arc<dyn CacheRelay>,
        config: VerifyCodeConfig,
        environment: Environment,
    ) -> Self {
        info!(
            relay = relay.name(),
            environment = %environment,
            bypass_enabled = !environment.is_production() && config.bypass_code.is_some(),
            "Verification service initialized"
        );

        Self {
            store,
            relay,
            config,
            environment,
            started_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &VerifyCodeConfig {
        &self.config
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Bypass code in effect, never set in production.
    pub fn bypass_code(&self) -> Option<&str> {
        if self.environment.is_production() {
            return None;
        }
        self.config.bypass_code.as_deref()
    }

    // == Code Generation ==
    pub fn generate_code(&self) -> String {
        generate_code(self.config.length)
    }

    // == Send Interval ==
    /// Checks whether a new code may be sent to `email`.
    pub async fn check_send_interval(&self, email: &str) -> SendIntervalCheck {
        let last_send = self
            .read(&send_interval_key(email))
            .await
            .and_then(|value| value.as_timestamp());

        if let Some(last_send) = last_send {
            let elapsed = current_timestamp_ms().saturating_sub(last_send);
            let interval = self.config.send_interval_ms;

            if elapsed < interval {
                let remaining_secs = (interval - elapsed).div_ceil(1000);
                debug!(email = %mask_email(email), remaining_secs, "Send refused by interval");
                return SendIntervalCheck::wait(remaining_secs);
            }
        }

        SendIntervalCheck::allowed()
    }

    /// Records now as the last send time; the entry expires with the interval.
    pub async fn record_send_time(&self, email: &str) {
        self.write(
            &send_interval_key(email),
            CacheValue::Timestamp(current_timestamp_ms()),
            self.config.send_interval(),
        )
        .await;
    }

    // == Code Storage ==
    /// Stores a fresh code and clears attempts left over from an older one.
    pub async fn set_code(&self, email: &str, code: &str) {
        self.write(
            &code_key(email),
            CacheValue::Code(code.to_string()),
            self.config.expire_time(),
        )
        .await;
        self.reset_try_count(email).await;

        info!(
            email = %mask_email(email),
            expire_ms = self.config.expire_time_ms,
            "Verification code stored"
        );
    }

    /// Live code for `email`, if any.
    pub async fn get_code(&self, email: &str) -> Option<String> {
        let code = self
            .read(&code_key(email))
            .await
            .and_then(|value| value.as_code().map(str::to_string));

        if code.is_none() {
            debug!(email = %mask_email(email), "Verification code missing or expired");
        }
        code
    }

    pub async fn delete_code(&self, email: &str) {
        self.remove(&code_key(email)).await;
        debug!(email = %mask_email(email), "Verification code deleted");
    }

    // == Attempt Counter ==
    pub async fn get_try_count(&self, email: &str) -> u32 {
        self.read(&try_count_key(email))
            .await
            .and_then(|value| value.as_counter())
            .unwrap_or(0)
    }

    /// Increments the attempt counter and returns the new count.
    ///
    /// Read and write happen under one store lock, so concurrent attempts on
    /// this worker never reuse a count.
    pub async fn increase_try_count(&self, email: &str) -> u32 {
        let key = try_count_key(email);
        let ttl = self.config.expire_time();

        let count = {
            let mut store = self.store.write().await;
            let count = store
                .get(&key)
                .and_then(|value| value.as_counter())
                .unwrap_or(0)
                .saturating_add(1);
            store.set(key.as_str(), CacheValue::Counter(count), ttl);
            count
        };

        self.propagate(CacheMutationEvent::set(key, CacheValue::Counter(count), ttl))
            .await;
        count
    }

    pub async fn reset_try_count(&self, email: &str) {
        self.remove(&try_count_key(email)).await;
    }

    // == Verify ==
    /// Checks `input` against the stored code for `email`.
    pub async fn verify(&self, email: &str, input: &str) -> VerifyOutcome {
        if self.bypass_code() == Some(input) {
            info!(email = %mask_email(email), "Bypass verification code accepted");
            return VerifyStatus::Bypassed.into();
        }

        let Some(stored) = self.get_code(email).await else {
            return VerifyStatus::NotFound.into();
        };

        let count = self.increase_try_count(email).await;
        let max_tries = self.config.max_tries;

        if count > max_tries {
            self.delete_code(email).await;
            self.reset_try_count(email).await;
            warn!(email = %mask_email(email), count, "Verification attempts exhausted");
            return VerifyStatus::TooManyAttempts.into();
        }

        if stored != input {
            return VerifyStatus::Mismatch {
                remaining: max_tries - count,
            }
            .into();
        }

        self.delete_code(email).await;
        self.reset_try_count(email).await;
        info!(email = %mask_email(email), "Verification code verified");

        VerifyStatus::Verified.into()
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheSnapshot {
        let store = self.store.read().await;
        let stats = store.stats();

        CacheSnapshot {
            initialized: true,
            relay: self.relay.name(),
            size: store.len(),
            keys: store.keys(),
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            hit_rate: stats.hit_rate(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_secs: self.uptime().as_secs(),
        }
    }

    /// Time since the service was built.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    // == Store Access ==
    async fn read(&self, key: &str) -> Option<CacheValue> {
        // Write lock: reads evict expired entries and update stats
        self.store.write().await.get(key)
    }

    async fn write(&self, key: &str, value: CacheValue, ttl: Duration) {
        self.store.write().await.set(key, value.clone(), ttl);
        self.propagate(CacheMutationEvent::set(key, value, ttl)).await;
    }

    async fn remove(&self, key: &str) {
        self.store.write().await.delete(key);
        self.propagate(CacheMutationEvent::delete(key)).await;
    }

    async fn propagate(&self, event: CacheMutationEvent) {
        if let Err(e) = self.relay.publish(event).await {
            warn!(
                relay = self.relay.name(),
                error = %e,
                "Relay publish failed, change kept in local store only"
            );
        }
    }
}

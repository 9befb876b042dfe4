//! Cache mutation events carried by the relay.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheValue;

/// Identifies the worker that published a message.
pub type OriginId = u64;

/// Fresh random origin for a new relay handle.
pub fn new_origin() -> OriginId {
    rand::random()
}

/// A mutation stamped with the worker that published it.
///
/// Workers apply their own writes locally before publishing, so the sync task
/// drops messages carrying its own origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    pub origin: OriginId,
    #[serde(flatten)]
    pub event: CacheMutationEvent,
}

impl RelayMessage {
    pub fn new(origin: OriginId, event: CacheMutationEvent) -> Self {
        Self { origin, event }
    }
}

/// A single store mutation, broadcast to every worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CacheMutationEvent {
    /// Insert or overwrite `key`; receivers compute expiry on arrival
    Set {
        key: String,
        value: CacheValue,
        ttl_ms: u64,
    },
    /// Remove `key`
    Delete { key: String },
}

impl CacheMutationEvent {
    pub fn set(key: impl Into<String>, value: CacheValue, ttl: Duration) -> Self {
        Self::Set {
            key: key.into(),
            value,
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Delete { key } => key,
        }
    }

    /// Short operation name for logs.
    pub fn op(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Delete { .. } => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_event_json_shape() {
        let event = CacheMutationEvent::set(
            "send_interval:a@b.io",
            CacheValue::Timestamp(1_700_000_000_000),
            Duration::from_secs(60),
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["op"], "set");
        assert_eq!(json["key"], "send_interval:a@b.io");
        assert_eq!(json["ttl_ms"], 60_000);
        assert_eq!(json["value"]["kind"], "timestamp");
    }

    #[test]
    fn test_delete_event_parses() {
        let event: CacheMutationEvent =
            serde_json::from_str(r#"{"op":"delete","key":"try_count:a@b.io"}"#).unwrap();

        assert_eq!(event, CacheMutationEvent::delete("try_count:a@b.io"));
        assert_eq!(event.key(), "try_count:a@b.io");
        assert_eq!(event.op(), "delete");
    }

    #[test]
    fn test_message_carries_origin_beside_event() {
        let message = RelayMessage::new(7, CacheMutationEvent::delete("verify_code:a@b.io"));
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["origin"], 7);
        assert_eq!(json["op"], "delete");
        assert_eq!(json["key"], "verify_code:a@b.io");

        let parsed: RelayMessage = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_message_without_origin_rejected() {
        let result: Result<RelayMessage, _> =
            serde_json::from_str(r#"{"op":"delete","key":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_origins_differ() {
        assert_ne!(new_origin(), new_origin());
    }

    #[test]
    fn test_unknown_op_rejected() {
        let result: Result<CacheMutationEvent, _> =
            serde_json::from_str(r#"{"op":"flush","key":"x"}"#);
        assert!(result.is_err());
    }
}

//! Cache Record Module
//!
//! Defines the unit of storage shared by the in-process and filesystem drivers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::expiry::{compute_expiry, is_live};

// == Cache Record ==
/// A stored value together with its absolute expiry.
///
/// Serialized as `{"value": ..., "expiry": ...}`, which is also the on-disk
/// layout of the filesystem driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// The stored payload
    pub value: Value,
    /// Expiration timestamp (Unix seconds), 0 = no expiration
    #[serde(default)]
    pub expiry: u64,
}

impl CacheRecord {
    // == Constructor ==
    /// Creates a record whose expiry is derived from `ttl_seconds` at `now`.
    pub fn new(value: Value, ttl_seconds: Option<i64>, now: u64) -> Self {
        Self {
            value,
            expiry: compute_expiry(ttl_seconds, now),
        }
    }

    /// Returns true if the record is visible at `now`.
    pub fn is_live(&self, now: u64) -> bool {
        is_live(self.expiry, now)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::expiry::NEVER_EXPIRES;
    use serde_json::json;

    #[test]
    fn test_record_creation_no_ttl() {
        let record = CacheRecord::new(json!("test_value"), None, 1_000);

        assert_eq!(record.value, json!("test_value"));
        assert_eq!(record.expiry, NEVER_EXPIRES);
        assert!(record.is_live(u64::MAX));
    }

    #[test]
    fn test_record_creation_with_ttl() {
        let record = CacheRecord::new(json!({"a": 1}), Some(60), 1_000);

        assert_eq!(record.expiry, 1_060);
        assert!(record.is_live(1_000));
        assert!(!record.is_live(1_061));
    }

    #[test]
    fn test_serialized_layout() {
        let record = CacheRecord::new(json!(["x", 2]), Some(5), 10);
        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(text, r#"{"value":["x",2],"expiry":15}"#);

        let back: CacheRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_missing_expiry_defaults_to_never() {
        let record: CacheRecord = serde_json::from_str(r#"{"value":"v"}"#).unwrap();
        assert_eq!(record.expiry, NEVER_EXPIRES);
    }
}

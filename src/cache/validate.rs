//! Validation Module
//!
//! Key, TTL and value checks shared by every backend. All checks run before
//! the backend touches its storage medium.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{CacheError, Result};

static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("key pattern is a valid regex")
});

// == TTL Policy ==
/// How non-positive TTLs are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtlPolicy {
    /// `Some(ttl <= 0)` is rejected with `InvalidTtl`.
    #[default]
    Strict,
    /// `Some(ttl <= 0)` is accepted and means "never expires".
    Lenient,
}

impl std::str::FromStr for TtlPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(TtlPolicy::Strict),
            "lenient" => Ok(TtlPolicy::Lenient),
            other => Err(format!("unknown TTL policy '{}'", other)),
        }
    }
}

/// Returns true iff the key is non-empty and only uses `[A-Za-z0-9_-]`.
pub fn is_valid_key(key: &str) -> bool {
    KEY_PATTERN.is_match(key)
}

/// Returns true iff the TTL is absent or strictly positive.
pub fn is_valid_ttl(ttl: Option<i64>) -> bool {
    match ttl {
        None => true,
        Some(seconds) => seconds > 0,
    }
}

/// Returns true iff the value is neither null nor an empty string.
pub fn is_valid_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Fails with `InvalidKey` unless the key passes `is_valid_key`.
pub fn ensure_key(key: &str) -> Result<()> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(CacheError::InvalidKey(key.to_string()))
    }
}

/// Checks a TTL against the policy.
pub fn ensure_ttl(ttl: Option<i64>, policy: TtlPolicy) -> Result<()> {
    match (ttl, policy) {
        (Some(seconds), TtlPolicy::Strict) if !is_valid_ttl(ttl) => {
            Err(CacheError::InvalidTtl(seconds))
        }
        _ => Ok(()),
    }
}

/// Fails with `InvalidValue` when the value is null or an empty string.
pub fn ensure_value(key: &str, value: &Value) -> Result<()> {
    if is_valid_value(value) {
        Ok(())
    } else {
        Err(CacheError::InvalidValue(key.to_string()))
    }
}

/// Rejects an empty key list and any invalid key in it.
pub fn ensure_batch_keys(keys: &[String]) -> Result<()> {
    if keys.is_empty() {
        return Err(CacheError::InvalidBatchInput(
            "Keys must be a non-empty list.".to_string(),
        ));
    }
    keys.iter().try_for_each(|key| ensure_key(key))
}

//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON payload
/// - `ttl`: Optional TTL in seconds (absent means never expires)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<i64>,
}

/// Request body for POST /mget
#[derive(Debug, Clone, Deserialize)]
pub struct MultiGetRequest {
    pub keys: Vec<String>,
    /// Substituted for missing or expired keys
    #[serde(default)]
    pub default: Value,
}

/// Request body for PUT /mset
#[derive(Debug, Clone, Deserialize)]
pub struct MultiSetRequest {
    pub values: Map<String, Value>,
    #[serde(default)]
    pub ttl: Option<i64>,
}

/// Request body for POST /mdel
#[derive(Debug, Clone, Deserialize)]
pub struct MultiDeleteRequest {
    pub keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": {"a": [1, 2]}}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, json!({"a": [1, 2]}));
        assert!(req.ttl.is_none());
    }

    #[test]
    fn test_set_request_with_negative_ttl() {
        let json = r#"{"key": "test", "value": "hello", "ttl": -1}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl, Some(-1));
    }

    #[test]
    fn test_multi_get_default_is_null() {
        let req: MultiGetRequest = serde_json::from_str(r#"{"keys": ["a"]}"#).unwrap();
        assert_eq!(req.default, Value::Null);
    }

    #[test]
    fn test_multi_set_keeps_order() {
        let req: MultiSetRequest =
            serde_json::from_str(r#"{"values": {"z": 1, "a": 2}, "ttl": 100}"#).unwrap();
        let keys: Vec<&String> = req.values.keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(req.ttl, Some(100));
    }
}

//! Cache trait definition.

use serde_json::{Map, Value};

use crate::cache::validate::{ensure_batch_keys, ensure_key, ensure_ttl, TtlPolicy};
use crate::error::Result;

/// Trait for cache operations.
///
/// All backends implement this trait so callers can depend on the capability
/// set alone. Every keyed method validates its key before any storage access.
///
/// The multi-key methods have default implementations that loop over the
/// single-key ones; backends with per-call network cost override them.
pub trait Cache: Send + Sync {
    /// Short backend name used in logs and health output.
    fn backend_name(&self) -> &'static str;

    /// The TTL policy applied by `set` and `set_multiple`.
    fn ttl_policy(&self) -> TtlPolicy;

    /// Fetches a live value, or `None` on a miss or an expired record.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Unconditionally upserts a value with an optional TTL in seconds.
    fn set(&self, key: &str, value: Value, ttl: Option<i64>) -> Result<()>;

    /// Removes a key. Deleting a missing key succeeds.
    fn delete(&self, key: &str) -> Result<()>;

    /// Removes every record owned by this backend.
    fn clear(&self) -> Result<()>;

    /// Fetches a value, substituting `default` on a miss.
    fn get_or(&self, key: &str, default: Value) -> Result<Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Returns true when `get` would return a value.
    ///
    /// Subject to races: another writer may delete the key right after this
    /// returns, so do not use it to guard a following `get`.
    fn has(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Fetches several keys; every requested key is present in the result,
    /// mapped to `default` when missing or expired. Output follows input order.
    fn get_multiple(&self, keys: &[String], default: Value) -> Result<Map<String, Value>> {
        ensure_batch_keys(keys)?;

        let mut results = Map::with_capacity(keys.len());
        for key in keys {
            let value = self.get(key)?.unwrap_or_else(|| default.clone());
            results.insert(key.clone(), value);
        }
        Ok(results)
    }

    /// Stores several values sharing one TTL.
    ///
    /// All keys and the TTL are validated before the first write. Writes are
    /// not atomic: a storage failure leaves earlier entries applied. An empty
    /// map is a no-op that succeeds without touching storage.
    fn set_multiple(&self, values: Map<String, Value>, ttl: Option<i64>) -> Result<()> {
        ensure_ttl(ttl, self.ttl_policy())?;
        values.keys().try_for_each(|key| ensure_key(key))?;

        for (key, value) in values {
            self.set(&key, value, ttl)?;
        }
        Ok(())
    }

    /// Deletes several keys, one at a time.
    ///
    /// An empty slice is a no-op that succeeds without touching storage.
    fn delete_multiple(&self, keys: &[String]) -> Result<()> {
        keys.iter().try_for_each(|key| ensure_key(key))?;

        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }
}

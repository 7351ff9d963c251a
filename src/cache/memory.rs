//! In-process cache driver.
//!
//! Records live in a `HashMap` owned by the driver instance and disappear with
//! it. Expired records are removed lazily when a read discovers them.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::cache::entry::CacheRecord;
use crate::cache::expiry::{Clock, SystemClock};
use crate::cache::validate::{ensure_key, ensure_ttl, TtlPolicy};
use crate::cache::Cache;
use crate::error::{CacheError, Result};

// == Memory Cache ==
/// In-process key-value cache.
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheRecord>>,
    clock: Arc<dyn Clock>,
    ttl_policy: TtlPolicy,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock: Arc::new(SystemClock),
            ttl_policy: TtlPolicy::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }

    /// Number of stored records, expired ones included until read.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(err: E) -> CacheError {
    CacheError::Storage(err.to_string())
}

impl Cache for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn ttl_policy(&self) -> TtlPolicy {
        self.ttl_policy
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        ensure_key(key)?;
        let now = self.clock.now();

        {
            let entries = self.entries.read().map_err(poisoned)?;
            match entries.get(key) {
                None => return Ok(None),
                Some(record) if record.is_live(now) => return Ok(Some(record.value.clone())),
                Some(_) => {}
            }
        }

        // Re-check under the write lock; a concurrent set may have replaced it
        let mut entries = self.entries.write().map_err(poisoned)?;
        if entries.get(key).is_some_and(|r| !r.is_live(now)) {
            entries.remove(key);
            debug!(key, "removed expired record");
        }
        Ok(None)
    }

    fn set(&self, key: &str, value: Value, ttl: Option<i64>) -> Result<()> {
        ensure_key(key)?;
        ensure_ttl(ttl, self.ttl_policy)?;

        let record = CacheRecord::new(value, ttl, self.clock.now());
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), record);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        ensure_key(key)?;
        self.entries.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

//! Shared-memory cache driver.
//!
//! The driver is a thin mapping onto a [`SharedStore`] handle supplied at
//! construction. The store owns its records and enforces TTL natively, so the
//! driver only validates input and converts the TTL into store seconds.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::cache::expiry::{compute_expiry, is_live, Clock, SystemClock, NEVER_EXPIRES};
use crate::cache::validate::{ensure_key, ensure_ttl, TtlPolicy};
use crate::cache::Cache;
use crate::error::{CacheError, Result};

// == Shared Store ==
/// Native operations of a process-wide shared key-value store.
///
/// `ttl_seconds == 0` stores without expiry.
pub trait SharedStore: Send + Sync {
    fn fetch(&self, key: &str) -> Result<Option<Value>>;
    fn store(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
    fn exists(&self, key: &str) -> Result<bool>;
    fn clear(&self) -> Result<()>;
}

// == Shared Segment ==
/// In-process shared store. Clones are handles onto the same segment.
#[derive(Debug, Clone)]
pub struct SharedSegment {
    slots: Arc<RwLock<HashMap<String, (Value, u64)>>>,
    clock: Arc<dyn Clock>,
}

impl SharedSegment {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Reads a live slot. An expired slot found on the way is removed.
    fn live_value(&self, key: &str) -> Result<Option<Value>> {
        let now = self.clock.now();

        {
            let slots = self.slots.read().map_err(poisoned)?;
            match slots.get(key) {
                None => return Ok(None),
                Some((value, expiry)) if is_live(*expiry, now) => return Ok(Some(value.clone())),
                Some(_) => {}
            }
        }

        // Re-check under the write lock; another handle may have stored it again
        let mut slots = self.slots.write().map_err(poisoned)?;
        if slots.get(key).is_some_and(|(_, expiry)| !is_live(*expiry, now)) {
            slots.remove(key);
            debug!(key, "removed expired slot");
        }
        Ok(None)
    }
}

impl Default for SharedSegment {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(err: E) -> CacheError {
    CacheError::Storage(err.to_string())
}

impl SharedStore for SharedSegment {
    fn fetch(&self, key: &str) -> Result<Option<Value>> {
        self.live_value(key)
    }

    fn store(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<()> {
        let expiry = if ttl_seconds == 0 {
            NEVER_EXPIRES
        } else {
            self.clock.now().saturating_add(ttl_seconds)
        };
        self.slots
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), (value, expiry));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.slots.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.live_value(key)?.is_some())
    }

    fn clear(&self) -> Result<()> {
        self.slots.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

// == Shared Memory Cache ==
/// Cache driver over an injected shared store handle.
pub struct SharedMemoryCache {
    store: Arc<dyn SharedStore>,
    clock: Arc<dyn Clock>,
    ttl_policy: TtlPolicy,
}

impl SharedMemoryCache {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ttl_policy: TtlPolicy::default(),
        }
    }

    /// Clock used only to express the TTL in store seconds.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }
}

impl Cache for SharedMemoryCache {
    fn backend_name(&self) -> &'static str {
        "shared"
    }

    fn ttl_policy(&self) -> TtlPolicy {
        self.ttl_policy
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        ensure_key(key)?;
        self.store.fetch(key)
    }

    fn set(&self, key: &str, value: Value, ttl: Option<i64>) -> Result<()> {
        ensure_key(key)?;
        ensure_ttl(ttl, self.ttl_policy)?;

        let now = self.clock.now();
        let ttl_seconds = match compute_expiry(ttl, now) {
            NEVER_EXPIRES => 0,
            expiry => expiry - now,
        };
        debug!(key, ttl_seconds, "storing in shared segment");
        self.store.store(key, value, ttl_seconds)
    }

    fn delete(&self, key: &str) -> Result<()> {
        ensure_key(key)?;
        self.store.delete(key)
    }

    fn clear(&self) -> Result<()> {
        self.store.clear()
    }

    fn has(&self, key: &str) -> Result<bool> {
        ensure_key(key)?;
        self.store.exists(key)
    }
}

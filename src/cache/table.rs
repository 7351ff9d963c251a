//! Remote table cache driver.
//!
//! Stores one row per key in a managed NoSQL table with attributes `id`,
//! `value` and an optional `expiry`. The driver is a stateless accessor; the
//! table owns the records. Multi-key reads and writes are batched into
//! provider-sized chunks, and `clear` pages through a full-table scan since
//! the service has no truncate.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::cache::batch::{chunked, scan_all};
use crate::cache::expiry::{compute_expiry, is_live, Clock, SystemClock, NEVER_EXPIRES};
use crate::cache::validate::{ensure_batch_keys, ensure_key, ensure_ttl, ensure_value, TtlPolicy};
use crate::cache::Cache;
use crate::error::Result;
use crate::table::{TableClient, TableItem};

/// Default number of keys per batch-get call and rows per scan page.
pub const DEFAULT_READ_BATCH_LIMIT: usize = 100;

/// Default number of rows per batch-write call.
pub const DEFAULT_WRITE_BATCH_LIMIT: usize = 25;

// == Table Cache ==
pub struct TableCache {
    table: String,
    client: Arc<dyn TableClient>,
    read_batch_limit: usize,
    write_batch_limit: usize,
    clock: Arc<dyn Clock>,
    ttl_policy: TtlPolicy,
}

impl TableCache {
    pub fn new(table: impl Into<String>, client: Arc<dyn TableClient>) -> Self {
        Self {
            table: table.into(),
            client,
            read_batch_limit: DEFAULT_READ_BATCH_LIMIT,
            write_batch_limit: DEFAULT_WRITE_BATCH_LIMIT,
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

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn read_batch_limit(&self) -> usize {
        self.read_batch_limit
    }

    /// Sets the keys per batch-get call and rows per scan page. 0 becomes 1.
    pub fn set_read_batch_limit(&mut self, limit: usize) {
        if limit == 0 {
            warn!("read batch limit of 0 clamped to 1");
        }
        self.read_batch_limit = limit.max(1);
    }

    pub fn write_batch_limit(&self) -> usize {
        self.write_batch_limit
    }

    /// Sets the rows per batch-write call. 0 becomes 1.
    pub fn set_write_batch_limit(&mut self, limit: usize) {
        if limit == 0 {
            warn!("write batch limit of 0 clamped to 1");
        }
        self.write_batch_limit = limit.max(1);
    }

    fn item_is_live(item: &TableItem, now: u64) -> bool {
        is_live(item.expiry.unwrap_or(NEVER_EXPIRES), now)
    }

    fn stored_expiry(ttl: Option<i64>, now: u64) -> Option<u64> {
        match compute_expiry(ttl, now) {
            NEVER_EXPIRES => None,
            expiry => Some(expiry),
        }
    }
}

impl Cache for TableCache {
    fn backend_name(&self) -> &'static str {
        "table"
    }

    fn ttl_policy(&self) -> TtlPolicy {
        self.ttl_policy
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        ensure_key(key)?;
        let now = self.clock.now();

        Ok(self
            .client
            .get_item(&self.table, key)?
            .filter(|item| Self::item_is_live(item, now))
            .map(|item| item.value))
    }

    fn set(&self, key: &str, value: Value, ttl: Option<i64>) -> Result<()> {
        ensure_key(key)?;
        ensure_ttl(ttl, self.ttl_policy)?;
        ensure_value(key, &value)?;

        let item = TableItem {
            id: key.to_string(),
            value,
            expiry: Self::stored_expiry(ttl, self.clock.now()),
        };
        self.client.put_item(&self.table, item)
    }

    fn delete(&self, key: &str) -> Result<()> {
        ensure_key(key)?;
        self.client.delete_item(&self.table, key)
    }

    /// Deletes every row, one call per row, paging with the read batch limit.
    fn clear(&self) -> Result<()> {
        let client = self.client.as_ref();
        let deleted = scan_all(client, &self.table, self.read_batch_limit, |item| {
            client.delete_item(&self.table, &item.id)
        })?;
        info!(table = %self.table, deleted, "table cache cleared");
        Ok(())
    }

    fn get_multiple(&self, keys: &[String], default: Value) -> Result<Map<String, Value>> {
        ensure_batch_keys(keys)?;
        let now = self.clock.now();

        let mut results: Map<String, Value> = keys
            .iter()
            .map(|key| (key.clone(), default.clone()))
            .collect();
        let ids: Vec<String> = results.keys().cloned().collect();

        for chunk in chunked(ids, self.read_batch_limit) {
            debug!(table = %self.table, size = chunk.len(), "dispatching batch get");
            for item in self.client.batch_get_item(&self.table, &chunk)? {
                if Self::item_is_live(&item, now) {
                    if let Some(slot) = results.get_mut(&item.id) {
                        *slot = item.value;
                    }
                }
            }
        }
        Ok(results)
    }

    /// Writes all values in chunks of the write batch limit.
    ///
    /// Every key and value is validated before the first call. Chunks are not
    /// atomic as a whole: if a later chunk fails, earlier chunks stay written.
    fn set_multiple(&self, values: Map<String, Value>, ttl: Option<i64>) -> Result<()> {
        ensure_ttl(ttl, self.ttl_policy)?;
        for (key, value) in &values {
            ensure_key(key)?;
            ensure_value(key, value)?;
        }

        let expiry = Self::stored_expiry(ttl, self.clock.now());
        let items: Vec<TableItem> = values
            .into_iter()
            .map(|(id, value)| TableItem { id, value, expiry })
            .collect();

        for chunk in chunked(items, self.write_batch_limit) {
            debug!(table = %self.table, size = chunk.len(), "dispatching batch write");
            self.client.batch_write_item(&self.table, chunk)?;
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::expiry::ManualClock;
    use crate::error::CacheError;
    use crate::table::{LocalTable, TableSchema};
    use serde_json::json;

    fn setup() -> (TableCache, Arc<LocalTable>, ManualClock) {
        let service = Arc::new(LocalTable::new());
        service
            .create_table(&TableSchema::cache_table("dynamo-cache"))
            .unwrap();
        let clock = ManualClock::new(1_700_000_000);
        let cache = TableCache::new("dynamo-cache", service.clone())
            .with_clock(Arc::new(clock.clone()));
        (cache, service, clock)
    }

    fn numbered(n: usize) -> Map<String, Value> {
        (0..n).map(|i| (format!("key_{}", i), json!(i))).collect()
    }

    #[test]
    fn test_set_omits_expiry_without_ttl() {
        let (cache, service, _) = setup();

        cache.set("k", json!("v"), None).unwrap();
        let item = service.get_item("dynamo-cache", "k").unwrap().unwrap();
        assert_eq!(item.expiry, None);
    }

    #[test]
    fn test_set_stores_absolute_expiry() {
        let (cache, service, _) = setup();

        cache.set("k", json!("v"), Some(100)).unwrap();
        let item = service.get_item("dynamo-cache", "k").unwrap().unwrap();
        assert_eq!(item.expiry, Some(1_700_000_100));
    }

    #[test]
    fn test_get_hides_expired_rows() {
        let (cache, _, clock) = setup();

        cache.set("helloTTL", json!("hello TTL"), Some(2)).unwrap();
        assert!(cache.has("helloTTL").unwrap());

        clock.advance(3);
        assert!(!cache.has("helloTTL").unwrap());
        assert_eq!(
            cache.get_or("helloTTL", json!("Default")).unwrap(),
            json!("Default")
        );
    }

    #[test]
    fn test_set_rejects_empty_values() {
        let (cache, service, _) = setup();

        assert!(matches!(
            cache.set("k", json!(""), None),
            Err(CacheError::InvalidValue(_))
        ));
        assert!(matches!(
            cache.set("k", Value::Null, None),
            Err(CacheError::InvalidValue(_))
        ));
        assert_eq!(service.calls().put_item, 0);
    }

    #[test]
    fn test_delete_missing_key_is_ok() {
        let (cache, _, _) = setup();
        cache.delete("ghost").unwrap();
        cache.delete("ghost").unwrap();
    }

    #[test]
    fn test_set_multiple_chunks_by_write_limit() {
        let (cache, service, _) = setup();

        cache.set_multiple(numbered(60), Some(100)).unwrap();

        // 25 + 25 + 10
        assert_eq!(service.calls().batch_write_item, 3);
        assert_eq!(service.item_count("dynamo-cache").unwrap(), 60);
    }

    #[test]
    fn test_set_multiple_shares_one_expiry() {
        let (cache, service, _) = setup();

        cache.set_multiple(numbered(3), Some(10)).unwrap();
        for i in 0..3 {
            let item = service
                .get_item("dynamo-cache", &format!("key_{}", i))
                .unwrap()
                .unwrap();
            assert_eq!(item.expiry, Some(1_700_000_010));
        }
    }

    #[test]
    fn test_set_multiple_validates_everything_first() {
        let (cache, service, _) = setup();

        let mut values = numbered(30);
        values.insert("bcd*".to_string(), json!("bcd"));
        assert!(matches!(
            cache.set_multiple(values, None),
            Err(CacheError::InvalidKey(_))
        ));

        let mut values = numbered(30);
        values.insert("empty".to_string(), json!(""));
        assert!(matches!(
            cache.set_multiple(values, None),
            Err(CacheError::InvalidValue(_))
        ));

        assert!(matches!(
            cache.set_multiple(numbered(2), Some(-1)),
            Err(CacheError::InvalidTtl(-1))
        ));

        assert_eq!(service.calls().batch_write_item, 0);
    }

    #[test]
    fn test_set_multiple_empty_is_noop() {
        let (cache, service, _) = setup();
        cache.set_multiple(Map::new(), None).unwrap();
        assert_eq!(service.calls().batch_write_item, 0);
    }

    /// Delegates to a local table but fails the Nth batch write.
    struct FailingWrites {
        inner: Arc<LocalTable>,
        fail_on_call: usize,
        writes: std::sync::atomic::AtomicUsize,
    }

    impl TableClient for FailingWrites {
        fn create_table(&self, schema: &crate::table::TableSchema) -> Result<()> {
            self.inner.create_table(schema)
        }
        fn get_item(&self, table: &str, id: &str) -> Result<Option<TableItem>> {
            self.inner.get_item(table, id)
        }
        fn put_item(&self, table: &str, item: TableItem) -> Result<()> {
            self.inner.put_item(table, item)
        }
        fn delete_item(&self, table: &str, id: &str) -> Result<()> {
            self.inner.delete_item(table, id)
        }
        fn batch_get_item(&self, table: &str, ids: &[String]) -> Result<Vec<TableItem>> {
            self.inner.batch_get_item(table, ids)
        }
        fn batch_write_item(&self, table: &str, items: Vec<TableItem>) -> Result<()> {
            let call = self
                .writes
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
                + 1;
            if call == self.fail_on_call {
                return Err(CacheError::Storage("throughput exceeded".to_string()));
            }
            self.inner.batch_write_item(table, items)
        }
        fn scan(
            &self,
            table: &str,
            limit: usize,
            exclusive_start_key: Option<&str>,
        ) -> Result<crate::table::ScanPage> {
            self.inner.scan(table, limit, exclusive_start_key)
        }
    }

    #[test]
    fn test_set_multiple_partial_failure_keeps_earlier_chunks() {
        let (_, service, clock) = setup();
        let client = Arc::new(FailingWrites {
            inner: service.clone(),
            fail_on_call: 2,
            writes: Default::default(),
        });
        let cache = TableCache::new("dynamo-cache", client).with_clock(Arc::new(clock));

        let result = cache.set_multiple(numbered(60), None);

        assert!(matches!(result, Err(CacheError::Storage(_))));
        // First chunk of 25 is committed, the rest never sent
        assert_eq!(service.item_count("dynamo-cache").unwrap(), 25);
        assert_eq!(cache.get("key_0").unwrap(), Some(json!(0)));
        assert_eq!(cache.get("key_59").unwrap(), None);
    }

    #[test]
    fn test_get_multiple_chunks_by_read_limit() {
        let (cache, service, _) = setup();

        cache.set_multiple(numbered(150), None).unwrap();
        let keys: Vec<String> = (0..150).map(|i| format!("key_{}", i)).collect();
        let results = cache.get_multiple(&keys, Value::Null).unwrap();

        assert_eq!(service.calls().batch_get_item, 2);
        assert_eq!(results.len(), 150);
        for (i, (key, value)) in results.iter().enumerate() {
            assert_eq!(key, &format!("key_{}", i));
            assert_eq!(value, &json!(i));
        }
    }

    #[test]
    fn test_get_multiple_substitutes_default() {
        let (cache, _, _) = setup();

        cache.set("y", json!("why"), None).unwrap();
        let results = cache
            .get_multiple(&["x".to_string(), "y".to_string()], json!("D"))
            .unwrap();

        let expected: Map<String, Value> =
            [("x".to_string(), json!("D")), ("y".to_string(), json!("why"))]
                .into_iter()
                .collect();
        assert_eq!(results, expected);
    }

    #[test]
    fn test_get_multiple_treats_expired_as_default() {
        let (cache, _, clock) = setup();

        cache.set("old", json!("v"), Some(1)).unwrap();
        clock.advance(5);
        let results = cache
            .get_multiple(&["old".to_string()], json!("gone"))
            .unwrap();
        assert_eq!(results["old"], json!("gone"));
    }

    #[test]
    fn test_get_multiple_duplicate_keys_fetched_once() {
        let (cache, service, _) = setup();

        cache.set("a", json!(1), None).unwrap();
        let keys = vec!["a".to_string(), "a".to_string()];
        let results = cache.get_multiple(&keys, Value::Null).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(service.calls().batch_get_item, 1);
    }

    #[test]
    fn test_get_multiple_rejects_empty_keys() {
        let (cache, service, _) = setup();
        assert!(matches!(
            cache.get_multiple(&[], Value::Null),
            Err(CacheError::InvalidBatchInput(_))
        ));
        assert_eq!(service.calls().batch_get_item, 0);
    }

    #[test]
    fn test_clear_pages_through_scan() {
        let (mut cache, service, _) = setup();
        cache.set_read_batch_limit(10);

        cache.set_multiple(numbered(35), None).unwrap();
        cache.clear().unwrap();

        assert_eq!(service.item_count("dynamo-cache").unwrap(), 0);
        assert_eq!(service.calls().delete_item, 35);
        // Pages of 10, 10, 10, 5
        assert_eq!(service.calls().scan, 4);
        assert_eq!(cache.get("key_34").unwrap(), None);
    }

    #[test]
    fn test_delete_multiple_uses_single_deletes() {
        let (cache, service, _) = setup();

        cache.set_multiple(numbered(4), None).unwrap();
        cache
            .delete_multiple(&["key_0".to_string(), "key_3".to_string()])
            .unwrap();

        assert_eq!(service.calls().delete_item, 2);
        assert_eq!(service.item_count("dynamo-cache").unwrap(), 2);
    }

    #[test]
    fn test_batch_limit_setters() {
        let (mut cache, _, _) = setup();

        assert_eq!(cache.read_batch_limit(), DEFAULT_READ_BATCH_LIMIT);
        assert_eq!(cache.write_batch_limit(), DEFAULT_WRITE_BATCH_LIMIT);

        cache.set_read_batch_limit(0);
        cache.set_write_batch_limit(7);
        assert_eq!(cache.read_batch_limit(), 1);
        assert_eq!(cache.write_batch_limit(), 7);
    }
}

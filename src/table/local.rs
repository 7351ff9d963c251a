//! In-process table service.
//!
//! Behaves like a local table emulator: provider batch ceilings are enforced,
//! scans page in key order and return a cursor whenever a page is full.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Mutex, RwLock};

use tracing::{debug, info};

use crate::error::{CacheError, Result};
use crate::table::{ScanPage, TableClient, TableConnection, TableItem, TableSchema};

/// Maximum ids per batch-get call.
pub const MAX_BATCH_GET_KEYS: usize = 100;

/// Maximum items per batch-write call.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

// == Call Counts ==
/// Number of calls received per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_item: usize,
    pub put_item: usize,
    pub delete_item: usize,
    pub batch_get_item: usize,
    pub batch_write_item: usize,
    pub scan: usize,
}

// == Local Table ==
#[derive(Debug)]
pub struct LocalTable {
    connection: TableConnection,
    tables: RwLock<HashMap<String, BTreeMap<String, TableItem>>>,
    calls: Mutex<CallCounts>,
}

fn poisoned<E: std::fmt::Display>(err: E) -> CacheError {
    CacheError::Storage(err.to_string())
}

fn not_found(table: &str) -> CacheError {
    CacheError::Storage(format!("Cannot do operations on a non-existent table: {}", table))
}

impl LocalTable {
    pub fn new() -> Self {
        Self::with_connection(TableConnection::new(None, None))
    }

    pub fn connect(connection: TableConnection) -> Self {
        info!(
            region = connection.region.as_deref().unwrap_or("-"),
            endpoint = connection.endpoint.as_deref().unwrap_or("-"),
            api_version = %connection.api_version,
            "local table service connected"
        );
        Self::with_connection(connection)
    }

    fn with_connection(connection: TableConnection) -> Self {
        Self {
            connection,
            tables: RwLock::new(HashMap::new()),
            calls: Mutex::new(CallCounts::default()),
        }
    }

    /// Snapshot of the calls received so far.
    pub fn calls(&self) -> CallCounts {
        self.calls.lock().map(|c| *c).unwrap_or_default()
    }

    /// Number of rows currently stored in `table`.
    pub fn item_count(&self, table: &str) -> Result<usize> {
        let tables = self.tables.read().map_err(poisoned)?;
        tables.get(table).map(BTreeMap::len).ok_or_else(|| not_found(table))
    }

    fn record(&self, bump: impl FnOnce(&mut CallCounts)) -> Result<()> {
        let mut calls = self.calls.lock().map_err(poisoned)?;
        bump(&mut calls);
        Ok(())
    }

    fn read_table<T>(
        &self,
        table: &str,
        f: impl FnOnce(&BTreeMap<String, TableItem>) -> T,
    ) -> Result<T> {
        let tables = self.tables.read().map_err(poisoned)?;
        tables.get(table).map(f).ok_or_else(|| not_found(table))
    }

    fn write_table<T>(
        &self,
        table: &str,
        f: impl FnOnce(&mut BTreeMap<String, TableItem>) -> T,
    ) -> Result<T> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.get_mut(table).map(f).ok_or_else(|| not_found(table))
    }
}

impl Default for LocalTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TableClient for LocalTable {
    fn create_table(&self, schema: &TableSchema) -> Result<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        if tables.contains_key(&schema.table_name) {
            return Err(CacheError::Storage(format!(
                "Table already exists: {}",
                schema.table_name
            )));
        }
        tables.insert(schema.table_name.clone(), BTreeMap::new());
        info!(
            table = %schema.table_name,
            hash_key = %schema.hash_key,
            api_version = %self.connection.api_version,
            "table created"
        );
        Ok(())
    }

    fn get_item(&self, table: &str, id: &str) -> Result<Option<TableItem>> {
        self.record(|c| c.get_item += 1)?;
        self.read_table(table, |rows| rows.get(id).cloned())
    }

    fn put_item(&self, table: &str, item: TableItem) -> Result<()> {
        self.record(|c| c.put_item += 1)?;
        self.write_table(table, |rows| {
            rows.insert(item.id.clone(), item);
        })
    }

    fn delete_item(&self, table: &str, id: &str) -> Result<()> {
        self.record(|c| c.delete_item += 1)?;
        self.write_table(table, |rows| {
            rows.remove(id);
        })
    }

    fn batch_get_item(&self, table: &str, ids: &[String]) -> Result<Vec<TableItem>> {
        self.record(|c| c.batch_get_item += 1)?;
        if ids.len() > MAX_BATCH_GET_KEYS {
            return Err(CacheError::Storage(format!(
                "Too many items requested for the BatchGetItem call: {} > {}",
                ids.len(),
                MAX_BATCH_GET_KEYS
            )));
        }
        debug!(table, count = ids.len(), "batch get");
        self.read_table(table, |rows| {
            ids.iter().filter_map(|id| rows.get(id).cloned()).collect()
        })
    }

    fn batch_write_item(&self, table: &str, items: Vec<TableItem>) -> Result<()> {
        self.record(|c| c.batch_write_item += 1)?;
        if items.len() > MAX_BATCH_WRITE_ITEMS {
            return Err(CacheError::Storage(format!(
                "Too many items in the BatchWriteItem call: {} > {}",
                items.len(),
                MAX_BATCH_WRITE_ITEMS
            )));
        }
        debug!(table, count = items.len(), "batch write");
        self.write_table(table, |rows| {
            for item in items {
                rows.insert(item.id.clone(), item);
            }
        })
    }

    fn scan(
        &self,
        table: &str,
        limit: usize,
        exclusive_start_key: Option<&str>,
    ) -> Result<ScanPage> {
        self.record(|c| c.scan += 1)?;
        if limit == 0 {
            return Err(CacheError::Storage("Scan limit must be at least 1".to_string()));
        }
        self.read_table(table, |rows| {
            let lower = match exclusive_start_key {
                Some(start) => Bound::Excluded(start.to_string()),
                None => Bound::Unbounded,
            };
            let items: Vec<TableItem> = rows
                .range((lower, Bound::Unbounded))
                .take(limit)
                .map(|(_, item)| item.clone())
                .collect();
            let last_evaluated_key = if items.len() == limit {
                items.last().map(|item| item.id.clone())
            } else {
                None
            };
            ScanPage {
                items,
                last_evaluated_key,
            }
        })
    }
}

//! Table Client Module
//!
//! Interface of the managed NoSQL table used by the remote cache driver,
//! plus an in-process implementation for local runs and tests.

mod local;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

pub use local::{CallCounts, LocalTable, MAX_BATCH_GET_KEYS, MAX_BATCH_WRITE_ITEMS};

/// Protocol version every connection is pinned to.
pub const API_VERSION: &str = "2012-08-10";

/// Name of the string hash-key attribute.
pub const HASH_KEY: &str = "id";

// == Table Item ==
/// One row: `id` (hash key), `value`, and `expiry` when the row can expire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableItem {
    pub id: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

// == Scan Page ==
/// One page of a full-table scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub items: Vec<TableItem>,
    /// Continuation cursor; `None` once the scan is complete.
    pub last_evaluated_key: Option<String>,
}

// == Table Schema ==
/// Key schema and provisioned capacity for a cache table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub hash_key: String,
    pub hash_key_type: String,
    pub read_capacity_units: u32,
    pub write_capacity_units: u32,
}

impl TableSchema {
    /// Schema required by the cache: a single string hash key named `id`.
    pub fn cache_table(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            hash_key: HASH_KEY.to_string(),
            hash_key_type: "S".to_string(),
            read_capacity_units: 5,
            write_capacity_units: 5,
        }
    }
}

// == Table Connection ==
/// Connectivity settings forwarded verbatim to the table client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConnection {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub api_version: String,
}

impl TableConnection {
    pub fn new(region: Option<String>, endpoint: Option<String>) -> Self {
        Self {
            region,
            endpoint,
            access_key_id: None,
            secret_access_key: None,
            api_version: API_VERSION.to_string(),
        }
    }

    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }
}

impl Default for TableConnection {
    fn default() -> Self {
        Self::new(None, None)
    }
}

// == Table Client ==
/// Operations of the managed table service.
///
/// Every method is one network round-trip; implementations must not retry.
pub trait TableClient: Send + Sync {
    fn create_table(&self, schema: &TableSchema) -> Result<()>;

    fn get_item(&self, table: &str, id: &str) -> Result<Option<TableItem>>;

    fn put_item(&self, table: &str, item: TableItem) -> Result<()>;

    /// Deleting a missing id is not an error.
    fn delete_item(&self, table: &str, id: &str) -> Result<()>;

    /// Returns the rows found, in no particular order. Missing ids are omitted.
    fn batch_get_item(&self, table: &str, ids: &[String]) -> Result<Vec<TableItem>>;

    fn batch_write_item(&self, table: &str, items: Vec<TableItem>) -> Result<()>;

    /// Returns up to `limit` rows after `exclusive_start_key`.
    fn scan(
        &self,
        table: &str,
        limit: usize,
        exclusive_start_key: Option<&str>,
    ) -> Result<ScanPage>;
}

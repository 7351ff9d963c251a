//! Configuration Module
//!
//! Handles loading server configuration from environment variables and
//! mounting the configured cache backend.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{
    Cache, FileCache, MemoryCache, SharedMemoryCache, SharedSegment, TableCache, TtlPolicy,
    DEFAULT_CACHE_DIR, DEFAULT_READ_BATCH_LIMIT, DEFAULT_WRITE_BATCH_LIMIT,
};
use crate::error::Result;
use crate::table::{LocalTable, TableClient, TableConnection, TableSchema};

/// Which storage backend the server mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Memory,
    Shared,
    File,
    Table,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "array" => Ok(BackendKind::Memory),
            "shared" | "apcu" => Ok(BackendKind::Shared),
            "file" | "disk" => Ok(BackendKind::File),
            "table" | "dynamo" => Ok(BackendKind::Table),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend to mount
    pub backend: BackendKind,
    /// Directory for the file backend
    pub cache_dir: PathBuf,
    /// Table name for the table backend
    pub table: String,
    /// Connectivity forwarded to the table client
    pub table_connection: TableConnection,
    /// Keys per batch-get call and rows per scan page
    pub read_batch_limit: usize,
    /// Rows per batch-write call
    pub write_batch_limit: usize,
    /// Treatment of non-positive TTLs
    pub ttl_policy: TtlPolicy,
    /// HTTP server port
    pub server_port: u16,
}

fn parsed_env<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(name, value = %raw, "ignoring unparsable environment variable");
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - memory, shared, file or table (default: memory)
    /// - `CACHE_DIR` - File backend directory (default: /tmp/mini-cache)
    /// - `CACHE_TABLE` - Table backend table name (default: mini-cache)
    /// - `TABLE_REGION`, `TABLE_ENDPOINT` - Table service location
    /// - `TABLE_ACCESS_KEY_ID`, `TABLE_SECRET_ACCESS_KEY` - Table credentials
    /// - `READ_BATCH_LIMIT` - Keys per batch read (default: 100)
    /// - `WRITE_BATCH_LIMIT` - Rows per batch write (default: 25)
    /// - `TTL_POLICY` - strict or lenient (default: strict)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut table_connection =
            TableConnection::new(env::var("TABLE_REGION").ok(), env::var("TABLE_ENDPOINT").ok());
        if let (Ok(id), Ok(secret)) = (
            env::var("TABLE_ACCESS_KEY_ID"),
            env::var("TABLE_SECRET_ACCESS_KEY"),
        ) {
            table_connection = table_connection.with_credentials(id, secret);
        }

        Self {
            backend: parsed_env("CACHE_BACKEND", defaults.backend),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            table: env::var("CACHE_TABLE").unwrap_or(defaults.table),
            table_connection,
            read_batch_limit: parsed_env("READ_BATCH_LIMIT", defaults.read_batch_limit),
            write_batch_limit: parsed_env("WRITE_BATCH_LIMIT", defaults.write_batch_limit),
            ttl_policy: parsed_env("TTL_POLICY", defaults.ttl_policy),
            server_port: parsed_env("SERVER_PORT", defaults.server_port),
        }
    }

    /// Mounts the configured backend.
    ///
    /// The table backend runs against an in-process table service, provisioned
    /// with the cache schema on startup.
    pub fn build_cache(&self) -> Result<Arc<dyn Cache>> {
        let cache: Arc<dyn Cache> = match self.backend {
            BackendKind::Memory => Arc::new(MemoryCache::new().with_ttl_policy(self.ttl_policy)),
            BackendKind::Shared => Arc::new(
                SharedMemoryCache::new(Arc::new(SharedSegment::new()))
                    .with_ttl_policy(self.ttl_policy),
            ),
            BackendKind::File => {
                Arc::new(FileCache::new(&self.cache_dir)?.with_ttl_policy(self.ttl_policy))
            }
            BackendKind::Table => {
                let service = LocalTable::connect(self.table_connection.clone());
                service.create_table(&TableSchema::cache_table(&self.table))?;

                let mut cache = TableCache::new(&self.table, Arc::new(service))
                    .with_ttl_policy(self.ttl_policy);
                cache.set_read_batch_limit(self.read_batch_limit);
                cache.set_write_batch_limit(self.write_batch_limit);
                Arc::new(cache)
            }
        };
        info!(backend = cache.backend_name(), "cache backend mounted");
        Ok(cache)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            table: "mini-cache".to_string(),
            table_connection: TableConnection::new(None, None),
            read_batch_limit: DEFAULT_READ_BATCH_LIMIT,
            write_batch_limit: DEFAULT_WRITE_BATCH_LIMIT,
            ttl_policy: TtlPolicy::Strict,
            server_port: 3000,
        }
    }
}

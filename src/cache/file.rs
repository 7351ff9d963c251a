//! Filesystem cache driver.
//!
//! Each record is a JSON `{value, expiry}` blob stored at `<cache_dir>/<key>`.
//! Writes go to a temporary file in the same directory which is then renamed
//! over the destination, so readers never observe a partial record.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::cache::entry::CacheRecord;
use crate::cache::expiry::{Clock, SystemClock};
use crate::cache::validate::{ensure_key, ensure_ttl, TtlPolicy};
use crate::cache::Cache;
use crate::error::{CacheError, Result};

/// Directory used when none is configured.
pub const DEFAULT_CACHE_DIR: &str = "/tmp/mini-cache";

// == File Cache ==
/// Disk-backed cache, one file per key.
#[derive(Debug)]
pub struct FileCache {
    cache_dir: PathBuf,
    clock: Arc<dyn Clock>,
    ttl_policy: TtlPolicy,
}

impl FileCache {
    /// Opens a cache rooted at `cache_dir`, creating the directory if absent.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache = Self {
            cache_dir: cache_dir.into(),
            clock: Arc::new(SystemClock),
            ttl_policy: TtlPolicy::default(),
        };
        cache.ensure_dir()?;
        info!(dir = %cache.cache_dir.display(), "file cache ready");
        Ok(cache)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.cache_dir.join(key)
    }

    fn ensure_dir(&self) -> Result<()> {
        if self.cache_dir.is_dir() {
            return Ok(());
        }
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o777);
        }
        builder.create(&self.cache_dir)?;
        Ok(())
    }

    fn read_record(&self, path: &Path) -> Result<Option<CacheRecord>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Cache for FileCache {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    fn ttl_policy(&self) -> TtlPolicy {
        self.ttl_policy
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        ensure_key(key)?;
        let path = self.path_for(key);

        let Some(record) = self.read_record(&path)? else {
            return Ok(None);
        };
        if record.is_live(self.clock.now()) {
            return Ok(Some(record.value));
        }

        match fs::remove_file(&path) {
            Ok(()) => debug!(key, "removed expired record file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(key, error = %e, "failed to remove expired record file"),
        }
        Ok(None)
    }

    fn set(&self, key: &str, value: Value, ttl: Option<i64>) -> Result<()> {
        ensure_key(key)?;
        ensure_ttl(ttl, self.ttl_policy)?;

        let record = CacheRecord::new(value, ttl, self.clock.now());
        let bytes = serde_json::to_vec(&record)?;

        self.ensure_dir()?;
        let mut tmp = NamedTempFile::new_in(&self.cache_dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(key))
            .map_err(|e| CacheError::Storage(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        ensure_key(key)?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes every file and then the directory itself.
    ///
    /// Fails if the directory is already gone, or if a concurrent writer
    /// adds a file before the directory is removed.
    fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.is_file() {
                fs::remove_file(&path)?;
            }
        }
        fs::remove_dir(&self.cache_dir)?;
        info!(dir = %self.cache_dir.display(), "file cache cleared");
        Ok(())
    }
}

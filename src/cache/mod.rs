//! Cache Module
//!
//! A uniform key-value cache with optional TTL over four interchangeable
//! backends:
//! - [`MemoryCache`] keeps records in the driver instance
//! - [`SharedMemoryCache`] maps onto an injected shared store handle
//! - [`FileCache`] stores one file per key in a directory
//! - [`TableCache`] stores one row per key in a managed NoSQL table
//!
//! Key syntax, TTL and expiry rules live in [`validate`] and [`expiry`] and
//! are shared by every backend.

mod batch;
mod entry;
pub mod expiry;
mod file;
mod memory;
mod shared;
mod table;
mod traits;
pub mod validate;


// Re-export public types
pub use batch::{chunked, scan_all};
pub use entry::CacheRecord;
pub use expiry::{compute_expiry, is_live, Clock, ManualClock, SystemClock, NEVER_EXPIRES};
pub use file::{FileCache, DEFAULT_CACHE_DIR};
pub use memory::MemoryCache;
pub use shared::{SharedMemoryCache, SharedSegment, SharedStore};
pub use table::{TableCache, DEFAULT_READ_BATCH_LIMIT, DEFAULT_WRITE_BATCH_LIMIT};
pub use traits::Cache;
pub use validate::{is_valid_key, is_valid_ttl, is_valid_value, TtlPolicy};

//! Mini Cache - A uniform key-value cache over interchangeable backends
//!
//! Provides get/set/delete/clear/has and multi-key operations with optional
//! TTL on an in-process map, a shared-memory store, a directory of files, or
//! a managed NoSQL table.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod table;

pub use api::AppState;
pub use cache::Cache;
pub use config::Config;
pub use error::{CacheError, Result};

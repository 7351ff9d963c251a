//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. Cache calls are
//! synchronous, so each one runs on the blocking thread pool.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::Cache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    BatchResponse, ClearResponse, DeleteResponse, GetResponse, HasResponse, HealthResponse,
    MultiDeleteRequest, MultiGetRequest, MultiGetResponse, MultiSetRequest, SetRequest,
    SetResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The mounted cache backend
    pub cache: Arc<dyn Cache>,
}

impl AppState {
    /// Creates a new AppState around a cache backend.
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.build_cache()?))
    }

    /// Runs a cache operation on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Cache) -> Result<T> + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || op(cache.as_ref()))
            .await
            .map_err(|e| CacheError::Storage(format!("cache task failed: {}", e)))?
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    let key = req.key.clone();
    state
        .run(move |cache| cache.set(&req.key, req.value, req.ttl))
        .await?;

    Ok(Json(SetResponse::new(key)))
}

/// Handler for GET /get/:key
///
/// Misses and expired keys answer 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let lookup = key.clone();
    let value = state.run(move |cache| cache.get(&lookup)).await?;

    match value {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<HasResponse>> {
    let lookup = key.clone();
    let exists = state.run(move |cache| cache.has(&lookup)).await?;

    Ok(Json(HasResponse::new(key, exists)))
}

/// Handler for DELETE /del/:key
///
/// Deleting a missing key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let target = key.clone();
    state.run(move |cache| cache.delete(&target)).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for DELETE /clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    let backend = state.cache.backend_name();
    state.run(|cache| cache.clear()).await?;

    Ok(Json(ClearResponse::new(backend)))
}

/// Handler for POST /mget
pub async fn multi_get_handler(
    State(state): State<AppState>,
    Json(req): Json<MultiGetRequest>,
) -> Result<Json<MultiGetResponse>> {
    let values = state
        .run(move |cache| cache.get_multiple(&req.keys, req.default))
        .await?;

    Ok(Json(MultiGetResponse { values }))
}

/// Handler for PUT /mset
pub async fn multi_set_handler(
    State(state): State<AppState>,
    Json(req): Json<MultiSetRequest>,
) -> Result<Json<BatchResponse>> {
    let count = req.values.len();
    state
        .run(move |cache| cache.set_multiple(req.values, req.ttl))
        .await?;

    Ok(Json(BatchResponse::stored(count)))
}

/// Handler for POST /mdel
pub async fn multi_delete_handler(
    State(state): State<AppState>,
    Json(req): Json<MultiDeleteRequest>,
) -> Result<Json<BatchResponse>> {
    let count = req.keys.len();
    state
        .run(move |cache| cache.delete_multiple(&req.keys))
        .await?;

    Ok(Json(BatchResponse::deleted(count)))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.backend_name()))
}

//! API Module
//!
//! HTTP handlers and routing that expose the mounted cache backend.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `GET /has/:key` - Check whether a key is live
//! - `DELETE /del/:key` - Delete a key
//! - `DELETE /clear` - Remove every key
//! - `POST /mget`, `PUT /mset`, `POST /mdel` - Multi-key operations
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

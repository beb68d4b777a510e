//! Weebcast snapshot gateway.
//!
//! A small HTTP API that serves precomputed anime-activity snapshots out of a
//! key-value store and accepts fresh snapshots from an external producer.
//!
//! # Endpoints
//!
//! ```text
//! GET  /api/activity       overall snapshot (mal-overall)
//! GET  /api/activity/all   every stored snapshot
//! GET  /api/anime/:id      one title (anime-<id>)
//! GET  /api/trending       trending list from the overall snapshot
//! GET  /api/seasonal       seasonal list, falling back to trending
//! POST /api/sync           overwrite one snapshot
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`snapshot`]: Snapshot records and store keys
//! - [`season`]: Calendar season labels
//! - [`store`]: Key-value store backends
//! - [`api`]: HTTP router and handlers
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod season;
pub mod snapshot;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{GatewayError, Result};

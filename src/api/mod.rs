//! HTTP API module serving monitor snapshots.

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::SyncAuth;
pub use handlers::AppState;
pub use routes::{create_router, serve};

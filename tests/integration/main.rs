//! Integration tests for the snapshot gateway.
//!
//! Run with: cargo test --test integration

mod cloudflare_store;

//! metrix API library entry.
//!
//! Wires config, store, access gate, handlers and ops endpoints into one axum
//! router. Consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod obs;
pub mod ops;
pub mod router;

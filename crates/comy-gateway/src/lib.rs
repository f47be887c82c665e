//! Comy server library entry.
//!
//! Wires the security model (groups, users, tokens), the command catalog,
//! the executor, the message router, and the WebSocket transport into one
//! server. Consumed by the binary (`main.rs`) and by integration tests;
//! embedders build their own catalog and hand it to [`app_state::AppState`].

pub mod app_state;
pub mod auth;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod exec;
pub mod hub;
pub mod ops;
pub mod router;
pub mod transport;

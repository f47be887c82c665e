//! Comy core: transport-agnostic wire contracts, parameter model, and errors.
//!
//! This crate defines the message envelopes exchanged with clients, the
//! tagged parameter values handed to command bodies, and the error surface
//! shared by the gateway. It carries no transport or runtime dependencies so
//! it can be reused by client tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `ComyError`/`Result` or as typed outcomes so
//! the server never crashes on malformed client input.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod param;
pub mod protocol;

/// Shared result type.
pub use error::{ComyError, Result};

//! Top-level facade crate for Comy.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use comy_core::*;
}

pub mod gateway {
    pub use comy_gateway::*;
}

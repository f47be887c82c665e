//! Live connections and egress.
//!
//! The hub is the explicit publish list used for catalog-change broadcasts;
//! each connection owns a bounded outbound queue drained by its socket writer.

mod connections;
mod types;

pub use connections::{Connection, ConnectionHub};
pub use types::PreparedMsg;

//! Wire protocol: JSON text envelopes discriminated by a `type` field.
//!
//! - Inbound: [`inbound::ClientMessage`], decoded once at the transport edge.
//! - Outbound: [`outbound::ServerMessage`], serialized once per send (or once
//!   per broadcast).
//!
//! Decoding is panic-free: malformed input is reported as `ComyError` and the
//! caller answers with a generic unexpected-error response.

pub mod inbound;
pub mod outbound;

pub use inbound::{
    decode, AuthenticateCredentials, AuthenticateToken, ClientMessage, ExecuteCommand, NeedState,
    RefreshToken,
};
pub use outbound::{
    AuthenticationResponse, CommandDescriptor, CommandResponse, CommandResult, ExecutionKind,
    ResultStatus, ServerInfo, ServerMessage, ServerState,
};

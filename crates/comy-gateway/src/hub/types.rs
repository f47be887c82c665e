use axum::extract::ws::Message;

use comy_core::error::Result;
use comy_core::protocol::ServerMessage;

/// Message serialized once, sendable to many connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMsg(String);

impl PreparedMsg {
    pub fn prepare(msg: &ServerMessage) -> Result<Self> {
        Ok(Self(msg.to_json()?))
    }

    /// Convert to axum::ws::Message for transport.
    pub fn to_ws_message(&self) -> Message {
        Message::Text(self.0.clone())
    }
}

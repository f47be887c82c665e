//! Client -> server envelopes.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ComyError, Result};

/// Every message a client may send. Unknown `type` values fail to decode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    NeedState(NeedState),
    ExecuteCommand(ExecuteCommand),
    AuthenticateCredentials(AuthenticateCredentials),
    AuthenticateToken(AuthenticateToken),
    RefreshToken(RefreshToken),
}

impl ClientMessage {
    /// Discriminant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::NeedState(_) => "NeedState",
            ClientMessage::ExecuteCommand(_) => "ExecuteCommand",
            ClientMessage::AuthenticateCredentials(_) => "AuthenticateCredentials",
            ClientMessage::AuthenticateToken(_) => "AuthenticateToken",
            ClientMessage::RefreshToken(_) => "RefreshToken",
        }
    }
}

/// Ask for the (authorization-filtered) command catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NeedState {
    #[serde(default)]
    pub token: Option<String>,
}

/// Run a command. Values are meant to be strings; they are checked and
/// coerced per schema, so a non-string value fails only that command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteCommand {
    pub command_name: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub params: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthenticateCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthenticateToken {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    pub refresh_token: String,
}

/// Decode one text frame.
pub fn decode(text: &str) -> Result<ClientMessage> {
    if text.trim().is_empty() {
        return Err(ComyError::BadRequest("empty message".into()));
    }
    serde_json::from_str(text)
        .map_err(|e| ComyError::BadRequest(format!("invalid envelope json: {e}")))
}

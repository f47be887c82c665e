//! Server -> client envelopes.

use serde::{Deserialize, Serialize};

use crate::error::{ComyError, Result};
use crate::param::ParameterDescriptor;

/// Every message the server may push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    ServerInfo(ServerInfo),
    ServerState(ServerState),
    Authentication(AuthenticationResponse),
    CommandResponse(CommandResponse),
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ComyError::Internal(format!("json encode failed: {e}")))
    }
}

impl From<ServerInfo> for ServerMessage {
    fn from(v: ServerInfo) -> Self {
        ServerMessage::ServerInfo(v)
    }
}

impl From<ServerState> for ServerMessage {
    fn from(v: ServerState) -> Self {
        ServerMessage::ServerState(v)
    }
}

impl From<AuthenticationResponse> for ServerMessage {
    fn from(v: AuthenticationResponse) -> Self {
        ServerMessage::Authentication(v)
    }
}

impl From<CommandResponse> for ServerMessage {
    fn from(v: CommandResponse) -> Self {
        ServerMessage::CommandResponse(v)
    }
}

/// Sent once per connection, right after the upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub server_name: String,
    pub is_secured: bool,
}

/// Catalog as visible to the requesting caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerState {
    pub name: String,
    pub commands: Vec<CommandDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_error: Option<AuthenticationResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionKind {
    Sync,
    Async,
}

/// Catalog entry published to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDescriptor {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub main_parameter: Option<ParameterDescriptor>,
    #[serde(default)]
    pub secondary_parameters: Vec<ParameterDescriptor>,
    #[serde(default)]
    pub security_groups: Vec<String>,
    pub kind: ExecutionKind,
}

/// Outcome of any authentication-related request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub username: Option<String>,
    pub message: String,
    pub code: u16,
    pub token_expired_error: bool,
    pub wrong_credentials_error: bool,
}

impl AuthenticationResponse {
    fn base(message: &str, code: u16) -> Self {
        Self {
            token: None,
            refresh_token: None,
            username: None,
            message: message.to_owned(),
            code,
            token_expired_error: false,
            wrong_credentials_error: false,
        }
    }

    pub fn logged_in(token: String, refresh_token: String, username: String) -> Self {
        Self {
            token: Some(token),
            refresh_token: Some(refresh_token),
            username: Some(username),
            ..Self::base("Successfully authenticated", 200)
        }
    }

    pub fn wrong_credentials() -> Self {
        Self {
            wrong_credentials_error: true,
            ..Self::base("Wrong credentials", 401)
        }
    }

    pub fn token_accepted(username: String) -> Self {
        Self {
            username: Some(username),
            ..Self::base("Successfully authenticated", 200)
        }
    }

    pub fn token_rejected(token_expired: bool) -> Self {
        Self {
            token_expired_error: token_expired,
            ..Self::base("Error with token", 401)
        }
    }

    pub fn refreshed(token: String) -> Self {
        Self {
            token: Some(token),
            ..Self::base("Refreshed token", 200)
        }
    }

    pub fn refresh_rejected() -> Self {
        Self::base("Error with refresh token", 401)
    }

    /// Embedded in state/command responses when authorization fails.
    pub fn unauthorized(token: Option<String>, token_expired: bool) -> Self {
        Self {
            token,
            token_expired_error: token_expired,
            ..Self::base("Unauthorized", 401)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultStatus {
    pub success: bool,
    pub message: String,
}

/// What a command produced (or why it did not run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub message: String,
    pub status: ResultStatus,
}

impl CommandResult {
    /// Successful result with status message "OK".
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: ResultStatus {
                success: true,
                message: "OK".into(),
            },
        }
    }

    /// Failed result with an empty message and the given status message.
    pub fn failure(status_message: impl Into<String>) -> Self {
        Self {
            message: String::new(),
            status: ResultStatus {
                success: false,
                message: status_message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.success
    }
}

impl Default for CommandResult {
    fn default() -> Self {
        Self::success("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub command_name: String,
    pub result: CommandResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_error: Option<AuthenticationResponse>,
}

impl CommandResponse {
    pub fn new(command_name: impl Into<String>, result: CommandResult) -> Self {
        Self {
            command_name: command_name.into(),
            result,
            auth_error: None,
        }
    }

    pub fn not_found(command_name: &str) -> Self {
        Self::new(
            command_name,
            CommandResult::failure(format!("Command named \"{command_name}\" not found")),
        )
    }

    /// Catch-all answer for undecodable input.
    pub fn unexpected_error() -> Self {
        Self::new("", CommandResult::failure("Unexpected error"))
    }
}

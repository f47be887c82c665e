//! Shared error type across Comy crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed message or configuration.
    BadRequest,
    /// Catalog invariant violated (names, parameters).
    InvalidCatalog,
    /// Security configuration invariant violated (groups, users).
    InvalidSecurity,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::InvalidCatalog => "INVALID_CATALOG",
            ClientCode::InvalidSecurity => "INVALID_SECURITY",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ComyError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum ComyError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("duplicate command name: {0}")]
    DuplicateCommand(String),
    #[error("error in command named {command}: duplicate parameter name {parameter}")]
    DuplicateParameter { command: String, parameter: String },
    #[error("error in command named {command}: wrong main parameter type for {parameter}")]
    InvalidMainParameter { command: String, parameter: String },
    #[error("duplicate security group: {0}")]
    DuplicateGroup(String),
    #[error("security group not registered: {0}")]
    UnknownGroup(String),
    #[error("security group hierarchy has a cycle through: {0}")]
    GroupCycle(String),
    #[error("user already registered: {0}")]
    DuplicateUser(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ComyError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            ComyError::BadRequest(_) => ClientCode::BadRequest,
            ComyError::DuplicateCommand(_)
            | ComyError::DuplicateParameter { .. }
            | ComyError::InvalidMainParameter { .. } => ClientCode::InvalidCatalog,
            ComyError::DuplicateGroup(_)
            | ComyError::UnknownGroup(_)
            | ComyError::GroupCycle(_)
            | ComyError::DuplicateUser(_) => ClientCode::InvalidSecurity,
            ComyError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            ComyError::Internal(_) => ClientCode::Internal,
        }
    }
}

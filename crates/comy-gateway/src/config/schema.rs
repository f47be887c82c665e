use serde::Deserialize;
use comy_core::error::{ComyError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComyConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub security: SecuritySection,
}

impl ComyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ComyError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.security.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// Deadline for asynchronous command bodies.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
            command_timeout_ms: default_command_timeout_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ComyError::BadRequest("server.name must not be empty".into()));
        }
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(ComyError::BadRequest(
                "server.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=3_600_000).contains(&self.idle_timeout_ms) {
            return Err(ComyError::BadRequest(
                "server.idle_timeout_ms must be between 10000 and 3600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(ComyError::BadRequest(
                "server.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(256..=16 * 1024 * 1024).contains(&self.max_frame_bytes) {
            return Err(ComyError::BadRequest(
                "server.max_frame_bytes must be between 256 and 16777216".into(),
            ));
        }
        if !(100..=3_600_000).contains(&self.command_timeout_ms) {
            return Err(ComyError::BadRequest(
                "server.command_timeout_ms must be between 100 and 3600000".into(),
            ));
        }
        Ok(())
    }
}

fn default_name() -> String {
    "Comy server".into()
}
fn default_listen() -> String {
    "0.0.0.0:12478".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    300000
}
fn default_max_frame_bytes() -> usize {
    64 * 1024
}
fn default_command_timeout_ms() -> u64 {
    15000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecuritySection {
    /// When false, authorization never blocks (diagnostics are still attached).
    #[serde(default)]
    pub secured: bool,

    /// HMAC key for access/refresh tokens.
    #[serde(default)]
    pub secret_key: String,

    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(default)]
    pub groups: Vec<GroupConfig>,

    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            secured: false,
            secret_key: String::new(),
            issuer: default_issuer(),
            groups: Vec::new(),
            users: Vec::new(),
        }
    }
}

impl SecuritySection {
    pub fn validate(&self) -> Result<()> {
        if self.issuer.trim().is_empty() {
            return Err(ComyError::BadRequest("security.issuer must not be empty".into()));
        }
        if (self.secured || !self.users.is_empty()) && self.secret_key.len() < 16 {
            return Err(ComyError::BadRequest(
                "security.secret_key must be at least 16 bytes when users are configured".into(),
            ));
        }
        Ok(())
    }
}

fn default_issuer() -> String {
    "comy".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub group: Option<String>,
}

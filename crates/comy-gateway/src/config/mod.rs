//! Server config loader (strict parsing).

pub mod schema;

use std::fs;

use comy_core::error::{ComyError, Result};

pub use schema::{ComyConfig, GroupConfig, SecuritySection, ServerSection, UserConfig};

pub fn load_from_file(path: &str) -> Result<ComyConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ComyError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ComyConfig> {
    let cfg: ComyConfig = serde_yaml::from_str(s)
        .map_err(|e| ComyError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

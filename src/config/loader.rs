//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable consulted when `reward.private_key` is empty.
pub const PRIVATE_KEY_ENV_VAR: &str = "GATEWAY_REWARD_PRIVATE_KEY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Replace every `${NAME}` with the value of the environment variable `NAME`.
///
/// Unset variables expand to the empty string. An unterminated `${` is kept verbatim.
pub fn expand_env(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                out.push_str(&std::env::var(name).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parse, expand and validate configuration text.
pub fn load_config_str(content: &str) -> Result<GatewayConfig, ConfigError> {
    let expanded = expand_env(content);
    let mut config: GatewayConfig = toml::from_str(&expanded)?;

    if config.reward.private_key.is_empty() {
        if let Ok(key) = std::env::var(PRIVATE_KEY_ENV_VAR) {
            config.reward.private_key = key;
        }
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    load_config_str(&content)
}

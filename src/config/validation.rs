//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, threshold on the 0-100 scale)
//! - Check that reward addresses and endpoints parse
//! - Refuse a configuration with no provider enabled
//! - Keep the whole-request timeout above the worst-case analysis and reward time
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use alloy::primitives::Address;

use crate::config::schema::GatewayConfig;

/// Upper bound of the similarity scale emitted by the analysis service.
pub const SIMILARITY_SCALE_MAX: f64 = 100.0;

/// Bounded RPC calls in one reward transfer: nonce, gas price, chain id, broadcast.
pub const RPC_CALLS_PER_TRANSFER: u64 = 4;

/// Longest an analysis attempt can take with every external call at its limit.
pub fn attempt_budget_ms(config: &GatewayConfig) -> u64 {
    let mut budget = 0u64;
    if config.analysis.enabled {
        budget = budget.saturating_add(config.analysis.timeout_ms);
    }
    if config.reward.enabled {
        budget = budget.saturating_add(
            config
                .reward
                .rpc_timeout_secs
                .saturating_mul(1000)
                .saturating_mul(RPC_CALLS_PER_TRANSFER),
        );
    }
    budget
}

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    } else {
        let budget = attempt_budget_ms(config);
        if config.timeouts.request_secs.saturating_mul(1000) <= budget {
            errors.push(ValidationError::new(
                "timeouts.request_secs",
                format!(
                    "{} s does not cover the analysis and reward budget of {} ms",
                    config.timeouts.request_secs, budget
                ),
            ));
        }
    }

    if !config.analysis.enabled && !config.reward.enabled {
        errors.push(ValidationError::new("providers", "no providers enabled"));
    }

    if config.analysis.enabled {
        if config.analysis.timeout_ms == 0 {
            errors.push(ValidationError::new("analysis.timeout_ms", "must be greater than 0"));
        }
        if url::Url::parse(&config.analysis.base_url).is_err() {
            errors.push(ValidationError::new(
                "analysis.base_url",
                format!("'{}' is not a valid URL", config.analysis.base_url),
            ));
        }
        if !config.analysis.endpoint_path.starts_with('/') {
            errors.push(ValidationError::new("analysis.endpoint_path", "must start with '/'"));
        }
    }

    let reward = &config.reward;
    if !reward.threshold.is_finite() || !(0.0..=SIMILARITY_SCALE_MAX).contains(&reward.threshold) {
        errors.push(ValidationError::new(
            "reward.threshold",
            format!("{} is outside the 0-100 similarity scale", reward.threshold),
        ));
    }

    if reward.enabled {
        if url::Url::parse(&reward.rpc_url).is_err() {
            errors.push(ValidationError::new(
                "reward.rpc_url",
                format!("'{}' is not a valid URL", reward.rpc_url),
            ));
        }
        if reward.token_contract_address.parse::<Address>().is_err() {
            errors.push(ValidationError::new("reward.token_contract_address", "not a 20-byte hex address"));
        }
        if reward.recipient_address.parse::<Address>().is_err() {
            errors.push(ValidationError::new("reward.recipient_address", "not a 20-byte hex address"));
        }
        if reward.min_units == 0 {
            errors.push(ValidationError::new("reward.min_units", "must be at least 1"));
        }
        if reward.min_units > reward.max_units {
            errors.push(ValidationError::new("reward.max_units", "must not be below min_units"));
        }
        if reward.token_decimals > 36 {
            errors.push(ValidationError::new("reward.token_decimals", "must be 36 or less"));
        }
        if reward.gas_limit == 0 {
            errors.push(ValidationError::new("reward.gas_limit", "must be greater than 0"));
        }
        if reward.rpc_timeout_secs == 0 {
            errors.push(ValidationError::new("reward.rpc_timeout_secs", "must be greater than 0"));
        }
    }

    for (field, prefix) in [
        ("history.audit_prefix", &config.history.audit_prefix),
        ("history.visit_prefix", &config.history.visit_prefix),
    ] {
        if prefix.is_empty() || prefix.contains(['/', '\\']) || prefix.contains("..") {
            errors.push(ValidationError::new(field, "must be a non-empty plain file name prefix"));
        }
    }
    if config.history.audit_prefix == config.history.visit_prefix {
        errors.push(ValidationError::new("history.visit_prefix", "must differ from audit_prefix"));
    }

    for origin in &config.security.allowed_origins {
        let origin = origin.trim();
        if origin.is_empty() || origin == "*" {
            errors.push(ValidationError::new(
                "security.allowed_origins",
                "list explicit origins; a wildcard cannot be combined with credentials",
            ));
        } else if url::Url::parse(origin).is_err() {
            errors.push(ValidationError::new(
                "security.allowed_origins",
                format!("'{}' is not an origin URL", origin),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("observability.metrics_address", "not a socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0xe211Fd7FD662125038Ce33D993A7e791DF67BB6F";
    const RECIPIENT: &str = "0x526b0FFA23DbB9980cc0e2E54dB5299Ed05B4861";

    fn reward_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.reward.enabled = true;
        config.reward.token_contract_address = TOKEN.to_string();
        config.reward.recipient_address = RECIPIENT.to_string();
        config
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_reward_config_is_valid() {
        assert!(validate_config(&reward_config()).is_ok());
    }

    #[test]
    fn test_no_providers_enabled() {
        let mut config = GatewayConfig::default();
        config.analysis.enabled = false;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "providers"));
    }

    #[test]
    fn test_threshold_outside_scale() {
        let mut config = GatewayConfig::default();
        config.reward.threshold = 950.0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "reward.threshold");

        config.reward.threshold = f64::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = reward_config();
        config.reward.recipient_address = "nope".to_string();
        config.reward.min_units = 10;
        config.reward.max_units = 5;
        config.analysis.timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"reward.recipient_address"));
        assert!(fields.contains(&"reward.max_units"));
        assert!(fields.contains(&"analysis.timeout_ms"));
    }

    #[test]
    fn test_prefix_rejects_path_separators() {
        let mut config = GatewayConfig::default();
        config.history.audit_prefix = "../etc".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "history.audit_prefix");
    }

    #[test]
    fn test_request_timeout_must_cover_attempt() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 1;
        config.analysis.timeout_ms = 5_000;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "timeouts.request_secs");

        // 35 s analysis plus four 10 s RPC calls.
        let mut config = reward_config();
        config.timeouts.request_secs = 75;
        assert_eq!(attempt_budget_ms(&config), 75_000);
        assert!(validate_config(&config).is_err());
        config.timeouts.request_secs = 76;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_wildcard_origin_rejected() {
        let mut config = GatewayConfig::default();
        config.security.allowed_origins = vec!["*".to_string()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "security.allowed_origins");

        config.security.allowed_origins = vec!["not an origin".to_string()];
        assert!(validate_config(&config).is_err());

        config.security.allowed_origins = vec!["https://draw.example.com".to_string()];
        assert!(validate_config(&config).is_ok());
    }
}

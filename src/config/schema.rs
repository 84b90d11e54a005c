//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the drawing gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Analysis service settings.
    pub analysis: AnalysisConfig,

    /// Token reward settings.
    pub reward: RewardConfig,

    /// Date-partitioned history files.
    pub history: HistoryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4000").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4000".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds. Must
    /// exceed the analysis timeout plus the reward RPC budget.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 90 }
    }
}

/// Analysis service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Register the analysis provider.
    pub enabled: bool,

    /// Base URL of the analysis service.
    pub base_url: String,

    /// Path appended to `base_url` for the analyze call.
    pub endpoint_path: String,

    /// Budget for one analysis call in milliseconds.
    pub timeout_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:8080".to_string(),
            endpoint_path: "/api/spring/v1/analyze".to_string(),
            timeout_ms: 35_000,
        }
    }
}

/// Token reward configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Register the reward provider.
    pub enabled: bool,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// ERC-20 token contract the transfer is sent to.
    pub token_contract_address: String,

    /// Account that receives rewarded tokens.
    pub recipient_address: String,

    /// Hex signing key of the sending account. Falls back to
    /// `GATEWAY_REWARD_PRIVATE_KEY` when empty.
    #[serde(skip_serializing)]
    pub private_key: String,

    /// Similarity (0-100 scale) at or above which a transfer is attempted.
    pub threshold: f64,

    /// Fixed-point precision declared by the token.
    pub token_decimals: u8,

    /// Lower bound of the random whole-token quantity.
    pub min_units: u64,

    /// Upper bound of the random whole-token quantity.
    pub max_units: u64,

    /// Gas limit for the transfer transaction.
    pub gas_limit: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Identical drawings inside this window reuse the earlier transfer (0 disables).
    pub dedupe_window_secs: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rpc_url: "http://localhost:8545".to_string(),
            token_contract_address: String::new(),
            recipient_address: String::new(),
            private_key: String::new(),
            threshold: 95.0,
            token_decimals: 18,
            min_units: 1,
            max_units: 1000,
            gas_limit: 100_000,
            rpc_timeout_secs: 10,
            dedupe_window_secs: 600,
        }
    }
}

/// History file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Directory holding the daily JSON files.
    pub data_dir: String,

    /// File prefix for analysis audit records.
    pub audit_prefix: String,

    /// File prefix for visit records.
    pub visit_prefix: String,

    /// Seconds to wait for in-flight writes on shutdown.
    pub drain_timeout_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            audit_prefix: "history".to_string(),
            visit_prefix: "visits".to_string(),
            drain_timeout_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes. Drawings arrive as base64 so this is generous.
    pub max_body_size: usize,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // 10MB
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env (optional, never overrides the process environment)
//!     → config file (TOML with ${VAR} placeholders)
//!     → loader.rs (expand, parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed to providers, store and server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Secrets come from the environment, never from the checked-in file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_str, ConfigError};
pub use schema::{
    AnalysisConfig, GatewayConfig, HistoryConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RewardConfig, SecurityConfig, TimeoutConfig, TlsConfig,
};

//! Pluggable backends the orchestrator calls out to.
//!
//! # Data Flow
//! ```text
//! GatewayConfig (enabled sections)
//!     → registry.rs (name → capability, built once at startup)
//!     → analysis.rs (HTTP call to the vision service)
//!     → reward.rs (token transfer on the configured chain)
//! ```
//!
//! # Design Decisions
//! - One trait per capability with typed payloads; nothing is downcast at runtime
//! - Providers are stateless per call and shared behind `Arc`
//! - The registry is read-only once startup finishes

pub mod analysis;
pub mod registry;
pub mod reward;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::BlockchainError;

pub use analysis::HttpAnalysisProvider;
pub use registry::{Registry, RegistryError, RegisteredProvider};
pub use reward::ChainRewardProvider;

/// Registry name of the analysis capability.
pub const ANALYSIS_PROVIDER: &str = "analysis";
/// Registry name of the reward capability.
pub const REWARD_PROVIDER: &str = "reward";

/// A drawing submitted for analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Encoded image, usually a base64 data URL from the canvas.
    #[serde(default, alias = "image_data")]
    pub image: String,
}

impl AnalysisRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self { image: image.into() }
    }

    /// Reject payloads that cannot possibly be an image.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.image.trim().is_empty() {
            return Err(ProviderError::Validation("image payload is empty".to_string()));
        }
        Ok(())
    }
}

/// Outcome of one analysis, returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Similarity on the 0-100 scale emitted by the analysis service.
    pub similarity: f64,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub feedback_ko: String,
    /// Reward transaction hash, present only when a transfer was accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
}

/// Proof that a reward transfer was accepted for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardReceipt {
    /// `0x`-prefixed transaction hash.
    pub tx_id: String,
    /// Whole-token quantity before decimal scaling.
    pub units: u64,
}

/// Errors a provider can report.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The payload was rejected before any network call.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The call did not finish within its budget.
    #[error("{provider} timed out after {millis} ms")]
    Timeout { provider: String, millis: u64 },

    /// Transport failure or non-success status from the upstream.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The upstream answered with a body we could not decode.
    #[error("malformed upstream response: {0}")]
    Decode(String),

    /// A reward transfer step failed.
    #[error("reward transfer failed: {0}")]
    Reward(#[from] BlockchainError),
}

/// Result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Anything that can sit in the registry.
pub trait Provider: Send + Sync {
    /// Unique name within a registry.
    fn name(&self) -> &str;
}

/// Scores a drawing.
#[async_trait]
pub trait AnalysisProvider: Provider {
    async fn analyze(&self, trace_id: &str, request: &AnalysisRequest) -> ProviderResult<AnalysisResult>;
}

/// Pays out a reward for a successful analysis.
#[async_trait]
pub trait RewardProvider: Provider {
    async fn reward(&self, trace_id: &str, result: &AnalysisResult) -> ProviderResult<RewardReceipt>;
}

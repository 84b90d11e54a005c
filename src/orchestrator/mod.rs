//! Request orchestration.
//!
//! # Data Flow
//! ```text
//! RequestContext + AnalysisRequest
//!     → validate (empty payload → 400, no upstream call)
//!     → analyze (bounded by analysis timeout, future dropped on expiry)
//!     → policy.rs (similarity >= threshold?)
//!     → dedupe.rs → reward provider (best effort, failure only recorded)
//!     → history writer (background, response does not wait)
//!     → AnalysisResult
//! ```
//!
//! # Design Decisions
//! - Exactly one audit record per attempt, including rejected ones
//! - The attempt runs as a tracked task, so a caller that goes away (request
//!   timeout, client disconnect) does not cut it short
//! - No retries; each external call is attempted once
//! - Reward and persistence failures never reach the caller

pub mod dedupe;
pub mod policy;

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::GatewayConfig;
use crate::history::{AuditRecord, HistoryWriter, RequestContext};
use crate::observability::metrics::{self, AnalysisOutcome, RewardOutcome};
use crate::provider::{
    AnalysisProvider, AnalysisRequest, AnalysisResult, Provider, ProviderError, Registry,
    RegistryError, RewardProvider, ANALYSIS_PROVIDER, REWARD_PROVIDER,
};

pub use dedupe::{Claim, RewardDedupe};
pub use policy::RewardPolicy;

/// Failures that end an orchestration attempt.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrchestrationError {
    #[error("{0}")]
    Validation(String),

    #[error("analysis timed out after {millis} ms")]
    UpstreamTimeout { millis: u64 },

    #[error("analysis failed: {0}")]
    Upstream(String),
}

impl OrchestrationError {
    /// Status reported to the caller and stored in the audit record.
    pub fn status_code(&self) -> u16 {
        match self {
            OrchestrationError::Validation(_) => 400,
            OrchestrationError::UpstreamTimeout { .. } | OrchestrationError::Upstream(_) => 500,
        }
    }

    fn outcome(&self) -> AnalysisOutcome {
        match self {
            OrchestrationError::Validation(_) => AnalysisOutcome::Invalid,
            OrchestrationError::UpstreamTimeout { .. } => AnalysisOutcome::Timeout,
            OrchestrationError::Upstream(_) => AnalysisOutcome::UpstreamError,
        }
    }
}

pub struct Orchestrator {
    analysis: Arc<dyn AnalysisProvider>,
    reward: Option<Arc<dyn RewardProvider>>,
    policy: RewardPolicy,
    analysis_timeout: Duration,
    dedupe: RewardDedupe,
    history: HistoryWriter,
}

impl Orchestrator {
    pub fn new(
        analysis: Arc<dyn AnalysisProvider>,
        reward: Option<Arc<dyn RewardProvider>>,
        policy: RewardPolicy,
        analysis_timeout: Duration,
        dedupe: RewardDedupe,
        history: HistoryWriter,
    ) -> Self {
        Self {
            analysis,
            reward,
            policy,
            analysis_timeout,
            dedupe,
            history,
        }
    }

    /// Wire the registered providers to the configured policy.
    ///
    /// The analysis provider is mandatory, the reward provider optional.
    pub fn from_registry(
        registry: &Registry,
        config: &GatewayConfig,
        history: HistoryWriter,
    ) -> Result<Self, RegistryError> {
        let analysis = registry
            .analysis(ANALYSIS_PROVIDER)
            .ok_or(RegistryError::Missing(ANALYSIS_PROVIDER))?;
        let reward = registry.reward(REWARD_PROVIDER);
        if reward.is_none() {
            tracing::info!("Reward provider not registered, rewards disabled");
        }

        Ok(Self::new(
            analysis,
            reward,
            RewardPolicy::new(config.reward.threshold),
            Duration::from_millis(config.analysis.timeout_ms),
            RewardDedupe::new(Duration::from_secs(config.reward.dedupe_window_secs)),
            history,
        ))
    }

    pub fn policy(&self) -> RewardPolicy {
        self.policy
    }

    pub fn history(&self) -> &HistoryWriter {
        &self.history
    }

    /// Run one analysis attempt end to end.
    ///
    /// The attempt is spawned on the history tracker: dropping the returned
    /// future abandons the response only, and the attempt still pays any
    /// reward it earned and writes its audit record.
    pub async fn handle(
        self: &Arc<Self>,
        context: RequestContext,
        request: AnalysisRequest,
    ) -> Result<AnalysisResult, OrchestrationError> {
        let orchestrator = Arc::clone(self);
        let fallback = context.clone();
        let attempt = self
            .history
            .spawn(async move { orchestrator.run(context, request).await });

        match attempt.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(trace_id = %fallback.trace_id, error = %e, "Analysis task aborted");
                Err(self.fail(
                    &fallback,
                    OrchestrationError::Upstream("analysis task failed".to_string()),
                    None,
                ))
            }
        }
    }

    async fn run(
        &self,
        context: RequestContext,
        request: AnalysisRequest,
    ) -> Result<AnalysisResult, OrchestrationError> {
        if let Err(e) = request.validate() {
            let message = match e {
                ProviderError::Validation(msg) => msg,
                other => other.to_string(),
            };
            return Err(self.fail(&context, OrchestrationError::Validation(message), None));
        }

        let started = Instant::now();
        let mut result = match self.analyze(&context.trace_id, &request).await {
            Ok(result) => result,
            Err(e) => return Err(self.fail(&context, e, Some(started))),
        };
        metrics::record_analysis(AnalysisOutcome::Success, Some(started));
        result.tx_id = None;

        let note = self.maybe_reward(&context.trace_id, &request, &mut result).await;

        tracing::info!(
            trace_id = %context.trace_id,
            similarity = result.similarity,
            rewarded = result.tx_id.is_some(),
            reused = note.reused,
            "Analysis completed"
        );
        let mut record = AuditRecord::completed(&context, &result, note.error);
        record.tx_reused = note.reused;
        self.history.record_audit(record);
        Ok(result)
    }

    /// Record an attempt whose body could not be decoded.
    pub fn reject(&self, context: &RequestContext, message: impl Into<String>) -> OrchestrationError {
        self.fail(context, OrchestrationError::Validation(message.into()), None)
    }

    async fn analyze(
        &self,
        trace_id: &str,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, OrchestrationError> {
        let millis = self.analysis_timeout.as_millis() as u64;
        match tokio::time::timeout(self.analysis_timeout, self.analysis.analyze(trace_id, request)).await {
            Err(_) => Err(OrchestrationError::UpstreamTimeout { millis }),
            Ok(Ok(result)) => Ok(result),
            Ok(Err(ProviderError::Timeout { millis, .. })) => {
                Err(OrchestrationError::UpstreamTimeout { millis })
            }
            Ok(Err(ProviderError::Validation(msg))) => Err(OrchestrationError::Validation(msg)),
            Ok(Err(e)) => Err(OrchestrationError::Upstream(e.to_string())),
        }
    }

    /// Attach a reward transaction id when the policy allows. Returns what
    /// the audit record needs to know about the reward.
    async fn maybe_reward(
        &self,
        trace_id: &str,
        request: &AnalysisRequest,
        result: &mut AnalysisResult,
    ) -> RewardNote {
        if !self.policy.should_reward(result.similarity) {
            metrics::record_reward(RewardOutcome::BelowThreshold);
            return RewardNote::default();
        }
        let Some(reward) = &self.reward else {
            metrics::record_reward(RewardOutcome::Disabled);
            return RewardNote::default();
        };

        let key = RewardDedupe::key(&request.image);
        match self.dedupe.claim(key) {
            Claim::Acquired => {}
            Claim::Issued(tx_id) => {
                tracing::info!(trace_id = %trace_id, tx_id = %tx_id, "Reusing reward for resubmitted drawing");
                metrics::record_reward(RewardOutcome::Deduplicated);
                result.tx_id = Some(tx_id);
                return RewardNote {
                    error: None,
                    reused: true,
                };
            }
            Claim::InFlight => {
                tracing::info!(trace_id = %trace_id, "Reward for this drawing already in progress");
                metrics::record_reward(RewardOutcome::Deduplicated);
                return RewardNote {
                    error: Some("reward already in progress for this drawing".to_string()),
                    reused: false,
                };
            }
        }

        match reward.reward(trace_id, result).await {
            Ok(receipt) => {
                tracing::info!(
                    trace_id = %trace_id,
                    provider = reward.name(),
                    tx_id = %receipt.tx_id,
                    units = receipt.units,
                    "Reward sent"
                );
                metrics::record_reward(RewardOutcome::Sent);
                self.dedupe.complete(key, receipt.tx_id.clone());
                result.tx_id = Some(receipt.tx_id);
                RewardNote::default()
            }
            Err(e) => {
                tracing::error!(trace_id = %trace_id, provider = reward.name(), error = %e, "Reward failed");
                metrics::record_reward(RewardOutcome::Failed);
                self.dedupe.release(&key);
                RewardNote {
                    error: Some(e.to_string()),
                    reused: false,
                }
            }
        }
    }

    fn fail(
        &self,
        context: &RequestContext,
        error: OrchestrationError,
        started: Option<Instant>,
    ) -> OrchestrationError {
        tracing::warn!(
            trace_id = %context.trace_id,
            status = error.status_code(),
            error = %error,
            "Analysis request failed"
        );
        metrics::record_analysis(error.outcome(), started);
        self.history
            .record_audit(AuditRecord::failed(context, error.status_code(), error.to_string()));
        error
    }
}

#[derive(Debug, Default)]
struct RewardNote {
    error: Option<String>,
    reused: bool,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("analysis", &self.analysis.name())
            .field("reward", &self.reward.as_ref().map(|r| r.name().to_string()))
            .field("policy", &self.policy)
            .field("analysis_timeout", &self.analysis_timeout)
            .finish()
    }
}

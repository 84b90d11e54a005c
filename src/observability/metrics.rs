//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_analysis_total` (counter): analysis attempts by outcome
//! - `gateway_analysis_duration_seconds` (histogram): upstream latency
//! - `gateway_reward_total` (counter): reward decisions by outcome
//! - `gateway_history_writes_total` (counter): history appends by log and outcome
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Analysis outcome labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Success,
    Invalid,
    Timeout,
    UpstreamError,
}

impl AnalysisOutcome {
    fn label(self) -> &'static str {
        match self {
            AnalysisOutcome::Success => "success",
            AnalysisOutcome::Invalid => "invalid",
            AnalysisOutcome::Timeout => "timeout",
            AnalysisOutcome::UpstreamError => "upstream_error",
        }
    }
}

/// Reward outcome labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardOutcome {
    BelowThreshold,
    Disabled,
    Sent,
    Deduplicated,
    Failed,
}

impl RewardOutcome {
    fn label(self) -> &'static str {
        match self {
            RewardOutcome::BelowThreshold => "below_threshold",
            RewardOutcome::Disabled => "disabled",
            RewardOutcome::Sent => "sent",
            RewardOutcome::Deduplicated => "deduplicated",
            RewardOutcome::Failed => "failed",
        }
    }
}

pub fn record_analysis(outcome: AnalysisOutcome, started: Option<Instant>) {
    metrics::counter!("gateway_analysis_total", "outcome" => outcome.label()).increment(1);
    if let Some(started) = started {
        metrics::histogram!("gateway_analysis_duration_seconds").record(started.elapsed().as_secs_f64());
    }
}

pub fn record_reward(outcome: RewardOutcome) {
    metrics::counter!("gateway_reward_total", "outcome" => outcome.label()).increment(1);
}

pub fn record_history_write(log: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!("gateway_history_writes_total", "log" => log.to_string(), "outcome" => outcome)
        .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_analysis(AnalysisOutcome::Success, Some(Instant::now()));
        record_reward(RewardOutcome::Sent);
        record_history_write("history", false);
        assert_eq!(AnalysisOutcome::Timeout.label(), "timeout");
        assert_eq!(RewardOutcome::BelowThreshold.label(), "below_threshold");
    }
}

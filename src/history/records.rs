//! Records persisted to the daily history files.
//!
//! Key names match the JSON the dashboard already reads, which is why they
//! mix camelCase and snake_case.

use serde::{Deserialize, Serialize};

use crate::classify::Environment;
use crate::provider::AnalysisResult;

/// Connection details of one inbound request, plus its environment class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// RFC 3339 arrival time.
    pub timestamp: String,
    pub trace_id: String,
    pub ip: String,
    pub user_agent: String,
    pub referer: String,
    pub path: String,
    pub environment: Environment,
}

impl RequestContext {
    /// Context stamped with the current local time.
    pub fn now(
        trace_id: impl Into<String>,
        ip: impl Into<String>,
        user_agent: impl Into<String>,
        referer: impl Into<String>,
        path: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            trace_id: trace_id.into(),
            ip: ip.into(),
            user_agent: user_agent.into(),
            referer: referer.into(),
            path: path.into(),
            environment,
        }
    }
}

/// One orchestration attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    #[serde(rename = "traceID")]
    pub trace_id: String,
    pub ip: String,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
    pub referer: String,
    pub path: String,

    pub device: String,
    pub browser: String,
    pub os: String,

    pub similarity: f64,
    pub feedback: String,
    pub feedback_ko: String,
    #[serde(rename = "txId", default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
    /// `tx_id` was issued for an earlier submission of the same drawing.
    #[serde(rename = "txReused", default, skip_serializing_if = "is_false")]
    pub tx_reused: bool,
    /// HTTP status returned to the caller.
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    /// Record for an attempt that produced an analysis result.
    ///
    /// `error` carries a non-fatal problem such as a failed reward.
    pub fn completed(context: &RequestContext, result: &AnalysisResult, error: Option<String>) -> Self {
        let mut record = Self::base(context, 200, error);
        record.similarity = result.similarity;
        record.feedback = result.feedback.clone();
        record.feedback_ko = result.feedback_ko.clone();
        record.tx_id = result.tx_id.clone();
        record
    }

    /// Record for an attempt that ended without a result.
    pub fn failed(context: &RequestContext, status: u16, error: impl Into<String>) -> Self {
        Self::base(context, status, Some(error.into()))
    }

    fn base(context: &RequestContext, status: u16, error: Option<String>) -> Self {
        Self {
            timestamp: context.timestamp.clone(),
            trace_id: context.trace_id.clone(),
            ip: context.ip.clone(),
            user_agent: context.user_agent.clone(),
            referer: context.referer.clone(),
            path: context.path.clone(),
            device: context.environment.device.clone(),
            browser: context.environment.browser.clone(),
            os: context.environment.os.clone(),
            similarity: 0.0,
            feedback: String::new(),
            feedback_ko: String::new(),
            tx_id: None,
            tx_reused: false,
            status,
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A page view reported by the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub timestamp: String,
    #[serde(rename = "traceID")]
    pub trace_id: String,
    pub ip: String,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
    pub referer: String,
    pub path: String,

    pub device: String,
    pub browser: String,
    pub os: String,

    /// Page the visitor landed on, as reported by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

impl VisitRecord {
    pub fn new(context: &RequestContext, page: Option<String>) -> Self {
        Self {
            timestamp: context.timestamp.clone(),
            trace_id: context.trace_id.clone(),
            ip: context.ip.clone(),
            user_agent: context.user_agent.clone(),
            referer: context.referer.clone(),
            path: context.path.clone(),
            device: context.environment.device.clone(),
            browser: context.environment.browser.clone(),
            os: context.environment.os.clone(),
            page: page.filter(|p| !p.trim().is_empty()),
        }
    }
}

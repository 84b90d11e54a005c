//! HTTP client for the drawing analysis service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::AnalysisConfig;
use crate::http::TRACE_ID_HEADER;
use crate::provider::{
    AnalysisProvider, AnalysisRequest, AnalysisResult, Provider, ProviderError, ProviderResult,
    ANALYSIS_PROVIDER,
};

/// Response bodies the analysis service is known to produce.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnalysisResponse {
    /// `{ "status": "...", "data": { ... } }`
    Envelope {
        #[serde(default)]
        status: Option<String>,
        data: AnalysisResult,
    },
    /// The result object itself.
    Bare(AnalysisResult),
}

impl AnalysisResponse {
    fn into_result(self) -> AnalysisResult {
        let mut result = match self {
            AnalysisResponse::Envelope { status, data } => {
                tracing::trace!(status = ?status, "Unwrapped analysis envelope");
                data
            }
            AnalysisResponse::Bare(result) => result,
        };
        // Only this gateway decides whether a reward happened.
        result.tx_id = None;
        result
    }
}

/// Calls `POST {base_url}{endpoint_path}` with `{ "image": ... }`.
#[derive(Debug, Clone)]
pub struct HttpAnalysisProvider {
    client: reqwest::Client,
    endpoint: url::Url,
    timeout: Duration,
}

impl HttpAnalysisProvider {
    pub fn new(endpoint: url::Url, timeout: Duration) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Upstream(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> ProviderResult<Self> {
        let base = config.base_url.trim_end_matches('/');
        let endpoint = format!("{}{}", base, config.endpoint_path)
            .parse::<url::Url>()
            .map_err(|e| ProviderError::Validation(format!("invalid analysis endpoint: {}", e)))?;

        Self::new(endpoint, Duration::from_millis(config.timeout_ms))
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

impl Provider for HttpAnalysisProvider {
    fn name(&self) -> &str {
        ANALYSIS_PROVIDER
    }
}

#[async_trait]
impl AnalysisProvider for HttpAnalysisProvider {
    async fn analyze(&self, trace_id: &str, request: &AnalysisRequest) -> ProviderResult<AnalysisResult> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(TRACE_ID_HEADER, trace_id)
            .json(&serde_json::json!({ "image": request.image }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        provider: ANALYSIS_PROVIDER.to_string(),
                        millis: self.timeout.as_millis() as u64,
                    }
                } else {
                    tracing::error!(provider = ANALYSIS_PROVIDER, trace_id, error = %e, "Analysis service connection failed");
                    ProviderError::Upstream(format!("analysis service unreachable: {}", e))
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(provider = ANALYSIS_PROVIDER, trace_id, status = %status, "Analysis service returned non-success status");
            return Err(ProviderError::Upstream(format!(
                "analysis service returned status: {}",
                status.as_u16()
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    provider: ANALYSIS_PROVIDER.to_string(),
                    millis: self.timeout.as_millis() as u64,
                }
            } else {
                ProviderError::Upstream(format!("failed to read analysis body: {}", e))
            }
        })?;

        let parsed: AnalysisResponse =
            serde_json::from_slice(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        let result = parsed.into_result();

        if !result.similarity.is_finite() {
            return Err(ProviderError::Decode("similarity is not a finite number".to_string()));
        }

        tracing::debug!(provider = ANALYSIS_PROVIDER, trace_id, similarity = result.similarity, "Analysis complete");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_bare_result() {
        let body = r#"{"similarity": 87.5, "feedback": "Close", "feedback_ko": "거의"}"#;
        let result = serde_json::from_str::<AnalysisResponse>(body).unwrap().into_result();
        assert_eq!(result.similarity, 87.5);
        assert_eq!(result.feedback, "Close");
        assert!(result.tx_id.is_none());
    }

    #[test]
    fn test_decodes_envelope() {
        let body = r#"{"status":"success","data":{"similarity": 12, "feedback": "Try again", "feedback_ko": "다시"}}"#;
        let result = serde_json::from_str::<AnalysisResponse>(body).unwrap().into_result();
        assert_eq!(result.similarity, 12.0);
        assert_eq!(result.feedback_ko, "다시");
    }

    #[test]
    fn test_upstream_tx_id_is_discarded() {
        let body = r#"{"similarity": 99, "tx_id": "0xforged"}"#;
        let result = serde_json::from_str::<AnalysisResponse>(body).unwrap().into_result();
        assert!(result.tx_id.is_none());
    }

    #[test]
    fn test_rejects_missing_similarity() {
        assert!(serde_json::from_str::<AnalysisResponse>(r#"{"feedback":"x"}"#).is_err());
    }

    #[test]
    fn test_endpoint_join() {
        let config = AnalysisConfig {
            base_url: "http://ai:8080/".to_string(),
            ..AnalysisConfig::default()
        };
        let provider = HttpAnalysisProvider::from_config(&config).unwrap();
        assert_eq!(provider.endpoint().as_str(), "http://ai:8080/api/spring/v1/analyze");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_upstream_error() {
        let provider = HttpAnalysisProvider::new(
            "http://127.0.0.1:9/analyze".parse().unwrap(),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = provider.analyze("trace", &AnalysisRequest::new("img")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Upstream(_) | ProviderError::Timeout { .. }));
    }
}

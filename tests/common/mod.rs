//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

use drawing_gateway::classify::KeywordClassifier;
use drawing_gateway::config::GatewayConfig;
use drawing_gateway::history::{DailyLog, HistoryWriter};
use drawing_gateway::http::{build_router, AppState};
use drawing_gateway::orchestrator::{Orchestrator, RewardDedupe, RewardPolicy};
use drawing_gateway::provider::{
    AnalysisResult, HttpAnalysisProvider, Provider, ProviderError, ProviderResult, RewardProvider,
    RewardReceipt,
};

pub const ANALYZE_PATH: &str = "/api/spring/v1/analyze";

/// Scripted reply of the mock analysis service.
#[derive(Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(similarity: f64) -> Self {
        Self {
            status: 200,
            body: serde_json::json!({
                "similarity": similarity,
                "feedback": "Clean lines",
                "feedback_ko": "선이 깔끔해요",
            }),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": "boom" }),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct MockState {
    reply: Reply,
    calls: Arc<AtomicUsize>,
    cancelled: Arc<AtomicUsize>,
    traces: Arc<Mutex<Vec<String>>>,
}

/// A running mock analysis service.
pub struct MockAnalysis {
    pub addr: SocketAddr,
    pub calls: Arc<AtomicUsize>,
    /// Handler invocations dropped before they replied.
    pub cancelled: Arc<AtomicUsize>,
    pub traces: Arc<Mutex<Vec<String>>>,
}

impl MockAnalysis {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Counts a handler as cancelled unless it is disarmed before drop.
struct CancelGuard {
    cancelled: Arc<AtomicUsize>,
    armed: bool,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.armed {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

async fn mock_analyze(State(state): State<MockState>, headers: HeaderMap, Json(_body): Json<Value>) -> (StatusCode, Json<Value>) {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let mut guard = CancelGuard {
        cancelled: state.cancelled.clone(),
        armed: true,
    };
    if let Some(trace) = headers.get("x-trace-id").and_then(|v| v.to_str().ok()) {
        state.traces.lock().unwrap().push(trace.to_string());
    }
    tokio::time::sleep(state.reply.delay).await;
    guard.armed = false;
    let status = StatusCode::from_u16(state.reply.status).unwrap();
    (status, Json(state.reply.body.clone()))
}

/// Start a mock analysis service on an ephemeral port.
pub async fn start_mock_analysis(reply: Reply) -> MockAnalysis {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let cancelled = Arc::new(AtomicUsize::new(0));
    let traces = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route(ANALYZE_PATH, post(mock_analyze))
        .with_state(MockState {
            reply,
            calls: calls.clone(),
            cancelled: cancelled.clone(),
            traces: traces.clone(),
        });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockAnalysis {
        addr,
        calls,
        cancelled,
        traces,
    }
}

/// Reward provider that counts calls and optionally fails.
pub struct CountingReward {
    fail: bool,
    calls: AtomicUsize,
}

impl CountingReward {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Provider for CountingReward {
    fn name(&self) -> &str {
        "reward"
    }
}

#[async_trait]
impl RewardProvider for CountingReward {
    async fn reward(&self, _trace_id: &str, _result: &AnalysisResult) -> ProviderResult<RewardReceipt> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Upstream("chain endpoint unreachable".to_string()));
        }
        Ok(RewardReceipt {
            tx_id: format!("0x{:064x}", n + 1),
            units: 10,
        })
    }
}

/// Router wired to a temporary history directory.
pub struct TestGateway {
    pub router: Router,
    pub history: HistoryWriter,
    pub config: GatewayConfig,
    _dir: TempDir,
}

pub struct GatewayOptions {
    pub analysis_base_url: String,
    pub threshold: f64,
    pub timeout_ms: u64,
    pub request_secs: u64,
    pub reward: Option<Arc<dyn RewardProvider>>,
}

impl GatewayOptions {
    pub fn new(analysis_base_url: impl Into<String>) -> Self {
        Self {
            analysis_base_url: analysis_base_url.into(),
            threshold: 95.0,
            timeout_ms: 2_000,
            request_secs: 60,
            reward: None,
        }
    }
}

pub fn gateway(options: GatewayOptions) -> TestGateway {
    let dir = tempfile::tempdir().unwrap();

    let mut config = GatewayConfig::default();
    config.analysis.base_url = options.analysis_base_url;
    config.analysis.timeout_ms = options.timeout_ms;
    config.timeouts.request_secs = options.request_secs;
    config.reward.threshold = options.threshold;
    config.history.data_dir = dir.path().to_string_lossy().into_owned();

    let history = HistoryWriter::new(
        DailyLog::new(dir.path(), config.history.audit_prefix.clone()),
        DailyLog::new(dir.path(), config.history.visit_prefix.clone()),
    );
    let analysis = Arc::new(HttpAnalysisProvider::from_config(&config.analysis).unwrap());
    let orchestrator = Orchestrator::new(
        analysis,
        options.reward,
        RewardPolicy::new(config.reward.threshold),
        Duration::from_millis(config.analysis.timeout_ms),
        RewardDedupe::new(Duration::from_secs(config.reward.dedupe_window_secs)),
        history.clone(),
    );
    let state = AppState::new(
        orchestrator,
        Arc::new(KeywordClassifier),
        vec!["analysis".to_string(), "reward".to_string()],
    );

    TestGateway {
        router: build_router(state, &config),
        history,
        config,
        _dir: dir,
    }
}

/// Read a JSON response body.
pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

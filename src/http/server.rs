//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (trace id, tracing, CORS, body limit, timeout)
//! - Serve plain TCP or TLS until shutdown

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::classify::EnvironmentClassifier;
use crate::config::GatewayConfig;
use crate::history::HistoryWriter;
use crate::http::handlers;
use crate::http::TRACE_ID_HEADER;
use crate::lifecycle::Shutdown;
use crate::orchestrator::Orchestrator;

/// Grace period for open TLS connections after shutdown is triggered.
const TLS_GRACE: Duration = Duration::from_secs(30);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub history: HistoryWriter,
    pub classifier: Arc<dyn EnvironmentClassifier>,
    pub providers: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(
        orchestrator: Orchestrator,
        classifier: Arc<dyn EnvironmentClassifier>,
        providers: Vec<String>,
    ) -> Self {
        let history = orchestrator.history().clone();
        Self {
            orchestrator: Arc::new(orchestrator),
            history,
            classifier,
            providers: Arc::new(providers),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    // A wildcard cannot go into an origin list once credentials are allowed.
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(v) if v != "*" => Some(v),
            _ => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let trace_header = HeaderName::from_static(TRACE_ID_HEADER);

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, trace_header.clone()])
        .expose_headers([trace_header])
        .allow_credentials(true)
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let trace_header = HeaderName::from_static(TRACE_ID_HEADER);

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(trace_header.clone(), MakeRequestUuid))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            let trace_id = req
                .headers()
                .get(TRACE_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %req.method(),
                path = %req.uri().path(),
                trace_id = %trace_id,
            )
        }))
        .layer(PropagateRequestIdLayer::new(trace_header))
        .layer(cors_layer(&config.security.allowed_origins))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

    Router::new()
        .route("/api/v1/analyze", post(handlers::analyze))
        .route("/visit", post(handlers::record_visit))
        .route("/visits/dates", get(handlers::visit_dates))
        .route("/visits/{date}", get(handlers::visits_for_day))
        .route("/history/dates", get(handlers::history_dates))
        .route("/history/{date}", get(handlers::history_for_day))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(config.security.max_body_size))
        .with_state(state)
        .layer(middleware)
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    pub fn new(state: AppState, config: &GatewayConfig) -> Self {
        Self {
            router: build_router(state, config),
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires, then let
    /// in-flight requests finish.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.signalled())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: axum_server::tls_rustls::RustlsConfig,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let signal_handle = handle.clone();
        let signalled = shutdown.signalled();
        tokio::spawn(async move {
            signalled.await;
            signal_handle.graceful_shutdown(Some(TLS_GRACE));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

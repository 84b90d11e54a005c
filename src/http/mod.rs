//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, trace id, CORS, limits)
//!     → context.rs (client address, user agent, environment class)
//!     → handlers.rs (analyze → orchestrator, visit → history writer, reads)
//!     → error.rs ({ "error": msg } bodies)
//! ```

pub mod context;
pub mod error;
pub mod handlers;
pub mod server;
pub mod tls;

/// Header carrying the correlation id, inbound and outbound.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

pub use error::ApiError;
pub use server::{build_router, AppState, GatewayServer};

//! Drawing analysis gateway.
//!
//! Accepts a drawing, scores it through an external analysis service, pays a
//! token reward when the score clears a threshold, and keeps a per-day audit
//! trail of every attempt.

pub mod blockchain;
pub mod classify;
pub mod config;
pub mod history;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod provider;

pub use config::schema::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use orchestrator::Orchestrator;

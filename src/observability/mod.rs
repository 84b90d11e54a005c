//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, trace_id on every request span)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Trace ID flows from the inbound header to the analysis call and history
//! - Metrics are cheap (atomic increments) and optional

pub mod logging;
pub mod metrics;

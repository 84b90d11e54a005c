//! Request history subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator / visit handler
//!     → records.rs (AuditRecord, VisitRecord built from RequestContext)
//!     → writer.rs (tracked background task, response already sent)
//!     → store.rs (lock → read day → append → atomic rewrite)
//!
//! Read handlers
//!     → store.rs (read day / list days)
//! ```
//!
//! # Design Decisions
//! - One file per calendar day and prefix, full rewrite per append
//! - Write failures are logged and counted, never returned to clients
//! - Shutdown drains the writer so accepted records reach disk

pub mod records;
pub mod store;
pub mod writer;

pub use records::{AuditRecord, RequestContext, VisitRecord};
pub use store::{parse_day, DailyLog, HistoryError, HistoryResult, DAY_FORMAT};
pub use writer::HistoryWriter;

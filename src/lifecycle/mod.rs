//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → server stops accepting → in-flight requests finish
//!     → history writer drains → exit
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, finish requests, flush history
//! - The history drain has a deadline; records still pending after it are lost

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;

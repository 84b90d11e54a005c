//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Config / environment (private key, RPC URL, token, recipient)
//!     → wallet.rs (key loading, nonce tracking, signing)
//!     → client.rs (RPC connection with timeouts)
//!     → transaction.rs (encode, build, sign, broadcast)
//! ```
//!
//! # Security Constraints
//! - Private keys are never logged or serialized
//! - All RPC calls have configurable timeouts
//! - A failed transfer never blocks the analysis response

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::ChainClient;
pub use transaction::{encode_transfer, scale_units, TransferBuilder};
pub use types::{BlockchainError, BlockchainResult, ChainId};
pub use wallet::Wallet;

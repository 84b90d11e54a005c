//! Chain-specific types and error definitions.

use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur while building and sending a reward transfer.
///
/// Each variant names the step that failed so the audit trail can tell them apart.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Endpoint URL unusable or connection refused.
    #[error("Connection error: {0}")]
    Connect(String),

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Nonce lookup failed.
    #[error("Nonce error: {0}")]
    Nonce(String),

    /// Gas price suggestion failed.
    #[error("Gas price error: {0}")]
    GasPrice(String),

    /// Chain identifier lookup failed.
    #[error("Chain ID error: {0}")]
    ChainId(String),

    /// Signing the assembled transaction failed.
    #[error("Signing error: {0}")]
    Signing(String),

    /// The endpoint refused the raw transaction.
    #[error("Broadcast error: {0}")]
    Broadcast(String),

    /// RPC request timed out.
    #[error("RPC timeout after {secs} seconds during {step}")]
    Timeout { step: &'static str, secs: u64 },
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

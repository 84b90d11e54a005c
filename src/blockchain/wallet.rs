//! Wallet management and transaction signing.
//!
//! # Security
//! - Private keys come from config placeholders or environment variables
//! - Keys are never logged or serialized

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Signing account.
///
/// Keeps the nonce of the last transfer it built, always taken from the
/// endpoint's pending count.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    nonce: Arc<AtomicU64>,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        if key_hex.is_empty() {
            return Err(BlockchainError::Wallet("Private key is empty".to_string()));
        }

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::info!(address = %signer.address(), "Reward wallet initialized");

        Ok(Self {
            signer,
            nonce: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sync to the chain's pending nonce, in either direction.
    pub fn set_nonce(&self, nonce: u64) {
        self.nonce.store(nonce, Ordering::SeqCst);
    }

    /// Nonce of the most recently built transfer.
    pub fn nonce(&self) -> u64 {
        self.nonce.load(Ordering::SeqCst)
    }

    /// Network wallet used to sign transaction envelopes.
    pub fn network_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("nonce", &self.nonce())
            .finish()
    }
}

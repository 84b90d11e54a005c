//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint
//! - Query the account state a transfer needs (pending nonce, gas price, chain id)
//! - Submit signed raw transactions
//! - Bound every call with the configured timeout

use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId};

/// Blockchain RPC client wrapper.
#[derive(Clone)]
pub struct ChainClient {
    provider: Arc<dyn Provider + Send + Sync>,
    rpc_url: String,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl ChainClient {
    /// Create a new client for the given endpoint.
    ///
    /// No request is made here; an unreachable endpoint surfaces on the first call.
    pub fn new(rpc_url: &str, timeout_secs: u64) -> BlockchainResult<Self> {
        let url: url::Url = rpc_url.parse().map_err(|e| {
            BlockchainError::Connect(format!("Invalid RPC URL '{}': {}", rpc_url, e))
        })?;

        let provider = Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>;

        Ok(Self {
            provider,
            rpc_url: rpc_url.to_string(),
            timeout_duration: Duration::from_secs(timeout_secs),
        })
    }

    async fn bounded<F, T, E>(&self, step: &'static str, fut: F, map_err: fn(String) -> BlockchainError) -> BlockchainResult<T>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(rpc_url = %self.rpc_url, step, error = %e, "RPC error");
                Err(map_err(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(rpc_url = %self.rpc_url, step, "RPC timeout");
                Err(BlockchainError::Timeout {
                    step,
                    secs: self.timeout_duration.as_secs(),
                })
            }
        }
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        self.bounded("chain_id", self.provider.get_chain_id(), BlockchainError::ChainId)
            .await
            .map(ChainId)
    }

    /// Get the next nonce for an address, counting transactions still in the mempool.
    pub async fn get_pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        self.bounded(
            "nonce",
            self.provider.get_transaction_count(address).pending(),
            BlockchainError::Nonce,
        )
        .await
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> BlockchainResult<u128> {
        self.bounded("gas_price", self.provider.get_gas_price(), BlockchainError::GasPrice)
            .await
    }

    /// Broadcast an already signed, EIP-2718 encoded transaction.
    ///
    /// Returns once the endpoint has accepted it; no confirmation is awaited.
    pub async fn send_raw_transaction(&self, encoded: &[u8]) -> BlockchainResult<TxHash> {
        let pending = self
            .bounded(
                "broadcast",
                self.provider.send_raw_transaction(encoded),
                BlockchainError::Broadcast,
            )
            .await?;
        Ok(*pending.tx_hash())
    }

    /// The configured endpoint URL.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("rpc_url", &self.rpc_url)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

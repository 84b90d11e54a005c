//! Token transfer building, signing, and broadcast.
//!
//! # Responsibilities
//! - Encode ERC-20 `transfer(address,uint256)` call data
//! - Resolve nonce, gas price and chain id from the endpoint
//! - Sign under the endpoint's chain id (EIP-155) and broadcast
//!
//! No retries and no confirmation wait: any failed step aborts the transfer.

use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::SolCall;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::blockchain::wallet::Wallet;

sol! {
    /// Standard ERC-20 transfer.
    function transfer(address to, uint256 amount) external returns (bool);
}

/// Encode the call data for `transfer(to, amount)`.
///
/// Layout: 4-byte selector, 32-byte left-padded recipient, 32-byte amount.
pub fn encode_transfer(to: Address, amount: U256) -> Bytes {
    transferCall { to, amount }.abi_encode().into()
}

/// Scale a whole-token quantity by the token's fixed-point precision.
pub fn scale_units(units: u64, decimals: u8) -> U256 {
    U256::from(units) * U256::from(10u64).pow(U256::from(decimals))
}

/// Builds and broadcasts token transfers from one wallet.
///
/// Transfers are serialized: the nonce is read from the endpoint's pending
/// count and held until the broadcast settles, so a refused transfer leaves
/// no gap for the next one.
#[derive(Clone, Debug)]
pub struct TransferBuilder {
    client: ChainClient,
    wallet: Wallet,
    token: Address,
    gas_limit: u64,
    send_lock: Arc<Mutex<()>>,
}

impl TransferBuilder {
    /// Create a new transfer builder for `token`.
    pub fn new(client: ChainClient, wallet: Wallet, token: Address, gas_limit: u64) -> Self {
        Self {
            client,
            wallet,
            token,
            gas_limit,
            send_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Assemble an unsigned legacy transaction calling `transfer(to, amount)`.
    pub async fn build(&self, to: Address, amount: U256) -> BlockchainResult<TransactionRequest> {
        let nonce = self.client.get_pending_nonce(self.wallet.address()).await?;
        let gas_price = self.client.get_gas_price().await?;
        let chain_id = self.client.get_chain_id().await?;
        self.wallet.set_nonce(nonce);

        let tx = TransactionRequest::default()
            .with_from(self.wallet.address())
            .with_to(self.token)
            .with_value(U256::ZERO)
            .with_input(encode_transfer(to, amount))
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_chain_id(chain_id.0)
            .with_gas_limit(self.gas_limit);

        Ok(tx)
    }

    /// Build, sign and broadcast a transfer. Returns the transaction hash once
    /// the endpoint accepts it.
    pub async fn send_transfer(&self, to: Address, amount: U256) -> BlockchainResult<TxHash> {
        let _guard = self.send_lock.lock().await;

        let tx = self.build(to, amount).await?;
        let nonce = tx.nonce.unwrap_or_default();

        let envelope = tx
            .build(&self.wallet.network_wallet())
            .await
            .map_err(|e| BlockchainError::Signing(e.to_string()))?;

        let hash = self.client.send_raw_transaction(&envelope.encoded_2718()).await?;
        tracing::info!(tx_hash = %hash, nonce, token = %self.token, "Transfer broadcast");
        Ok(hash)
    }

    /// Address the tokens are sent from.
    pub fn sender(&self) -> Address {
        self.wallet.address()
    }
}

//! Token reward provider backed by an ERC-20 transfer.

use alloy::primitives::Address;
use async_trait::async_trait;
use rand::Rng;

use crate::blockchain::{scale_units, BlockchainError, ChainClient, TransferBuilder, Wallet};
use crate::config::RewardConfig;
use crate::provider::{
    AnalysisResult, Provider, ProviderError, ProviderResult, RewardProvider, RewardReceipt,
    REWARD_PROVIDER,
};

/// Sends a random whole-token amount to a fixed recipient.
#[derive(Debug, Clone)]
pub struct ChainRewardProvider {
    builder: TransferBuilder,
    recipient: Address,
    min_units: u64,
    max_units: u64,
    decimals: u8,
}

impl ChainRewardProvider {
    pub fn new(
        builder: TransferBuilder,
        recipient: Address,
        min_units: u64,
        max_units: u64,
        decimals: u8,
    ) -> Self {
        Self {
            builder,
            recipient,
            min_units: min_units.max(1),
            max_units: max_units.max(min_units.max(1)),
            decimals,
        }
    }

    pub fn from_config(config: &RewardConfig) -> ProviderResult<Self> {
        let client = ChainClient::new(&config.rpc_url, config.rpc_timeout_secs)?;
        let wallet = Wallet::from_private_key(&config.private_key)?;
        let token: Address = config
            .token_contract_address
            .parse()
            .map_err(|e| ProviderError::Validation(format!("invalid token contract address: {}", e)))?;
        let recipient: Address = config
            .recipient_address
            .parse()
            .map_err(|e| ProviderError::Validation(format!("invalid recipient address: {}", e)))?;

        let builder = TransferBuilder::new(client, wallet, token, config.gas_limit);
        Ok(Self::new(
            builder,
            recipient,
            config.min_units,
            config.max_units,
            config.token_decimals,
        ))
    }

    /// Uniformly random quantity in `[min_units, max_units]`.
    fn pick_units(&self) -> u64 {
        rand::thread_rng().gen_range(self.min_units..=self.max_units)
    }
}

impl Provider for ChainRewardProvider {
    fn name(&self) -> &str {
        REWARD_PROVIDER
    }
}

#[async_trait]
impl RewardProvider for ChainRewardProvider {
    async fn reward(&self, trace_id: &str, result: &AnalysisResult) -> ProviderResult<RewardReceipt> {
        let units = self.pick_units();
        let amount = scale_units(units, self.decimals);

        tracing::info!(
            provider = REWARD_PROVIDER,
            trace_id,
            similarity = result.similarity,
            units,
            recipient = %self.recipient,
            "Starting reward transfer"
        );

        let tx_hash = self
            .builder
            .send_transfer(self.recipient, amount)
            .await
            .map_err(|e: BlockchainError| {
                tracing::warn!(provider = REWARD_PROVIDER, trace_id, error = %e, "Reward transfer failed");
                ProviderError::Reward(e)
            })?;

        tracing::info!(provider = REWARD_PROVIDER, trace_id, tx_hash = %tx_hash, units, "Reward transfer accepted");

        Ok(RewardReceipt {
            tx_id: tx_hash.to_string(),
            units,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config() -> RewardConfig {
        RewardConfig {
            enabled: true,
            rpc_url: "http://127.0.0.1:9".to_string(),
            token_contract_address: "0xe211Fd7FD662125038Ce33D993A7e791DF67BB6F".to_string(),
            recipient_address: "0x526b0FFA23DbB9980cc0e2E54dB5299Ed05B4861".to_string(),
            private_key: TEST_KEY.to_string(),
            rpc_timeout_secs: 2,
            ..RewardConfig::default()
        }
    }

    #[test]
    fn test_units_stay_in_range() {
        let mut cfg = config();
        cfg.min_units = 3;
        cfg.max_units = 5;
        let provider = ChainRewardProvider::from_config(&cfg).unwrap();
        for _ in 0..200 {
            let units = provider.pick_units();
            assert!((3..=5).contains(&units));
        }
    }

    #[test]
    fn test_invalid_recipient() {
        let mut cfg = config();
        cfg.recipient_address = "0x1234".to_string();
        let err = ChainRewardProvider::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("recipient"));
    }

    #[tokio::test]
    async fn test_unreachable_chain_is_reward_error() {
        let provider = ChainRewardProvider::from_config(&config()).unwrap();
        let result = AnalysisResult {
            similarity: 99.0,
            feedback: String::new(),
            feedback_ko: String::new(),
            tx_id: None,
        };
        let err = provider.reward("trace", &result).await.unwrap_err();
        assert!(matches!(err, ProviderError::Reward(_)));
    }
}

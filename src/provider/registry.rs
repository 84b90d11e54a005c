//! Name-keyed provider registry.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::config::GatewayConfig;
use crate::provider::analysis::HttpAnalysisProvider;
use crate::provider::reward::ChainRewardProvider;
use crate::provider::{AnalysisProvider, Provider, ProviderError, RewardProvider};

/// Startup failures while assembling providers.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no providers enabled")]
    Empty,

    #[error("required provider '{0}' is not registered")]
    Missing(&'static str),

    #[error("failed to build provider '{name}': {source}")]
    Build {
        name: &'static str,
        #[source]
        source: ProviderError,
    },
}

/// A registered provider, tagged by capability.
#[derive(Clone)]
pub enum RegisteredProvider {
    Analysis(Arc<dyn AnalysisProvider>),
    Reward(Arc<dyn RewardProvider>),
}

impl RegisteredProvider {
    pub fn name(&self) -> &str {
        match self {
            RegisteredProvider::Analysis(p) => p.name(),
            RegisteredProvider::Reward(p) => p.name(),
        }
    }

    /// Capability label used in logs and the health endpoint.
    pub fn kind(&self) -> &'static str {
        match self {
            RegisteredProvider::Analysis(_) => "analysis",
            RegisteredProvider::Reward(_) => "reward",
        }
    }
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Process-lifetime mapping from provider name to provider.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    providers: HashMap<String, RegisteredProvider>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every provider whose config section is enabled.
    ///
    /// Fails when nothing is enabled; that is a configuration error, not a request error.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        if config.analysis.enabled {
            let provider = HttpAnalysisProvider::from_config(&config.analysis).map_err(|source| {
                RegistryError::Build {
                    name: crate::provider::ANALYSIS_PROVIDER,
                    source,
                }
            })?;
            registry.register(RegisteredProvider::Analysis(Arc::new(provider)));
        }

        if config.reward.enabled {
            let provider = ChainRewardProvider::from_config(&config.reward).map_err(|source| {
                RegistryError::Build {
                    name: crate::provider::REWARD_PROVIDER,
                    source,
                }
            })?;
            registry.register(RegisteredProvider::Reward(Arc::new(provider)));
        }

        if registry.is_empty() {
            return Err(RegistryError::Empty);
        }

        tracing::info!(count = registry.len(), names = ?registry.names(), "Providers initialized");
        Ok(registry)
    }

    /// Register a provider, replacing any previous one with the same name.
    pub fn register(&mut self, provider: RegisteredProvider) {
        let name = provider.name().to_string();
        if self.providers.insert(name.clone(), provider).is_some() {
            tracing::debug!(provider = %name, "Replaced provider with duplicate name");
        }
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredProvider> {
        self.providers.get(name)
    }

    pub fn all(&self) -> &HashMap<String, RegisteredProvider> {
        &self.providers
    }

    /// Analysis provider registered under `name`, if it has that capability.
    pub fn analysis(&self, name: &str) -> Option<Arc<dyn AnalysisProvider>> {
        match self.providers.get(name)? {
            RegisteredProvider::Analysis(p) => Some(p.clone()),
            RegisteredProvider::Reward(_) => None,
        }
    }

    /// Reward provider registered under `name`, if it has that capability.
    pub fn reward(&self, name: &str) -> Option<Arc<dyn RewardProvider>> {
        match self.providers.get(name)? {
            RegisteredProvider::Reward(p) => Some(p.clone()),
            RegisteredProvider::Analysis(_) => None,
        }
    }

    /// Sorted provider names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AnalysisRequest, AnalysisResult, ProviderResult, RewardReceipt};
    use async_trait::async_trait;

    struct Fixed(&'static str, f64);

    impl Provider for Fixed {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[async_trait]
    impl AnalysisProvider for Fixed {
        async fn analyze(&self, _trace_id: &str, _request: &AnalysisRequest) -> ProviderResult<AnalysisResult> {
            Ok(AnalysisResult {
                similarity: self.1,
                feedback: String::new(),
                feedback_ko: String::new(),
                tx_id: None,
            })
        }
    }

    struct Payout;

    impl Provider for Payout {
        fn name(&self) -> &str {
            "reward"
        }
    }

    #[async_trait]
    impl RewardProvider for Payout {
        async fn reward(&self, _trace_id: &str, _result: &AnalysisResult) -> ProviderResult<RewardReceipt> {
            Ok(RewardReceipt {
                tx_id: "0x01".to_string(),
                units: 1,
            })
        }
    }

    #[tokio::test]
    async fn test_register_overwrites_by_name() {
        let mut registry = Registry::new();
        registry.register(RegisteredProvider::Analysis(Arc::new(Fixed("analysis", 1.0))));
        registry.register(RegisteredProvider::Analysis(Arc::new(Fixed("analysis", 2.0))));
        assert_eq!(registry.len(), 1);

        let provider = registry.analysis("analysis").unwrap();
        let result = provider.analyze("t", &AnalysisRequest::new("x")).await.unwrap();
        assert_eq!(result.similarity, 2.0);
    }

    #[test]
    fn test_typed_lookup_respects_capability() {
        let mut registry = Registry::new();
        registry.register(RegisteredProvider::Reward(Arc::new(Payout)));
        assert!(registry.reward("reward").is_some());
        assert!(registry.analysis("reward").is_none());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.get("reward").unwrap().kind(), "reward");
        assert_eq!(registry.all().len(), 1);
    }

    #[test]
    fn test_from_config_requires_a_provider() {
        let mut config = GatewayConfig::default();
        config.analysis.enabled = false;
        config.reward.enabled = false;
        assert!(matches!(Registry::from_config(&config), Err(RegistryError::Empty)));
    }

    #[test]
    fn test_from_config_default_registers_analysis() {
        let registry = Registry::from_config(&GatewayConfig::default()).unwrap();
        assert_eq!(registry.names(), vec!["analysis".to_string()]);
    }

    #[test]
    fn test_from_config_reward_without_key_fails() {
        let mut config = GatewayConfig::default();
        config.reward.enabled = true;
        config.reward.token_contract_address = "0xe211Fd7FD662125038Ce33D993A7e791DF67BB6F".to_string();
        config.reward.recipient_address = "0x526b0FFA23DbB9980cc0e2E54dB5299Ed05B4861".to_string();
        config.reward.private_key = String::new();
        let err = Registry::from_config(&config).unwrap_err();
        assert!(matches!(err, RegistryError::Build { name: "reward", .. }));
    }
}

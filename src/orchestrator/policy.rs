//! Reward eligibility.

/// Similarity cut-off for reward payouts, on the analysis service's 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardPolicy {
    threshold: f64,
}

impl RewardPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `true` when `similarity` is at or above the threshold. NaN never qualifies.
    pub fn should_reward(&self, similarity: f64) -> bool {
        similarity.is_finite() && similarity >= self.threshold
    }
}

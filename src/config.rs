//! Sampler settings, loadable from JSON or any other serde format.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::weights::WeightTable;

/// Serializable sampler settings.
///
/// ```
/// use jobsample::SamplerConfig;
///
/// let cfg: SamplerConfig =
///     serde_json::from_str(r#"{"k": 100, "weights": {"11": 1.0, "13": 2.0}, "seed": 42}"#)
///         .unwrap();
/// assert_eq!(cfg.k, 100);
/// assert_eq!(cfg.weights.unwrap().weight_of("13"), 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    /// Target sample size per pass.
    pub k: usize,
    /// Per-category weights; `None` means uniform sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<WeightTable>,
    /// Seed for reproducible passes; `None` draws from the thread RNG.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl SamplerConfig {
    /// Uniform, unseeded sampling of `k` records.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            weights: None,
            seed: None,
        }
    }

    /// Sample with per-category weights.
    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Seed every pass for reproducible samples.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check settings that do not depend on the source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k == 0 {
            return Err(ConfigError::ZeroSampleSize);
        }
        Ok(())
    }
}

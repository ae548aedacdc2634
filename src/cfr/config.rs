//! Configuration options for the CFR+ engines.
//!
//! This module provides the configuration struct that controls how the
//! engines initialize and accumulate, plus the statistics they report.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the CFR+ engines.
///
/// # Example
/// ```
/// use cfr_plus::cfr::CfrConfig;
///
/// let config = CfrConfig::default();
/// assert!(config.initial_evaluation);
/// assert_eq!(config.epsilon, 0.0);
/// assert!(config.use_cfr_plus); // CFR+ is enabled by default
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfrConfig {
    /// Run one non-accumulating pass right after construction.
    ///
    /// This fills every info set's instantaneous regret, so metrics are
    /// meaningful before the first training iteration.
    pub initial_evaluation: bool,

    /// Epsilon-soft exploration in `[0, 1)`.
    ///
    /// The strategy used to walk the tree and compute regrets gives every
    /// action at least `epsilon / k`. The cumulative strategy is always
    /// accumulated from the plain regret-matching strategy.
    pub epsilon: f64,

    /// Starting value of every cumulative regret for newly discovered info
    /// sets. Zero unless deliberately warm-starting.
    pub initial_regret: f64,

    /// Number of training iterations before strategy accumulation starts.
    ///
    /// Early iterations play poor strategies; skipping them in the average
    /// speeds convergence.
    pub strategy_delay: u64,

    /// Clip cumulative regrets at zero after every update (CFR+).
    ///
    /// When false the engines run plain CFR: regret sums keep their sign and
    /// only regret matching takes the positive part.
    pub use_cfr_plus: bool,
}

impl Default for CfrConfig {
    fn default() -> Self {
        Self {
            initial_evaluation: true,
            epsilon: 0.0,
            initial_regret: 0.0,
            strategy_delay: 0,
            use_cfr_plus: true,
        }
    }
}

impl CfrConfig {
    /// Create a new CfrConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set whether to run the initialization pass.
    pub fn with_initial_evaluation(mut self, enable: bool) -> Self {
        self.initial_evaluation = enable;
        self
    }

    /// Builder method: set the epsilon-soft exploration.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Builder method: set the starting cumulative regret.
    pub fn with_initial_regret(mut self, regret: f64) -> Self {
        self.initial_regret = regret;
        self
    }

    /// Builder method: set the strategy accumulation delay.
    pub fn with_strategy_delay(mut self, iterations: u64) -> Self {
        self.strategy_delay = iterations;
        self
    }

    /// Builder method: enable or disable CFR+ regret clipping.
    pub fn with_cfr_plus(mut self, enable: bool) -> Self {
        self.use_cfr_plus = enable;
        self
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string. Missing fields keep their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.epsilon) {
            return Err(ConfigError::InvalidEpsilon(self.epsilon));
        }

        if !self.initial_regret.is_finite() || self.initial_regret < 0.0 {
            return Err(ConfigError::InvalidInitialRegret(self.initial_regret));
        }

        Ok(())
    }
}

/// Errors that can occur when validating a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Epsilon is out of range [0, 1).
    #[error("epsilon {0} is out of range [0, 1)")]
    InvalidEpsilon(f64),

    /// Initial regret is negative or not finite.
    #[error("initial regret {0} must be finite and non-negative")]
    InvalidInitialRegret(f64),

    /// Randomization probability is out of range [0, 1].
    #[error("random choice probability {0} is out of range [0, 1]")]
    InvalidRandomProbability(f64),

    /// Candidate limit of zero.
    #[error("max random actions must be at least 1")]
    InvalidMaxRandomActions,

    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(String),

    /// The configuration file is not valid JSON.
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Statistics tracked during training.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CfrStats {
    /// Total number of training iterations completed.
    pub iterations: u64,

    /// Number of info sets in the store.
    pub info_sets: usize,

    /// Total time spent training (in seconds).
    pub elapsed_seconds: f64,

    /// Iterations per second.
    pub iterations_per_second: f64,

    /// Root utility of the last pass, one entry per player.
    pub root_utilities: Vec<f64>,
}

impl CfrStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update iterations per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.iterations_per_second = self.iterations as f64 / self.elapsed_seconds;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(CfrConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = CfrConfig::new()
            .with_initial_evaluation(false)
            .with_epsilon(0.1)
            .with_initial_regret(20.0)
            .with_strategy_delay(50)
            .with_cfr_plus(false);
        assert!(!config.initial_evaluation);
        assert!(!config.use_cfr_plus);
        assert_eq!(config.epsilon, 0.1);
        assert_eq!(config.initial_regret, 20.0);
        assert_eq!(config.strategy_delay, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert_eq!(
            CfrConfig::new().with_epsilon(1.0).validate(),
            Err(ConfigError::InvalidEpsilon(1.0))
        );
        assert!(CfrConfig::new().with_epsilon(-0.1).validate().is_err());
        assert!(CfrConfig::new().with_initial_regret(-1.0).validate().is_err());
        assert!(CfrConfig::new().with_initial_regret(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_config_json_fills_defaults() {
        let config = CfrConfig::from_json_str(r#"{ "epsilon": 0.05 }"#).unwrap();
        assert_eq!(config.epsilon, 0.05);
        assert!(config.initial_evaluation);
        assert_eq!(config.strategy_delay, 0);
        assert!(config.use_cfr_plus);

        let plain = CfrConfig::from_json_str(r#"{ "use_cfr_plus": false }"#).unwrap();
        assert!(!plain.use_cfr_plus);
    }

    #[test]
    fn test_config_json_errors() {
        assert!(matches!(CfrConfig::from_json_str("{ epsilon"), Err(ConfigError::Parse(_))));
        assert_eq!(
            CfrConfig::from_json_str(r#"{ "epsilon": 1.5 }"#),
            Err(ConfigError::InvalidEpsilon(1.5))
        );
        assert!(matches!(
            CfrConfig::from_json_file("/nonexistent/cfr-plus.json"),
            Err(ConfigError::Io(_))
        ));
    }
}

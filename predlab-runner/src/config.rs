//! Serializable backtest configuration, loaded from TOML.
//!
//! ```toml
//! min_history_points = 2
//!
//! [fees]
//! entry_fee_rate = 0.02
//! exit_fee_rate = 0.02
//! slippage_rate = 0.01
//!
//! [outcome_policy]
//! type = "explicit"
//!
//! [[strategies]]
//! id = "longshot_yes"
//! entry = { type = "price_below", threshold = 0.3 }
//! side = { type = "fixed", side = "YES" }
//!
//! [validation]
//! seed = 42
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use predlab_core::{ConfigError, EntryMode, FeeModel, OutcomePolicy, StrategyRule};

use crate::bootstrap::BootstrapConfig;
use crate::monte_carlo::MonteCarloConfig;
use crate::stability::StabilityConfig;
use crate::tail_metrics::TailRiskConfig;
use crate::walk_forward::WalkForwardConfig;

/// Content hash identifying a configuration.
pub type RunId = String;

/// Everything needed to reproduce a batch of backtests and their validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub strategies: Vec<StrategyRule>,
    #[serde(default)]
    pub fees: FeeModel,
    #[serde(default)]
    pub outcome_policy: OutcomePolicy,
    #[serde(default)]
    pub entry_mode: EntryMode,
    /// Markets with fewer quotes are excluded as too short (default 2).
    #[serde(default = "default_min_history_points")]
    pub min_history_points: usize,
    #[serde(default)]
    pub validation: ValidationConfig,
}

fn default_min_history_points() -> usize {
    2
}

impl BacktestConfig {
    pub fn new(strategies: Vec<StrategyRule>) -> Self {
        Self {
            strategies,
            fees: FeeModel::default(),
            outcome_policy: OutcomePolicy::default(),
            entry_mode: EntryMode::default(),
            min_history_points: default_min_history_points(),
            validation: ValidationConfig::default(),
        }
    }

    pub fn with_fees(mut self, fees: FeeModel) -> Self {
        self.fees = fees;
        self
    }

    pub fn with_outcome_policy(mut self, outcome_policy: OutcomePolicy) -> Self {
        self.outcome_policy = outcome_policy;
        self
    }

    pub fn with_entry_mode(mut self, entry_mode: EntryMode) -> Self {
        self.entry_mode = entry_mode;
        self
    }

    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every parameter. The runner refuses to start on any error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategies.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "strategies",
                reason: "at least one strategy is required".into(),
            });
        }
        let mut seen = HashSet::new();
        for rule in &self.strategies {
            rule.validate()?;
            if !seen.insert(rule.id.as_str()) {
                return Err(ConfigError::DuplicateStrategy(rule.id.clone()));
            }
        }
        self.validate_market_settings()?;
        self.validation.validate()
    }

    /// Checks shared by every strategy: fees, outcome policy, entry mode, history length.
    pub fn validate_market_settings(&self) -> Result<(), ConfigError> {
        self.fees.validate()?;
        self.outcome_policy.validate()?;
        if let EntryMode::Multiple { min_gap: 0 } = self.entry_mode {
            return Err(ConfigError::InvalidParameter {
                name: "entry_mode.min_gap",
                reason: "must be >= 1".into(),
            });
        }
        if self.min_history_points == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "min_history_points",
                reason: "must be >= 1".into(),
            });
        }
        Ok(())
    }

    /// BLAKE3 hash of the canonical JSON form.
    ///
    /// Two runs with identical configs share a `RunId`.
    pub fn run_id(&self) -> RunId {
        // Struct fields serialize in declaration order, so the JSON is canonical.
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}

/// Parameters of every validation step, plus the master seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub bootstrap: BootstrapConfig,
    pub monte_carlo: MonteCarloConfig,
    pub tail_risk: TailRiskConfig,
    pub walk_forward: WalkForwardConfig,
    pub stability: StabilityConfig,
    /// Master seed for all resampling (default 42).
    pub seed: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            bootstrap: BootstrapConfig::default(),
            monte_carlo: MonteCarloConfig::default(),
            tail_risk: TailRiskConfig::default(),
            walk_forward: WalkForwardConfig::default(),
            stability: StabilityConfig::default(),
            seed: 42,
        }
    }
}

impl ValidationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bootstrap.validate()?;
        self.monte_carlo.validate()?;
        self.tail_risk.validate()?;
        self.walk_forward.validate()?;
        self.stability.validate()
    }
}

//! Statistical validation of a finished backtest.
//!
//! Each step runs independently. A step that cannot run on the available
//! trades (too few, zero variance) is reported as `None` with a warning
//! instead of failing the whole report.

use serde::{Deserialize, Serialize};

use predlab_core::RngHierarchy;

use crate::bootstrap::{bootstrap_returns, BootstrapResult};
use crate::config::ValidationConfig;
use crate::monte_carlo::{monte_carlo_paths, MonteCarloResult};
use crate::result::BacktestResult;
use crate::stability::{strategy_stability, StabilityResult};
use crate::tail_metrics::{compute_tail_metrics, TailMetrics};
use crate::walk_forward::{walk_forward_analysis, WalkForwardResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub strategy_id: String,
    pub sample_size: usize,
    pub seed: u64,
    pub bootstrap: Option<BootstrapResult>,
    pub monte_carlo: Option<MonteCarloResult>,
    pub tail: Option<TailMetrics>,
    pub walk_forward: WalkForwardResult,
    pub stability: StabilityResult,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// True when every step produced a result.
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Run every validation step on `result`'s chronological returns.
///
/// Resampling is seeded from `config.seed` and scoped by strategy id, so two
/// strategies in one batch never share a random stream.
pub fn validate_result(result: &BacktestResult, config: &ValidationConfig) -> ValidationReport {
    let returns = result.returns();
    let rng = RngHierarchy::new(config.seed);
    let scope = result.strategy_id.as_str();
    let mut warnings = Vec::new();

    let bootstrap = match bootstrap_returns(&returns, &config.bootstrap, &rng, scope) {
        Ok(b) => {
            if b.degenerate_sharpe_samples > 0 {
                warnings.push(format!(
                    "bootstrap: {} of {} resamples had zero variance and were left out of the Sharpe distribution",
                    b.degenerate_sharpe_samples, b.n_iterations
                ));
            }
            Some(b)
        }
        Err(e) => {
            warnings.push(format!("bootstrap skipped: {e}"));
            None
        }
    };

    let monte_carlo = match monte_carlo_paths(&returns, &config.monte_carlo, &rng, scope) {
        Ok(mc) => Some(mc),
        Err(e) => {
            warnings.push(format!("monte carlo skipped: {e}"));
            None
        }
    };

    let tail = match compute_tail_metrics(&returns, config.tail_risk.alpha) {
        Ok(t) => Some(t),
        Err(e) => {
            warnings.push(format!("tail metrics skipped: {e}"));
            None
        }
    };

    let walk_forward = walk_forward_analysis(&result.trades, &config.walk_forward);
    if let Some(w) = &walk_forward.warning {
        warnings.push(w.clone());
    }

    let stability = strategy_stability(&result.trades, config.stability.window_size);
    if let Some(w) = &stability.warning {
        warnings.push(w.clone());
    }

    for warning in &warnings {
        tracing::warn!(strategy = scope, "{warning}");
    }

    ValidationReport {
        strategy_id: result.strategy_id.clone(),
        sample_size: returns.len(),
        seed: config.seed,
        bootstrap,
        monte_carlo,
        tail,
        walk_forward,
        stability,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::BootstrapConfig;
    use crate::monte_carlo::MonteCarloConfig;

    fn small_config() -> ValidationConfig {
        ValidationConfig {
            bootstrap: BootstrapConfig {
                n_iterations: 50,
                ..BootstrapConfig::default()
            },
            monte_carlo: MonteCarloConfig {
                n_paths: 20,
                store_paths: false,
                ..MonteCarloConfig::default()
            },
            ..ValidationConfig::default()
        }
    }

    #[test]
    fn empty_result_degrades_to_warnings() {
        let result = BacktestResult::new("s", "run", vec![], vec![], 0);
        let report = validate_result(&result, &small_config());
        assert_eq!(report.sample_size, 0);
        assert!(report.bootstrap.is_none());
        assert!(report.monte_carlo.is_none());
        assert!(report.tail.is_none());
        assert!(report.walk_forward.is_empty());
        assert!(report.stability.is_empty());
        assert_eq!(report.warnings.len(), 5);
        assert!(!report.is_complete());
    }
}

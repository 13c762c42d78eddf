//! Monte Carlo equity paths from resampled trade returns.
//!
//! Each path draws `periods` returns with replacement and compounds them
//! into an equity curve `E_t = prod(1 + r_i)` starting at 1.0, i.e. the full
//! bankroll is staked on every trade.
//!
//! Assumption: the historical returns are i.i.d. and stationary. The paths
//! describe the spread of outcomes under that assumption; they are not a
//! forecast of future performance.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use predlab_core::{ConfigError, DegenerateStatisticsError, RngHierarchy};

use crate::metrics::{mean_f64, percentile_sorted, sorted_copy};

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Number of simulated paths (default 1000).
    pub n_paths: usize,
    /// Returns drawn per path. `None` uses the number of observed trades.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periods: Option<usize>,
    /// A path is ruined once its equity falls to or below this level (default 0.5).
    pub ruin_threshold: f64,
    /// Keep the full path matrix in the result (default true).
    pub store_paths: bool,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            n_paths: 1000,
            periods: None,
            ruin_threshold: 0.5,
            store_paths: true,
        }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_paths == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "monte_carlo.n_paths",
                reason: "must be >= 1".into(),
            });
        }
        if self.periods == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "monte_carlo.periods",
                reason: "must be >= 1 when set".into(),
            });
        }
        if !self.ruin_threshold.is_finite() || !(0.0..1.0).contains(&self.ruin_threshold) {
            return Err(ConfigError::InvalidParameter {
                name: "monte_carlo.ruin_threshold",
                reason: format!("must be in [0, 1), got {}", self.ruin_threshold),
            });
        }
        Ok(())
    }
}

// ─── Result types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerminalPercentiles {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub n_paths: usize,
    pub periods: usize,
    pub ruin_threshold: f64,
    pub terminal: TerminalPercentiles,
    pub mean_terminal: f64,
    /// Fraction of paths ending below the starting equity.
    pub prob_loss: f64,
    /// Fraction of paths whose equity touched `ruin_threshold`.
    pub prob_ruin: f64,
    /// Mean over paths of the worst peak-relative drawdown (<= 0).
    pub mean_max_drawdown: f64,
    /// `n_paths` rows of `periods + 1` equity values; empty unless stored.
    pub paths: Vec<Vec<f64>>,
}

struct PathSummary {
    terminal: f64,
    ruined: bool,
    max_drawdown: f64,
    path: Vec<f64>,
}

// ─── Simulation ──────────────────────────────────────────────────────

pub fn monte_carlo_paths(
    returns: &[f64],
    config: &MonteCarloConfig,
    rng: &RngHierarchy,
    scope: &str,
) -> Result<MonteCarloResult, DegenerateStatisticsError> {
    if returns.is_empty() {
        return Err(DegenerateStatisticsError::TooFewObservations {
            got: 0,
            required: 1,
        });
    }
    let periods = config.periods.unwrap_or(returns.len());

    let summaries: Vec<PathSummary> = (0..config.n_paths)
        .into_par_iter()
        .map(|i| {
            let mut path_rng = rng.rng_for(scope, "monte_carlo", i as u64);
            let draws = (0..periods).map(|_| returns[path_rng.gen_range(0..returns.len())]);
            simulate_path(draws, periods, config)
        })
        .collect();

    let terminals: Vec<f64> = summaries.iter().map(|s| s.terminal).collect();
    if terminals.iter().any(|t| !t.is_finite()) {
        return Err(DegenerateStatisticsError::NoFiniteSamples(
            "monte carlo terminal equity".into(),
        ));
    }
    let sorted = sorted_copy(&terminals);
    let n = summaries.len() as f64;

    let terminal = TerminalPercentiles {
        p5: percentile_sorted(&sorted, 5.0),
        p25: percentile_sorted(&sorted, 25.0),
        p50: percentile_sorted(&sorted, 50.0),
        p75: percentile_sorted(&sorted, 75.0),
        p95: percentile_sorted(&sorted, 95.0),
    };
    let prob_loss = terminals.iter().filter(|&&t| t < 1.0).count() as f64 / n;
    let prob_ruin = summaries.iter().filter(|s| s.ruined).count() as f64 / n;
    let drawdowns: Vec<f64> = summaries.iter().map(|s| s.max_drawdown).collect();

    Ok(MonteCarloResult {
        n_paths: config.n_paths,
        periods,
        ruin_threshold: config.ruin_threshold,
        terminal,
        mean_terminal: mean_f64(&terminals),
        prob_loss,
        prob_ruin,
        mean_max_drawdown: mean_f64(&drawdowns),
        paths: if config.store_paths {
            summaries.into_iter().map(|s| s.path).collect()
        } else {
            Vec::new()
        },
    })
}

fn simulate_path(
    draws: impl Iterator<Item = f64>,
    periods: usize,
    config: &MonteCarloConfig,
) -> PathSummary {
    let mut path = Vec::with_capacity(if config.store_paths { periods + 1 } else { 0 });
    let mut equity = 1.0_f64;
    let mut peak = equity;
    let mut max_dd = 0.0_f64;
    let mut ruined = false;
    if config.store_paths {
        path.push(equity);
    }

    for r in draws {
        equity *= 1.0 + r;
        if config.store_paths {
            path.push(equity);
        }
        if equity <= config.ruin_threshold {
            ruined = true;
        }
        if equity > peak {
            peak = equity;
        }
        if peak > 0.0 {
            max_dd = max_dd.min(equity / peak - 1.0);
        }
    }

    PathSummary {
        terminal: equity,
        ruined,
        max_drawdown: max_dd,
        path,
    }
}

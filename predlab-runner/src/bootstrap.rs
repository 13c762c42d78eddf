//! I.i.d. bootstrap of per-trade returns: confidence intervals and p-values.
//!
//! Each resample draws `n` returns with replacement from the original `n`.
//! Per resample the mean and an annualized Sharpe (`mean / std * sqrt(k)`)
//! are recorded. Reported intervals are the empirical `[alpha/2, 1 - alpha/2]`
//! percentiles; p-values are the one-sided fractions of resamples `<= 0`.
//!
//! Resamples whose standard deviation is zero (every draw the same value)
//! have no defined Sharpe. They are left out of the Sharpe distribution and
//! counted in `degenerate_sharpe_samples`.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use predlab_core::{ConfigError, DegenerateStatisticsError, RngHierarchy};

use crate::metrics::{mean_f64, percentile_sorted, sorted_copy, std_dev, STD_EPSILON};

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Number of resamples (default 1000).
    pub n_iterations: usize,
    /// Two-sided significance level for the intervals (default 0.05).
    pub alpha: f64,
    /// Sharpe scaling factor (default 252, trading days).
    pub annualization_factor: f64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            n_iterations: 1000,
            alpha: 0.05,
            annualization_factor: 252.0,
        }
    }
}

impl BootstrapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_iterations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "bootstrap.n_iterations",
                reason: "must be >= 1".into(),
            });
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "bootstrap.alpha",
                reason: format!("must be in (0, 1), got {}", self.alpha),
            });
        }
        if !self.annualization_factor.is_finite() || self.annualization_factor <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "bootstrap.annualization_factor",
                reason: format!("must be positive, got {}", self.annualization_factor),
            });
        }
        Ok(())
    }
}

// ─── Result types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    pub n_iterations: usize,
    pub sample_size: usize,
    pub alpha: f64,

    // ── Mean ──
    /// Mean of the original returns.
    pub mean: f64,
    pub mean_ci: ConfidenceInterval,
    /// `P(sample_mean <= 0)`.
    pub p_mean: f64,

    // ── Sharpe ──
    /// Annualized Sharpe of the original returns; `None` at zero variance.
    pub sharpe: Option<f64>,
    /// `None` when no resample had a defined Sharpe.
    pub sharpe_ci: Option<ConfidenceInterval>,
    /// `P(sample_sharpe <= 0)` over resamples with a defined Sharpe.
    pub p_sharpe: Option<f64>,
    pub degenerate_sharpe_samples: usize,
}

// ─── Bootstrap ───────────────────────────────────────────────────────

/// Bootstrap `returns` under `config`.
///
/// Draw `i` uses the RNG derived from `(scope, "bootstrap", i)`, so results
/// do not depend on how rayon schedules the draws.
pub fn bootstrap_returns(
    returns: &[f64],
    config: &BootstrapConfig,
    rng: &RngHierarchy,
    scope: &str,
) -> Result<BootstrapResult, DegenerateStatisticsError> {
    let n = returns.len();
    if n < 2 {
        return Err(DegenerateStatisticsError::TooFewObservations {
            got: n,
            required: 2,
        });
    }
    let annualization = config.annualization_factor.sqrt();

    let samples: Vec<(f64, Option<f64>)> = (0..config.n_iterations)
        .into_par_iter()
        .map(|i| {
            let mut draw_rng = rng.rng_for(scope, "bootstrap", i as u64);
            let resample: Vec<f64> = (0..n).map(|_| returns[draw_rng.gen_range(0..n)]).collect();
            let mean = mean_f64(&resample);
            (mean, annualized_sharpe(&resample, annualization))
        })
        .collect();

    let means: Vec<f64> = samples.iter().map(|(m, _)| *m).collect();
    let sharpes: Vec<f64> = samples.iter().filter_map(|(_, s)| *s).collect();
    if means.iter().any(|m| !m.is_finite()) {
        return Err(DegenerateStatisticsError::NoFiniteSamples("bootstrap mean".into()));
    }

    let lower_pct = config.alpha / 2.0 * 100.0;
    let upper_pct = (1.0 - config.alpha / 2.0) * 100.0;

    let sorted_means = sorted_copy(&means);
    let mean_ci = ConfidenceInterval {
        lower: percentile_sorted(&sorted_means, lower_pct),
        upper: percentile_sorted(&sorted_means, upper_pct),
    };

    let (sharpe_ci, p_sharpe) = if sharpes.is_empty() {
        (None, None)
    } else {
        let sorted_sharpes = sorted_copy(&sharpes);
        let ci = ConfidenceInterval {
            lower: percentile_sorted(&sorted_sharpes, lower_pct),
            upper: percentile_sorted(&sorted_sharpes, upper_pct),
        };
        (Some(ci), Some(fraction_non_positive(&sharpes)))
    };

    Ok(BootstrapResult {
        n_iterations: config.n_iterations,
        sample_size: n,
        alpha: config.alpha,
        mean: mean_f64(returns),
        mean_ci,
        p_mean: fraction_non_positive(&means),
        sharpe: annualized_sharpe(returns, annualization),
        sharpe_ci,
        p_sharpe,
        degenerate_sharpe_samples: samples.len() - sharpes.len(),
    })
}

/// `mean / std * scale`, or `None` when the sample has no dispersion.
fn annualized_sharpe(returns: &[f64], scale: f64) -> Option<f64> {
    let std = std_dev(returns);
    if std < STD_EPSILON || !std.is_finite() {
        return None;
    }
    Some(mean_f64(returns) / std * scale)
}

fn fraction_non_positive(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|&&v| v <= 0.0).count() as f64 / values.len() as f64
}

//! Tail risk of per-trade returns: VaR, CVaR and distribution shape.

use serde::{Deserialize, Serialize};

use predlab_core::{ConfigError, DegenerateStatisticsError};

use crate::metrics::{mean_f64, percentile_sorted, sorted_copy, std_dev, STD_EPSILON};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailRiskConfig {
    /// Tail probability for VaR/CVaR (default 0.05).
    pub alpha: f64,
}

impl Default for TailRiskConfig {
    fn default() -> Self {
        Self { alpha: 0.05 }
    }
}

impl TailRiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "tail_risk.alpha",
                reason: format!("must be in (0, 1), got {}", self.alpha),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarCvar {
    pub alpha: f64,
    /// `percentile(returns, 100 * alpha)`, linearly interpolated.
    pub var: f64,
    /// Mean of the returns at or below `var`.
    pub cvar: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailMetrics {
    pub var_cvar: VarCvar,
    /// Third standardized moment. `None` below 3 returns or at zero variance.
    pub skewness: Option<f64>,
    /// Fourth standardized moment minus 3. `None` below 4 returns or at zero variance.
    pub excess_kurtosis: Option<f64>,
    pub sample_size: usize,
}

pub fn compute_var_cvar(returns: &[f64], alpha: f64) -> Result<VarCvar, DegenerateStatisticsError> {
    if returns.is_empty() {
        return Err(DegenerateStatisticsError::TooFewObservations {
            got: 0,
            required: 1,
        });
    }
    let sorted = sorted_copy(returns);
    let var = percentile_sorted(&sorted, 100.0 * alpha);
    let tail: Vec<f64> = sorted.iter().copied().take_while(|&r| r <= var).collect();
    // The minimum is always <= an interpolated percentile, so `tail` is non-empty.
    Ok(VarCvar {
        alpha,
        var,
        cvar: mean_f64(&tail),
    })
}

pub fn compute_tail_metrics(
    returns: &[f64],
    alpha: f64,
) -> Result<TailMetrics, DegenerateStatisticsError> {
    let var_cvar = compute_var_cvar(returns, alpha)?;
    Ok(TailMetrics {
        var_cvar,
        skewness: (returns.len() >= 3).then(|| skewness(returns)).flatten(),
        excess_kurtosis: (returns.len() >= 4).then(|| excess_kurtosis(returns)).flatten(),
        sample_size: returns.len(),
    })
}

fn standardized_moment(returns: &[f64], power: i32) -> Option<f64> {
    let std = std_dev(returns);
    if std < STD_EPSILON {
        return None;
    }
    let mean = mean_f64(returns);
    let n = returns.len() as f64;
    Some(returns.iter().map(|r| ((r - mean) / std).powi(power)).sum::<f64>() / n)
}

fn skewness(returns: &[f64]) -> Option<f64> {
    standardized_moment(returns, 3)
}

fn excess_kurtosis(returns: &[f64]) -> Option<f64> {
    standardized_moment(returns, 4).map(|m4| m4 - 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_cvar_on_known_series() {
        // sorted: -1, -1, -0.5, 0, 1, 2, 3, 4, 5, 9
        let returns = [9.0, -1.0, 0.0, 5.0, -0.5, 1.0, -1.0, 2.0, 3.0, 4.0];
        let v = compute_var_cvar(&returns, 0.2).unwrap();
        // rank 0.2 * 9 = 1.8 → -1 + 0.8 * (-0.5 - -1) = -0.6
        assert!((v.var - (-0.6)).abs() < 1e-10);
        assert!((v.cvar - (-1.0)).abs() < 1e-10);
    }

    #[test]
    fn cvar_never_above_var() {
        let returns = [0.3, -0.2, 0.1, -0.9, 0.4, 0.0];
        for alpha in [0.01, 0.05, 0.25, 0.5, 0.99] {
            let v = compute_var_cvar(&returns, alpha).unwrap();
            assert!(v.cvar <= v.var + 1e-12, "alpha {alpha}");
        }
    }

    #[test]
    fn empty_is_degenerate() {
        assert!(compute_var_cvar(&[], 0.05).is_err());
    }

    #[test]
    fn symmetric_series_has_zero_skew() {
        let tm = compute_tail_metrics(&[-2.0, -1.0, 0.0, 1.0, 2.0], 0.05).unwrap();
        assert!(tm.skewness.unwrap().abs() < 1e-12);
        assert!(tm.excess_kurtosis.is_some());
    }

    #[test]
    fn longshot_returns_are_right_skewed() {
        let tm = compute_tail_metrics(&[9.0, -1.0, -1.0, -1.0, -1.0, -1.0], 0.05).unwrap();
        assert!(tm.skewness.unwrap() > 0.0);
    }

    #[test]
    fn constant_series_has_no_shape() {
        let tm = compute_tail_metrics(&[0.1; 6], 0.05).unwrap();
        assert!(tm.skewness.is_none());
        assert!(tm.excess_kurtosis.is_none());
        assert!((tm.var_cvar.var - 0.1).abs() < 1e-12);
    }
}

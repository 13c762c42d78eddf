//! Walk-forward validation over the chronological trade list.
//!
//! A training window of `train_size = floor(n * train_ratio)` trades slides
//! forward in steps of `max(train_size / 5, 1)`. Each window is followed by a
//! test fold of the next `train_size` trades; a fold is created only when the
//! full test fold fits. Per fold the mean net return (ROI) of both windows is
//! reported, along with
//!
//! - `degradation = mean(test_roi) - mean(train_roi)`
//! - the Pearson correlation between fold train ROI and test ROI.
//!
//! Fewer than `2 * min_trades` trades, or no fold that fits (an empty
//! training window included), yield an empty result carrying a warning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use predlab_core::{ConfigError, DegenerateStatisticsError, SimulatedTrade};

use crate::metrics::{mean_f64, win_rate, STD_EPSILON};
use crate::result::chronological;

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    /// Fraction of all trades in each training window (default 0.5).
    pub train_ratio: f64,
    /// Minimum trades per training window (default 10).
    pub min_trades: usize,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.5,
            min_trades: 10,
        }
    }
}

impl WalkForwardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "walk_forward.train_ratio",
                reason: format!("must be in (0, 1), got {}", self.train_ratio),
            });
        }
        if self.min_trades == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "walk_forward.min_trades",
                reason: "must be >= 1".into(),
            });
        }
        Ok(())
    }
}

// ─── Result types ────────────────────────────────────────────────────

/// Trade index ranges of one fold, half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldSpec {
    pub fold_index: usize,
    pub train_start: usize,
    pub train_end: usize,
    pub test_start: usize,
    pub test_end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    pub spec: FoldSpec,
    pub train_from: DateTime<Utc>,
    pub test_from: DateTime<Utc>,
    pub test_until: DateTime<Utc>,
    pub train_roi: f64,
    pub test_roi: f64,
    pub train_win_rate: f64,
    pub test_win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WalkForwardResult {
    pub train_size: usize,
    pub step: usize,
    pub folds: Vec<FoldResult>,
    pub mean_train_roi: Option<f64>,
    pub mean_test_roi: Option<f64>,
    /// `mean(test_roi) - mean(train_roi)`; negative means out-of-sample decay.
    pub degradation: Option<f64>,
    /// `None` with fewer than two folds or zero variance on either side.
    pub train_test_correlation: Option<f64>,
    pub warning: Option<String>,
}

impl WalkForwardResult {
    pub fn empty(warning: impl Into<String>) -> Self {
        Self {
            warning: Some(warning.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }
}

// ─── Fold creation ───────────────────────────────────────────────────

/// Fold layout for `n_trades` trades.
pub fn create_folds(
    n_trades: usize,
    config: &WalkForwardConfig,
) -> Result<Vec<FoldSpec>, DegenerateStatisticsError> {
    let required = config.min_trades.saturating_mul(2);
    if n_trades < required {
        return Err(DegenerateStatisticsError::TooFewObservations {
            got: n_trades,
            required,
        });
    }

    let train_size = (n_trades as f64 * config.train_ratio).floor() as usize;
    if train_size == 0 {
        return Err(DegenerateStatisticsError::TooFewObservations {
            got: n_trades,
            required: required.max(1),
        });
    }
    let step = (train_size / 5).max(1);

    let mut folds = Vec::new();
    let mut start = 0;
    while start + 2 * train_size <= n_trades {
        folds.push(FoldSpec {
            fold_index: folds.len(),
            train_start: start,
            train_end: start + train_size,
            test_start: start + train_size,
            test_end: start + 2 * train_size,
        });
        start += step;
    }

    if folds.is_empty() {
        return Err(DegenerateStatisticsError::TooFewObservations {
            got: n_trades,
            required: 2 * train_size,
        });
    }
    Ok(folds)
}

// ─── Analysis ────────────────────────────────────────────────────────

/// Walk-forward analysis of `trades`, sorted by entry time first.
pub fn walk_forward_analysis(
    trades: &[SimulatedTrade],
    config: &WalkForwardConfig,
) -> WalkForwardResult {
    let ordered = chronological(trades);
    let specs = match create_folds(ordered.len(), config) {
        Ok(specs) => specs,
        Err(e) => {
            let warning = format!("walk-forward skipped: {e}");
            tracing::warn!(trades = ordered.len(), min_trades = config.min_trades, "{warning}");
            return WalkForwardResult::empty(warning);
        }
    };

    let train_size = specs[0].train_end - specs[0].train_start;
    let step = specs.get(1).map_or(
        (train_size / 5).max(1),
        |second| second.train_start - specs[0].train_start,
    );

    let folds: Vec<FoldResult> = specs
        .iter()
        .map(|spec| {
            let train = &ordered[spec.train_start..spec.train_end];
            let test = &ordered[spec.test_start..spec.test_end];
            FoldResult {
                spec: *spec,
                train_from: train[0].entry_timestamp,
                test_from: test[0].entry_timestamp,
                test_until: test[test.len() - 1].entry_timestamp,
                train_roi: roi(train),
                test_roi: roi(test),
                train_win_rate: win_rate(&train.iter().map(|t| t.win).collect::<Vec<_>>()),
                test_win_rate: win_rate(&test.iter().map(|t| t.win).collect::<Vec<_>>()),
            }
        })
        .collect();

    let train_rois: Vec<f64> = folds.iter().map(|f| f.train_roi).collect();
    let test_rois: Vec<f64> = folds.iter().map(|f| f.test_roi).collect();
    let mean_train = mean_f64(&train_rois);
    let mean_test = mean_f64(&test_rois);

    WalkForwardResult {
        train_size,
        step,
        mean_train_roi: Some(mean_train),
        mean_test_roi: Some(mean_test),
        degradation: Some(mean_test - mean_train),
        train_test_correlation: pearson(&train_rois, &test_rois),
        folds,
        warning: None,
    }
}

fn roi(trades: &[&SimulatedTrade]) -> f64 {
    mean_f64(&trades.iter().map(|t| t.net_return).collect::<Vec<_>>())
}

/// Pearson correlation, `None` below two points or with a flat side.
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean_f64(x);
    let my = mean_f64(y);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        vx += (a - mx).powi(2);
        vy += (b - my).powi(2);
    }
    let denom = (vx * vy).sqrt();
    if denom < STD_EPSILON {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}

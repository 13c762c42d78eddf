//! Rolling stability of per-trade ROI.
//!
//! Rolling windows of `window_size` consecutive trades (step 1) each yield a
//! mean net return. The stability metric is the coefficient of variation of
//! those means, `std / (|mean| + 1e-9)`; lower is more stable.

use serde::{Deserialize, Serialize};

use predlab_core::{ConfigError, SimulatedTrade};

use crate::metrics::{mean_f64, std_dev};
use crate::result::chronological;

const STABILITY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Trades per rolling window (default 20).
    pub window_size: usize,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self { window_size: 20 }
    }
}

impl StabilityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "stability.window_size",
                reason: "must be >= 1".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StabilityResult {
    pub window_size: usize,
    pub rolling_mean_roi: Vec<f64>,
    pub mean_rolling_roi: Option<f64>,
    pub std_rolling_roi: Option<f64>,
    pub stability_metric: Option<f64>,
    pub warning: Option<String>,
}

impl StabilityResult {
    pub fn is_empty(&self) -> bool {
        self.rolling_mean_roi.is_empty()
    }
}

/// Rolling-window stability of `trades`, sorted by entry time first.
/// Empty, with a warning, below `2 * window_size` trades.
pub fn strategy_stability(trades: &[SimulatedTrade], window_size: usize) -> StabilityResult {
    let ordered = chronological(trades);
    let required = window_size.saturating_mul(2);
    if window_size == 0 || ordered.len() < required {
        let warning = format!(
            "stability skipped: {} trades < required {required} for window {window_size}",
            ordered.len()
        );
        tracing::warn!(trades = ordered.len(), window_size, "{warning}");
        return StabilityResult {
            window_size,
            warning: Some(warning),
            ..StabilityResult::default()
        };
    }

    let returns: Vec<f64> = ordered.iter().map(|t| t.net_return).collect();
    let rolling = rolling_means(&returns, window_size);
    let mean = mean_f64(&rolling);
    let std = std_dev(&rolling);

    StabilityResult {
        window_size,
        mean_rolling_roi: Some(mean),
        std_rolling_roi: Some(std),
        stability_metric: Some(std / (mean.abs() + STABILITY_EPSILON)),
        rolling_mean_roi: rolling,
        warning: None,
    }
}

/// Mean of every length-`window` run, computed with a running sum.
fn rolling_means(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len() - window + 1);
    let mut sum: f64 = values[..window].iter().sum();
    out.push(sum / window as f64);
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out.push(sum / window as f64);
    }
    out
}

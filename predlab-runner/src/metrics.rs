//! Performance metrics as pure functions over a chronological trade list.
//!
//! Every metric takes trades (or their net returns) in entry order and
//! returns a scalar. Order matters for drawdown and streaks; callers must
//! not reorder.

use serde::{Deserialize, Serialize};

use predlab_core::sizers::KellySizing;
use predlab_core::SimulatedTrade;

/// Values closer to zero than this count as zero dispersion.
pub(crate) const STD_EPSILON: f64 = 1e-15;

/// Aggregate performance metrics for one strategy's trade list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub trade_count: usize,
    pub win_rate: f64,
    pub avg_return: f64,
    pub total_return: f64,
    pub return_std: f64,
    /// `mean / std` of per-trade returns, not annualized.
    pub sharpe_ratio: f64,
    /// Most negative gap between cumulative return and its running peak.
    pub max_drawdown: f64,
    pub profit_factor: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub avg_losing_streak: f64,
    /// Mean price actually paid per contract (after slippage, before fee).
    pub avg_execution_price: f64,
    /// Kelly fractions implied by the realized win rate at the mean execution price.
    pub kelly: KellySizing,
}

impl PerformanceMetrics {
    pub fn compute(trades: &[SimulatedTrade]) -> Self {
        let returns = net_returns(trades);
        let wins: Vec<bool> = trades.iter().map(|t| t.is_winner()).collect();
        let win_rate = win_rate(&wins);
        let avg_execution_price =
            mean_f64(&trades.iter().map(|t| t.execution_price).collect::<Vec<_>>());

        Self {
            trade_count: trades.len(),
            win_rate,
            avg_return: mean_f64(&returns),
            total_return: total_return(&returns),
            return_std: std_dev(&returns),
            sharpe_ratio: sharpe_ratio(&returns),
            max_drawdown: max_drawdown(&returns),
            profit_factor: profit_factor(&returns),
            max_consecutive_wins: max_consecutive(&wins, true),
            max_consecutive_losses: max_consecutive(&wins, false),
            avg_losing_streak: avg_losing_streak(&wins),
            avg_execution_price,
            kelly: if trades.is_empty() {
                KellySizing::default()
            } else {
                KellySizing::new(win_rate, avg_execution_price)
            },
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

pub fn net_returns(trades: &[SimulatedTrade]) -> Vec<f64> {
    trades.iter().map(|t| t.net_return).collect()
}

/// Fraction of winning trades; 0 with no trades.
pub fn win_rate(wins: &[bool]) -> f64 {
    if wins.is_empty() {
        return 0.0;
    }
    wins.iter().filter(|&&w| w).count() as f64 / wins.len() as f64
}

/// Sum of per-trade returns (single-unit stakes, not compounded).
pub fn total_return(returns: &[f64]) -> f64 {
    returns.iter().sum()
}

/// `mean / std` when there are at least two returns and `std > 0`, else 0.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < STD_EPSILON {
        return 0.0;
    }
    mean_f64(returns) / std
}

/// Maximum drawdown of the additive cumulative-return path.
///
/// `min_t(cum[t] - max(cum[0..=t]))`. Always `<= 0`, and exactly 0 iff the
/// path never decreases.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut cumulative = 0.0;
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &r in returns {
        cumulative += r;
        if cumulative > peak {
            peak = cumulative;
        }
        let dd = cumulative - peak;
        if dd < max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// Gross gains over gross losses. Capped at 100 (all winners).
pub fn profit_factor(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = returns.iter().filter(|&&r| r > 0.0).sum();
    let gross_loss: f64 = returns.iter().filter(|&&r| r < 0.0).map(|r| r.abs()).sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Average length of losing streaks.
pub fn avg_losing_streak(wins: &[bool]) -> f64 {
    let mut streaks: Vec<usize> = Vec::new();
    let mut current = 0;

    for &win in wins {
        if !win {
            current += 1;
        } else {
            if current > 0 {
                streaks.push(current);
            }
            current = 0;
        }
    }
    if current > 0 {
        streaks.push(current);
    }

    if streaks.is_empty() {
        return 0.0;
    }
    streaks.iter().sum::<usize>() as f64 / streaks.len() as f64
}

fn max_consecutive(wins: &[bool], target: bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;

    for &win in wins {
        if win == target {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Linear-interpolation percentile on an ascending slice, `pct` in [0, 100].
pub(crate) fn percentile_sorted(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] + frac * (sorted[upper] - sorted[lower])
}

pub(crate) fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use predlab_core::{Outcome, Side, TradeExit};

    fn make_trade(i: usize, price: f64, win: bool) -> SimulatedTrade {
        let net_return = if win { (1.0 - price) / price } else { -1.0 };
        SimulatedTrade {
            market_id: format!("m{i}"),
            side: Side::Yes,
            entry_index: 0,
            entry_timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::days(i as i64),
            quoted_entry_price: price,
            execution_price: price,
            cost: price,
            exit: TradeExit::Resolution {
                outcome: if win { Outcome::Yes } else { Outcome::No },
            },
            proceeds: if win { 1.0 } else { 0.0 },
            net_return,
            win,
        }
    }

    // ── Win rate / returns ──

    #[test]
    fn empty_trades_all_zero() {
        let m = PerformanceMetrics::compute(&[]);
        assert_eq!(m.trade_count, 0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.avg_return, 0.0);
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.kelly.full, 0.0);
    }

    #[test]
    fn mixed_trades() {
        let trades = vec![
            make_trade(0, 0.5, true),
            make_trade(1, 0.5, false),
            make_trade(2, 0.5, true),
            make_trade(3, 0.5, true),
        ];
        let m = PerformanceMetrics::compute(&trades);
        assert_eq!(m.trade_count, 4);
        assert!((m.win_rate - 0.75).abs() < 1e-10);
        assert!((m.total_return - 2.0).abs() < 1e-10);
        assert!((m.avg_return - 0.5).abs() < 1e-10);
        assert_eq!(m.max_consecutive_wins, 2);
        assert_eq!(m.max_consecutive_losses, 1);
        assert!((m.profit_factor - 3.0).abs() < 1e-10);
        // p = 0.75 at price 0.5: f* = 0.75 - 0.25 = 0.5
        assert!((m.kelly.full - 0.5).abs() < 1e-10);
    }

    // ── Sharpe ──

    #[test]
    fn sharpe_single_return_is_zero() {
        assert_eq!(sharpe_ratio(&[0.5]), 0.0);
    }

    #[test]
    fn sharpe_constant_returns_is_zero() {
        assert_eq!(sharpe_ratio(&[0.2, 0.2, 0.2]), 0.0);
    }

    #[test]
    fn sharpe_known_value() {
        // mean 0.5, sample std sqrt(((0.5)^2 * 2) / 1) = 0.7071
        let s = sharpe_ratio(&[1.0, 0.0]);
        assert!((s - 0.5 / 0.5_f64.sqrt()).abs() < 1e-10);
    }

    // ── Drawdown ──

    #[test]
    fn drawdown_monotone_path_is_zero() {
        assert_eq!(max_drawdown(&[0.1, 0.0, 0.3]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn drawdown_peak_to_trough() {
        // cum: 1.0, 0.0, -0.5, 0.5  → peak 1.0, trough -0.5
        let dd = max_drawdown(&[1.0, -1.0, -0.5, 1.0]);
        assert!((dd - (-1.5)).abs() < 1e-10);
    }

    #[test]
    fn drawdown_first_trade_loss_counts_from_first_point() {
        // cum: -1.0, -2.0 → running max -1.0, drawdown -1.0
        assert!((max_drawdown(&[-1.0, -1.0]) - (-1.0)).abs() < 1e-10);
    }

    // ── Profit factor / streaks ──

    #[test]
    fn profit_factor_all_winners_capped() {
        assert_eq!(profit_factor(&[1.0, 2.0]), 100.0);
        assert_eq!(profit_factor(&[0.0]), 0.0);
    }

    #[test]
    fn losing_streak_average() {
        let wins = [false, false, true, false, true, false, false, false];
        assert!((avg_losing_streak(&wins) - 2.0).abs() < 1e-10);
    }

    // ── Helpers ──

    #[test]
    fn percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((percentile_sorted(&sorted, 50.0) - 3.0).abs() < 1e-10);
        assert!((percentile_sorted(&sorted, 25.0) - 2.0).abs() < 1e-10);
        assert!((percentile_sorted(&sorted, 10.0) - 1.4).abs() < 1e-10);
        assert_eq!(percentile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(percentile_sorted(&sorted, 100.0), 5.0);
    }
}

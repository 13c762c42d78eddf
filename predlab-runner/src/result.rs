//! Backtest result for one strategy: chronological trades plus exclusions.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use predlab_core::{Exclusion, SimulatedTrade};

use crate::metrics::{net_returns, PerformanceMetrics};

/// Current schema version for serialized results.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Completed backtest of a single strategy over a market corpus.
///
/// Only built once every market has been processed; an aborted batch
/// produces no `BacktestResult` at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub strategy_id: String,
    /// Hash of the configuration that produced this result.
    pub run_id: String,
    /// Sorted by `(entry_timestamp, market_id, entry_index)`.
    pub trades: Vec<SimulatedTrade>,
    pub metrics: PerformanceMetrics,
    pub markets_scanned: usize,
    pub markets_traded: usize,
    pub exclusions: Vec<Exclusion>,
    /// Exclusions keyed by reason code.
    pub exclusion_counts: BTreeMap<String, usize>,
    /// Distinct markets with at least one indeterminate-outcome exclusion.
    pub indeterminate_markets: usize,
}

impl BacktestResult {
    /// Freeze a result. Trades are put into chronological order here so the
    /// metrics never see completion order.
    pub fn new(
        strategy_id: impl Into<String>,
        run_id: impl Into<String>,
        mut trades: Vec<SimulatedTrade>,
        exclusions: Vec<Exclusion>,
        markets_scanned: usize,
    ) -> Self {
        sort_chronologically(&mut trades);
        let metrics = PerformanceMetrics::compute(&trades);

        let mut traded: Vec<&str> = trades.iter().map(|t| t.market_id.as_str()).collect();
        traded.sort_unstable();
        traded.dedup();

        let exclusion_counts = count_exclusions(&exclusions);
        let mut indeterminate: Vec<&str> = exclusions
            .iter()
            .filter(|e| e.reason.is_indeterminate())
            .map(|e| e.market_id.as_str())
            .collect();
        indeterminate.sort_unstable();
        indeterminate.dedup();
        let indeterminate_markets = indeterminate.len();

        Self {
            schema_version: SCHEMA_VERSION,
            strategy_id: strategy_id.into(),
            run_id: run_id.into(),
            markets_traded: traded.len(),
            trades,
            metrics,
            markets_scanned,
            exclusions,
            exclusion_counts,
            indeterminate_markets,
        }
    }

    /// Net returns in trade order.
    pub fn returns(&self) -> Vec<f64> {
        net_returns(&self.trades)
    }

    pub fn excluded_count(&self) -> usize {
        self.exclusions.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub fn count_exclusions(exclusions: &[Exclusion]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for exclusion in exclusions {
        *counts
            .entry(exclusion.reason.code().to_string())
            .or_insert(0) += 1;
    }
    counts
}

// ─── Ordering ───────────────────────────────────────────────────────

/// Total order on trades: entry time, then market id, then entry index.
pub fn trade_order(a: &SimulatedTrade, b: &SimulatedTrade) -> Ordering {
    a.entry_timestamp
        .cmp(&b.entry_timestamp)
        .then_with(|| a.market_id.cmp(&b.market_id))
        .then_with(|| a.entry_index.cmp(&b.entry_index))
}

pub fn sort_chronologically(trades: &mut [SimulatedTrade]) {
    trades.sort_by(trade_order);
}

/// Borrowed view of `trades` in chronological order.
pub fn chronological(trades: &[SimulatedTrade]) -> Vec<&SimulatedTrade> {
    let mut ordered: Vec<&SimulatedTrade> = trades.iter().collect();
    ordered.sort_by(|a, b| trade_order(a, b));
    ordered
}

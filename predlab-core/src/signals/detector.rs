//! Signal detector: scans a market's price history for rule entries.
//!
//! At index `i` the rule sees `prices[0..=i]` through a `PricePrefix` and
//! nothing else. Unmet warmup requirements yield no signal rather than an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::prefix::PricePrefix;
use super::rule::SignalRule;
use crate::domain::{MarketSeries, PricePoint, Side};

/// How many entries a single market may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryMode {
    /// Stop at the first qualifying quote: one trade per market.
    #[default]
    FirstOnly,
    /// Keep scanning after an entry, skipping the next `min_gap - 1` quotes.
    Multiple { min_gap: usize },
}

/// A qualifying entry event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntrySignal {
    pub entry_index: usize,
    pub entry_timestamp: DateTime<Utc>,
    pub side: Side,
    /// YES-implied price at entry.
    pub yes_price: f64,
}

impl EntrySignal {
    /// Quoted price of the contract the signal buys.
    pub fn entry_price(&self) -> f64 {
        self.side.contract_price(self.yes_price)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SignalDetector {
    mode: EntryMode,
}

impl SignalDetector {
    pub fn new(mode: EntryMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    /// Entry events for `rule` on `series`, in chronological order.
    pub fn detect<R>(&self, series: &MarketSeries, rule: &R) -> Vec<EntrySignal>
    where
        R: SignalRule + ?Sized,
    {
        // Only the quotes are handed on; the outcome stays with the series.
        scan(series.prices(), rule, self.mode)
    }
}

fn scan<R>(points: &[PricePoint], rule: &R, mode: EntryMode) -> Vec<EntrySignal>
where
    R: SignalRule + ?Sized,
{
    let mut signals = Vec::new();
    let mut next_eligible = rule.warmup_points().max(1) - 1;

    for index in 0..points.len() {
        if index < next_eligible {
            continue;
        }
        let Some(prefix) = PricePrefix::new(points, index) else {
            break;
        };
        if !rule.predicate(&prefix) {
            continue;
        }

        signals.push(EntrySignal {
            entry_index: index,
            entry_timestamp: points[index].timestamp,
            side: rule.select_side(&prefix),
            yes_price: points[index].price,
        });

        match mode {
            EntryMode::FirstOnly => break,
            EntryMode::Multiple { min_gap } => next_eligible = index + min_gap.max(1),
        }
    }

    signals
}

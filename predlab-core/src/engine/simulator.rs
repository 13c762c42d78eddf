//! Trade simulator. Turns entry signals into settled single-contract trades.
//!
//! This is the only stage that reads a market's resolution. Signals are
//! produced first from price prefixes; the outcome is looked up afterwards.

use super::outcome::OutcomePolicy;
use crate::domain::{MarketSeries, Outcome, SimulatedTrade, TradeExit};
use crate::error::{Exclusion, ExclusionReason, IndeterminateOutcomeError};
use crate::execution::{net_return, FeeModel};
use crate::signals::{EntrySignal, ExitPolicy, SignalRule};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TradeSimulator {
    fees: FeeModel,
    outcome_policy: OutcomePolicy,
}

impl TradeSimulator {
    pub fn new(fees: FeeModel, outcome_policy: OutcomePolicy) -> Self {
        Self {
            fees,
            outcome_policy,
        }
    }

    pub fn fees(&self) -> &FeeModel {
        &self.fees
    }

    pub fn outcome_policy(&self) -> OutcomePolicy {
        self.outcome_policy
    }

    /// Simulate one entry on `series`.
    ///
    /// Fails with an `Exclusion` when the market cannot be settled or the
    /// entry cost is zero.
    pub fn simulate<R>(
        &self,
        series: &MarketSeries,
        signal: &EntrySignal,
        rule: &R,
    ) -> Result<SimulatedTrade, Exclusion>
    where
        R: SignalRule + ?Sized,
    {
        let outcome = self.outcome_policy.resolve(series);
        self.settle(series, signal, rule.exit_policy(), outcome)
    }

    /// Simulate every signal on one market. The outcome is resolved once;
    /// repeated identical exclusions for the same market are collapsed.
    pub fn simulate_market<R>(
        &self,
        series: &MarketSeries,
        signals: &[EntrySignal],
        rule: &R,
    ) -> (Vec<SimulatedTrade>, Vec<Exclusion>)
    where
        R: SignalRule + ?Sized,
    {
        let mut trades = Vec::with_capacity(signals.len());
        let mut exclusions: Vec<Exclusion> = Vec::new();
        if signals.is_empty() {
            return (trades, exclusions);
        }

        let outcome = self.outcome_policy.resolve(series);
        let exit = rule.exit_policy();
        for signal in signals {
            match self.settle(series, signal, exit, outcome.clone()) {
                Ok(trade) => trades.push(trade),
                Err(exclusion) => {
                    if exclusions.last() != Some(&exclusion) {
                        tracing::debug!(
                            market_id = %exclusion.market_id,
                            reason = exclusion.reason.code(),
                            "trade excluded"
                        );
                        exclusions.push(exclusion);
                    }
                }
            }
        }
        (trades, exclusions)
    }

    fn settle(
        &self,
        series: &MarketSeries,
        signal: &EntrySignal,
        exit: ExitPolicy,
        outcome: Result<Outcome, IndeterminateOutcomeError>,
    ) -> Result<SimulatedTrade, Exclusion> {
        let market_id = series.market_id();
        let entry = self.fees.entry_cost(signal.yes_price, signal.side);
        if entry.cost <= 0.0 {
            return Err(Exclusion::new(market_id, ExclusionReason::ZeroCost));
        }

        let (exit, proceeds) = match horizon_exit(series, signal, exit) {
            Some((exit_index, exit_price)) => {
                let exit = TradeExit::Horizon {
                    exit_index,
                    exit_timestamp: series.prices()[exit_index].timestamp,
                    exit_price,
                };
                (exit, self.fees.sale_proceeds(exit_price))
            }
            None => {
                let outcome = outcome.map_err(|e| Exclusion::new(market_id, e))?;
                let proceeds = self.fees.settlement_proceeds(outcome.pays(signal.side));
                (TradeExit::Resolution { outcome }, proceeds)
            }
        };

        let net_return = net_return(proceeds, entry.cost)
            .ok_or_else(|| Exclusion::new(market_id, ExclusionReason::ZeroCost))?;
        let win = match exit {
            TradeExit::Resolution { outcome } => outcome.pays(signal.side),
            TradeExit::Horizon { .. } => net_return > 0.0,
        };

        Ok(SimulatedTrade {
            market_id: market_id.to_string(),
            side: signal.side,
            entry_index: signal.entry_index,
            entry_timestamp: signal.entry_timestamp,
            quoted_entry_price: entry.quoted,
            execution_price: entry.execution,
            cost: entry.cost,
            exit,
            proceeds,
            net_return,
            win,
        })
    }
}

/// Exit index and held-contract price for a fixed-horizon exit, or `None`
/// when the position is held to resolution (including when the history
/// ends before the horizon).
fn horizon_exit(
    series: &MarketSeries,
    signal: &EntrySignal,
    exit: ExitPolicy,
) -> Option<(usize, f64)> {
    let ExitPolicy::FixedHorizon { steps } = exit else {
        return None;
    };
    let exit_index = signal.entry_index.checked_add(steps)?;
    let point = series.prices().get(exit_index)?;
    Some((exit_index, signal.side.contract_price(point.price)))
}

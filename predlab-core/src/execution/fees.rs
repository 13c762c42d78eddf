//! Fee and slippage arithmetic for single-contract binary positions.
//!
//! All functions are pure. Prices are contract prices in [0, 1]; one contract
//! pays 1 if its side wins and 0 otherwise.

use serde::{Deserialize, Serialize};

use crate::domain::Side;
use crate::error::ConfigError;

/// Proportional transaction costs applied to every simulated trade.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeModel {
    /// Fraction added to the execution price on entry (0.02 = 2%).
    pub entry_fee_rate: f64,
    /// Fraction withheld from the payoff on exit.
    pub exit_fee_rate: f64,
    /// Fraction the quote moves against the trader on execution.
    pub slippage_rate: f64,
}

impl FeeModel {
    pub fn new(entry_fee_rate: f64, exit_fee_rate: f64, slippage_rate: f64) -> Self {
        Self {
            entry_fee_rate,
            exit_fee_rate,
            slippage_rate,
        }
    }

    /// No fees, no slippage.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Every rate must be finite and in [0, 1).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("entry_fee_rate", self.entry_fee_rate),
            ("exit_fee_rate", self.exit_fee_rate),
            ("slippage_rate", self.slippage_rate),
        ] {
            if !value.is_finite() || !(0.0..1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }
        Ok(())
    }

    /// Cost of buying one `side` contract at the YES quote `quoted_yes_price`.
    pub fn entry_cost(&self, quoted_yes_price: f64, side: Side) -> EntryCost {
        let execution = execution_price(quoted_yes_price, side, self.slippage_rate);
        EntryCost {
            quoted: side.contract_price(quoted_yes_price),
            execution,
            cost: cost_after_entry_fee(execution, self.entry_fee_rate),
        }
    }

    /// Proceeds from redeeming one contract at settlement (payoff 1 or 0).
    pub fn settlement_proceeds(&self, won: bool) -> f64 {
        let payoff = if won { 1.0 } else { 0.0 };
        proceeds_after_exit_fee(payoff, self.exit_fee_rate)
    }

    /// Proceeds from selling one contract quoted at `contract_price` before settlement.
    pub fn sale_proceeds(&self, contract_price: f64) -> f64 {
        let executed = exit_execution_price(contract_price, self.slippage_rate);
        proceeds_after_exit_fee(executed, self.exit_fee_rate)
    }
}

/// Entry prices for one contract, from quote to all-in cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryCost {
    pub quoted: f64,
    pub execution: f64,
    pub cost: f64,
}

/// Price actually paid to buy `side` given the YES quote.
///
/// Buying pushes the price up: `contract * (1 + slippage_rate)`, capped at 1
/// since no contract trades above its maximum payoff.
pub fn execution_price(quoted_yes_price: f64, side: Side, slippage_rate: f64) -> f64 {
    (side.contract_price(quoted_yes_price) * (1.0 + slippage_rate)).min(1.0)
}

/// Price received when selling a contract: `contract * (1 - slippage_rate)`.
pub fn exit_execution_price(contract_price: f64, slippage_rate: f64) -> f64 {
    (contract_price * (1.0 - slippage_rate)).max(0.0)
}

pub fn cost_after_entry_fee(execution_price: f64, entry_fee_rate: f64) -> f64 {
    execution_price * (1.0 + entry_fee_rate)
}

pub fn proceeds_after_exit_fee(payoff: f64, exit_fee_rate: f64) -> f64 {
    payoff * (1.0 - exit_fee_rate)
}

/// `(proceeds - cost) / cost`, or `None` when the cost is zero and the return is undefined.
pub fn net_return(proceeds: f64, cost: f64) -> Option<f64> {
    if cost == 0.0 || !cost.is_finite() {
        return None;
    }
    Some((proceeds - cost) / cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_fee_winning_yes_law() {
        let fees = FeeModel::zero();
        let p = 0.1;
        let entry = fees.entry_cost(p, Side::Yes);
        let r = net_return(fees.settlement_proceeds(true), entry.cost).unwrap();
        assert_eq!(r, (1.0 - p) / p);
        assert!((r - 9.0).abs() < 1e-12);
    }

    #[test]
    fn losing_trade_loses_everything() {
        let fees = FeeModel::new(0.02, 0.02, 0.01);
        let entry = fees.entry_cost(0.4, Side::Yes);
        let r = net_return(fees.settlement_proceeds(false), entry.cost).unwrap();
        assert_eq!(r, -1.0);
    }

    #[test]
    fn fees_and_slippage_example() {
        let fees = FeeModel::new(0.02, 0.02, 0.01);
        let entry = fees.entry_cost(0.10, Side::Yes);
        assert!((entry.execution - 0.101).abs() < 1e-12);
        assert!((entry.cost - 0.10302).abs() < 1e-12);
        let proceeds = fees.settlement_proceeds(true);
        assert!((proceeds - 0.98).abs() < 1e-12);
        let r = net_return(proceeds, entry.cost).unwrap();
        assert!((r - 8.5126).abs() < 1e-3, "got {r}");
    }

    #[test]
    fn no_side_pays_complement_price() {
        let entry = FeeModel::zero().entry_cost(0.9, Side::No);
        assert!((entry.quoted - 0.1).abs() < 1e-12);
        assert!((entry.execution - 0.1).abs() < 1e-12);
    }

    #[test]
    fn slippage_capped_at_one() {
        assert_eq!(execution_price(0.999, Side::Yes, 0.05), 1.0);
    }

    #[test]
    fn sale_moves_price_down() {
        let fees = FeeModel::new(0.0, 0.0, 0.01);
        assert!((fees.sale_proceeds(0.5) - 0.495).abs() < 1e-12);
    }

    #[test]
    fn zero_cost_is_undefined() {
        assert!(net_return(1.0, 0.0).is_none());
    }

    #[test]
    fn negative_rate_rejected() {
        let fees = FeeModel::new(-0.01, 0.0, 0.0);
        assert_eq!(
            fees.validate(),
            Err(ConfigError::RateOutOfRange {
                name: "entry_fee_rate",
                value: -0.01
            })
        );
        assert!(FeeModel::new(0.0, 1.0, 0.0).validate().is_err());
        assert!(FeeModel::new(0.02, 0.02, 0.01).validate().is_ok());
    }
}

//! One hypothetical single-unit position, from entry to settlement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::market::{Outcome, Side};

/// How the position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TradeExit {
    /// Held until the market settled; the contract paid 1 or 0.
    Resolution { outcome: Outcome },
    /// Sold at a recorded quote a fixed number of points after entry.
    Horizon {
        exit_index: usize,
        exit_timestamp: DateTime<Utc>,
        /// Quoted price of the held contract at exit.
        exit_price: f64,
    },
}

/// A completed simulated trade. Created once by the trade simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTrade {
    // ── Identification ──
    pub market_id: String,
    pub side: Side,

    // ── Entry ──
    pub entry_index: usize,
    pub entry_timestamp: DateTime<Utc>,
    /// Quoted price of the purchased contract (YES price for YES, 1 - YES price for NO).
    pub quoted_entry_price: f64,
    /// Quoted price moved against the trader by slippage.
    pub execution_price: f64,
    /// Execution price plus entry fee: what one contract actually cost.
    pub cost: f64,

    // ── Exit ──
    pub exit: TradeExit,
    /// Payoff after exit fee.
    pub proceeds: f64,

    // ── Result ──
    pub net_return: f64,
    pub win: bool,
}

impl SimulatedTrade {
    pub fn is_winner(&self) -> bool {
        self.win
    }

    pub fn held_to_resolution(&self) -> bool {
        matches!(self.exit, TradeExit::Resolution { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_trade() -> SimulatedTrade {
        SimulatedTrade {
            market_id: "m1".into(),
            side: Side::Yes,
            entry_index: 0,
            entry_timestamp: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
            quoted_entry_price: 0.10,
            execution_price: 0.10,
            cost: 0.10,
            exit: TradeExit::Resolution {
                outcome: Outcome::Yes,
            },
            proceeds: 1.0,
            net_return: 9.0,
            win: true,
        }
    }

    #[test]
    fn winner_flag() {
        let trade = sample_trade();
        assert!(trade.is_winner());
        assert!(trade.held_to_resolution());
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: SimulatedTrade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}

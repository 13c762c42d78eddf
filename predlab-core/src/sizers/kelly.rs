//! Kelly criterion for binary contracts.
//!
//! Buying a contract at `price` that pays 1 on a win gives net odds
//! `b = (1 - price) / price`. With win probability `p` and `q = 1 - p`,
//! full Kelly is `f* = (p * b - q) / b`, clipped at 0.

use serde::{Deserialize, Serialize};

/// Full-Kelly bankroll fraction. Returns 0 for no edge, for `price >= 1`
/// (no upside) and for inputs outside [0, 1].
pub fn kelly_fraction(win_prob: f64, price: f64) -> f64 {
    if !(0.0..=1.0).contains(&win_prob) || !(0.0..=1.0).contains(&price) || price <= 0.0 {
        return 0.0;
    }
    let b = (1.0 - price) / price;
    if b <= 0.0 {
        return 0.0;
    }
    let q = 1.0 - win_prob;
    ((win_prob * b - q) / b).max(0.0)
}

pub fn half_kelly(win_prob: f64, price: f64) -> f64 {
    kelly_fraction(win_prob, price) * 0.5
}

pub fn quarter_kelly(win_prob: f64, price: f64) -> f64 {
    kelly_fraction(win_prob, price) * 0.25
}

/// Full, half and quarter Kelly for one (probability, price) pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KellySizing {
    pub win_prob: f64,
    pub price: f64,
    pub full: f64,
    pub half: f64,
    pub quarter: f64,
}

impl KellySizing {
    pub fn new(win_prob: f64, price: f64) -> Self {
        let full = kelly_fraction(win_prob, price);
        Self {
            win_prob,
            price,
            full,
            half: full * 0.5,
            quarter: full * 0.25,
        }
    }
}

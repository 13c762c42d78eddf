//! Strategy rules as data.
//!
//! A rule is an entry predicate over a `PricePrefix`, a side selector and an
//! exit policy. The detector and simulator only talk to the `SignalRule`
//! trait, so adding a strategy means adding a variant here, not a new loop.

use serde::{Deserialize, Serialize};

use super::prefix::PricePrefix;
use crate::domain::Side;
use crate::error::ConfigError;

/// Interface every strategy exposes to the signal detector and trade simulator.
///
/// # Lookahead invariant
/// `predicate` and `select_side` receive only a prefix of the price history.
/// They cannot observe later quotes or the market's resolution.
pub trait SignalRule: Send + Sync {
    fn id(&self) -> &str;

    /// Minimum number of visible quotes before the predicate can fire.
    fn warmup_points(&self) -> usize;

    fn predicate(&self, prefix: &PricePrefix<'_>) -> bool;

    fn select_side(&self, prefix: &PricePrefix<'_>) -> Side;

    fn exit_policy(&self) -> ExitPolicy;
}

/// Entry condition variants. Each documents its boundary convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryCondition {
    /// Fires when `price < threshold`, or `price <= threshold` when `inclusive`.
    PriceBelow {
        threshold: f64,
        #[serde(default)]
        inclusive: bool,
    },
    /// Fires when `price > threshold`, or `price >= threshold` when `inclusive`.
    PriceAbove {
        threshold: f64,
        #[serde(default)]
        inclusive: bool,
    },
    /// Fires when `low <= price <= high` (both ends inclusive).
    PriceInRange { low: f64, high: f64 },
    /// Fires when `price < sma(window) - margin` (strict). Needs `window` quotes.
    MeanReversion { window: usize, margin: f64 },
    /// Fires when the change over `lookback` steps reaches `min_change`:
    /// `change >= min_change` for a non-negative `min_change`,
    /// `change <= min_change` for a negative one. Needs `lookback + 1` quotes.
    Momentum { lookback: usize, min_change: f64 },
    /// Fires on the quote where `sma(fast) > sma(slow)` and, one quote earlier,
    /// `sma(fast) <= sma(slow)`. Needs `slow + 1` quotes.
    SmaCross { fast: usize, slow: usize },
}

impl EntryCondition {
    pub fn warmup_points(&self) -> usize {
        match self {
            Self::PriceBelow { .. } | Self::PriceAbove { .. } | Self::PriceInRange { .. } => 1,
            Self::MeanReversion { window, .. } => *window,
            Self::Momentum { lookback, .. } => lookback + 1,
            Self::SmaCross { slow, .. } => slow + 1,
        }
    }

    pub fn is_met(&self, prefix: &PricePrefix<'_>) -> bool {
        if prefix.len() < self.warmup_points() {
            return false;
        }
        let price = prefix.current_price();
        match *self {
            Self::PriceBelow {
                threshold,
                inclusive,
            } => {
                if inclusive {
                    price <= threshold
                } else {
                    price < threshold
                }
            }
            Self::PriceAbove {
                threshold,
                inclusive,
            } => {
                if inclusive {
                    price >= threshold
                } else {
                    price > threshold
                }
            }
            Self::PriceInRange { low, high } => low <= price && price <= high,
            Self::MeanReversion { window, margin } => match prefix.sma(window) {
                Some(mean) => price < mean - margin,
                None => false,
            },
            Self::Momentum {
                lookback,
                min_change,
            } => match prefix.change(lookback) {
                Some(change) if min_change >= 0.0 => change >= min_change,
                Some(change) => change <= min_change,
                None => false,
            },
            Self::SmaCross { fast, slow } => {
                let current = prefix.sma(fast).zip(prefix.sma(slow));
                let previous = prefix.previous_sma(fast).zip(prefix.previous_sma(slow));
                match (current, previous) {
                    (Some((f, s)), Some((pf, ps))) => f > s && pf <= ps,
                    _ => false,
                }
            }
        }
    }

    /// Human-readable condition including its boundary convention.
    pub fn describe(&self) -> String {
        match self {
            Self::PriceBelow {
                threshold,
                inclusive,
            } => format!("price {} {threshold}", if *inclusive { "<=" } else { "<" }),
            Self::PriceAbove {
                threshold,
                inclusive,
            } => format!("price {} {threshold}", if *inclusive { ">=" } else { ">" }),
            Self::PriceInRange { low, high } => format!("{low} <= price <= {high}"),
            Self::MeanReversion { window, margin } => {
                format!("price < sma({window}) - {margin}")
            }
            Self::Momentum {
                lookback,
                min_change,
            } => {
                let op = if *min_change >= 0.0 { ">=" } else { "<=" };
                format!("change({lookback}) {op} {min_change}")
            }
            Self::SmaCross { fast, slow } => format!("sma({fast}) crosses above sma({slow})"),
        }
    }

    fn validate(&self) -> Result<(), String> {
        let unit = |name: &str, v: f64| -> Result<(), String> {
            if v.is_finite() && (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(format!("{name} must be a finite value in [0, 1], got {v}"))
            }
        };
        match *self {
            Self::PriceBelow { threshold, .. } | Self::PriceAbove { threshold, .. } => {
                unit("threshold", threshold)
            }
            Self::PriceInRange { low, high } => {
                unit("low", low)?;
                unit("high", high)?;
                if low > high {
                    return Err(format!("low {low} exceeds high {high}"));
                }
                Ok(())
            }
            Self::MeanReversion { window, margin } => {
                if window == 0 {
                    return Err("window must be >= 1".into());
                }
                unit("margin", margin)
            }
            Self::Momentum {
                lookback,
                min_change,
            } => {
                if lookback == 0 {
                    return Err("lookback must be >= 1".into());
                }
                if !min_change.is_finite() || min_change.abs() > 1.0 {
                    return Err(format!("min_change must be in [-1, 1], got {min_change}"));
                }
                Ok(())
            }
            Self::SmaCross { fast, slow } => {
                if fast == 0 {
                    return Err("fast must be >= 1".into());
                }
                if slow <= fast {
                    return Err(format!("slow ({slow}) must be > fast ({fast})"));
                }
                Ok(())
            }
        }
    }
}

/// Which contract to buy once the entry condition fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SideSelector {
    Fixed { side: Side },
    /// YES when the current price is at least 0.5, otherwise NO.
    Favorite,
    /// YES when the current price is below 0.5, otherwise NO.
    Underdog,
}

impl Default for SideSelector {
    fn default() -> Self {
        Self::Fixed { side: Side::Yes }
    }
}

impl SideSelector {
    pub fn select(&self, prefix: &PricePrefix<'_>) -> Side {
        let price = prefix.current_price();
        match *self {
            Self::Fixed { side } => side,
            Self::Favorite => {
                if price >= 0.5 {
                    Side::Yes
                } else {
                    Side::No
                }
            }
            Self::Underdog => {
                if price < 0.5 {
                    Side::Yes
                } else {
                    Side::No
                }
            }
        }
    }
}

/// When a simulated position is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExitPolicy {
    #[default]
    HoldToResolution,
    /// Sell `steps` quotes after entry. Falls back to resolution when the
    /// history ends first.
    FixedHorizon { steps: usize },
}

/// A complete, immutable strategy definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRule {
    pub id: String,
    pub entry: EntryCondition,
    #[serde(default)]
    pub side: SideSelector,
    #[serde(default)]
    pub exit: ExitPolicy,
}

impl StrategyRule {
    pub fn new(id: impl Into<String>, entry: EntryCondition, side: SideSelector) -> Self {
        Self {
            id: id.into(),
            entry,
            side,
            exit: ExitPolicy::HoldToResolution,
        }
    }

    pub fn with_exit(mut self, exit: ExitPolicy) -> Self {
        self.exit = exit;
        self
    }

    /// Buy YES whenever the price is strictly below `threshold`.
    pub fn buy_yes_below(id: impl Into<String>, threshold: f64) -> Self {
        Self::new(
            id,
            EntryCondition::PriceBelow {
                threshold,
                inclusive: false,
            },
            SideSelector::Fixed { side: Side::Yes },
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidRule {
            strategy: self.id.clone(),
            reason,
        };
        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty".into()));
        }
        self.entry.validate().map_err(invalid)?;
        if let ExitPolicy::FixedHorizon { steps: 0 } = self.exit {
            return Err(invalid("fixed_horizon steps must be >= 1".into()));
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        self.entry.describe()
    }
}

impl SignalRule for StrategyRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn warmup_points(&self) -> usize {
        self.entry.warmup_points()
    }

    fn predicate(&self, prefix: &PricePrefix<'_>) -> bool {
        self.entry.is_met(prefix)
    }

    fn select_side(&self, prefix: &PricePrefix<'_>) -> Side {
        self.side.select(prefix)
    }

    fn exit_policy(&self) -> ExitPolicy {
        self.exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricePoint;
    use chrono::{TimeZone, Utc};

    fn points(prices: &[f64]) -> Vec<PricePoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                PricePoint::new(
                    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                        + chrono::Duration::days(i as i64),
                    p,
                )
            })
            .collect()
    }

    fn at(pts: &[PricePoint], i: usize) -> PricePrefix<'_> {
        PricePrefix::new(pts, i).unwrap()
    }

    #[test]
    fn strict_vs_inclusive_threshold() {
        let pts = points(&[0.30]);
        let strict = EntryCondition::PriceBelow {
            threshold: 0.30,
            inclusive: false,
        };
        let inclusive = EntryCondition::PriceBelow {
            threshold: 0.30,
            inclusive: true,
        };
        assert!(!strict.is_met(&at(&pts, 0)));
        assert!(inclusive.is_met(&at(&pts, 0)));
    }

    #[test]
    fn price_above_and_range() {
        let pts = points(&[0.8]);
        let above = EntryCondition::PriceAbove {
            threshold: 0.75,
            inclusive: false,
        };
        let range = EntryCondition::PriceInRange {
            low: 0.8,
            high: 0.9,
        };
        assert!(above.is_met(&at(&pts, 0)));
        assert!(range.is_met(&at(&pts, 0)));
    }

    #[test]
    fn mean_reversion_needs_window() {
        let pts = points(&[0.5, 0.5, 0.3]);
        let cond = EntryCondition::MeanReversion {
            window: 3,
            margin: 0.05,
        };
        assert!(!cond.is_met(&at(&pts, 1)));
        // sma = 0.4333, 0.3 < 0.3833
        assert!(cond.is_met(&at(&pts, 2)));
    }

    #[test]
    fn momentum_signed_threshold() {
        let pts = points(&[0.2, 0.25, 0.35]);
        let up = EntryCondition::Momentum {
            lookback: 2,
            min_change: 0.1,
        };
        let down = EntryCondition::Momentum {
            lookback: 2,
            min_change: -0.1,
        };
        assert!(up.is_met(&at(&pts, 2)));
        assert!(!down.is_met(&at(&pts, 2)));
        assert!(!up.is_met(&at(&pts, 1)));
    }

    #[test]
    fn sma_cross_fires_only_on_cross() {
        let pts = points(&[0.5, 0.4, 0.3, 0.6, 0.7]);
        let cond = EntryCondition::SmaCross { fast: 1, slow: 3 };
        // index 3: sma1 = 0.6 > sma3 = 0.433; prev sma1 = 0.3 <= sma3 = 0.4
        assert!(cond.is_met(&at(&pts, 3)));
        // index 4: already above on the previous quote
        assert!(!cond.is_met(&at(&pts, 4)));
    }

    #[test]
    fn side_selectors() {
        let pts = points(&[0.7]);
        let p = at(&pts, 0);
        assert_eq!(SideSelector::Favorite.select(&p), Side::Yes);
        assert_eq!(SideSelector::Underdog.select(&p), Side::No);
        assert_eq!(SideSelector::default().select(&p), Side::Yes);
    }

    #[test]
    fn validation_rejects_malformed_thresholds() {
        let bad = StrategyRule::buy_yes_below("bad", 1.5);
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidRule { .. })
        ));
        let cross = StrategyRule::new(
            "cross",
            EntryCondition::SmaCross { fast: 5, slow: 5 },
            SideSelector::default(),
        );
        assert!(cross.validate().is_err());
        let horizon = StrategyRule::buy_yes_below("h", 0.3)
            .with_exit(ExitPolicy::FixedHorizon { steps: 0 });
        assert!(horizon.validate().is_err());
        assert!(StrategyRule::buy_yes_below("ok", 0.3).validate().is_ok());
    }

    #[test]
    fn describe_states_boundary() {
        assert_eq!(StrategyRule::buy_yes_below("r", 0.3).describe(), "price < 0.3");
    }

    #[test]
    fn rule_deserializes_from_tagged_json() {
        let json = r#"{
            "id": "longshot",
            "entry": {"type": "price_below", "threshold": 0.1},
            "side": {"type": "fixed", "side": "NO"},
            "exit": {"type": "fixed_horizon", "steps": 3}
        }"#;
        let rule: StrategyRule = serde_json::from_str(json).unwrap();
        assert_eq!(
            rule.entry,
            EntryCondition::PriceBelow {
                threshold: 0.1,
                inclusive: false
            }
        );
        assert_eq!(rule.side, SideSelector::Fixed { side: Side::No });
        assert_eq!(rule.exit, ExitPolicy::FixedHorizon { steps: 3 });
    }
}

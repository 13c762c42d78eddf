//! Outcome resolution policy.
//!
//! A market is settled from its explicit `resolution_outcome`. Inferring the
//! outcome from the final recorded price is opt-in only, and even then a
//! final price inside the proxy band leaves the market indeterminate.

use serde::{Deserialize, Serialize};

use crate::domain::{MarketSeries, Outcome};
use crate::error::{ConfigError, IndeterminateOutcomeError};

pub const DEFAULT_PROXY_YES_ABOVE: f64 = 0.95;
pub const DEFAULT_PROXY_NO_BELOW: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutcomePolicy {
    /// Only the recorded resolution counts.
    #[default]
    Explicit,
    /// Fall back to the final price when no resolution is recorded:
    /// YES if `final > yes_above`, NO if `final < no_below`, else indeterminate.
    PriceAsProxy {
        #[serde(default = "default_yes_above")]
        yes_above: f64,
        #[serde(default = "default_no_below")]
        no_below: f64,
    },
}

fn default_yes_above() -> f64 {
    DEFAULT_PROXY_YES_ABOVE
}

fn default_no_below() -> f64 {
    DEFAULT_PROXY_NO_BELOW
}

impl OutcomePolicy {
    pub fn price_as_proxy() -> Self {
        Self::PriceAsProxy {
            yes_above: DEFAULT_PROXY_YES_ABOVE,
            no_below: DEFAULT_PROXY_NO_BELOW,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Self::PriceAsProxy {
            yes_above,
            no_below,
        } = *self
        {
            let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
            if !in_unit(yes_above) || !in_unit(no_below) || no_below >= yes_above {
                return Err(ConfigError::InvalidParameter {
                    name: "outcome_policy",
                    reason: format!(
                        "need 0 <= no_below < yes_above <= 1, got no_below={no_below}, yes_above={yes_above}"
                    ),
                });
            }
        }
        Ok(())
    }

    /// Settle `series` under this policy.
    pub fn resolve(&self, series: &MarketSeries) -> Result<Outcome, IndeterminateOutcomeError> {
        if let Some(outcome) = series.resolution_outcome() {
            return Ok(outcome);
        }
        match *self {
            Self::Explicit => Err(IndeterminateOutcomeError::Unresolved),
            Self::PriceAsProxy {
                yes_above,
                no_below,
            } => {
                let final_price = series.final_price();
                if final_price > yes_above {
                    Ok(Outcome::Yes)
                } else if final_price < no_below {
                    Ok(Outcome::No)
                } else {
                    Err(IndeterminateOutcomeError::AmbiguousFinalPrice {
                        final_price,
                        yes_above,
                        no_below,
                    })
                }
            }
        }
    }
}

//! Error taxonomy and per-market exclusion records.
//!
//! Four error classes cover the pipeline:
//! - `DataError`: one market's price history is malformed or too short.
//! - `IndeterminateOutcomeError`: the market cannot be settled.
//! - `DegenerateStatisticsError`: a validation step has nothing meaningful to measure.
//! - `ConfigError`: the run itself is misconfigured and must not start.
//!
//! The first two never abort a batch. They are turned into `Exclusion` records
//! so every result can account for the markets it left out.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed or unusable price history for a single market.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum DataError {
    #[error("price history is empty")]
    EmptyHistory,

    #[error("price history too short: {len} points < minimum {min}")]
    TooShort { len: usize, min: usize },

    #[error("non-finite price at index {index}")]
    NonFinitePrice { index: usize },

    #[error("price {price} at index {index} outside [0, 1]")]
    PriceOutOfRange { index: usize, price: f64 },

    #[error("timestamp at index {index} does not strictly increase")]
    NonIncreasingTimestamp { index: usize },

    #[error("malformed market record: {0}")]
    Malformed(String),
}

/// The market's resolution cannot be determined under the active outcome policy.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum IndeterminateOutcomeError {
    #[error("no explicit resolution outcome recorded")]
    Unresolved,

    #[error("final price {final_price} is not above {yes_above} or below {no_below}")]
    AmbiguousFinalPrice {
        final_price: f64,
        yes_above: f64,
        no_below: f64,
    },
}

/// A validation sample is too small or too flat to produce a statistic.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum DegenerateStatisticsError {
    #[error("too few observations: {got} < required {required}")]
    TooFewObservations { got: usize, required: usize },

    #[error("zero variance in {0}")]
    ZeroVariance(String),

    #[error("no finite resamples produced for {0}")]
    NoFiniteSamples(String),
}

/// Invalid strategy, fee or validation parameters. Aborts the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be in [0, 1), got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },

    #[error("strategy '{strategy}': {reason}")]
    InvalidRule { strategy: String, reason: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("duplicate strategy id '{0}'")]
    DuplicateStrategy(String),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("config I/O error: {0}")]
    Io(String),
}

/// Why a market (or a candidate trade on it) was left out of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    Data { error: DataError },
    IndeterminateOutcome { error: IndeterminateOutcomeError },
    /// Entry cost was zero, so the return is undefined.
    ZeroCost,
}

impl ExclusionReason {
    /// Stable code used to aggregate exclusion counts in reports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Data { error } => match error {
                DataError::EmptyHistory => "data_empty_history",
                DataError::TooShort { .. } => "data_too_short",
                DataError::NonFinitePrice { .. } => "data_non_finite_price",
                DataError::PriceOutOfRange { .. } => "data_price_out_of_range",
                DataError::NonIncreasingTimestamp { .. } => "data_non_increasing_timestamp",
                DataError::Malformed(_) => "data_malformed",
            },
            Self::IndeterminateOutcome { error } => match error {
                IndeterminateOutcomeError::Unresolved => "indeterminate_unresolved",
                IndeterminateOutcomeError::AmbiguousFinalPrice { .. } => {
                    "indeterminate_ambiguous_final_price"
                }
            },
            Self::ZeroCost => "zero_entry_cost",
        }
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Self::IndeterminateOutcome { .. })
    }
}

impl From<DataError> for ExclusionReason {
    fn from(error: DataError) -> Self {
        Self::Data { error }
    }
}

impl From<IndeterminateOutcomeError> for ExclusionReason {
    fn from(error: IndeterminateOutcomeError) -> Self {
        Self::IndeterminateOutcome { error }
    }
}

/// A market or candidate trade dropped from a backtest, with its reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub market_id: String,
    pub reason: ExclusionReason,
}

impl Exclusion {
    pub fn new(market_id: impl Into<String>, reason: impl Into<ExclusionReason>) -> Self {
        Self {
            market_id: market_id.into(),
            reason: reason.into(),
        }
    }
}

//! Immutable binary-market price history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Which contract a position holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Yes => Side::No,
            Side::No => Side::Yes,
        }
    }

    /// Price of this side's contract given the YES-implied probability.
    pub fn contract_price(self, yes_price: f64) -> f64 {
        match self {
            Side::Yes => yes_price,
            Side::No => 1.0 - yes_price,
        }
    }
}

/// How a market resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    pub fn winning_side(self) -> Side {
        match self {
            Outcome::Yes => Side::Yes,
            Outcome::No => Side::No,
        }
    }

    pub fn pays(self, side: Side) -> bool {
        self.winning_side() == side
    }
}

/// One recorded quote: YES-implied probability at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Price history and metadata for a single binary market.
///
/// Construction validates the history (prices finite and in [0, 1], timestamps
/// strictly increasing). Fields are private and there are no `&mut self`
/// methods, so a series cannot change once it has been handed downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSeries {
    market_id: String,
    question: String,
    end_date: Option<DateTime<Utc>>,
    resolution_outcome: Option<Outcome>,
    volume: f64,
    prices: Vec<PricePoint>,
}

impl MarketSeries {
    /// Build a series from its price history, rejecting malformed data.
    pub fn new(
        market_id: impl Into<String>,
        question: impl Into<String>,
        prices: Vec<PricePoint>,
    ) -> Result<Self, DataError> {
        validate_history(&prices)?;
        Ok(Self {
            market_id: market_id.into(),
            question: question.into(),
            end_date: None,
            resolution_outcome: None,
            volume: 0.0,
            prices,
        })
    }

    pub fn with_outcome(mut self, outcome: Option<Outcome>) -> Self {
        self.resolution_outcome = outcome;
        self
    }

    pub fn with_end_date(mut self, end_date: Option<DateTime<Utc>>) -> Self {
        self.end_date = end_date;
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Explicitly recorded resolution, if any.
    ///
    /// Only outcome resolution and the trade simulator read this. Strategy
    /// rules see a `PricePrefix`, which has no path to it.
    pub fn resolution_outcome(&self) -> Option<Outcome> {
        self.resolution_outcome
    }

    pub fn prices(&self) -> &[PricePoint] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Last recorded price. Always present: construction rejects empty histories.
    pub fn final_price(&self) -> f64 {
        self.prices.last().map(|p| p.price).unwrap_or(f64::NAN)
    }
}

fn validate_history(prices: &[PricePoint]) -> Result<(), DataError> {
    if prices.is_empty() {
        return Err(DataError::EmptyHistory);
    }
    for (index, point) in prices.iter().enumerate() {
        if !point.price.is_finite() {
            return Err(DataError::NonFinitePrice { index });
        }
        if !(0.0..=1.0).contains(&point.price) {
            return Err(DataError::PriceOutOfRange {
                index,
                price: point.price,
            });
        }
        if index > 0 && point.timestamp <= prices[index - 1].timestamp {
            return Err(DataError::NonIncreasingTimestamp { index });
        }
    }
    Ok(())
}

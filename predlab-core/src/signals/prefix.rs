//! The point-in-time price view a strategy rule evaluates.
//!
//! A prefix at index `i` covers `prices[0..=i]`: the quote being acted on and
//! everything recorded before it. It carries no resolution outcome and no
//! later quotes, so a rule written against it cannot look ahead.

use chrono::{DateTime, Utc};

use crate::domain::PricePoint;

#[derive(Debug, Clone, Copy)]
pub struct PricePrefix<'a> {
    points: &'a [PricePoint],
}

impl<'a> PricePrefix<'a> {
    /// Prefix ending at (and including) `index`. `None` if `index` is past the end.
    pub fn new(points: &'a [PricePoint], index: usize) -> Option<Self> {
        points.get(..=index).map(|points| Self { points })
    }

    /// Number of quotes visible, including the current one.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the current quote in the full series.
    pub fn index(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn current_price(&self) -> f64 {
        self.points.last().map(|p| p.price).unwrap_or(f64::NAN)
    }

    pub fn current_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    /// Price `lag` steps before the current quote (`lag = 0` is the current quote).
    pub fn price_at_lag(&self, lag: usize) -> Option<f64> {
        let idx = self.index().checked_sub(lag)?;
        self.points.get(idx).map(|p| p.price)
    }

    pub fn points(&self) -> &'a [PricePoint] {
        self.points
    }

    /// Simple moving average of the last `window` quotes (current included).
    ///
    /// `None` while fewer than `window` quotes are visible.
    pub fn sma(&self, window: usize) -> Option<f64> {
        if window == 0 || self.points.len() < window {
            return None;
        }
        let tail = &self.points[self.points.len() - window..];
        Some(tail.iter().map(|p| p.price).sum::<f64>() / window as f64)
    }

    /// SMA as of the previous quote, for crossover detection.
    pub fn previous_sma(&self, window: usize) -> Option<f64> {
        self.shifted()?.sma(window)
    }

    /// Absolute price change over the last `lookback` steps.
    pub fn change(&self, lookback: usize) -> Option<f64> {
        let past = self.price_at_lag(lookback)?;
        Some(self.current_price() - past)
    }

    /// The prefix one quote shorter.
    fn shifted(&self) -> Option<PricePrefix<'a>> {
        if self.points.len() < 2 {
            return None;
        }
        Some(Self {
            points: &self.points[..self.points.len() - 1],
        })
    }
}

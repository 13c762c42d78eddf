//! Domain types for binary prediction markets.

pub mod market;
pub mod trade;

pub use market::{MarketSeries, Outcome, PricePoint, Side};
pub use trade::{SimulatedTrade, TradeExit};

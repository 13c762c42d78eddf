//! Backtest engine: outcome resolution and trade simulation.
//!
//! Pipeline per market:
//!
//! 1. Signal detection over price prefixes (see `signals`)
//! 2. Outcome resolution under the configured `OutcomePolicy`
//! 3. Settlement of each entry through the fee model

pub mod outcome;
pub mod simulator;

pub use outcome::{OutcomePolicy, DEFAULT_PROXY_NO_BELOW, DEFAULT_PROXY_YES_ABOVE};
pub use simulator::TradeSimulator;

//! PredLab Core: binary prediction-market backtest primitives.
//!
//! This crate contains everything needed to turn one market's price history
//! into simulated trades:
//! - Domain types (price points, market series, sides, outcomes, trades)
//! - Strategy rules as data and a lookahead-free signal detector
//! - Fee and slippage model, Kelly sizing
//! - Outcome resolution and the trade simulator
//! - Deterministic RNG hierarchy for the validation layer

pub mod domain;
pub mod engine;
pub mod error;
pub mod execution;
pub mod rng;
pub mod signals;
pub mod sizers;

pub use domain::{MarketSeries, Outcome, PricePoint, Side, SimulatedTrade, TradeExit};
pub use engine::{OutcomePolicy, TradeSimulator};
pub use error::{
    ConfigError, DataError, DegenerateStatisticsError, Exclusion, ExclusionReason,
    IndeterminateOutcomeError,
};
pub use execution::FeeModel;
pub use rng::RngHierarchy;
pub use signals::{
    EntryCondition, EntryMode, EntrySignal, ExitPolicy, PricePrefix, SideSelector,
    SignalDetector, SignalRule, StrategyRule,
};
pub use sizers::KellySizing;

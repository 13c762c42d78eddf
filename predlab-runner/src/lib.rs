//! PredLab Runner: batch backtests and their statistical validation.
//!
//! This crate builds on `predlab-core` to provide:
//! - Market corpus loading from JSON / JSON Lines
//! - TOML backtest configuration with run-id hashing
//! - Parallel per-strategy runner with abort support
//! - Performance metrics over chronological trades
//! - Bootstrap, Monte Carlo, VaR/CVaR, walk-forward and stability validation

pub mod bootstrap;
pub mod config;
pub mod loader;
pub mod metrics;
pub mod monte_carlo;
pub mod report;
pub mod result;
pub mod runner;
pub mod stability;
pub mod tail_metrics;
pub mod walk_forward;

pub use bootstrap::{bootstrap_returns, BootstrapConfig, BootstrapResult, ConfidenceInterval};
pub use config::{BacktestConfig, RunId, ValidationConfig};
pub use loader::{
    load_markets_file, parse_markets_json, JsonFileSource, LoadError, MarketCorpus, MarketRecord,
    MarketSource,
};
pub use metrics::PerformanceMetrics;
pub use monte_carlo::{monte_carlo_paths, MonteCarloConfig, MonteCarloResult, TerminalPercentiles};
pub use report::{validate_result, ValidationReport};
pub use result::{BacktestResult, SCHEMA_VERSION};
pub use runner::{run_backtest, run_batch, AbortHandle, RunError, StrategyReport};
pub use stability::{strategy_stability, StabilityConfig, StabilityResult};
pub use tail_metrics::{compute_tail_metrics, compute_var_cvar, TailMetrics, TailRiskConfig, VarCvar};
pub use walk_forward::{
    create_folds, walk_forward_analysis, FoldResult, FoldSpec, WalkForwardConfig,
    WalkForwardResult,
};

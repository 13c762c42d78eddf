//! Backtest runner. Wires detection and simulation into per-strategy results.
//!
//! Two entry points:
//! - `run_backtest()`: one strategy over a market corpus.
//! - `run_batch()`: every strategy in a `BacktestConfig`, each followed by
//!   statistical validation.
//!
//! Markets are processed in parallel with rayon. Trades are re-sorted by
//! `BacktestResult::new`, so the output never depends on scheduling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use predlab_core::{
    ConfigError, DataError, Exclusion, MarketSeries, SignalDetector, SimulatedTrade, StrategyRule,
    TradeSimulator,
};

use crate::config::BacktestConfig;
use crate::loader::MarketCorpus;
use crate::report::{validate_result, ValidationReport};
use crate::result::BacktestResult;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("run aborted before completion")]
    Aborted,
}

/// Shared flag for stopping a run from another thread.
///
/// Once set, in-flight markets finish but no result is produced.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// A strategy's backtest together with its validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub result: BacktestResult,
    pub validation: ValidationReport,
}

impl StrategyReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

struct MarketOutcome {
    trades: Vec<SimulatedTrade>,
    exclusions: Vec<Exclusion>,
}

/// Run `rule` over every market in `corpus`.
///
/// Records rejected while loading are carried into the result's exclusions.
pub fn run_backtest(
    corpus: &MarketCorpus,
    rule: &StrategyRule,
    config: &BacktestConfig,
    abort: &AbortHandle,
) -> Result<BacktestResult, RunError> {
    rule.validate()?;
    config.validate_market_settings()?;
    if abort.is_aborted() {
        return Err(RunError::Aborted);
    }

    let detector = SignalDetector::new(config.entry_mode);
    let simulator = TradeSimulator::new(config.fees, config.outcome_policy);

    let per_market: Vec<Option<MarketOutcome>> = corpus
        .markets()
        .par_iter()
        .map(|series| {
            if abort.is_aborted() {
                return None;
            }
            Some(process_market(
                series,
                rule,
                &detector,
                &simulator,
                config.min_history_points,
            ))
        })
        .collect();

    if abort.is_aborted() || per_market.iter().any(Option::is_none) {
        tracing::warn!(strategy = %rule.id, "backtest aborted");
        return Err(RunError::Aborted);
    }

    let mut trades = Vec::new();
    let mut exclusions: Vec<Exclusion> = corpus.rejected().to_vec();
    for outcome in per_market.into_iter().flatten() {
        trades.extend(outcome.trades);
        exclusions.extend(outcome.exclusions);
    }

    let markets_scanned = corpus.len() + corpus.rejected().len();
    let result = BacktestResult::new(
        rule.id.clone(),
        config.run_id(),
        trades,
        exclusions,
        markets_scanned,
    );

    tracing::info!(
        strategy = %result.strategy_id,
        markets_scanned,
        trades = result.trades.len(),
        excluded = result.excluded_count(),
        win_rate = result.metrics.win_rate,
        "backtest complete"
    );
    Ok(result)
}

fn process_market(
    series: &MarketSeries,
    rule: &StrategyRule,
    detector: &SignalDetector,
    simulator: &TradeSimulator,
    min_history_points: usize,
) -> MarketOutcome {
    if series.len() < min_history_points {
        let exclusion = Exclusion::new(
            series.market_id(),
            DataError::TooShort {
                len: series.len(),
                min: min_history_points,
            },
        );
        tracing::debug!(market_id = series.market_id(), "market too short");
        return MarketOutcome {
            trades: Vec::new(),
            exclusions: vec![exclusion],
        };
    }

    let signals = detector.detect(series, rule);
    let (trades, exclusions) = simulator.simulate_market(series, &signals, rule);
    MarketOutcome { trades, exclusions }
}

/// Backtest and validate every strategy in `config`.
///
/// The whole config is validated first; any error stops the batch before a
/// single market is touched. Reports come back in config order.
pub fn run_batch(
    corpus: &MarketCorpus,
    config: &BacktestConfig,
    abort: &AbortHandle,
) -> Result<Vec<StrategyReport>, RunError> {
    config.validate()?;

    let reports = config
        .strategies
        .par_iter()
        .map(|rule| {
            let result = run_backtest(corpus, rule, config, abort)?;
            if abort.is_aborted() {
                return Err(RunError::Aborted);
            }
            let validation = validate_result(&result, &config.validation);
            Ok(StrategyReport { result, validation })
        })
        .collect::<Result<Vec<_>, RunError>>()?;

    tracing::info!(
        strategies = reports.len(),
        markets = corpus.len(),
        dataset_hash = corpus.dataset_hash(),
        "batch complete"
    );
    Ok(reports)
}

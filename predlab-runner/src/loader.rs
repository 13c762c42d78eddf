//! Market loading boundary. JSON records in, validated `MarketSeries` out.
//!
//! Accepted input is either a JSON array of market records or JSON Lines
//! (one record per line):
//!
//! ```json
//! {"market_id": "m1", "question": "...", "end_date": "2024-11-05T00:00:00Z",
//!  "resolution_outcome": "YES", "volume": 125000.0,
//!  "price_history": [{"timestamp": "2024-10-01T00:00:00Z", "price": 0.12}]}
//! ```
//!
//! Timestamps may be RFC 3339 strings or Unix seconds. `resolution_outcome`
//! is `"YES"`, `"NO"`, `"unknown"` or absent. A record that fails to parse or
//! validate is rejected with a `DataError` and recorded as an exclusion; it
//! never fails the whole load. In JSON Lines input an unparseable line is
//! rejected as `line#<n>` (1-based).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use predlab_core::{DataError, Exclusion, MarketSeries, Outcome, PricePoint};

/// Errors that prevent reading the input at all.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON input: {0}")]
    Json(#[from] serde_json::Error),
}

/// Anything that can supply a market corpus to the runner.
pub trait MarketSource {
    fn load(&self) -> Result<MarketCorpus, LoadError>;
}

/// JSON or JSON Lines file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MarketSource for JsonFileSource {
    fn load(&self) -> Result<MarketCorpus, LoadError> {
        load_markets_file(&self.path)
    }
}

// ─── Records ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimestampField {
    Rfc3339(DateTime<Utc>),
    UnixSeconds(i64),
}

impl TimestampField {
    fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match *self {
            Self::Rfc3339(t) => Some(t),
            Self::UnixSeconds(secs) => DateTime::from_timestamp(secs, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub timestamp: TimestampField,
    pub price: f64,
}

/// One market as it arrives from the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub market_id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub end_date: Option<TimestampField>,
    #[serde(default)]
    pub resolution_outcome: Option<String>,
    /// Trading volume. Missing or `null` reads as 0.
    #[serde(default)]
    pub volume: Option<f64>,
    pub price_history: Vec<PriceRecord>,
}

impl MarketRecord {
    /// Validate into an immutable `MarketSeries`.
    pub fn into_series(self) -> Result<MarketSeries, DataError> {
        let outcome = parse_outcome(self.resolution_outcome.as_deref())?;
        let end_date = match &self.end_date {
            Some(t) => Some(t.to_datetime().ok_or_else(|| {
                DataError::Malformed(format!("end_date out of range: {t:?}"))
            })?),
            None => None,
        };

        let points = self
            .price_history
            .iter()
            .enumerate()
            .map(|(index, p)| {
                p.timestamp
                    .to_datetime()
                    .map(|t| PricePoint::new(t, p.price))
                    .ok_or_else(|| {
                        DataError::Malformed(format!("timestamp out of range at index {index}"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MarketSeries::new(self.market_id, self.question, points)?
            .with_outcome(outcome)
            .with_end_date(end_date)
            .with_volume(self.volume.unwrap_or(0.0)))
    }
}

fn parse_outcome(raw: Option<&str>) -> Result<Option<Outcome>, DataError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" => Ok(Some(Outcome::Yes)),
        "no" => Ok(Some(Outcome::No)),
        "" | "unknown" | "unresolved" => Ok(None),
        other => Err(DataError::Malformed(format!(
            "unrecognized resolution_outcome '{other}'"
        ))),
    }
}

// ─── Corpus ──────────────────────────────────────────────────────────

/// Validated markets plus the records rejected while loading.
#[derive(Debug, Clone, Default)]
pub struct MarketCorpus {
    markets: Vec<MarketSeries>,
    rejected: Vec<Exclusion>,
    dataset_hash: String,
}

impl MarketCorpus {
    pub fn new(markets: Vec<MarketSeries>, rejected: Vec<Exclusion>) -> Self {
        let dataset_hash = dataset_hash(&markets);
        Self {
            markets,
            rejected,
            dataset_hash,
        }
    }

    pub fn from_markets(markets: Vec<MarketSeries>) -> Self {
        Self::new(markets, Vec::new())
    }

    pub fn markets(&self) -> &[MarketSeries] {
        &self.markets
    }

    pub fn rejected(&self) -> &[Exclusion] {
        &self.rejected
    }

    /// BLAKE3 over every market id, quote and resolution.
    pub fn dataset_hash(&self) -> &str {
        &self.dataset_hash
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

fn dataset_hash(markets: &[MarketSeries]) -> String {
    let mut hasher = blake3::Hasher::new();
    for market in markets {
        hasher.update(market.market_id().as_bytes());
        hasher.update(&[0]);
        for point in market.prices() {
            hasher.update(&point.timestamp.timestamp().to_le_bytes());
            hasher.update(&point.price.to_le_bytes());
        }
        let outcome_tag: u8 = match market.resolution_outcome() {
            Some(Outcome::Yes) => 1,
            Some(Outcome::No) => 2,
            None => 0,
        };
        hasher.update(&[outcome_tag]);
    }
    hasher.finalize().to_hex().to_string()
}

// ─── Parsing ─────────────────────────────────────────────────────────

pub fn load_markets_file(path: impl AsRef<Path>) -> Result<MarketCorpus, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_markets_json(&text)
}

/// Parse a JSON array or JSON Lines document into a corpus.
pub fn parse_markets_json(text: &str) -> Result<MarketCorpus, LoadError> {
    let mut rejected = Vec::new();
    let values: Vec<serde_json::Value> = if text.trim_start().starts_with('[') {
        serde_json::from_str(text)?
    } else {
        let mut values = Vec::new();
        for (n, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(value) => values.push(value),
                Err(e) => reject(
                    &mut rejected,
                    &format!("line#{}", n + 1),
                    DataError::Malformed(e.to_string()),
                ),
            }
        }
        values
    };

    let mut markets = Vec::with_capacity(values.len());
    let mut seen = HashSet::new();

    for (index, value) in values.into_iter().enumerate() {
        let label = value
            .get("market_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("record#{index}"));

        let parsed = serde_json::from_value::<MarketRecord>(value)
            .map_err(|e| DataError::Malformed(e.to_string()))
            .and_then(MarketRecord::into_series);

        match parsed {
            Ok(series) => {
                if !seen.insert(series.market_id().to_string()) {
                    reject(
                        &mut rejected,
                        &label,
                        DataError::Malformed("duplicate market_id".into()),
                    );
                    continue;
                }
                markets.push(series);
            }
            Err(error) => reject(&mut rejected, &label, error),
        }
    }

    tracing::info!(
        loaded = markets.len(),
        rejected = rejected.len(),
        "market corpus loaded"
    );
    Ok(MarketCorpus::new(markets, rejected))
}

fn reject(rejected: &mut Vec<Exclusion>, market_id: &str, error: DataError) {
    tracing::debug!(market_id, %error, "market record rejected");
    rejected.push(Exclusion::new(market_id, error));
}

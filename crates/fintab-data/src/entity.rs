//! Fetch targets and their per-entity state.

use crate::error::{DataError, FailureCause, Result};
use crate::parser::{ParsedStatements, UnmappedRow};
use crate::statement::{StatementGrid, StatementKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tokio::sync::Mutex;

/// Venues the source accepts as an exchange qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    /// New York Stock Exchange
    #[serde(rename = "NYSE")]
    Nyse,
    /// Nasdaq
    #[serde(rename = "NASDAQ")]
    Nasdaq,
}

impl Exchange {
    /// All recognized venues.
    pub const ALL: [Self; 2] = [Self::Nyse, Self::Nasdaq];

    /// Code used in the request target.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Nyse => "NYSE",
            Self::Nasdaq => "NASDAQ",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Exchange {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|e| e.code() == upper)
            .ok_or_else(|| DataError::UnrecognizedExchange(s.to_string()))
    }
}

/// One company to fetch: a symbol, optionally qualified by its exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawIdentifier")]
pub struct EntityIdentifier {
    symbol: String,
    exchange: Option<Exchange>,
}

/// Accepts `"NYSE:IBM"` as well as `{"symbol": "IBM", "exchange": "NYSE"}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdentifier {
    Target(String),
    Parts {
        symbol: String,
        #[serde(default)]
        exchange: Option<String>,
    },
}

impl TryFrom<RawIdentifier> for EntityIdentifier {
    type Error = DataError;

    fn try_from(raw: RawIdentifier) -> Result<Self> {
        match raw {
            RawIdentifier::Target(target) => target.parse(),
            RawIdentifier::Parts { symbol, exchange } => {
                let exchange = exchange.as_deref().map(str::parse).transpose()?;
                Self::new(symbol, exchange)
            }
        }
    }
}

impl EntityIdentifier {
    /// Create an identifier. The symbol is trimmed and must not be empty.
    pub fn new(symbol: impl Into<String>, exchange: Option<Exchange>) -> Result<Self> {
        let symbol = symbol.into().trim().to_string();
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }
        if symbol.contains(':') || symbol.chars().any(char::is_whitespace) {
            return Err(DataError::InvalidSymbol(symbol));
        }
        Ok(Self { symbol, exchange })
    }

    /// Create an unqualified identifier.
    pub fn symbol_only(symbol: impl Into<String>) -> Result<Self> {
        Self::new(symbol, None)
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Exchange qualifier, if any.
    pub const fn exchange(&self) -> Option<Exchange> {
        self.exchange
    }

    /// Request target: `SYMBOL` or `EXCHANGE:SYMBOL`.
    pub fn target(&self) -> String {
        match self.exchange {
            Some(exchange) => format!("{}:{}", exchange.code(), self.symbol),
            None => self.symbol.clone(),
        }
    }
}

impl fmt::Display for EntityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.target())
    }
}

impl FromStr for EntityIdentifier {
    type Err = DataError;

    /// Parse `SYMBOL` or `EXCHANGE:SYMBOL`.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((exchange, symbol)) => Self::new(symbol, Some(exchange.parse()?)),
            None => Self::new(s, None),
        }
    }
}

/// Everything known about one entity during and after a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    id: EntityIdentifier,
    grids: BTreeMap<StatementKey, StatementGrid>,
    unmapped: Vec<UnmappedRow>,
    complete: bool,
    attempts: u32,
    last_failure: Option<FailureCause>,
}

impl EntityRecord {
    /// Create an empty, pending record.
    pub const fn new(id: EntityIdentifier) -> Self {
        Self {
            id,
            grids: BTreeMap::new(),
            unmapped: Vec::new(),
            complete: false,
            attempts: 0,
            last_failure: None,
        }
    }

    /// A complete record from statements parsed elsewhere, e.g. a saved page.
    pub fn from_parsed(id: EntityIdentifier, parsed: ParsedStatements) -> Self {
        let mut record = Self::new(id);
        record.complete_with(parsed.grids, parsed.unmapped);
        record
    }

    /// Identifier of the entity.
    pub const fn id(&self) -> &EntityIdentifier {
        &self.id
    }

    /// Ticker symbol of the entity.
    pub fn symbol(&self) -> &str {
        self.id.symbol()
    }

    /// Returns true once all six statements have been stored.
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Number of fetch attempts made so far.
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Cause of the most recent failed attempt, cleared on success.
    pub const fn last_failure(&self) -> Option<&FailureCause> {
        self.last_failure.as_ref()
    }

    /// Grid for one statement, present only once fetched.
    pub fn grid(&self, key: StatementKey) -> Option<&StatementGrid> {
        self.grids.get(&key)
    }

    /// All grids in canonical statement order.
    pub const fn grids(&self) -> &BTreeMap<StatementKey, StatementGrid> {
        &self.grids
    }

    /// Row labels dropped by the normalizer in the successful parse.
    pub fn unmapped(&self) -> &[UnmappedRow] {
        &self.unmapped
    }

    pub(crate) fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    pub(crate) fn record_failure(&mut self, cause: FailureCause) {
        self.last_failure = Some(cause);
    }

    /// Store the parsed statements and mark the record complete.
    ///
    /// Has no effect on a record that is already complete.
    pub(crate) fn complete_with(
        &mut self,
        grids: BTreeMap<StatementKey, StatementGrid>,
        unmapped: Vec<UnmappedRow>,
    ) -> bool {
        if self.complete {
            return false;
        }
        self.grids = grids;
        self.unmapped = unmapped;
        self.last_failure = None;
        self.complete = true;
        true
    }
}

/// A record behind an async lock.
///
/// The lock is held for the full duration of an attempt, so at most one
/// attempt per entity is ever in flight.
#[derive(Debug)]
pub struct EntitySlot(Mutex<EntityRecord>);

impl EntitySlot {
    /// Wrap a record.
    pub fn new(record: EntityRecord) -> Self {
        Self(Mutex::new(record))
    }

    pub(crate) const fn lock_handle(&self) -> &Mutex<EntityRecord> {
        &self.0
    }

    /// Returns true if the record is complete. Waits for any running attempt.
    pub async fn is_complete(&self) -> bool {
        self.0.lock().await.is_complete()
    }

    /// Unwrap the record.
    pub fn into_inner(self) -> EntityRecord {
        self.0.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("AAPL", "AAPL", None)]
    #[case("NASDAQ:AAPL", "AAPL", Some(Exchange::Nasdaq))]
    #[case("nyse:IBM", "IBM", Some(Exchange::Nyse))]
    #[case("  MSFT ", "MSFT", None)]
    fn test_parse_identifier(
        #[case] input: &str,
        #[case] symbol: &str,
        #[case] exchange: Option<Exchange>,
    ) {
        let id: EntityIdentifier = input.parse().unwrap();
        assert_eq!(id.symbol(), symbol);
        assert_eq!(id.exchange(), exchange);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("NASDAQ:")]
    #[case("BRK A")]
    fn test_invalid_symbol(#[case] input: &str) {
        let result: Result<EntityIdentifier> = input.parse();
        assert!(matches!(result, Err(DataError::InvalidSymbol(_))));
    }

    #[test]
    fn test_unrecognized_exchange() {
        let result: Result<EntityIdentifier> = "LSE:VOD".parse();
        assert!(matches!(result, Err(DataError::UnrecognizedExchange(e)) if e == "LSE"));
    }

    #[test]
    fn test_target() {
        let plain = EntityIdentifier::symbol_only("GOOG").unwrap();
        assert_eq!(plain.target(), "GOOG");

        let qualified = EntityIdentifier::new("GOOG", Some(Exchange::Nasdaq)).unwrap();
        assert_eq!(qualified.target(), "NASDAQ:GOOG");
        assert_eq!(qualified.to_string(), "NASDAQ:GOOG");
    }

    #[test]
    fn test_deserialize_identifier() {
        let id: EntityIdentifier =
            serde_json::from_str(r#"{"symbol": "IBM", "exchange": "NYSE"}"#).unwrap();
        assert_eq!(id.target(), "NYSE:IBM");

        let bad = serde_json::from_str::<EntityIdentifier>(r#"{"symbol": "IBM", "exchange": "TSX"}"#);
        assert!(bad.is_err());

        let empty = serde_json::from_str::<EntityIdentifier>(r#"{"symbol": ""}"#);
        assert!(empty.is_err());

        let ids: Vec<EntityIdentifier> =
            serde_json::from_str(r#"["NASDAQ:AAPL", "MSFT", {"symbol": "IBM"}]"#).unwrap();
        let targets: Vec<String> = ids.iter().map(EntityIdentifier::target).collect();
        assert_eq!(targets, vec!["NASDAQ:AAPL", "MSFT", "IBM"]);
    }

    #[test]
    fn test_record_completes_once() {
        let mut record = EntityRecord::new(EntityIdentifier::symbol_only("AAPL").unwrap());
        assert!(!record.is_complete());
        assert_eq!(record.begin_attempt(), 1);

        let mut grids = BTreeMap::new();
        grids.insert(StatementKey::ALL[0], StatementGrid::default());
        assert!(record.complete_with(grids, Vec::new()));
        assert!(record.is_complete());
        assert!(!record.complete_with(BTreeMap::new(), Vec::new()));
        assert_eq!(record.grids().len(), 1);
    }

    #[test]
    fn test_record_from_parsed() {
        let mut parsed = ParsedStatements::default();
        parsed.grids.insert(StatementKey::ALL[2], StatementGrid::default());
        let record = EntityRecord::from_parsed("NYSE:IBM".parse().unwrap(), parsed);
        assert!(record.is_complete());
        assert_eq!(record.attempts(), 0);
        assert!(record.grid(StatementKey::ALL[2]).is_some());
    }
}

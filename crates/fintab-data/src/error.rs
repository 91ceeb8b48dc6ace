//! Error types for data operations.
//!
//! Failures are split by who can do something about them:
//!
//! - [`DataError`] covers caller mistakes (an empty symbol, an exchange outside
//!   the recognized venue set) and local I/O or configuration problems. These
//!   are returned eagerly and are never retried.
//! - [`TransportError`] and [`ParseError`] describe a single failed attempt at
//!   one entity. The fetcher wraps them into a [`FetchFailure`] so that the
//!   batch keeps going and a later round can try again.

use crate::statement::StatementKey;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Invalid symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Exchange outside the recognized venue set
    #[error("Unrecognized exchange: {0}")]
    UnrecognizedExchange(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Network error while building the HTTP client
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Document parsing failure
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A failed request at the transport layer. Always retryable by a later round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request could not be sent or the body could not be read
    #[error("request to {url} failed: {reason}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying error message
        reason: String,
    },

    /// The request timed out
    #[error("request to {url} timed out")]
    Timeout {
        /// Requested URL
        url: String,
    },

    /// The server answered with a non-success status
    #[error("request to {url} returned HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },
}

impl TransportError {
    /// Build a transport error from a `reqwest` failure.
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            Self::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// A document that does not have the expected statement layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// None of the six statement sections exist in the document
    #[error("document contains no financial statement sections")]
    NoData,

    /// The section anchor for a statement is absent
    #[error("{key}: section `{anchor}` not found")]
    MissingSection {
        /// Statement that was being extracted
        key: StatementKey,
        /// Element id that was looked up
        anchor: String,
    },

    /// The section exists but holds no statement table
    #[error("{key}: statement table not found")]
    MissingTable {
        /// Statement that was being extracted
        key: StatementKey,
    },

    /// The statement table has no header row
    #[error("{key}: header row not found")]
    MissingHeader {
        /// Statement that was being extracted
        key: StatementKey,
    },

    /// A body row has a different number of cells than the header has periods
    #[error("{key}: row `{label}` has {found} values, expected {expected}")]
    RaggedRow {
        /// Statement that was being extracted
        key: StatementKey,
        /// Raw row label
        label: String,
        /// Number of period columns in the header
        expected: usize,
        /// Number of value cells in the row
        found: usize,
    },

    /// A cell is neither a number nor the missing-value marker
    #[error("{key}: row `{label}` has non-numeric value `{value}`")]
    InvalidCell {
        /// Statement that was being extracted
        key: StatementKey,
        /// Raw row label
        label: String,
        /// Offending cell text
        value: String,
    },

    /// A DOM selector could not be compiled
    #[error("invalid selector `{0}`")]
    Selector(String),
}

impl ParseError {
    /// The statement the error refers to, if it is specific to one.
    pub const fn statement_key(&self) -> Option<StatementKey> {
        match self {
            Self::MissingSection { key, .. }
            | Self::MissingTable { key }
            | Self::MissingHeader { key }
            | Self::RaggedRow { key, .. }
            | Self::InvalidCell { key, .. } => Some(*key),
            Self::NoData | Self::Selector(_) => None,
        }
    }
}

/// Why a single fetch attempt did not complete an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    /// The document could not be retrieved
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The document was retrieved but could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A non-fatal failure of one attempt at one entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetch failed for {symbol} (attempt {attempt}): {cause}")]
pub struct FetchFailure {
    /// Symbol of the entity
    pub symbol: String,
    /// 1-based attempt number for this entity
    pub attempt: u32,
    /// When the attempt failed
    pub at: DateTime<Utc>,
    /// Underlying cause
    pub cause: FailureCause,
}

impl FetchFailure {
    /// Create a failure record stamped with the current time.
    pub fn new(symbol: impl Into<String>, attempt: u32, cause: impl Into<FailureCause>) -> Self {
        Self {
            symbol: symbol.into(),
            attempt,
            at: Utc::now(),
            cause: cause.into(),
        }
    }

    /// Returns true if the attempt failed at the transport layer.
    pub const fn is_transport(&self) -> bool {
        matches!(self.cause, FailureCause::Transport(_))
    }

    /// Returns true if the document was retrieved but did not parse.
    pub const fn is_parse(&self) -> bool {
        matches!(self.cause, FailureCause::Parse(_))
    }
}

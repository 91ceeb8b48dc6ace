#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fintab/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod batch;
pub mod entity;
pub mod error;
pub mod fetcher;
pub mod parser;
pub mod statement;
pub mod transport;
pub mod vocabulary;

pub use batch::{Batch, BatchConfig, BatchEvent, BatchOrchestrator, BatchOutcome};
pub use entity::{EntityIdentifier, EntityRecord, EntitySlot, Exchange};
pub use error::{DataError, FailureCause, FetchFailure, ParseError, Result, TransportError};
pub use fetcher::EntityFetcher;
pub use parser::{ParsedStatements, UnmappedRow};
pub use statement::{FieldCode, Frequency, GridRow, StatementGrid, StatementKey, StatementType};
pub use transport::{HttpConfig, HttpTransport, RateLimiter, Transport};
pub use vocabulary::Vocabulary;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

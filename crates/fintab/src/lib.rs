#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fintab/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod vocabulary;

// Re-export main types from sub-crates
pub use fintab_data as data;
pub use fintab_output as output;

// Re-export common types
pub use fintab_data::{Batch, BatchConfig, BatchOutcome, EntityIdentifier, Vocabulary};
pub use fintab_output::WideTable;

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

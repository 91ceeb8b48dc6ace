//! Single-entity fetch: transport, parse, record.

use crate::entity::{EntityIdentifier, EntityRecord, EntitySlot};
use crate::error::{FailureCause, FetchFailure};
use crate::parser;
use crate::transport::{DEFAULT_BASE_URL, Transport};
use crate::vocabulary::Vocabulary;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches and parses the report page of one entity at a time.
#[derive(Debug)]
pub struct EntityFetcher<T> {
    transport: T,
    vocabulary: Arc<Vocabulary>,
    base_url: String,
}

impl<T: Transport> EntityFetcher<T> {
    /// Create a fetcher against the default report URL.
    pub fn new(transport: T, vocabulary: impl Into<Arc<Vocabulary>>) -> Self {
        Self {
            transport,
            vocabulary: vocabulary.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Use a different URL prefix.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The transport in use.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The vocabulary rows are normalized with.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Request URL for an entity.
    pub fn url_for(&self, id: &EntityIdentifier) -> String {
        format!("{}{}", self.base_url, id.target())
    }

    /// Run one attempt for `record`.
    ///
    /// On success all six grids are stored and the record is marked complete.
    /// Transport and parse failures leave the record pending and come back as
    /// a [`FetchFailure`]; they are never raised. A record that is already
    /// complete is left alone.
    pub async fn fetch(&self, record: &mut EntityRecord) -> Result<(), FetchFailure> {
        if record.is_complete() {
            debug!(symbol = record.symbol(), "already complete, skipping");
            return Ok(());
        }

        let attempt = record.begin_attempt();
        let url = self.url_for(record.id());
        debug!(symbol = record.symbol(), attempt, %url, "fetching");

        let outcome = match self.transport.fetch(&url).await {
            Ok(body) => parser::parse_bytes(&body, &self.vocabulary).map_err(FailureCause::from),
            Err(e) => Err(FailureCause::from(e)),
        };

        match outcome {
            Ok(parsed) => {
                if !parsed.unmapped.is_empty() {
                    debug!(
                        symbol = record.symbol(),
                        unmapped = parsed.unmapped.len(),
                        "rows dropped by normalizer"
                    );
                }
                record.complete_with(parsed.grids, parsed.unmapped);
                Ok(())
            }
            Err(cause) => {
                warn!(symbol = record.symbol(), attempt, error = %cause, "fetch failed");
                record.record_failure(cause.clone());
                Err(FetchFailure::new(record.symbol(), attempt, cause))
            }
        }
    }

    /// Run one attempt for the record behind `slot`, holding its lock for the
    /// whole attempt. Concurrent calls on the same slot run one after another.
    pub async fn fetch_slot(&self, slot: &EntitySlot) -> Result<(), FetchFailure> {
        let mut record = slot.lock_handle().lock().await;
        self.fetch(&mut record).await
    }
}

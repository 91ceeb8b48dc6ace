//! Batch retrieval with bounded retry rounds.
//!
//! Every entity moves through `Pending → Fetching → {Complete | Pending}`.
//! A round attempts each pending entity once; a failed attempt simply leaves
//! the entity pending for the next round. After `max_rounds` rounds the batch
//! stops regardless, so at most `max_rounds × entities` attempts are made and
//! the run always terminates. There is no batch-level error: callers inspect
//! [`BatchOutcome::is_complete`] or the per-record completion flags.
//!
//! # Example
//!
//! ```no_run
//! use fintab_data::{Batch, BatchConfig, BatchOrchestrator, EntityFetcher, HttpTransport, Vocabulary};
//!
//! # async fn example() -> fintab_data::Result<()> {
//! let vocabulary = Vocabulary::from_pairs([("Revenue", "REV"), ("Net Income", "NI")]);
//! let fetcher = EntityFetcher::new(HttpTransport::new()?, vocabulary);
//! let orchestrator = BatchOrchestrator::new(fetcher, BatchConfig::default());
//!
//! let batch: Batch = ["NASDAQ:AAPL".parse()?, "NYSE:IBM".parse()?].into_iter().collect();
//! let outcome = orchestrator.run(batch).await;
//! println!("{} of {} complete", outcome.batch.complete_count(), outcome.batch.len());
//! # Ok(())
//! # }
//! ```

use crate::entity::{EntityIdentifier, EntityRecord, EntitySlot};
use crate::error::{DataError, FetchFailure, Result};
use crate::fetcher::EntityFetcher;
use crate::transport::{RateLimiter, Transport};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Pacing and retry settings for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Pause between two attempts within a round, in milliseconds
    pub inter_attempt_delay_ms: u64,
    /// Pause between two rounds, in milliseconds
    pub inter_round_delay_ms: u64,
    /// Maximum number of rounds; values below 1 are treated as 1
    pub max_rounds: u32,
    /// Maximum number of attempts in flight at once
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            inter_attempt_delay_ms: 1_000,
            inter_round_delay_ms: 30_000,
            max_rounds: 10,
            concurrency: 1,
        }
    }
}

impl BatchConfig {
    /// Pause between attempts.
    pub const fn inter_attempt_delay(&self) -> Duration {
        Duration::from_millis(self.inter_attempt_delay_ms)
    }

    /// Pause between rounds.
    pub const fn inter_round_delay(&self) -> Duration {
        Duration::from_millis(self.inter_round_delay_ms)
    }

    /// Round budget, at least 1.
    pub fn effective_max_rounds(&self) -> u32 {
        self.max_rounds.max(1)
    }

    /// Check the settings.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(DataError::Config("concurrency must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Ordered collection of entity records, keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    records: Vec<EntityRecord>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity as a fresh pending record.
    ///
    /// If the symbol is already present its record is replaced in place, so
    /// the entity keeps its original position. Returns true if the symbol is new.
    pub fn add(&mut self, id: EntityIdentifier) -> bool {
        let record = EntityRecord::new(id);
        match self.records.iter_mut().find(|r| r.symbol() == record.symbol()) {
            Some(existing) => {
                *existing = record;
                false
            }
            None => {
                self.records.push(record);
                true
            }
        }
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the batch has no entities.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    /// Record for a symbol.
    pub fn get(&self, symbol: &str) -> Option<&EntityRecord> {
        self.records.iter().find(|r| r.symbol() == symbol)
    }

    /// Number of complete records.
    pub fn complete_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_complete()).count()
    }

    /// Returns true if every record is complete.
    pub fn is_complete(&self) -> bool {
        self.records.iter().all(EntityRecord::is_complete)
    }

    /// Records that are still pending.
    pub fn incomplete(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.iter().filter(|r| !r.is_complete())
    }

    /// Take the records out.
    pub fn into_records(self) -> Vec<EntityRecord> {
        self.records
    }
}

impl FromIterator<EntityIdentifier> for Batch {
    fn from_iter<I: IntoIterator<Item = EntityIdentifier>>(iter: I) -> Self {
        let mut batch = Self::new();
        for id in iter {
            batch.add(id);
        }
        batch
    }
}

impl From<Vec<EntityRecord>> for Batch {
    fn from(records: Vec<EntityRecord>) -> Self {
        Self { records }
    }
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// A round is about to attempt `pending` entities
    RoundStarted {
        /// 1-based round number
        round: u32,
        /// Entities to attempt in this round
        pending: usize,
    },
    /// One attempt finished
    Attempted {
        /// 1-based round number
        round: u32,
        /// Symbol of the entity
        symbol: String,
        /// Whether the entity is now complete
        success: bool,
    },
    /// A round finished
    RoundFinished {
        /// 1-based round number
        round: u32,
        /// Complete entities after the round
        complete: usize,
        /// Entities in the batch
        total: usize,
    },
}

/// What a batch run produced.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Records in insertion order, complete or not
    pub batch: Batch,
    /// Every failed attempt, in the order the rounds ran
    pub failures: Vec<FetchFailure>,
    /// Total fetch attempts made
    pub attempts: usize,
    /// Rounds that were started
    pub rounds: u32,
    /// Whether the run stopped on the cancellation signal
    pub cancelled: bool,
}

impl BatchOutcome {
    /// Returns true if every entity completed.
    pub fn is_complete(&self) -> bool {
        self.batch.is_complete()
    }

    /// Records that did not complete.
    pub fn incomplete(&self) -> impl Iterator<Item = &EntityRecord> {
        self.batch.incomplete()
    }

    /// Symbols of the entities that did not complete.
    pub fn incomplete_symbols(&self) -> Vec<&str> {
        self.batch.incomplete().map(EntityRecord::symbol).collect()
    }

    /// Failed attempts for one symbol.
    pub fn failures_for<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a FetchFailure> {
        self.failures.iter().filter(move |f| f.symbol == symbol)
    }
}

#[derive(Debug, Default)]
struct RoundTally {
    attempts: usize,
    failures: Vec<FetchFailure>,
    cancelled: bool,
}

/// Drives an [`EntityFetcher`] over a [`Batch`] in retry rounds.
#[derive(Debug)]
pub struct BatchOrchestrator<T> {
    fetcher: EntityFetcher<T>,
    config: BatchConfig,
    events: Option<mpsc::UnboundedSender<BatchEvent>>,
}

impl<T: Transport> BatchOrchestrator<T> {
    /// Create an orchestrator.
    pub const fn new(fetcher: EntityFetcher<T>, config: BatchConfig) -> Self {
        Self {
            fetcher,
            config,
            events: None,
        }
    }

    /// Send [`BatchEvent`]s to `events` while running.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<BatchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// The fetcher in use.
    pub const fn fetcher(&self) -> &EntityFetcher<T> {
        &self.fetcher
    }

    /// The batch settings.
    pub const fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Run the batch to completion or until the round budget is spent.
    pub async fn run(&self, batch: Batch) -> BatchOutcome {
        let (_never, cancel) = watch::channel(false);
        self.run_until_cancelled(batch, cancel).await
    }

    /// Like [`run`](Self::run), but stops early once `cancel` turns true.
    ///
    /// The signal is checked between entities and between rounds, and
    /// interrupts the pauses. An attempt already in flight is finished.
    /// Cancellation is not an error: the records gathered so far are returned
    /// with [`BatchOutcome::cancelled`] set.
    pub async fn run_until_cancelled(
        &self,
        batch: Batch,
        mut cancel: watch::Receiver<bool>,
    ) -> BatchOutcome {
        let max_rounds = self.config.effective_max_rounds();
        let symbols: Vec<String> = batch.records().iter().map(|r| r.symbol().to_string()).collect();
        let slots: Vec<EntitySlot> = batch.into_records().into_iter().map(EntitySlot::new).collect();
        // shared by every round
        let pacer = Mutex::new(RateLimiter::new(self.config.inter_attempt_delay()));

        let mut failures = Vec::new();
        let mut attempts = 0;
        let mut rounds = 0;
        let mut cancelled = false;

        for round in 1..=max_rounds {
            let pending = pending_indices(&slots).await;
            if pending.is_empty() {
                break;
            }
            if is_cancelled(&cancel) {
                cancelled = true;
                break;
            }

            rounds = round;
            info!(round, max_rounds, pending = pending.len(), total = slots.len(), "starting round");
            self.emit(BatchEvent::RoundStarted {
                round,
                pending: pending.len(),
            });

            let tally = if self.config.concurrency <= 1 {
                self.sequential_round(round, &slots, &symbols, &pending, &pacer, &mut cancel)
                    .await
            } else {
                self.concurrent_round(round, &slots, &symbols, &pending, &pacer, &cancel)
                    .await
            };
            attempts += tally.attempts;
            failures.extend(tally.failures);
            cancelled = tally.cancelled;

            let complete = slots.len() - pending_indices(&slots).await.len();
            info!(round, complete, total = slots.len(), "round finished");
            self.emit(BatchEvent::RoundFinished {
                round,
                complete,
                total: slots.len(),
            });

            if cancelled || complete == slots.len() {
                break;
            }
            if round < max_rounds && pause(self.config.inter_round_delay(), &mut cancel).await {
                cancelled = true;
                break;
            }
        }

        if cancelled {
            warn!(rounds, attempts, "batch cancelled");
        }

        let records: Vec<EntityRecord> = slots.into_iter().map(EntitySlot::into_inner).collect();
        BatchOutcome {
            batch: Batch::from(records),
            failures,
            attempts,
            rounds,
            cancelled,
        }
    }

    /// One attempt per pending entity, strictly one after another.
    async fn sequential_round(
        &self,
        round: u32,
        slots: &[EntitySlot],
        symbols: &[String],
        pending: &[usize],
        pacer: &Mutex<RateLimiter>,
        cancel: &mut watch::Receiver<bool>,
    ) -> RoundTally {
        let mut tally = RoundTally::default();
        for &idx in pending {
            if !paced_start(pacer, cancel).await {
                tally.cancelled = true;
                break;
            }

            let result = self.fetcher.fetch_slot(&slots[idx]).await;
            self.tally_attempt(round, &symbols[idx], result, &mut tally);
        }
        tally
    }

    /// Up to `concurrency` attempts in flight, with request starts spaced by
    /// the inter-attempt delay across all workers.
    async fn concurrent_round(
        &self,
        round: u32,
        slots: &[EntitySlot],
        symbols: &[String],
        pending: &[usize],
        pacer: &Mutex<RateLimiter>,
        cancel: &watch::Receiver<bool>,
    ) -> RoundTally {
        let mut results: Vec<(usize, Option<std::result::Result<(), FetchFailure>>)> =
            stream::iter(pending.iter().copied())
                .map(|idx| {
                    let mut cancel = cancel.clone();
                    async move {
                        if !paced_start(pacer, &mut cancel).await {
                            return (idx, None);
                        }
                        (idx, Some(self.fetcher.fetch_slot(&slots[idx]).await))
                    }
                })
                .buffer_unordered(self.config.concurrency)
                .collect()
                .await;
        results.sort_by_key(|(idx, _)| *idx);

        let mut tally = RoundTally::default();
        for (idx, result) in results {
            match result {
                Some(result) => self.tally_attempt(round, &symbols[idx], result, &mut tally),
                None => tally.cancelled = true,
            }
        }
        tally
    }

    fn tally_attempt(
        &self,
        round: u32,
        symbol: &str,
        result: std::result::Result<(), FetchFailure>,
        tally: &mut RoundTally,
    ) {
        tally.attempts += 1;
        let success = result.is_ok();
        if let Err(failure) = result {
            tally.failures.push(failure);
        }
        debug!(round, symbol, success, "attempt finished");
        self.emit(BatchEvent::Attempted {
            round,
            symbol: symbol.to_string(),
            success,
        });
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(events) = &self.events {
            // a dropped receiver only means nobody is listening
            let _ = events.send(event);
        }
    }
}

async fn pending_indices(slots: &[EntitySlot]) -> Vec<usize> {
    let mut pending = Vec::new();
    for (idx, slot) in slots.iter().enumerate() {
        if !slot.is_complete().await {
            pending.push(idx);
        }
    }
    pending
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

/// Resolves once the signal turns true; never resolves if the sender is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|c| *c).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Wait for the batch-wide pacer before starting an attempt. Returns false
/// if cancelled instead.
async fn paced_start(pacer: &Mutex<RateLimiter>, cancel: &mut watch::Receiver<bool>) -> bool {
    let mut pacer = pacer.lock().await;
    if is_cancelled(cancel) {
        return false;
    }
    tokio::select! {
        () = pacer.wait() => true,
        () = cancelled(cancel) => false,
    }
}

/// Sleep for `duration` unless cancelled first. Returns true if cancelled.
async fn pause(duration: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    if is_cancelled(cancel) {
        return true;
    }
    if duration.is_zero() {
        return false;
    }
    tokio::select! {
        () = sleep(duration) => is_cancelled(cancel),
        () = cancelled(cancel) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(symbol: &str) -> EntityIdentifier {
        symbol.parse().unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.inter_attempt_delay(), Duration::from_secs(1));
        assert_eq!(config.inter_round_delay(), Duration::from_secs(30));
        assert_eq!(config.max_rounds, 10);
        assert_eq!(config.concurrency, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_max_rounds_clamped() {
        let config = BatchConfig {
            max_rounds: 0,
            ..BatchConfig::default()
        };
        assert_eq!(config.effective_max_rounds(), 1);
    }

    #[test]
    fn test_config_zero_concurrency_invalid() {
        let config = BatchConfig {
            concurrency: 0,
            ..BatchConfig::default()
        };
        assert!(matches!(config.validate(), Err(DataError::Config(_))));
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: BatchConfig = serde_json::from_str(r#"{"max_rounds": 3}"#).unwrap();
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.inter_attempt_delay_ms, 1_000);
    }

    #[test]
    fn test_batch_keeps_insertion_order_and_replaces_duplicates() {
        let mut batch: Batch = [id("MSFT"), id("AAPL"), id("IBM")].into_iter().collect();
        assert!(!batch.add(id("NASDAQ:AAPL")));
        assert!(batch.add(id("GOOG")));

        let symbols: Vec<&str> = batch.records().iter().map(EntityRecord::symbol).collect();
        assert_eq!(symbols, vec!["MSFT", "AAPL", "IBM", "GOOG"]);
        assert_eq!(batch.get("AAPL").unwrap().id().target(), "NASDAQ:AAPL");
        assert_eq!(batch.complete_count(), 0);
        assert!(!batch.is_complete());
        assert_eq!(batch.incomplete().count(), 4);
    }

    #[test]
    fn test_empty_batch_is_complete() {
        assert!(Batch::new().is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_interrupted_by_cancel() {
        let (tx, mut rx) = watch::channel(false);
        let start = tokio::time::Instant::now();
        tokio::spawn(async move {
            sleep(Duration::from_secs(2)).await;
            tx.send(true).unwrap();
        });
        assert!(pause(Duration::from_secs(60), &mut rx).await);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_runs_full_duration_without_cancel() {
        let (_tx, mut rx) = watch::channel(false);
        let start = tokio::time::Instant::now();
        assert!(!pause(Duration::from_secs(5), &mut rx).await);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }
}

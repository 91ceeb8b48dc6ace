//! `fintab fetch`: run a batch and write the wide table.

use super::config::{BatchOverrides, FileConfig, load_vocabulary, resolve_entities};
use fintab_data::{
    Batch, BatchEvent, BatchOrchestrator, BatchOutcome, EntityFetcher, EntityRecord, HttpTransport,
};
use fintab_output::{ExportFormat, Exporter, WideTable};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Arguments of the fetch command.
#[derive(Debug)]
pub(crate) struct FetchArgs {
    pub(crate) symbols: Vec<String>,
    pub(crate) overrides: BatchOverrides,
    pub(crate) vocabulary: Option<PathBuf>,
    pub(crate) output: Option<PathBuf>,
    pub(crate) format: ExportFormat,
    pub(crate) progress: bool,
}

pub(crate) async fn fetch(args: FetchArgs, config: FileConfig) -> Result<(), Box<dyn std::error::Error>> {
    let batch_config = args.overrides.apply(config.batch)?;
    let vocabulary = load_vocabulary(args.vocabulary.as_deref().or(config.vocabulary.as_deref()))?;
    let batch: Batch = resolve_entities(&args.symbols, config.entities)?
        .into_iter()
        .collect();

    let transport = HttpTransport::with_config(&config.http)?;
    let fetcher = EntityFetcher::new(transport, vocabulary).with_base_url(&config.http.base_url);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let orchestrator = BatchOrchestrator::new(fetcher, batch_config).with_events(events_tx);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping after the current attempt");
            cancel_tx.send_replace(true);
        }
    });

    info!(
        entities = batch.len(),
        max_rounds = orchestrator.config().effective_max_rounds(),
        concurrency = orchestrator.config().concurrency,
        "starting batch"
    );

    let progress = if args.progress {
        Some(progress_bar(batch.len() as u64)?)
    } else {
        None
    };
    let reporter = tokio::spawn(report_progress(events_rx, progress));

    let outcome = orchestrator.run_until_cancelled(batch, cancel_rx).await;
    // closes the event channel so the reporter finishes
    drop(orchestrator);
    reporter.await?;

    print_summary(&outcome);

    let table = WideTable::assemble(outcome.batch.records());
    match &args.output {
        Some(path) => {
            table.export_to_file(path, args.format)?;
            eprintln!(
                "Wrote {} rows × {} columns to {}",
                table.n_rows(),
                table.n_columns(),
                path.display()
            );
        }
        None => println!("{}", table.export_to_string(args.format)?),
    }

    Ok(())
}

fn progress_bar(len: u64) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

async fn report_progress(mut events: mpsc::UnboundedReceiver<BatchEvent>, pb: Option<ProgressBar>) {
    while let Some(event) = events.recv().await {
        let Some(pb) = &pb else { continue };
        match event {
            BatchEvent::RoundStarted { round, pending } => {
                pb.set_message(format!("round {round}, {pending} pending"));
            }
            BatchEvent::Attempted {
                symbol,
                success: true,
                ..
            } => {
                pb.inc(1);
                pb.set_message(format!("fetched {symbol}"));
            }
            BatchEvent::Attempted { symbol, .. } => {
                pb.set_message(format!("{symbol} failed, will retry"));
            }
            BatchEvent::RoundFinished { .. } => {}
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}

fn print_summary(outcome: &BatchOutcome) {
    eprintln!(
        "Fetched {}/{} entities in {} round(s), {} attempt(s){}",
        outcome.batch.complete_count(),
        outcome.batch.len(),
        outcome.rounds,
        outcome.attempts,
        if outcome.cancelled { ", cancelled" } else { "" }
    );
    for record in outcome.incomplete() {
        eprintln!("  {}: {}", record.id(), failure_summary(record));
    }
}

fn failure_summary(record: &EntityRecord) -> String {
    match record.last_failure() {
        Some(cause) => format!("{} attempt(s), last error: {cause}", record.attempts()),
        None => "not attempted".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_summary_for_untouched_record() {
        let record = EntityRecord::new("IBM".parse().unwrap());
        assert_eq!(failure_summary(&record), "not attempted");
    }
}

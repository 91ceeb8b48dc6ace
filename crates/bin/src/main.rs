//! fintab CLI binary.
//!
//! Fetches financial statements for a list of companies and writes them as
//! one wide table.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::config::{BatchOverrides, FileConfig};
use commands::fetch::{FetchArgs, fetch};
use commands::parse::{ParseArgs, parse};
use commands::vocabulary::vocabulary;
use fintab_data::EntityIdentifier;
use fintab_output::ExportFormat;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fintab")]
#[command(about = "fintab: financial statement tables across companies", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (JSON); defaults to <config dir>/fintab/config.json when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch statements for a batch of companies
    Fetch {
        /// Symbols as SYMBOL or EXCHANGE:SYMBOL; defaults to the config file's entities
        symbols: Vec<String>,

        /// Maximum number of retry rounds
        #[arg(long)]
        max_rounds: Option<u32>,

        /// Pause between requests in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Pause between rounds in milliseconds
        #[arg(long)]
        round_delay_ms: Option<u64>,

        /// Maximum number of requests in flight
        #[arg(long)]
        concurrency: Option<usize>,

        /// JSON file of extra label → code entries
        #[arg(long)]
        vocabulary: Option<PathBuf>,

        /// Write the table here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Parse a saved report page
    Parse {
        /// HTML file
        file: PathBuf,

        /// JSON file of extra label → code entries
        #[arg(long)]
        vocabulary: Option<PathBuf>,

        /// Print a one-row wide table for this entity instead of the grids
        #[arg(long)]
        symbol: Option<EntityIdentifier>,

        /// Output format of the wide table
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
    },

    /// List the built-in label → code vocabulary
    Vocabulary {
        /// Print as a JSON vocabulary file
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
    PrettyJson,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => Self::Csv,
            Format::Json => Self::Json,
            Format::PrettyJson => Self::PrettyJson,
        }
    }
}

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            symbols,
            max_rounds,
            delay_ms,
            round_delay_ms,
            concurrency,
            vocabulary,
            output,
            format,
            no_progress,
        } => {
            let config = FileConfig::load(cli.config.as_deref())?;
            let args = FetchArgs {
                symbols,
                overrides: BatchOverrides {
                    max_rounds,
                    delay_ms,
                    round_delay_ms,
                    concurrency,
                },
                vocabulary,
                output,
                format: format.into(),
                progress: !no_progress,
            };
            fetch(args, config).await?;
        }
        Commands::Parse {
            file,
            vocabulary,
            symbol,
            format,
        } => {
            let config = FileConfig::load(cli.config.as_deref())?;
            parse(ParseArgs {
                file,
                vocabulary: vocabulary.or(config.vocabulary),
                symbol,
                format: format.into(),
            })?;
        }
        Commands::Vocabulary { json } => vocabulary(json)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fetch_arguments() {
        let cli = Cli::try_parse_from([
            "fintab",
            "fetch",
            "NASDAQ:AAPL",
            "IBM",
            "--max-rounds",
            "3",
            "--format",
            "pretty-json",
        ])
        .unwrap();
        match cli.command {
            Commands::Fetch {
                symbols,
                max_rounds,
                format,
                ..
            } => {
                assert_eq!(symbols, vec!["NASDAQ:AAPL", "IBM"]);
                assert_eq!(max_rounds, Some(3));
                assert_eq!(ExportFormat::from(format), ExportFormat::PrettyJson);
            }
            _ => panic!("expected fetch"),
        }
    }

    #[rstest]
    #[case("NYSE:IBM", true)]
    #[case("LSE:VOD", false)]
    fn test_parse_symbol_is_validated(#[case] symbol: &str, #[case] ok: bool) {
        let result = Cli::try_parse_from(["fintab", "parse", "page.html", "--symbol", symbol]);
        assert_eq!(result.is_ok(), ok);
    }
}

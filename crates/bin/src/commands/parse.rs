//! `fintab parse`: parse a saved report page offline.

use super::config::load_vocabulary;
use fintab_data::parser::parse_bytes;
use fintab_data::{EntityIdentifier, EntityRecord, StatementGrid};
use fintab_output::{ExportFormat, Exporter, WideTable};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Arguments of the parse command.
#[derive(Debug)]
pub(crate) struct ParseArgs {
    pub(crate) file: PathBuf,
    pub(crate) vocabulary: Option<PathBuf>,
    /// Emit a one-row wide table for this entity instead of the raw grids.
    pub(crate) symbol: Option<EntityIdentifier>,
    pub(crate) format: ExportFormat,
}

pub(crate) fn parse(args: ParseArgs) -> Result<(), Box<dyn std::error::Error>> {
    let vocabulary = load_vocabulary(args.vocabulary.as_deref())?;
    let bytes = std::fs::read(&args.file)?;
    let parsed = parse_bytes(&bytes, &vocabulary)?;

    for row in &parsed.unmapped {
        eprintln!("unmapped ({}): {}", row.key, row.label);
    }

    match args.symbol {
        Some(id) => {
            let record = EntityRecord::from_parsed(id, parsed);
            let table = WideTable::assemble([&record]);
            println!("{}", table.export_to_string(args.format)?);
        }
        None => {
            let grids: BTreeMap<String, &StatementGrid> = parsed
                .grids
                .iter()
                .map(|(key, grid)| (key.to_string(), grid))
                .collect();
            println!("{}", serde_json::to_string_pretty(&grids)?);
        }
    }

    Ok(())
}

//! `fintab vocabulary`: show the built-in label table.

use fintab::vocabulary::{GOOGLE_FINANCE_LABELS, labels_for};
use fintab_data::StatementType;
use std::collections::BTreeMap;

pub(crate) fn vocabulary(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        // same shape `--vocabulary` files use
        let table: BTreeMap<&str, &str> = GOOGLE_FINANCE_LABELS
            .iter()
            .map(|(_, label, code)| (*label, *code))
            .collect();
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    for statement_type in StatementType::ALL {
        println!("{}:", statement_type.name());
        for (label, code) in labels_for(statement_type) {
            println!("  {code:<6} {label}");
        }
    }
    Ok(())
}

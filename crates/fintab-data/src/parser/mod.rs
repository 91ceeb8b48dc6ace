//! Statement parsing for financial report pages.
//!
//! A report page carries six statement sections, one per [`StatementKey`].
//! Each section is an element with id `{inc|bal|cas}{interim|annual}div`
//! wrapping a table with id `fs-table`:
//!
//! ```text
//! <div id="incannualdiv">
//!   <table id="fs-table">
//!     <tr><th>In Millions of USD</th><th>2021</th><th>2020</th></tr>
//!     <tr><td>Revenue</td><td>1,000</td><td>-</td></tr>
//!   </table>
//! </div>
//! ```
//!
//! The header row gives the period labels (its first cell is a caption and is
//! dropped). Each body row starts with a line-item label, normalized through
//! a [`Vocabulary`]; rows with unknown labels are left out of the grid and
//! reported as [`UnmappedRow`]s. A `-` cell is a missing value.
//!
//! # Example
//!
//! ```
//! use fintab_data::parser::parse_document;
//! use fintab_data::{StatementKey, Vocabulary};
//!
//! let mut html = String::new();
//! for key in StatementKey::ALL {
//!     html.push_str(&format!(
//!         r#"<div id="{}"><table id="fs-table">
//!            <tr><th>Code</th><th>2020</th><th>2021</th></tr>
//!            <tr><td>TotalRevenue</td><td>100</td><td>-</td></tr>
//!         </table></div>"#,
//!         key.anchor_id()
//!     ));
//! }
//!
//! let vocabulary = Vocabulary::from_pairs([("TotalRevenue", "REV")]);
//! let parsed = parse_document(&html, &vocabulary).unwrap();
//! let grid = &parsed.grids[&StatementKey::ALL[1]];
//! assert_eq!(grid.value("REV", 0), Some(100.0));
//! assert_eq!(grid.value("REV", 1), None);
//! ```

mod dom;

use crate::error::ParseError;
use crate::statement::{StatementGrid, StatementKey};
use crate::vocabulary::Vocabulary;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Literal the source uses for "no figure reported".
pub const MISSING_MARKER: &str = "-";

/// Id of the table element inside every statement section.
const TABLE_ID: &str = "fs-table";

/// A row whose label has no entry in the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmappedRow {
    /// Statement the row was found in
    pub key: StatementKey,
    /// Raw row label
    pub label: String,
}

/// The six grids of one document and the rows that were left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedStatements {
    /// Grids in canonical statement order
    pub grids: BTreeMap<StatementKey, StatementGrid>,
    /// Rows dropped because their label is unmapped
    pub unmapped: Vec<UnmappedRow>,
}

/// Parse raw response bytes. Invalid UTF-8 is replaced, not rejected.
pub fn parse_bytes(bytes: &[u8], vocabulary: &Vocabulary) -> Result<ParsedStatements, ParseError> {
    parse_document(&String::from_utf8_lossy(bytes), vocabulary)
}

/// Parse an HTML document into its six statement grids.
///
/// # Errors
///
/// Returns [`ParseError::NoData`] if none of the six sections exist, and a
/// statement-specific [`ParseError`] if one section is structurally broken
/// or holds a value that is neither numeric nor the missing marker.
pub fn parse_document(html: &str, vocabulary: &Vocabulary) -> Result<ParsedStatements, ParseError> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut sections = Vec::with_capacity(StatementKey::ALL.len());
    for key in StatementKey::ALL {
        sections.push((key, dom::find_by_id(root, &key.anchor_id())?));
    }
    if sections.iter().all(|(_, section)| section.is_none()) {
        return Err(ParseError::NoData);
    }

    let mut parsed = ParsedStatements::default();
    for (key, section) in sections {
        let section = section.ok_or_else(|| ParseError::MissingSection {
            key,
            anchor: key.anchor_id(),
        })?;
        let grid = parse_section(key, section, vocabulary, &mut parsed.unmapped)?;
        parsed.grids.insert(key, grid);
    }

    Ok(parsed)
}

fn parse_section(
    key: StatementKey,
    section: ElementRef<'_>,
    vocabulary: &Vocabulary,
    unmapped: &mut Vec<UnmappedRow>,
) -> Result<StatementGrid, ParseError> {
    let table = dom::find_by_id(section, TABLE_ID)?.ok_or(ParseError::MissingTable { key })?;

    let tr = dom::selector("tr")?;
    let th = dom::selector("th")?;
    let td = dom::selector("td")?;

    let rows = dom::find_all(table, &tr);
    let (header, body) = rows
        .split_first()
        .ok_or(ParseError::MissingHeader { key })?;

    let header_cells = dom::find_all(*header, &th);
    if header_cells.is_empty() {
        return Err(ParseError::MissingHeader { key });
    }
    let periods: Vec<String> = header_cells.into_iter().skip(1).map(dom::text).collect();
    let mut grid = StatementGrid::new(periods);

    for row in body {
        let cells = dom::find_all(*row, &td);
        let Some((label_cell, value_cells)) = cells.split_first() else {
            debug!(statement = %key, "skipping row without data cells");
            continue;
        };
        let label = dom::text(*label_cell);

        let Some(code) = vocabulary.normalize(&label) else {
            warn!(statement = %key, label = %label, "unmapped row label");
            unmapped.push(UnmappedRow { key, label });
            continue;
        };

        if value_cells.len() != grid.n_periods() {
            return Err(ParseError::RaggedRow {
                key,
                label,
                expected: grid.n_periods(),
                found: value_cells.len(),
            });
        }

        let mut values = Vec::with_capacity(value_cells.len());
        for cell in value_cells {
            let raw = dom::text(*cell);
            let value = parse_value(&raw).ok_or_else(|| ParseError::InvalidCell {
                key,
                label: label.clone(),
                value: raw.clone(),
            })?;
            values.push(value);
        }

        if !grid.push_row(code.clone(), values) {
            debug!(statement = %key, code = %code, label = %label, "duplicate code, keeping first row");
        }
    }

    Ok(grid)
}

/// Convert one cell. `Some(None)` is the missing marker, `None` is invalid.
fn parse_value(raw: &str) -> Option<Option<f64>> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned == MISSING_MARKER {
        return Some(None);
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
}

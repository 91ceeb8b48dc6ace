//! One-row-per-entity tables assembled from statement grids.

use fintab_data::{EntityRecord, FieldCode, Frequency};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Name of the index column in exported tables.
pub const SYMBOL_COLUMN: &str = "symbol";

/// Column name for one field at one period offset, e.g. `IA0_REV`.
pub fn column_name(frequency: Frequency, offset: usize, code: &FieldCode) -> String {
    format!("{}{}_{}", frequency.period_code_prefix(), offset, code)
}

/// Entities × columns table of optional values.
///
/// Rows follow the order of the records it was assembled from. Columns are
/// the union of the columns each entity produced, in the order they were
/// first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    index: Vec<String>,
    columns: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl WideTable {
    /// Flatten the grids of every record into one row each.
    ///
    /// Grids are walked in canonical statement order, then by period offset,
    /// then by row. An incomplete record contributes a row of `None`. If one
    /// entity produces the same column twice (the same code in two statements
    /// of one frequency), the first value is kept.
    pub fn assemble<'a>(records: impl IntoIterator<Item = &'a EntityRecord>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut index = Vec::new();
        let mut sparse: Vec<Vec<(usize, Option<f64>)>> = Vec::new();

        for record in records {
            let mut cells = Vec::new();
            let mut seen = HashSet::new();

            if record.is_complete() {
                for (key, grid) in record.grids() {
                    for offset in 0..grid.n_periods() {
                        for (code, value) in grid.column(offset) {
                            let name = column_name(key.frequency, offset, code);
                            let position = match positions.get(&name) {
                                Some(&position) => position,
                                None => {
                                    positions.insert(name.clone(), columns.len());
                                    columns.push(name.clone());
                                    columns.len() - 1
                                }
                            };
                            if !seen.insert(position) {
                                warn!(
                                    symbol = record.symbol(),
                                    column = %name,
                                    statement = %key,
                                    "duplicate column, keeping first value"
                                );
                                continue;
                            }
                            cells.push((position, value));
                        }
                    }
                }
            }

            index.push(record.symbol().to_string());
            sparse.push(cells);
        }

        let values = sparse
            .into_iter()
            .map(|cells| {
                let mut row = vec![None; columns.len()];
                for (position, value) in cells {
                    row[position] = value;
                }
                row
            })
            .collect();

        Self {
            index,
            columns,
            values,
        }
    }

    /// Entity symbols in row order.
    pub fn index(&self) -> &[String] {
        &self.index
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    /// Number of value columns, not counting the index.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns true if the column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_position(column).is_some()
    }

    /// Values of one entity, in column order.
    pub fn row(&self, symbol: &str) -> Option<&[Option<f64>]> {
        let position = self.index.iter().position(|s| s == symbol)?;
        Some(&self.values[position])
    }

    /// Values of one column, in row order.
    pub fn column(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let position = self.column_position(column)?;
        Some(self.values.iter().map(|row| row[position]).collect())
    }

    /// A single cell. `None` if the entity or column is unknown or the value is missing.
    pub fn value(&self, symbol: &str, column: &str) -> Option<f64> {
        let position = self.column_position(column)?;
        self.row(symbol)?[position]
    }

    /// Rows as `(symbol, values)` pairs.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.index
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    fn column_position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

/// Serializes as a list of row objects, `symbol` first, columns in table order.
impl Serialize for WideTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.n_rows()))?;
        for (symbol, values) in self.rows() {
            seq.serialize_element(&RowRef {
                symbol,
                columns: &self.columns,
                values,
            })?;
        }
        seq.end()
    }
}

struct RowRef<'a> {
    symbol: &'a str,
    columns: &'a [String],
    values: &'a [Option<f64>],
}

impl Serialize for RowRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len() + 1))?;
        map.serialize_entry(SYMBOL_COLUMN, self.symbol)?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

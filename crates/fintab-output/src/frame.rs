//! Polars conversion.

use crate::table::{SYMBOL_COLUMN, WideTable};
use polars::prelude::*;

impl WideTable {
    /// Build a `DataFrame` with a `symbol` column followed by one nullable
    /// `f64` column per table column.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.n_columns() + 1);
        columns.push(Series::new(SYMBOL_COLUMN.into(), self.index().to_vec()).into());

        for (position, name) in self.columns().iter().enumerate() {
            let values: Vec<Option<f64>> = self.rows().map(|(_, row)| row[position]).collect();
            columns.push(Series::new(name.as_str().into(), values).into());
        }

        DataFrame::new(columns)
    }
}

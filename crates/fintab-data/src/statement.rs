//! Statement keys and the per-statement numeric grid.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three financial statements published for each company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementType {
    /// Income statement
    Income,
    /// Balance sheet
    Balance,
    /// Cash flow statement
    CashFlow,
}

impl StatementType {
    /// All statement types in canonical order.
    pub const ALL: [Self; 3] = [Self::Income, Self::Balance, Self::CashFlow];

    /// Prefix of the section anchor id in the source document.
    pub const fn anchor_prefix(&self) -> &'static str {
        match self {
            Self::Income => "inc",
            Self::Balance => "bal",
            Self::CashFlow => "cas",
        }
    }

    /// Lowercase name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Balance => "balance",
            Self::CashFlow => "cashflow",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reporting cadence of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Quarterly figures
    Interim,
    /// Yearly figures
    Annual,
}

impl Frequency {
    /// Both frequencies in canonical order.
    pub const ALL: [Self; 2] = [Self::Interim, Self::Annual];

    /// Frequency part of the section anchor id.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Interim => "interim",
            Self::Annual => "annual",
        }
    }

    /// Column prefix used in the wide table (`IQ` or `IA`).
    pub const fn period_code_prefix(&self) -> &'static str {
        match self {
            Self::Interim => "IQ",
            Self::Annual => "IA",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One statement at one frequency.
///
/// The derived ordering is the canonical extraction order: statement type
/// first, then interim before annual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatementKey {
    /// Which statement
    pub statement_type: StatementType,
    /// Which reporting cadence
    pub frequency: Frequency,
}

impl StatementKey {
    /// All six keys in canonical order.
    pub const ALL: [Self; 6] = [
        Self::new(StatementType::Income, Frequency::Interim),
        Self::new(StatementType::Income, Frequency::Annual),
        Self::new(StatementType::Balance, Frequency::Interim),
        Self::new(StatementType::Balance, Frequency::Annual),
        Self::new(StatementType::CashFlow, Frequency::Interim),
        Self::new(StatementType::CashFlow, Frequency::Annual),
    ];

    /// Create a new statement key.
    pub const fn new(statement_type: StatementType, frequency: Frequency) -> Self {
        Self {
            statement_type,
            frequency,
        }
    }

    /// Id of the element wrapping this statement, e.g. `incannualdiv`.
    pub fn anchor_id(&self) -> String {
        format!(
            "{}{}div",
            self.statement_type.anchor_prefix(),
            self.frequency.name()
        )
    }
}

impl fmt::Display for StatementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.statement_type, self.frequency)
    }
}

/// Canonical code of a statement line item, e.g. `REV`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FieldCode(String);

impl FieldCode {
    /// Create a field code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// One line item of a statement: a code and one value per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    /// Canonical field code
    pub code: FieldCode,
    /// Values in period order; `None` where the source reports no figure
    pub values: Vec<Option<f64>>,
}

/// A field-code × period table for one statement at one frequency.
///
/// Periods keep the column order of the source, so offset 0 is the first
/// (most recent) period. Every row has exactly one value per period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct StatementGrid {
    periods: Vec<String>,
    rows: Vec<GridRow>,
}

#[derive(Deserialize)]
struct RawGrid {
    periods: Vec<String>,
    rows: Vec<GridRow>,
}

impl TryFrom<RawGrid> for StatementGrid {
    type Error = String;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        let mut grid = Self::new(raw.periods);
        for row in raw.rows {
            if row.values.len() != grid.n_periods() {
                return Err(format!(
                    "row `{}` has {} values, expected {}",
                    row.code,
                    row.values.len(),
                    grid.n_periods()
                ));
            }
            if !grid.push_row(row.code.clone(), row.values) {
                return Err(format!("duplicate row `{}`", row.code));
            }
        }
        Ok(grid)
    }
}

impl StatementGrid {
    /// Create an empty grid over the given period labels.
    pub const fn new(periods: Vec<String>) -> Self {
        Self {
            periods,
            rows: Vec::new(),
        }
    }

    /// Append a row.
    ///
    /// Returns `false` and leaves the grid unchanged if the code is already
    /// present or the number of values does not match the number of periods.
    pub fn push_row(&mut self, code: FieldCode, values: Vec<Option<f64>>) -> bool {
        if values.len() != self.periods.len() || self.contains(&code) {
            return false;
        }
        self.rows.push(GridRow { code, values });
        true
    }

    /// Period labels in column order.
    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    /// Rows in source order.
    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    /// Number of period columns.
    pub fn n_periods(&self) -> usize {
        self.periods.len()
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the grid has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true if a row with this code exists.
    pub fn contains(&self, code: &FieldCode) -> bool {
        self.rows.iter().any(|r| &r.code == code)
    }

    /// Field codes in row order.
    pub fn codes(&self) -> impl Iterator<Item = &FieldCode> {
        self.rows.iter().map(|r| &r.code)
    }

    /// Row for a field code.
    pub fn row(&self, code: &str) -> Option<&GridRow> {
        self.rows.iter().find(|r| r.code.as_str() == code)
    }

    /// Value at a period offset. `None` if the row or offset does not exist
    /// or the cell is missing.
    pub fn value(&self, code: &str, offset: usize) -> Option<f64> {
        self.row(code)
            .and_then(|r| r.values.get(offset).copied())
            .flatten()
    }

    /// Value by period label.
    pub fn value_for_period(&self, code: &str, period: &str) -> Option<f64> {
        let offset = self.periods.iter().position(|p| p == period)?;
        self.value(code, offset)
    }

    /// The `(code, value)` pairs of one period column, in row order.
    pub fn column(&self, offset: usize) -> impl Iterator<Item = (&FieldCode, Option<f64>)> {
        self.rows
            .iter()
            .filter(move |_| offset < self.periods.len())
            .map(move |r| (&r.code, r.values.get(offset).copied().flatten()))
    }
}

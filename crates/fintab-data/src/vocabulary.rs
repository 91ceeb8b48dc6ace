//! Row-name normalization.
//!
//! The source labels line items in prose ("Total Revenue", "Net Income
//! Before Taxes", ...). A [`Vocabulary`] maps those labels onto short
//! canonical [`FieldCode`]s. Labels without an entry are *unmapped*: this is
//! an expected outcome, reported to the caller rather than raised as an error.

use crate::error::Result;
use crate::statement::FieldCode;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Fixed label → code lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    codes: HashMap<String, FieldCode>,
}

impl Vocabulary {
    /// Create an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vocabulary from `(label, code)` pairs. Later pairs override
    /// earlier ones with the same label.
    pub fn from_pairs<L, C>(pairs: impl IntoIterator<Item = (L, C)>) -> Self
    where
        L: AsRef<str>,
        C: Into<FieldCode>,
    {
        let mut vocabulary = Self::new();
        for (label, code) in pairs {
            vocabulary.insert(label.as_ref(), code);
        }
        vocabulary
    }

    /// Parse a JSON object of the form `{"Total Revenue": "TREV", ...}`.
    ///
    /// Entries apply in file order, so when two keys normalize to the same
    /// label the later one wins.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let LabelPairs(pairs) = serde_json::from_str(json)?;
        Ok(Self::from_pairs(pairs))
    }

    /// Read a JSON vocabulary file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Add or replace one entry.
    pub fn insert(&mut self, label: &str, code: impl Into<FieldCode>) {
        self.codes.insert(canonical_label(label), code.into());
    }

    /// Merge another vocabulary into this one; its entries win.
    pub fn extend(&mut self, other: Self) {
        self.codes.extend(other.codes);
    }

    /// Look up the code for a raw row label. `None` means the label is unmapped.
    pub fn normalize(&self, label: &str) -> Option<&FieldCode> {
        self.codes.get(&canonical_label(label))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Entries sorted by label.
    pub fn entries(&self) -> Vec<(&str, &FieldCode)> {
        let mut entries: Vec<(&str, &FieldCode)> =
            self.codes.iter().map(|(l, c)| (l.as_str(), c)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// Trim and collapse whitespace runs (non-breaking spaces included) to one space.
fn canonical_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `(label, code)` entries of a JSON object in source order.
struct LabelPairs(Vec<(String, String)>);

impl<'de> Deserialize<'de> for LabelPairs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = LabelPairs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of label to field code strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<LabelPairs, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((label, code)) = map.next_entry::<String, String>()? {
                    pairs.push((label, code));
                }
                Ok(LabelPairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn vocabulary() -> Vocabulary {
        Vocabulary::from_pairs([
            ("Revenue", "REV"),
            ("Total Revenue", "TREV"),
            ("Net Income", "NI"),
        ])
    }

    #[rstest]
    #[case("Revenue", Some("REV"))]
    #[case("  Total Revenue ", Some("TREV"))]
    #[case("Total\u{a0}\u{a0}Revenue", Some("TREV"))]
    #[case("Total\n   Revenue", Some("TREV"))]
    #[case("total revenue", None)]
    #[case("Diluted EPS", None)]
    #[case("", None)]
    fn test_normalize(#[case] label: &str, #[case] expected: Option<&str>) {
        let vocab = vocabulary();
        assert_eq!(vocab.normalize(label).map(FieldCode::as_str), expected);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let vocab = vocabulary();
        for _ in 0..3 {
            assert_eq!(vocab.normalize("Net Income"), Some(&FieldCode::new("NI")));
            assert_eq!(vocab.normalize("Gross Profit"), None);
        }
    }

    #[test]
    fn test_from_json() {
        let vocab =
            Vocabulary::from_json_str(r#"{"Revenue": "REV", "Net Income": "NI"}"#).unwrap();
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.normalize("Net Income").unwrap().as_str(), "NI");

        assert!(Vocabulary::from_json_str("[1, 2]").is_err());
        assert!(Vocabulary::from_json_str(r#"{"Revenue": 1}"#).is_err());
    }

    #[test]
    fn test_json_entries_apply_in_file_order() {
        for _ in 0..8 {
            let vocab = Vocabulary::from_json_str(
                r#"{"Total  Revenue": "FIRST", "Gross Profit": "GP", "Total Revenue": "SECOND"}"#,
            )
            .unwrap();
            assert_eq!(vocab.len(), 2);
            assert_eq!(vocab.normalize("Total Revenue").unwrap().as_str(), "SECOND");
        }

        let vocab =
            Vocabulary::from_json_str(r#"{"Total Revenue": "FIRST", "Total\nRevenue": "SECOND"}"#)
                .unwrap();
        assert_eq!(vocab.normalize("Total Revenue").unwrap().as_str(), "SECOND");
    }

    #[test]
    fn test_later_pairs_override() {
        let mut vocab = Vocabulary::from_pairs([("Revenue", "REV"), ("Revenue", "SALES")]);
        assert_eq!(vocab.normalize("Revenue").unwrap().as_str(), "SALES");

        vocab.extend(Vocabulary::from_pairs([("Revenue", "R")]));
        assert_eq!(vocab.normalize("Revenue").unwrap().as_str(), "R");
        assert_eq!(vocab.entries(), vec![("Revenue", &FieldCode::new("R"))]);
    }
}

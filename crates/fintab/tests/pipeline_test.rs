//! End-to-end: saved report page → record → wide table, with the built-in vocabulary.

use fintab::data::parser::parse_document;
use fintab::data::{EntityRecord, StatementKey, StatementType};
use fintab::output::{ExportFormat, Exporter};
use fintab::{WideTable, vocabulary};

fn page() -> String {
    let mut html = String::from("<html><body>");
    for key in StatementKey::ALL {
        let rows: &[(&str, &str, &str)] = match key.statement_type {
            StatementType::Income => &[
                ("Total Revenue", "91,819.00", "78,351.00"),
                ("Net Income", "18,361.00", "-"),
                ("Some Footnote Line", "1.00", "2.00"),
            ],
            StatementType::Balance => &[("Total Assets", "290,479.00", "261,894.00")],
            StatementType::CashFlow => &[("Cash from Operating Activities", "27,463.00", "-")],
        };
        html.push_str(&format!(
            r#"<div id="{}"><table id="fs-table">
               <thead><tr><th>In Millions of USD</th><th>2015</th><th>2014</th></tr></thead>
               <tbody>"#,
            key.anchor_id()
        ));
        for (label, first, second) in rows {
            html.push_str(&format!(
                "<tr><td class=\"lft\">{label}\n</td><td class=\"r\">{first}</td><td class=\"r\">{second}</td></tr>"
            ));
        }
        html.push_str("</tbody></table></div>");
    }
    html.push_str("</body></html>");
    html
}

#[test]
fn test_saved_page_to_wide_table() {
    let parsed = parse_document(&page(), &vocabulary::google_finance()).unwrap();
    assert_eq!(parsed.unmapped.len(), 2);

    let record = EntityRecord::from_parsed("NASDAQ:AAPL".parse().unwrap(), parsed);
    let table = WideTable::assemble([&record]);

    assert_eq!(table.value("AAPL", "IA0_RTLR"), Some(91_819.0));
    assert_eq!(table.value("AAPL", "IQ1_RTLR"), Some(78_351.0));
    assert_eq!(table.value("AAPL", "IA1_NINC"), None);
    assert_eq!(table.value("AAPL", "IA0_ATOT"), Some(290_479.0));
    assert_eq!(table.value("AAPL", "IQ0_OTLO"), Some(27_463.0));
    assert!(!table.columns().iter().any(|c| c.ends_with("_Some Footnote Line")));

    let csv = table.export_to_string(ExportFormat::Csv).unwrap();
    assert!(csv.starts_with("symbol,IQ0_RTLR,IQ0_NINC,IQ1_RTLR,IQ1_NINC,"));
}

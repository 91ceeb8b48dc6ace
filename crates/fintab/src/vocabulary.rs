//! Built-in row label vocabulary for Google Finance statement pages.
//!
//! Codes are the four-letter line item codes of the underlying fundamentals
//! feed, so the same code names the same item in every company's table.

use fintab_data::{StatementType, Vocabulary};

/// Label → code entries, grouped by the statement they appear in.
pub const GOOGLE_FINANCE_LABELS: &[(StatementType, &str, &str)] = &[
    // Income statement
    (StatementType::Income, "Revenue", "SREV"),
    (StatementType::Income, "Other Revenue, Total", "SORE"),
    (StatementType::Income, "Total Revenue", "RTLR"),
    (StatementType::Income, "Cost of Revenue, Total", "SCOR"),
    (StatementType::Income, "Gross Profit", "SGRP"),
    (StatementType::Income, "Selling/General/Admin. Expenses, Total", "SSGA"),
    (StatementType::Income, "Research & Development", "ERAD"),
    (StatementType::Income, "Depreciation/Amortization", "SDPR"),
    (StatementType::Income, "Interest Expense(Income) - Net Operating", "SINN"),
    (StatementType::Income, "Unusual Expense (Income)", "SUIE"),
    (StatementType::Income, "Other Operating Expenses, Total", "SOOE"),
    (StatementType::Income, "Total Operating Expense", "ETOE"),
    (StatementType::Income, "Operating Income", "SOPI"),
    (StatementType::Income, "Interest Income(Expense), Net Non-Operating", "SNIN"),
    (StatementType::Income, "Gain (Loss) on Sale of Assets", "NGLA"),
    (StatementType::Income, "Other, Net", "SONT"),
    (StatementType::Income, "Income Before Tax", "EIBT"),
    (StatementType::Income, "Income After Tax", "TIAT"),
    (StatementType::Income, "Minority Interest", "CMIN"),
    (StatementType::Income, "Equity In Affiliates", "CEIA"),
    (StatementType::Income, "Net Income Before Extra. Items", "NIBX"),
    (StatementType::Income, "Accounting Change", "NACC"),
    (StatementType::Income, "Discontinued Operations", "XDOP"),
    (StatementType::Income, "Extraordinary Item", "NEXI"),
    (StatementType::Income, "Net Income", "NINC"),
    (StatementType::Income, "Preferred Dividends", "CPRD"),
    (StatementType::Income, "Income Available to Common Excl. Extra Items", "CIAC"),
    (StatementType::Income, "Income Available to Common Incl. Extra Items", "XNIC"),
    (StatementType::Income, "Basic Weighted Average Shares", "SBAS"),
    (StatementType::Income, "Basic EPS Excluding Extraordinary Items", "SBBF"),
    (StatementType::Income, "Basic EPS Including Extraordinary Items", "SBAI"),
    (StatementType::Income, "Dilution Adjustment", "SDAJ"),
    (StatementType::Income, "Diluted Weighted Average Shares", "SDWS"),
    (StatementType::Income, "Diluted EPS Excluding Extraordinary Items", "SDBF"),
    (StatementType::Income, "Diluted EPS Including Extraordinary Items", "SDAI"),
    (StatementType::Income, "Dividends per Share - Common Stock Primary Issue", "DDPS1"),
    (StatementType::Income, "Gross Dividends - Common Stock", "VDES"),
    (StatementType::Income, "Net Income after Stock Based Comp. Expense", "VSCP"),
    (StatementType::Income, "Basic EPS after Stock Based Comp. Expense", "VBES"),
    (StatementType::Income, "Diluted EPS after Stock Based Comp. Expense", "VDBS"),
    (StatementType::Income, "Depreciation, Supplemental", "VDEP"),
    (StatementType::Income, "Total Special Items", "VTSI"),
    (StatementType::Income, "Normalized Income Before Taxes", "VNIB"),
    (StatementType::Income, "Effect of Special Items on Income Taxes", "VESI"),
    (StatementType::Income, "Income Taxes Ex. Impact of Special Items", "VITX"),
    (StatementType::Income, "Normalized Income After Taxes", "VNIA"),
    (StatementType::Income, "Normalized Income Avail to Common", "VNIC"),
    (StatementType::Income, "Basic Normalized EPS", "VBNE"),
    (StatementType::Income, "Diluted Normalized EPS", "VDNE"),
    // Balance sheet
    (StatementType::Balance, "Cash & Equivalents", "ACAE"),
    (StatementType::Balance, "Short Term Investments", "ASTI"),
    (StatementType::Balance, "Cash and Short Term Investments", "SCSI"),
    (StatementType::Balance, "Accounts Receivable - Trade, Net", "AACR"),
    (StatementType::Balance, "Receivables - Other", "SORE2"),
    (StatementType::Balance, "Total Receivables, Net", "ATRC"),
    (StatementType::Balance, "Total Inventory", "AITL"),
    (StatementType::Balance, "Prepaid Expenses", "APPY"),
    (StatementType::Balance, "Other Current Assets, Total", "SOCA"),
    (StatementType::Balance, "Total Current Assets", "ATCA"),
    (StatementType::Balance, "Property/Plant/Equipment, Total - Gross", "APTC"),
    (StatementType::Balance, "Accumulated Depreciation, Total", "ADEP"),
    (StatementType::Balance, "Goodwill, Net", "AGWI"),
    (StatementType::Balance, "Intangibles, Net", "AINT"),
    (StatementType::Balance, "Long Term Investments", "SINV"),
    (StatementType::Balance, "Other Long Term Assets, Total", "SOLA"),
    (StatementType::Balance, "Total Assets", "ATOT"),
    (StatementType::Balance, "Accounts Payable", "LAPB"),
    (StatementType::Balance, "Accrued Expenses", "LAEX"),
    (StatementType::Balance, "Notes Payable/Short Term Debt", "LSTD"),
    (StatementType::Balance, "Current Port. of LT Debt/Capital Leases", "LCLD"),
    (StatementType::Balance, "Other Current liabilities, Total", "SOCL"),
    (StatementType::Balance, "Total Current Liabilities", "LTCL"),
    (StatementType::Balance, "Long Term Debt", "LLTD"),
    (StatementType::Balance, "Capital Lease Obligations", "LCLO"),
    (StatementType::Balance, "Total Long Term Debt", "LTTD"),
    (StatementType::Balance, "Total Debt", "STLD"),
    (StatementType::Balance, "Deferred Income Tax", "SBDT"),
    (StatementType::Balance, "Minority Interest, Balance Sheet", "LMIN"),
    (StatementType::Balance, "Other Liabilities, Total", "SLTL"),
    (StatementType::Balance, "Total Liabilities", "LTLL"),
    (StatementType::Balance, "Redeemable Preferred Stock, Total", "SRPR"),
    (StatementType::Balance, "Preferred Stock - Non Redeemable, Net", "SPRS"),
    (StatementType::Balance, "Common Stock, Total", "SCMS"),
    (StatementType::Balance, "Additional Paid-In Capital", "QPIC"),
    (StatementType::Balance, "Retained Earnings (Accumulated Deficit)", "QRED"),
    (StatementType::Balance, "Treasury Stock - Common", "QTSC"),
    (StatementType::Balance, "Other Equity, Total", "SOTE"),
    (StatementType::Balance, "Total Equity", "QTLE"),
    (StatementType::Balance, "Total Liabilities & Shareholders' Equity", "QTEL"),
    (StatementType::Balance, "Shares Outs - Common Stock Primary Issue", "QTPO"),
    (StatementType::Balance, "Total Common Shares Outstanding", "QTCO"),
    // Cash flow statement
    (StatementType::CashFlow, "Net Income/Starting Line", "ONET"),
    (StatementType::CashFlow, "Depreciation/Depletion", "SDED"),
    (StatementType::CashFlow, "Amortization", "SAMT"),
    (StatementType::CashFlow, "Deferred Taxes", "OBDT"),
    (StatementType::CashFlow, "Non-Cash Items", "SNCI"),
    (StatementType::CashFlow, "Changes in Working Capital", "SOCF"),
    (StatementType::CashFlow, "Cash from Operating Activities", "OTLO"),
    (StatementType::CashFlow, "Capital Expenditures", "SCEX"),
    (StatementType::CashFlow, "Other Investing Cash Flow Items, Total", "SICF"),
    (StatementType::CashFlow, "Cash from Investing Activities", "ITLI"),
    (StatementType::CashFlow, "Financing Cash Flow Items", "SFCF"),
    (StatementType::CashFlow, "Total Cash Dividends Paid", "FCDP"),
    (StatementType::CashFlow, "Issuance (Retirement) of Stock, Net", "FPSS"),
    (StatementType::CashFlow, "Issuance (Retirement) of Debt, Net", "FPRD"),
    (StatementType::CashFlow, "Cash from Financing Activities", "FTLF"),
    (StatementType::CashFlow, "Foreign Exchange Effects", "SFEE"),
    (StatementType::CashFlow, "Net Change in Cash", "SNCC"),
    (StatementType::CashFlow, "Cash Interest Paid, Supplemental", "SCIP"),
    (StatementType::CashFlow, "Cash Taxes Paid, Supplemental", "SCTP"),
];

/// The built-in vocabulary.
pub fn google_finance() -> Vocabulary {
    Vocabulary::from_pairs(
        GOOGLE_FINANCE_LABELS
            .iter()
            .map(|(_, label, code)| (*label, *code)),
    )
}

/// Entries that belong to one statement.
pub fn labels_for(statement_type: StatementType) -> impl Iterator<Item = (&'static str, &'static str)> {
    GOOGLE_FINANCE_LABELS
        .iter()
        .filter(move |(st, _, _)| *st == statement_type)
        .map(|(_, label, code)| (*label, *code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[test]
    fn test_labels_and_codes_are_unique() {
        let labels: HashSet<&str> = GOOGLE_FINANCE_LABELS.iter().map(|(_, l, _)| *l).collect();
        let codes: HashSet<&str> = GOOGLE_FINANCE_LABELS.iter().map(|(_, _, c)| *c).collect();
        assert_eq!(labels.len(), GOOGLE_FINANCE_LABELS.len());
        assert_eq!(codes.len(), GOOGLE_FINANCE_LABELS.len());
        assert_eq!(google_finance().len(), GOOGLE_FINANCE_LABELS.len());
    }

    #[rstest]
    #[case("Total Revenue", "RTLR")]
    #[case("Net Income", "NINC")]
    #[case("Total Assets", "ATOT")]
    #[case("Cash from Operating Activities", "OTLO")]
    #[case("  Gross   Profit ", "SGRP")]
    fn test_lookup(#[case] label: &str, #[case] code: &str) {
        let vocabulary = google_finance();
        assert_eq!(vocabulary.normalize(label).map(|c| c.as_str()), Some(code));
    }

    #[test]
    fn test_unknown_label() {
        assert!(google_finance().normalize("Net Incom").is_none());
    }

    #[test]
    fn test_every_statement_has_entries() {
        for statement_type in StatementType::ALL {
            assert!(labels_for(statement_type).count() > 10);
        }
    }
}

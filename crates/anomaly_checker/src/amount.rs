use std::str::FromStr;

use models::{LedgerLine, LedgerRow};
use rust_decimal::Decimal;

use crate::error::{CheckError, Result};

const THOUSANDS_SEPARATOR: char = ',';

/// Strips thousands separators and parses the rest as a signed decimal.
///
/// Returns `None` when the text is not a number. Scientific notation is
/// accepted because numeric spreadsheet cells can render that way.
///
/// Amounts are exact 96-bit decimals, so values whose magnitude exceeds
/// `Decimal::MAX` (about 7.9e28, e.g. `"1e30"`) are rejected rather than
/// approximated the way a float parse would.
pub fn normalize_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != THOUSANDS_SEPARATOR)
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    match Decimal::from_str(&cleaned) {
        Ok(d) => Some(d),
        Err(_) if cleaned.contains(['e', 'E']) => Decimal::from_scientific(&cleaned).ok(),
        Err(_) => None,
    }
}

/// Turns raw loader rows into typed ledger lines without touching the input.
///
/// Stops at the first row that is missing a required field or carries an
/// amount that does not parse.
pub fn normalize_rows(rows: &[LedgerRow]) -> Result<Vec<LedgerLine>> {
    rows.iter().map(normalize_row).collect()
}

fn normalize_row(row: &LedgerRow) -> Result<LedgerLine> {
    let gl_code = required(row.row_number, row.gl_code.as_deref(), "gl_code")?;
    let grouping_label = required(row.row_number, row.grouping_label.as_deref(), "grouping_label")?;
    let amount_raw = required(row.row_number, row.amount_raw.as_deref(), "amount")?;

    let amount = normalize_amount(amount_raw).ok_or_else(|| CheckError::MalformedAmount {
        row: row.row_number,
        gl_code: gl_code.to_string(),
        raw: amount_raw.to_string(),
    })?;

    Ok(LedgerLine {
        row_number: row.row_number,
        gl_code: gl_code.to_string(),
        gl_name: row.gl_name.as_deref().unwrap_or_default().trim().to_string(),
        grouping_label: grouping_label.to_string(),
        amount,
    })
}

/// Present and non-blank, returned trimmed.
fn required<'a>(row: usize, value: Option<&'a str>, field: &'static str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CheckError::MalformedRow { row, field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(normalize_amount("1,234,567.89"), Some(dec!(1234567.89)));
        assert_eq!(normalize_amount("-12,000"), Some(dec!(-12000)));
        assert_eq!(normalize_amount("  42.10 "), Some(dec!(42.10)));
    }

    #[test]
    fn accepts_scientific_notation() {
        assert_eq!(normalize_amount("1.5e3"), Some(dec!(1500)));
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(normalize_amount("abc"), None);
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount(","), None);
        assert_eq!(normalize_amount("(100)"), None);
        assert_eq!(normalize_amount("$100"), None);
    }

    #[test]
    fn normalize_rows_trims_labels_and_keeps_input() {
        let rows = vec![LedgerRow::new(3, " 1001 ", "Cash", "  Current Assets ", "1,000")];
        let lines = normalize_rows(&rows).unwrap();

        assert_eq!(lines[0].gl_code, "1001");
        assert_eq!(lines[0].grouping_label, "Current Assets");
        assert_eq!(lines[0].amount, dec!(1000));
        assert_eq!(rows[0].amount_raw.as_deref(), Some("1,000"));
    }

    #[test]
    fn missing_gl_name_becomes_empty() {
        let mut row = LedgerRow::new(1, "1001", "", "Equity", "-5");
        row.gl_name = None;
        let lines = normalize_rows(&[row]).unwrap();
        assert_eq!(lines[0].gl_name, "");
    }

    #[test]
    fn blank_grouping_label_is_malformed_row() {
        let rows = vec![
            LedgerRow::new(1, "1001", "Cash", "Current Assets", "10"),
            LedgerRow::new(2, "1002", "Bank", "   ", "10"),
        ];
        let err = normalize_rows(&rows).unwrap_err();
        assert_eq!(
            err,
            CheckError::MalformedRow {
                row: 2,
                field: "grouping_label"
            }
        );
    }

    #[test]
    fn missing_amount_is_malformed_row_not_malformed_amount() {
        let mut row = LedgerRow::new(7, "1001", "Cash", "Current Assets", "");
        assert_eq!(
            normalize_rows(&[row.clone()]).unwrap_err(),
            CheckError::MalformedRow { row: 7, field: "amount" }
        );
        row.amount_raw = None;
        assert_eq!(normalize_rows(&[row]).unwrap_err().row(), Some(7));
    }

    #[test]
    fn unparseable_amount_names_the_row() {
        let rows = vec![LedgerRow::new(5, "2001", "Payables", "Current Liabilities", "abc")];
        let err = normalize_rows(&rows).unwrap_err();
        assert_eq!(
            err,
            CheckError::MalformedAmount {
                row: 5,
                gl_code: "2001".to_string(),
                raw: "abc".to_string(),
            }
        );
    }

    #[test]
    fn missing_or_blank_gl_code_is_malformed_row() {
        let mut row = LedgerRow::new(9, "   ", "Cash", "Current Assets", "10");
        assert_eq!(
            normalize_rows(&[row.clone()]).unwrap_err(),
            CheckError::MalformedRow { row: 9, field: "gl_code" }
        );
        row.gl_code = None;
        assert_eq!(
            normalize_rows(&[row]).unwrap_err(),
            CheckError::MalformedRow { row: 9, field: "gl_code" }
        );
    }

    #[test]
    fn amounts_beyond_decimal_precision_are_rejected() {
        assert_eq!(normalize_amount("1e30"), None);
        assert_eq!(normalize_amount("123456789012345678901234567890.5"), None);
        assert_eq!(
            normalize_amount("79228162514264337593543950335"),
            Some(Decimal::MAX)
        );
    }
}

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use models::{ColumnNames, LedgerRow, WorkbookSettings};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

pub const PARSER_NAME: &str = "trial_balance";

/// Reads ledger rows out of a trial-balance workbook.
///
/// The sheet, header row and column names are configurable; by default the
/// first sheet is used and the header row is detected from the column names.
#[derive(Debug, Clone, Default)]
pub struct TrialBalanceReader {
    pub columns: ColumnNames,
    pub sheet: Option<String>,
    /// 0-based sheet row holding the column names.
    pub header_row: Option<usize>,
}

impl TrialBalanceReader {
    pub fn new(columns: ColumnNames) -> Self {
        Self {
            columns,
            sheet: None,
            header_row: None,
        }
    }

    pub fn from_settings(settings: &WorkbookSettings) -> Self {
        Self {
            columns: settings.columns.clone(),
            sheet: settings.sheet.clone(),
            header_row: settings.header_row,
        }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = Some(header_row);
        self
    }

    /// Parse the configured sheet of an `.xlsx`, `.xls` or `.ods` file.
    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<LedgerRow>> {
        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Cannot open {}", path.display()))?;

        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| anyhow!("Workbook {} has no sheets", path.display()))?,
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Cannot read sheet '{}' in {}", sheet_name, path.display()))?;

        let rows = self
            .read_range(&range)
            .with_context(|| format!("Sheet '{}' in {}", sheet_name, path.display()))?;

        info!(
            sheet = %sheet_name,
            rows = rows.len(),
            "loaded trial balance from {}",
            path.display()
        );
        Ok(rows)
    }

    /// Parse an already loaded sheet.
    pub fn read_range(&self, range: &Range<Data>) -> Result<Vec<LedgerRow>> {
        // `rows()` starts at the first used cell, not at A1.
        let row_offset = range.start().map(|(r, _)| r as usize).unwrap_or(0);

        let (header_idx, header_map) = match self.header_row {
            Some(abs) => {
                let rel = abs
                    .checked_sub(row_offset)
                    .ok_or_else(|| anyhow!("Header row {} is empty", abs + 1))?;
                let row = range
                    .rows()
                    .nth(rel)
                    .ok_or_else(|| anyhow!("Header row {} is past the end of the sheet", abs + 1))?;
                (rel, header_map(row))
            }
            None => find_header_row(range, &self.columns).ok_or_else(|| {
                anyhow!(
                    "No header row with columns '{}', '{}', '{}', '{}'",
                    self.columns.gl_code,
                    self.columns.gl_name,
                    self.columns.amount,
                    self.columns.grouping
                )
            })?,
        };

        let idx = ColumnIndexes::resolve(&header_map, &self.columns)
            .with_context(|| format!("Header row {}", row_offset + header_idx + 1))?;
        debug!(header_row = row_offset + header_idx + 1, ?idx, "mapped columns");

        let mut out = Vec::new();
        for (r_idx, row) in range.rows().enumerate().skip(header_idx + 1) {
            let gl_code = cell_str(row.get(idx.gl_code));
            let gl_name = cell_str(row.get(idx.gl_name));
            let grouping_label = cell_str(row.get(idx.grouping));
            let amount_raw = cell_str(row.get(idx.amount));

            // Trailing blank rows are common below the data.
            if [&gl_code, &gl_name, &grouping_label, &amount_raw]
                .iter()
                .all(|c| is_blank(c))
            {
                continue;
            }

            out.push(LedgerRow {
                row_number: row_offset + r_idx + 1,
                gl_code,
                gl_name,
                grouping_label,
                amount_raw,
            });
        }

        Ok(out)
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndexes {
    gl_code: usize,
    gl_name: usize,
    amount: usize,
    grouping: usize,
}

impl ColumnIndexes {
    fn resolve(header_map: &HashMap<String, usize>, columns: &ColumnNames) -> Result<Self> {
        let lookup = |name: &str| {
            header_map
                .get(name.trim())
                .copied()
                .with_context(|| format!("Missing column: {}", name))
        };
        Ok(Self {
            gl_code: lookup(&columns.gl_code)?,
            gl_name: lookup(&columns.gl_name)?,
            amount: lookup(&columns.amount)?,
            grouping: lookup(&columns.grouping)?,
        })
    }
}

fn header_map(row: &[Data]) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (c_idx, cell) in row.iter().enumerate() {
        let name = cell_str(Some(cell)).unwrap_or_default();
        let name = name.trim().to_string();
        // First occurrence wins for duplicated headers.
        if !name.is_empty() {
            map.entry(name).or_insert(c_idx);
        }
    }
    map
}

/// First row containing all four configured column names.
fn find_header_row(
    range: &Range<Data>,
    columns: &ColumnNames,
) -> Option<(usize, HashMap<String, usize>)> {
    for (r_idx, row) in range.rows().enumerate() {
        let map = header_map(row);
        let wanted = [
            &columns.gl_code,
            &columns.gl_name,
            &columns.amount,
            &columns.grouping,
        ];
        if wanted.iter().all(|name| map.contains_key(name.trim())) {
            return Some((r_idx, map));
        }
    }
    None
}

pub fn cell_str(cell: Option<&Data>) -> Option<String> {
    let c = cell?;
    match c {
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::Empty => None,
        _ => Some(c.to_string()),
    }
}

fn is_blank(cell: &Option<String>) -> bool {
    cell.as_deref().map_or(true, |s| s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(start: (u32, u32), rows: &[&[Data]]) -> Range<Data> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let end = (start.0 + rows.len() as u32 - 1, start.1 + width - 1);
        let mut range = Range::new(start, end);
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((start.0 + r as u32, start.1 + c as u32), cell.clone());
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn header() -> Vec<Data> {
        vec![s("GL"), s("GL Name"), s("Amount"), s("FS Grouping Main Head")]
    }

    #[test]
    fn detects_header_row_and_reads_rows() {
        let h = header();
        let h = h.as_slice();
        let range = sheet(
            (0, 0),
            &[
                &[s("Trial Balance FY24")],
                &[],
                h,
                &[Data::Float(11100110.0), s("Inventory"), s("1,200.50"), s("Current Assets")],
                &[Data::Int(21000010), s("Payables"), Data::Float(-1200.5), s("Current Liabilities ")],
            ],
        );

        let rows = TrialBalanceReader::default().read_range(&range).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 4);
        assert_eq!(rows[0].gl_code.as_deref(), Some("11100110"));
        assert_eq!(rows[0].amount_raw.as_deref(), Some("1,200.50"));
        assert_eq!(rows[1].gl_code.as_deref(), Some("21000010"));
        assert_eq!(rows[1].amount_raw.as_deref(), Some("-1200.5"));
        assert_eq!(rows[1].grouping_label.as_deref(), Some("Current Liabilities "));
    }

    #[test]
    fn configured_header_row_accounts_for_range_offset() {
        let h = header();
        let h = h.as_slice();
        let range = sheet(
            (2, 0),
            &[h, &[s("1001"), s("Cash"), s("10"), s("Current Assets")]],
        );

        let rows = TrialBalanceReader::default()
            .with_header_row(2)
            .read_range(&range)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_number, 4);
    }

    #[test]
    fn header_row_above_used_range_is_an_error() {
        let h = header();
        let h = h.as_slice();
        let range = sheet((2, 0), &[h]);
        let err = TrialBalanceReader::default()
            .with_header_row(0)
            .read_range(&range)
            .unwrap_err();
        assert!(err.to_string().contains("Header row 1"));
    }

    #[test]
    fn configured_header_row_missing_column_is_an_error() {
        let range = sheet((0, 0), &[&[s("GL"), s("GL Name"), s("Amount")]]);
        let err = TrialBalanceReader::default()
            .with_header_row(0)
            .read_range(&range)
            .unwrap_err();
        assert!(format!("{err:#}").contains("Missing column: FS Grouping Main Head"));
    }

    #[test]
    fn skips_fully_blank_rows_but_keeps_partial_ones() {
        let h = header();
        let h = h.as_slice();
        let range = sheet(
            (0, 0),
            &[
                h,
                &[Data::Empty, s("  "), Data::Empty, Data::Empty],
                &[s("1001"), s("Cash"), Data::Empty, s("Current Assets")],
            ],
        );

        let rows = TrialBalanceReader::default().read_range(&range).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_number, 3);
        assert_eq!(rows[0].amount_raw, None);
    }

    #[test]
    fn custom_column_names() {
        let columns = ColumnNames {
            gl_code: "Account".to_string(),
            gl_name: "Description".to_string(),
            amount: "Closing".to_string(),
            grouping: "Head".to_string(),
        };
        let range = sheet(
            (0, 0),
            &[
                &[s("Head"), s("Closing"), s("Description"), s("Account")],
                &[s("Equity"), s("-5"), s("Capital"), s("3000")],
            ],
        );

        let rows = TrialBalanceReader::new(columns).read_range(&range).unwrap();
        assert_eq!(rows[0], LedgerRow::new(2, "3000", "Capital", "Equity", "-5"));
    }

    #[test]
    fn no_header_row_found() {
        let range = sheet((0, 0), &[&[s("Something else")]]);
        assert!(TrialBalanceReader::default().read_range(&range).is_err());
    }
}

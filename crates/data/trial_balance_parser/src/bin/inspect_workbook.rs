use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Reader};
use std::env;
use trial_balance_parser::cell_str;

fn main() -> Result<()> {
    logger::init_stderr("trial_balance_parser=info");

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "Trial_Balance.xlsx".to_string());

    let mut workbook =
        open_workbook_auto(&path).with_context(|| format!("Cannot open {}", path))?;

    let sheet_names = workbook.sheet_names().to_vec();
    println!("Sheets ({}):", sheet_names.len());

    for sheet_name in sheet_names {
        println!("\n== {} ==", sheet_name);

        let range = match workbook.worksheet_range(&sheet_name) {
            Ok(r) => r,
            Err(e) => {
                println!("  (cannot read: {e})");
                continue;
            }
        };

        let (h, w) = range.get_size();
        let (r0, c0) = range.start().unwrap_or((0, 0));
        println!("  size: rows={h}, cols={w}, first cell at row {} col {}", r0 + 1, c0 + 1);

        // First 15 non-empty rows, up to 8 columns; row numbers as Excel shows them.
        let mut printed = 0usize;
        for (r_idx, row) in range.rows().enumerate() {
            if printed >= 15 {
                break;
            }

            let cells: Vec<String> = row
                .iter()
                .take(8)
                .map(|c| cell_str(Some(c)).unwrap_or_default())
                .collect();

            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }

            println!("  r{:>3}: {}", r0 as usize + r_idx + 1, cells.join(" | "));
            printed += 1;
        }
    }

    Ok(())
}

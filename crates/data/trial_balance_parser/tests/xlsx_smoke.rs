use models::{LedgerRow, WorkbookSettings};
use rust_xlsxwriter::Workbook;
use trial_balance_parser::TrialBalanceReader;

fn write_trial_balance(path: &std::path::Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("TB").unwrap();

    sheet.write_string(0, 0, "Trial Balance as at 31 March").unwrap();
    let headers = [
        "GL",
        "GL Name",
        "Gr GL",
        "Gr GL Name",
        "Amount",
        "FS Grouping Main Head",
        "FS Grouping Main Sub Head",
    ];
    for (c, h) in headers.iter().enumerate() {
        sheet.write_string(2, c as u16, *h).unwrap();
    }

    sheet.write_number(3, 0, 11100110.0).unwrap();
    sheet.write_string(3, 1, "Inventory-Raw Material-Domestic").unwrap();
    sheet.write_string(3, 4, "1,500.25").unwrap();
    sheet.write_string(3, 5, "Current Assets").unwrap();
    sheet.write_string(3, 6, "Inventories").unwrap();

    sheet.write_number(4, 0, 21000010.0).unwrap();
    sheet.write_string(4, 1, "Trade Payables").unwrap();
    sheet.write_number(4, 4, -1500.25).unwrap();
    sheet.write_string(4, 5, " Current Liabilities").unwrap();

    workbook.save(path).unwrap();
}

#[test]
fn reads_rows_below_configured_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Trial_Balance.xlsx");
    write_trial_balance(&path);

    let reader = TrialBalanceReader::from_settings(&WorkbookSettings::default());
    let rows = reader.read_file(&path).unwrap();

    assert_eq!(
        rows,
        vec![
            LedgerRow::new(4, "11100110", "Inventory-Raw Material-Domestic", "Current Assets", "1,500.25"),
            LedgerRow::new(5, "21000010", "Trade Payables", " Current Liabilities", "-1500.25"),
        ]
    );
}

#[test]
fn named_sheet_and_detected_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tb.xlsx");
    write_trial_balance(&path);

    let rows = TrialBalanceReader::default().with_sheet("TB").read_file(&path).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn unknown_sheet_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tb.xlsx");
    write_trial_balance(&path);

    let err = TrialBalanceReader::default().with_sheet("Nope").read_file(&path).unwrap_err();
    assert!(err.to_string().contains("Nope"));
}

#[test]
fn missing_file_is_an_error() {
    let err = TrialBalanceReader::default()
        .read_file("no_such_workbook.xlsx")
        .unwrap_err();
    assert!(err.to_string().contains("no_such_workbook.xlsx"));
}

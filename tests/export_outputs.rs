use std::fs;

use calamine::{Reader, Xlsx, open_workbook};
use dbpull::io::{self, excel_write};
use dbpull::model::QueryResult;
use tempfile::tempdir;

const LABEL: &str = "2024年04月";

fn sample_result() -> QueryResult {
    QueryResult {
        columns: vec!["EmployeeId".to_string(), "Name".to_string(), "JoiningDate".to_string()],
        rows: vec![
            vec!["1".to_string(), "Tanaka".to_string(), "2024-04-01".to_string()],
            vec!["2".to_string(), "Suzuki".to_string(), "2024-04-15".to_string()],
            vec!["3".to_string(), "Sato".to_string(), "2024-04-30".to_string()],
        ],
    }
}

fn sheet_rows(path: &std::path::Path, sheet: &str) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("workbook opened");
    let range = workbook
        .worksheet_range(sheet)
        .expect("sheet present")
        .expect("sheet readable");
    range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

#[test]
fn writes_header_plus_rows_to_a_named_sheet() {
    let temp_dir = tempdir().expect("temporary directory");
    let out_dir = temp_dir.path().join("output");
    let result = sample_result();

    io::write_result(&out_dir, &result, "EmployeeMaster", LABEL).expect("artifacts written");

    let rows = sheet_rows(&io::workbook_path(&out_dir, LABEL), "EmployeeMaster");
    assert_eq!(rows.len(), result.rows.len() + 1);
    assert_eq!(rows[0], result.columns);
    assert_eq!(rows[1..], result.rows[..]);
}

#[test]
fn two_tables_share_one_workbook_with_separate_csvs() {
    let temp_dir = tempdir().expect("temporary directory");
    let out_dir = temp_dir.path().join("output");

    let employees = sample_result();
    let expenses = QueryResult {
        columns: vec!["ExpenseId".to_string(), "RegistrationDate".to_string()],
        rows: vec![vec!["77".to_string(), "2024-04-02".to_string()]],
    };

    io::write_result(&out_dir, &employees, "EmployeeMaster", LABEL).expect("first table written");
    io::write_result(&out_dir, &expenses, "ExpenseReimbursement", LABEL)
        .expect("second table written");

    let mut workbook: Xlsx<_> =
        open_workbook(io::workbook_path(&out_dir, LABEL)).expect("workbook opened");
    let mut names = workbook.sheet_names().to_vec();
    names.sort();
    assert_eq!(names, ["EmployeeMaster", "ExpenseReimbursement"]);

    assert!(io::csv_path(&out_dir, "EmployeeMaster", LABEL).exists());
    assert!(io::csv_path(&out_dir, "ExpenseReimbursement", LABEL).exists());
}

#[test]
fn rewriting_a_table_replaces_only_its_own_sheet() {
    let temp_dir = tempdir().expect("temporary directory");
    let out_dir = temp_dir.path().join("output");

    let expenses = QueryResult {
        columns: vec!["ExpenseId".to_string(), "RegistrationDate".to_string()],
        rows: vec![vec!["77".to_string(), "2024-04-02".to_string()]],
    };
    io::write_result(&out_dir, &sample_result(), "EmployeeMaster", LABEL)
        .expect("first write");
    io::write_result(&out_dir, &expenses, "ExpenseReimbursement", LABEL).expect("second write");

    let replacement = QueryResult {
        columns: vec!["EmployeeId".to_string(), "Name".to_string()],
        rows: vec![vec!["9".to_string(), "Yamada".to_string()]],
    };
    io::write_result(&out_dir, &replacement, "EmployeeMaster", LABEL).expect("rewrite");

    let workbook_path = io::workbook_path(&out_dir, LABEL);
    let mut workbook: Xlsx<_> = open_workbook(&workbook_path).expect("workbook opened");
    assert_eq!(workbook.sheet_names().len(), 2);
    drop(workbook);

    let replaced = sheet_rows(&workbook_path, "EmployeeMaster");
    assert_eq!(replaced.len(), 2);
    assert_eq!(replaced[0], ["EmployeeId", "Name"]);

    let untouched = sheet_rows(&workbook_path, "ExpenseReimbursement");
    assert_eq!(untouched.len(), 2);
    assert_eq!(untouched[1], ["77", "2024-04-02"]);
}

#[test]
fn column_widths_are_longest_cell_plus_padding() {
    let grid = vec![
        vec!["Id".to_string(), "Description".to_string()],
        vec!["1".to_string(), "short".to_string()],
        vec!["12345".to_string(), "a considerably longer remark".to_string()],
    ];

    let widths = excel_write::column_widths(&grid);
    // Longest of "Id"/"1"/"12345" is 5; header wins in the second column.
    assert_eq!(widths, vec![15.0, 38.0]);
}

#[test]
fn header_counts_toward_column_width() {
    let grid = vec![
        vec!["RegistrationDate".to_string()],
        vec!["2024-04-02".to_string()],
    ];
    assert_eq!(excel_write::column_widths(&grid), vec![26.0]);
}

#[test]
fn csv_is_still_written_when_the_workbook_write_fails() {
    let temp_dir = tempdir().expect("temporary directory");
    let out_dir = temp_dir.path().join("output");
    // A directory squatting on the workbook path makes the Excel write fail.
    fs::create_dir_all(io::workbook_path(&out_dir, LABEL)).expect("blocking directory");

    let outcome = io::write_result(&out_dir, &sample_result(), "EmployeeMaster", LABEL);

    assert!(outcome.is_err());
    assert!(io::csv_path(&out_dir, "EmployeeMaster", LABEL).exists());
}

#[test]
fn workbook_is_still_written_when_the_csv_write_fails() {
    let temp_dir = tempdir().expect("temporary directory");
    let out_dir = temp_dir.path().join("output");
    fs::create_dir_all(io::csv_path(&out_dir, "EmployeeMaster", LABEL))
        .expect("blocking directory");

    let outcome = io::write_result(&out_dir, &sample_result(), "EmployeeMaster", LABEL);

    assert!(outcome.is_err());
    let rows = sheet_rows(&io::workbook_path(&out_dir, LABEL), "EmployeeMaster");
    assert_eq!(rows.len(), sample_result().rows.len() + 1);
}

#[test]
fn csv_is_bom_prefixed_and_round_trips() {
    let temp_dir = tempdir().expect("temporary directory");
    let out_dir = temp_dir.path().join("output");
    let result = sample_result();

    io::write_result(&out_dir, &result, "EmployeeMaster", LABEL).expect("artifacts written");

    let bytes = fs::read(io::csv_path(&out_dir, "EmployeeMaster", LABEL)).expect("CSV read");
    assert_eq!(&bytes[..3], b"\xEF\xBB\xBF");

    let mut reader = csv::Reader::from_reader(&bytes[3..]);
    let headers: Vec<String> = reader
        .headers()
        .expect("headers parsed")
        .iter()
        .map(str::to_string)
        .collect();
    assert_eq!(headers, result.columns);

    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|record| {
            record
                .expect("record parsed")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect();
    assert_eq!(rows, result.rows);
}

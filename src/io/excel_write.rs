use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::debug;

use crate::error::Result;
use crate::model::QueryResult;

/// Fixed padding added to the longest cell when sizing a column.
const WIDTH_PADDING: usize = 10;

/// Adds or replaces the sheet named `sheet_name` in the workbook at `path`.
///
/// When the file already exists, every other sheet is read back as text and
/// carried over unchanged, so the workbook gains sheets incrementally across
/// tables and re-running the same table replaces only its own sheet. The new
/// sheet holds the header row followed by the data rows in query order, with
/// columns sized to their content.
pub fn write_sheet(path: &Path, sheet_name: &str, result: &QueryResult) -> Result<()> {
    let preserved = if path.exists() {
        read_other_sheets(path, sheet_name)?
    } else {
        Vec::new()
    };
    debug!(
        sheet = sheet_name,
        preserved = preserved.len(),
        "rewriting workbook"
    );

    let mut workbook = Workbook::new();
    for (name, grid) in &preserved {
        write_grid(workbook.add_worksheet(), name, grid)?;
    }

    let mut grid = Vec::with_capacity(result.rows.len() + 1);
    grid.push(result.columns.clone());
    grid.extend(result.rows.iter().cloned());
    write_grid(workbook.add_worksheet(), sheet_name, &grid)?;

    workbook.save(path)?;
    Ok(())
}

fn write_grid(worksheet: &mut Worksheet, name: &str, grid: &[Vec<String>]) -> Result<()> {
    worksheet.set_name(name)?;
    for (row_idx, row) in grid.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            worksheet.write_string(row_idx as u32, col_idx as u16, cell)?;
        }
    }
    for (col_idx, width) in column_widths(grid).into_iter().enumerate() {
        worksheet.set_column_width(col_idx as u16, width)?;
    }
    Ok(())
}

/// Width per column: the character length of the longest cell in that
/// column, header row included, plus the fixed padding.
pub fn column_widths(grid: &[Vec<String>]) -> Vec<f64> {
    let columns = grid.iter().map(|row| row.len()).max().unwrap_or(0);
    (0..columns)
        .map(|col| {
            let longest = grid
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0);
            (longest + WIDTH_PADDING) as f64
        })
        .collect()
}

/// Reads every sheet except `skip` from an existing workbook, cells
/// rendered as text.
fn read_other_sheets(path: &Path, skip: &str) -> Result<Vec<(String, Vec<Vec<String>>)>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let names: Vec<String> = workbook.sheet_names().to_vec();

    let mut sheets = Vec::new();
    for name in names {
        if name == skip {
            continue;
        }
        let Some(range) = workbook.worksheet_range(&name) else {
            continue;
        };
        let rows = range?
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        sheets.push((name, rows));
    }
    Ok(sheets)
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(value) => value.clone(),
        DataType::Float(value) => value.to_string(),
        DataType::Int(value) => value.to_string(),
        DataType::Bool(value) => value.to_string(),
        DataType::Empty => String::new(),
        other => other.to_string(),
    }
}

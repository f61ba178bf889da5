pub mod csv_write;
pub mod excel_write;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::model::QueryResult;

/// Workbook shared by every table exported for one month.
pub fn workbook_path(out_dir: &Path, label: &str) -> PathBuf {
    out_dir.join(format!("output_data_{label}.xlsx"))
}

/// Per-table delimited text file for one month.
pub fn csv_path(out_dir: &Path, table: &str, label: &str) -> PathBuf {
    out_dir.join(format!("{table}_output_data_{label}.csv"))
}

/// Writes both artifacts for one table: a sheet in the shared workbook and
/// a standalone CSV. The two writes are independent; both are attempted,
/// and the first failure is reported only after both have run.
pub fn write_result(out_dir: &Path, result: &QueryResult, table: &str, label: &str) -> Result<()> {
    fs::create_dir_all(out_dir)?;

    let excel = excel_write::write_sheet(&workbook_path(out_dir, label), table, result);
    match &excel {
        Ok(()) => info!(table, "table data saved to Excel"),
        Err(error) => warn!(table, %error, "Excel write failed"),
    }

    let csv = csv_write::write_rows(&csv_path(out_dir, table, label), result);
    match &csv {
        Ok(()) => info!(table, "table data saved to CSV"),
        Err(error) => warn!(table, %error, "CSV write failed"),
    }

    excel.and(csv)
}

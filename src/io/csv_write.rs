use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::model::QueryResult;

/// Byte-order mark written ahead of the body so spreadsheet applications
/// open the file as UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes the result as a comma-delimited file: header row, then data rows
/// in query order, values as their default string rendering.
pub fn write_rows(path: &Path, result: &QueryResult) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&result.columns)?;
    for row in &result.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

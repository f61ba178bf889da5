use std::path::Path;

use mysql::prelude::Queryable;
use mysql::{Conn, Value};
use tracing::{info, instrument, warn};

use crate::error::{ExportError, Result};
use crate::io;
use crate::model::{ExportSummary, QueryResult, TableOutcome};
use crate::month::DateRange;
use crate::registry::TableSpec;

/// Pulls every row of `spec.table` whose date column falls inside `range`,
/// bounds inclusive. The range bounds travel as bound parameters, never as
/// query text; the table and column names come from the static registry.
#[instrument(level = "debug", skip(conn))]
pub fn fetch_table(conn: &mut Conn, spec: &TableSpec, range: &DateRange) -> Result<QueryResult> {
    let query = format!(
        "SELECT * FROM `{}` WHERE `{}` >= ? AND `{}` <= ?",
        spec.table, spec.date_column, spec.date_column
    );

    let fetched: Vec<mysql::Row> = conn
        .exec(&query, (range.start.to_string(), range.end.to_string()))
        .map_err(|source| ExportError::QueryFailed {
            table: spec.table.to_string(),
            source,
        })?;

    let columns = fetched
        .first()
        .map(|row| {
            row.columns_ref()
                .iter()
                .map(|column| column.name_str().into_owned())
                .collect()
        })
        .unwrap_or_default();
    let rows = fetched
        .into_iter()
        .map(|row| row.unwrap().into_iter().map(value_to_text).collect())
        .collect();

    Ok(QueryResult { columns, rows })
}

/// Exports each registry table in order over the single connection.
///
/// A failing table is recorded in the summary and the remaining tables
/// still run; an empty table is skipped with a notice and produces no
/// artifacts.
#[instrument(level = "info", skip(conn, tables), fields(month = %label))]
pub fn export_all(
    conn: &mut Conn,
    tables: &[TableSpec],
    range: &DateRange,
    label: &str,
    out_dir: &Path,
) -> ExportSummary {
    let mut summary = ExportSummary::default();
    for spec in tables {
        let outcome = export_table(conn, spec, range, label, out_dir);
        if let TableOutcome::Failed(error) = &outcome {
            warn!(table = spec.table, %error, "table export failed, continuing with remaining tables");
        }
        summary.record(spec.table, outcome);
    }
    summary
}

fn export_table(
    conn: &mut Conn,
    spec: &TableSpec,
    range: &DateRange,
    label: &str,
    out_dir: &Path,
) -> TableOutcome {
    let result = match fetch_table(conn, spec, range) {
        Ok(result) => result,
        Err(error) => return TableOutcome::Failed(error),
    };

    if result.is_empty() {
        info!(
            table = spec.table,
            month = %label,
            "no rows in the selected month, nothing exported"
        );
        return TableOutcome::Empty;
    }

    let rows = result.rows.len();
    info!(table = spec.table, rows, "rows fetched");
    match io::write_result(out_dir, &result, spec.table, label) {
        Ok(()) => TableOutcome::Written { rows },
        Err(error) => TableOutcome::Failed(error),
    }
}

/// Default string rendering for a MySQL value: NULL becomes the empty
/// string, dates with no time-of-day render as `YYYY-MM-DD`.
pub fn value_to_text(value: Value) -> String {
    match value {
        Value::NULL => String::new(),
        Value::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Value::Int(number) => number.to_string(),
        Value::UInt(number) => number.to_string(),
        Value::Float(number) => number.to_string(),
        Value::Double(number) => number.to_string(),
        Value::Date(year, month, day, 0, 0, 0, 0) => format!("{year:04}-{month:02}-{day:02}"),
        Value::Date(year, month, day, hour, minute, second, 0) => {
            format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")
        }
        Value::Date(year, month, day, hour, minute, second, micros) => format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}"
        ),
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = u32::from(hours) + days * 24;
            if micros == 0 {
                format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
            } else {
                format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros:06}")
            }
        }
    }
}

use crate::error::ExportError;

/// One tabular result set: ordered column names and ordered rows of display
/// strings, bound to a single table and month window. Created per table per
/// run and consumed immediately by the writer.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// What happened to one table during a run.
#[derive(Debug)]
pub enum TableOutcome {
    /// Rows were found and both artifacts were written.
    Written { rows: usize },
    /// No rows in the window; nothing was written.
    Empty,
    /// The query or a write failed; later tables still ran.
    Failed(ExportError),
}

/// Per-table outcomes for one run, in registry order.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub outcomes: Vec<(String, TableOutcome)>,
}

impl ExportSummary {
    pub fn record(&mut self, table: &str, outcome: TableOutcome) {
        self.outcomes.push((table.to_string(), outcome));
    }

    /// Number of tables that failed to export.
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, TableOutcome::Failed(_)))
            .count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Operator-facing run summary, one line per table in registry order.
    pub fn write_report<W: std::io::Write>(&self, mut out: W) -> std::io::Result<()> {
        for (table, outcome) in &self.outcomes {
            match outcome {
                TableOutcome::Written { rows } => {
                    writeln!(out, "{table}: exported {rows} rows")?;
                }
                TableOutcome::Empty => {
                    writeln!(out, "{table}: no rows for the selected month")?;
                }
                TableOutcome::Failed(error) => {
                    writeln!(out, "{table}: failed: {error}")?;
                }
            }
        }
        Ok(())
    }
}

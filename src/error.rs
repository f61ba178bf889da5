use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Error type covering the different failure cases that can occur while
/// resolving the month, tunnelling to the database, querying, or writing the
/// output artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the configuration file is missing or malformed.
    #[error("configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Raised when the month input does not match the `YYYY/MM` pattern or
    /// names a month outside the calendar.
    #[error("invalid month '{0}': expected YYYY/MM")]
    InvalidDateFormat(String),

    /// Raised when the SSH tunnel or the database connection cannot be
    /// established. The run aborts before any table is queried.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Raised when the month-window query against one table fails.
    #[error("query against table `{table}` failed")]
    QueryFailed {
        table: String,
        #[source]
        source: mysql::Error,
    },

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up while reading an existing workbook back for the
    /// append-or-replace pass.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up from the delimited-text writer.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ExportError {
    /// Process exit code for this error: 2 for bad month input, 3 for
    /// connection failures, 4 for query or export-write failures, 1 for
    /// everything else. Per-table failures are normally folded into the run
    /// summary, where the process exits 4 as well, so the mapping stays
    /// consistent whichever path a failure takes.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExportError::InvalidDateFormat(_) => 2,
            ExportError::ConnectionFailed(_) => 3,
            ExportError::QueryFailed { .. }
            | ExportError::ExcelWrite(_)
            | ExportError::ExcelRead(_)
            | ExportError::Csv(_) => 4,
            _ => 1,
        }
    }
}

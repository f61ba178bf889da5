//! Core library for the dbpull command line application.
//!
//! The pipeline resolves a `YYYY/MM` selection into an inclusive calendar
//! range, connects to MySQL through an SSH tunnel, and writes each registry
//! table's rows for that month to a shared Excel workbook plus per-table CSV
//! files. Month arithmetic lives in [`month`], the tunnel and scoped
//! connection handling in [`tunnel`], per-run orchestration in [`export`],
//! and the output adapters under [`io`].

pub mod config;
pub mod error;
pub mod export;
pub mod input;
pub mod io;
pub mod model;
pub mod month;
pub mod registry;
pub mod tunnel;

pub use error::{ExportError, Result};

use std::io::{BufRead, Write};

use crate::error::{ExportError, Result};

/// Prompts for a month and reads one line. The interactive form reduces to
/// this single capability: produce a month string or signal no-input.
/// Empty or whitespace-only input is [`ExportError::InvalidDateFormat`].
pub fn read_month<R: BufRead, W: Write>(reader: &mut R, prompt_to: &mut W) -> Result<String> {
    write!(prompt_to, "Month to export (YYYY/MM): ")?;
    prompt_to.flush()?;

    let mut line = String::new();
    reader.read_line(&mut line)?;
    let month = line.trim();
    if month.is_empty() {
        return Err(ExportError::InvalidDateFormat(String::new()));
    }
    Ok(month.to_string())
}

use chrono::{Datelike, Days, NaiveDate};

use crate::error::{ExportError, Result};

/// A calendar year and month pair parsed from the `YYYY/MM` input pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSelection {
    pub year: i32,
    pub month: u32,
}

/// Inclusive first-to-last-day window for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthSelection {
    /// Parses a month strictly against the `YYYY/MM` pattern: four digits,
    /// a slash, two digits, month between 01 and 12. Anything else is
    /// [`ExportError::InvalidDateFormat`].
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || ExportError::InvalidDateFormat(text.to_string());

        let (year_text, month_text) = text.split_once('/').ok_or_else(invalid)?;
        if year_text.len() != 4 || month_text.len() != 2 {
            return Err(invalid());
        }
        if !year_text.chars().all(|c| c.is_ascii_digit())
            || !month_text.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let year: i32 = year_text.parse().map_err(|_| invalid())?;
        let month: u32 = month_text.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(Self { year, month })
    }

    /// Resolves the selection into the inclusive first-to-last-day range.
    ///
    /// The end is derived by rolling the start forward a fixed 31 days,
    /// truncating to that result's first of month, and stepping back one
    /// day. This never assumes a month length, so February, leap years, and
    /// the December-to-January rollover all come out right.
    pub fn range(&self) -> Result<DateRange> {
        let start = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .ok_or_else(|| ExportError::InvalidDateFormat(format!("{}/{}", self.year, self.month)))?;

        let rolled = start + Days::new(31);
        let next_month_start = rolled.with_day(1).unwrap_or(rolled);
        let end = next_month_start - Days::new(1);

        Ok(DateRange { start, end })
    }

    /// Human-readable month stamp used in output filenames and notices,
    /// e.g. `2024年04月`.
    pub fn label(&self) -> String {
        format!("{:04}年{:02}月", self.year, self.month)
    }
}

//! Calendar-date helpers shared by the query filters.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

/// Wire format for calendar dates (`YYYY-MM-DD`).
pub const CALENDAR_DATE_FORMAT: &str = "%Y-%m-%d";

/// Why a raw value is not a calendar date.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CalendarDateError {
    /// Not a four-digit year followed by dash-separated month and day digits.
    #[error("expected YYYY-MM-DD")]
    Shape,
    #[error("invalid calendar date: {0}")]
    Chrono(#[from] chrono::ParseError),
}

/// Parse a `YYYY-MM-DD` calendar date.
///
/// The year is exactly four digits. Signs and whitespace are rejected before
/// chrono sees the value; its numeric parsing would accept them.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, CalendarDateError> {
    let bytes = raw.as_bytes();
    let year_ok =
        bytes.len() > 5 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-';
    if !year_ok || !bytes.iter().all(|b| b.is_ascii_digit() || *b == b'-') {
        return Err(CalendarDateError::Shape);
    }
    Ok(NaiveDate::parse_from_str(raw, CALENDAR_DATE_FORMAT)?)
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

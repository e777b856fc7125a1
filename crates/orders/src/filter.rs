//! Date-window filter for order listings.
//!
//! The window is a containment filter: an order matches only when its whole
//! `[start_date, embargo_date]` interval lies inside the requested window.
//! Orders that merely overlap the window are excluded.

use chrono::NaiveDate;
use thiserror::Error;

use stockroom_core::{ValueObject, parse_calendar_date};

use crate::order::Order;

/// Why the window query parameters were rejected.
///
/// `Display` is the exact client-facing message.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DateWindowError {
    #[error("Both \"start_date\" and \"embargo_date\" query parameters are required.")]
    Missing,
    #[error("Invalid date format. Use \"YYYY-MM-DD\".")]
    InvalidFormat,
    #[error("\"start_date\" must be before or equal to \"embargo_date\".")]
    Reversed,
}

/// Inclusive `[start_date, embargo_date]` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start_date: NaiveDate,
    embargo_date: NaiveDate,
}

impl ValueObject for DateWindow {}

impl DateWindow {
    pub fn new(start_date: NaiveDate, embargo_date: NaiveDate) -> Result<Self, DateWindowError> {
        if start_date > embargo_date {
            return Err(DateWindowError::Reversed);
        }
        Ok(Self {
            start_date,
            embargo_date,
        })
    }

    /// Parse raw query values: presence first, then format, then ordering.
    pub fn from_query(
        start_date: Option<&str>,
        embargo_date: Option<&str>,
    ) -> Result<Self, DateWindowError> {
        let (Some(start), Some(embargo)) = (
            start_date.filter(|v| !v.is_empty()),
            embargo_date.filter(|v| !v.is_empty()),
        ) else {
            return Err(DateWindowError::Missing);
        };

        let start = parse_calendar_date(start).map_err(|_| DateWindowError::InvalidFormat)?;
        let embargo = parse_calendar_date(embargo).map_err(|_| DateWindowError::InvalidFormat)?;
        Self::new(start, embargo)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn embargo_date(&self) -> NaiveDate {
        self.embargo_date
    }

    pub fn contains(&self, order: &Order) -> bool {
        order.start_date >= self.start_date && order.embargo_date <= self.embargo_date
    }
}

//! `created_after` filter for inventory listings.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use stockroom_core::{ValueObject, parse_calendar_date, start_of_day};

use crate::item::Inventory;

/// Why a `created_after` query parameter was rejected.
///
/// `Display` is the exact client-facing message.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CreatedAfterError {
    #[error("The \"created_after\" query parameter is required.")]
    Missing,
    #[error("Invalid date format for \"created_after\". Use YYYY-MM-DD.")]
    InvalidFormat,
}

/// Keeps inventory created strictly after midnight (UTC) of a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedAfter {
    date: NaiveDate,
}

impl ValueObject for CreatedAfter {}

impl CreatedAfter {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Parse the raw query value. An empty value counts as missing.
    pub fn from_query(raw: Option<&str>) -> Result<Self, CreatedAfterError> {
        let raw = raw
            .filter(|v| !v.is_empty())
            .ok_or(CreatedAfterError::Missing)?;
        let date = parse_calendar_date(raw).map_err(|_| CreatedAfterError::InvalidFormat)?;
        Ok(Self::new(date))
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Exclusive lower bound on `created_at`.
    pub fn threshold(&self) -> DateTime<Utc> {
        start_of_day(self.date)
    }

    pub fn matches(&self, inventory: &Inventory) -> bool {
        inventory.created_at > self.threshold()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use stockroom_core::{InventoryId, InventoryLanguageId, InventoryTypeId};

    use crate::item::InventoryDraft;

    fn inventory_created_at(created_at: DateTime<Utc>) -> Inventory {
        Inventory::from_draft(
            InventoryId::new(1),
            InventoryDraft::new("Item", InventoryTypeId::new(1), InventoryLanguageId::new(1)),
            created_at,
        )
    }

    #[test]
    fn missing_or_empty_parameter() {
        assert_eq!(CreatedAfter::from_query(None), Err(CreatedAfterError::Missing));
        assert_eq!(CreatedAfter::from_query(Some("")), Err(CreatedAfterError::Missing));
        assert_eq!(
            CreatedAfterError::Missing.to_string(),
            "The \"created_after\" query parameter is required."
        );
    }

    #[test]
    fn malformed_parameter() {
        assert_eq!(
            CreatedAfter::from_query(Some("invalid-date")),
            Err(CreatedAfterError::InvalidFormat)
        );
        assert_eq!(
            CreatedAfterError::InvalidFormat.to_string(),
            "Invalid date format for \"created_after\". Use YYYY-MM-DD."
        );
    }

    #[test]
    fn boundary_is_exclusive_midnight() {
        let filter = CreatedAfter::from_query(Some("2024-03-10")).unwrap();
        let midnight = filter.threshold();

        assert!(!filter.matches(&inventory_created_at(midnight)));
        assert!(filter.matches(&inventory_created_at(midnight + Duration::seconds(1))));
        assert!(!filter.matches(&inventory_created_at(midnight - Duration::seconds(1))));
    }

    #[test]
    fn mirrors_the_three_item_scenario() {
        let now = Utc::now();
        let items = [
            inventory_created_at(now - Duration::days(5)),
            inventory_created_at(now - Duration::days(3)),
            inventory_created_at(now),
        ];
        let filter = CreatedAfter::new((now - Duration::days(4)).date_naive());
        let kept = items.iter().filter(|i| filter.matches(i)).count();
        assert_eq!(kept, 2);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The filter keeps exactly the records created after midnight of the date.
            #[test]
            fn keeps_exactly_records_after_midnight(
                day_offset in -400i64..400,
                seconds in -200_000i64..200_000,
            ) {
                let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
                let date = epoch + Duration::days(day_offset);
                let filter = CreatedAfter::new(date);
                let created_at = start_of_day(date) + Duration::seconds(seconds);
                prop_assert_eq!(filter.matches(&inventory_created_at(created_at)), seconds > 0);
            }
        }
    }
}

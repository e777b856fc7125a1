//! Limit/offset pagination.
//!
//! Query parameters are parsed leniently: a bad `limit` falls back to the
//! default page size and a bad `offset` falls back to zero, so a listing
//! never fails because of its pagination parameters.

use serde::{Deserialize, Serialize};

/// A window into an ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOffset {
    /// Maximum number of records in the window (always >= 1).
    pub limit: usize,
    /// Number of records skipped before the window (0-based).
    pub offset: usize,
}

impl LimitOffset {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: limit.max(1),
            offset,
        }
    }

    /// Build a window from raw `limit` / `offset` query values.
    pub fn from_query(limit: Option<&str>, offset: Option<&str>, default_limit: usize) -> Self {
        let limit = limit
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|v| *v > 0)
            .map(|v| v as usize)
            .unwrap_or(default_limit);
        let offset = offset
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|v| *v >= 0)
            .map(|v| v as usize)
            .unwrap_or(0);
        Self::new(limit, offset)
    }

    /// Offset of the following window, if any records remain after this one.
    pub fn next_offset(&self, count: usize) -> Option<usize> {
        let next = self.offset.saturating_add(self.limit);
        (next < count).then_some(next)
    }

    /// Offset of the preceding window, or `None` on the first window.
    ///
    /// `Some(0)` means the previous window starts at the beginning; links for
    /// it drop the `offset` parameter altogether.
    pub fn previous_offset(&self) -> Option<usize> {
        if self.offset == 0 {
            return None;
        }
        Some(self.offset.saturating_sub(self.limit))
    }

    /// Slice an already-ordered collection down to this window.
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset)
            .take(self.limit)
            .cloned()
            .collect()
    }
}

/// One window of results plus the total size of the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub count: usize,
    pub items: Vec<T>,
    pub window: LimitOffset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_params_missing() {
        let w = LimitOffset::from_query(None, None, 3);
        assert_eq!(w, LimitOffset { limit: 3, offset: 0 });
    }

    #[test]
    fn explicit_params_override_defaults() {
        let w = LimitOffset::from_query(Some("5"), Some("5"), 3);
        assert_eq!(w, LimitOffset { limit: 5, offset: 5 });
    }

    #[test]
    fn bad_params_fall_back() {
        assert_eq!(LimitOffset::from_query(Some("0"), None, 3).limit, 3);
        assert_eq!(LimitOffset::from_query(Some("-2"), None, 3).limit, 3);
        assert_eq!(LimitOffset::from_query(Some("ten"), None, 3).limit, 3);
        assert_eq!(LimitOffset::from_query(None, Some("-1"), 3).offset, 0);
        assert_eq!(LimitOffset::from_query(None, Some("x"), 3).offset, 0);
    }

    #[test]
    fn neighbours_of_middle_window() {
        let w = LimitOffset::new(3, 3);
        assert_eq!(w.next_offset(10), Some(6));
        assert_eq!(w.previous_offset(), Some(0));
        assert_eq!(LimitOffset::new(3, 9).next_offset(10), None);
        assert_eq!(LimitOffset::new(3, 0).previous_offset(), None);
        assert_eq!(LimitOffset::new(3, 5).previous_offset(), Some(2));
    }

    #[test]
    fn apply_takes_the_window() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(LimitOffset::new(5, 5).apply(&items), vec![5, 6, 7, 8, 9]);
        assert_eq!(LimitOffset::new(3, 0).apply(&items), vec![0, 1, 2]);
        assert!(LimitOffset::new(3, 20).apply(&items).is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Walking `next_offset` from zero visits every record exactly once.
            #[test]
            fn windows_partition_the_collection(count in 0usize..200, limit in 1usize..20) {
                let items: Vec<usize> = (0..count).collect();
                let mut seen = Vec::new();
                let mut window = LimitOffset::new(limit, 0);
                loop {
                    seen.extend(window.apply(&items));
                    match window.next_offset(count) {
                        Some(next) => window = LimitOffset::new(limit, next),
                        None => break,
                    }
                }
                prop_assert_eq!(seen, items);
            }

            #[test]
            fn window_never_exceeds_limit(
                count in 0usize..100,
                limit in 1usize..20,
                offset in 0usize..120,
            ) {
                let items: Vec<usize> = (0..count).collect();
                let page = LimitOffset::new(limit, offset).apply(&items);
                prop_assert!(page.len() <= limit);
                prop_assert_eq!(page.len(), count.saturating_sub(offset).min(limit));
            }
        }
    }
}

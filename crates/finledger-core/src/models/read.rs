use std::sync::Arc;

use time::Date;

use super::Entry;

/// Optional predicates for listing entries. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    pub category: Option<Arc<str>>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl EntryFilter {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        if let Some(category) = &self.category {
            if entry.category != *category {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if entry.entry_date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if entry.entry_date > end {
                return false;
            }
        }
        true
    }
}

use std::sync::Arc;

use rust_decimal::Decimal;
use time::Date;

use super::EntryType;

/// Full contents of an entry, used for both insert and full-row update.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryCommand {
    pub entry_date: Date,
    pub description: Arc<str>,
    pub amount: Decimal,
    pub category: Arc<str>,
    pub entry_type: EntryType,
}

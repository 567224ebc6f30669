use std::{fmt::Display, sync::Arc};

use rust_decimal::Decimal;
use thiserror::Error;
use time::{macros::format_description, Date};

pub mod write;
pub mod read;

pub type EntryId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryType {
    Asset,
    Cash,
    BankTransaction,
    Other(Arc<str>),
}

impl EntryType {
    /// The types offered by the entry form, in display order.
    pub const KNOWN: [EntryType; 3] = [EntryType::Asset, EntryType::Cash, EntryType::BankTransaction];

    pub fn as_str(&self) -> &str {
        match self {
            EntryType::Asset => "Asset",
            EntryType::Cash => "Cash",
            EntryType::BankTransaction => "Bank Transaction",
            EntryType::Other(label) => label,
        }
    }
}

impl From<&str> for EntryType {
    fn from(s: &str) -> Self {
        match s {
            "Asset" => EntryType::Asset,
            "Cash" => EntryType::Cash,
            "Bank Transaction" => EntryType::BankTransaction,
            other => EntryType::Other(Arc::from(other)),
        }
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub entry_date: Date,
    pub description: Arc<str>,
    pub amount: Decimal,
    /// Free text. Not checked against the categories table.
    pub category: Arc<str>,
    pub entry_type: EntryType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: Arc<str>,
}

/// Stored dates compare as text, so only four-digit years are accepted.
pub const MIN_YEAR: i32 = 0;
pub const MAX_YEAR: i32 = 9999;

#[derive(Debug, Error)]
pub enum DateError {
    #[error(transparent)]
    Parse(#[from] time::error::Parse),
    #[error("year {0} is outside 0000..=9999")]
    YearOutOfRange(i32),
}

pub fn check_date(d: Date) -> Result<Date, DateError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&d.year()) {
        Ok(d)
    } else {
        Err(DateError::YearOutOfRange(d.year()))
    }
}

/// Parses a `YYYY-MM-DD` date, the format used by HTML date inputs and by the store.
pub fn parse_date(s: &str) -> Result<Date, DateError> {
    let d = Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))?;
    check_date(d)
}

/// Inverse of [`parse_date`] for any date that passed [`check_date`].
pub fn format_date(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), d.month() as u8, d.day())
}

use std::{str::FromStr, sync::Arc};

use finledger_core::{format_date, parse_date, Entry, EntryCommand, EntryFilter, EntryType};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Largest accepted magnitude for a single amount. Summaries over any
/// realistic number of entries stay far below the decimal range.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Raw entry form fields as submitted, kept as text so a rejected form can be shown again unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub entry_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub entry_type: String,
}

impl EntryForm {
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            entry_date: format_date(entry.entry_date),
            description: entry.description.to_string(),
            amount: entry.amount.to_string(),
            category: entry.category.to_string(),
            entry_type: entry.entry_type.to_string(),
        }
    }

    /// Collects every problem with the submission rather than stopping at the first.
    pub fn validate(&self) -> Result<EntryCommand, Vec<String>> {
        let mut errors = Vec::new();

        let entry_date = match parse_date(&self.entry_date) {
            Ok(d) => Some(d),
            Err(_) => {
                errors.push(format!("Date '{}' must be in YYYY-MM-DD format.", self.entry_date.trim()));
                None
            }
        };

        let amount = match Decimal::from_str(self.amount.trim()) {
            Ok(a) if a.abs() > Decimal::from(MAX_AMOUNT) => {
                errors.push(format!("Amount '{}' must be between -{} and {}.", self.amount.trim(), MAX_AMOUNT, MAX_AMOUNT));
                None
            }
            Ok(a) => Some(a),
            Err(_) => {
                errors.push(format!("Amount '{}' is not a number.", self.amount.trim()));
                None
            }
        };

        let description = self.description.trim();
        if description.is_empty() {
            errors.push("Description is required.".to_string());
        }
        let category = self.category.trim();
        if category.is_empty() {
            errors.push("Category is required.".to_string());
        }
        let entry_type = self.entry_type.trim();
        if entry_type.is_empty() {
            errors.push("Type is required.".to_string());
        }

        match (entry_date, amount) {
            (Some(entry_date), Some(amount)) if errors.is_empty() => Ok(EntryCommand {
                entry_date,
                description: Arc::from(description),
                amount,
                category: Arc::from(category),
                entry_type: EntryType::from(entry_type),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
}

/// Query string of the index page. Empty parameters count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl FilterQuery {
    pub fn to_filter(&self) -> Result<EntryFilter, String> {
        let date = |value: &Option<String>, name: &str| match non_empty(value) {
            Some(v) => parse_date(v)
                .map(Some)
                .map_err(|_| format!("{} '{}' must be in YYYY-MM-DD format", name, v)),
            None => Ok(None),
        };

        Ok(EntryFilter {
            category: non_empty(&self.category).map(Arc::from),
            start_date: date(&self.start_date, "start_date")?,
            end_date: date(&self.end_date, "end_date")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use time::macros::date;

    fn form(date: &str, amount: &str) -> EntryForm {
        EntryForm {
            entry_date: date.to_string(),
            description: " Weekly shop ".to_string(),
            amount: amount.to_string(),
            category: "Food".to_string(),
            entry_type: "Bank Transaction".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let command = form("2024-05-01", " -42.10 ").validate().unwrap();
        assert_eq!(command.entry_date, date!(2024 - 05 - 01));
        assert_eq!(command.amount, dec!(-42.10));
        assert_eq!(command.description.as_ref(), "Weekly shop");
        assert_eq!(command.entry_type, EntryType::BankTransaction);
    }

    #[test]
    fn test_invalid_form_reports_every_field() {
        let errors = EntryForm {
            entry_date: "May 1st".to_string(),
            amount: "lots".to_string(),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors[0].contains("YYYY-MM-DD"));
        assert!(errors[1].contains("not a number"));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let errors = form("-0001-01-01", "79228162514264337593543950335").validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("YYYY-MM-DD"));
        assert!(errors[1].contains("must be between"));

        assert!(form("2024-05-01", "1000000000000000").validate().is_ok());
        assert!(form("2024-05-01", "-1000000000000000.01").validate().is_err());

        let bad = FilterQuery {
            start_date: Some("-0001-01-01".to_string()),
            ..Default::default()
        }
        .to_filter();
        assert!(bad.unwrap_err().contains("start_date"));
    }

    #[test]
    fn test_form_from_entry_validates_back() {
        let command = form("2024-05-01", "12.5").validate().unwrap();
        let entry = Entry {
            id: 3,
            entry_date: command.entry_date,
            description: command.description.clone(),
            amount: command.amount,
            category: command.category.clone(),
            entry_type: command.entry_type.clone(),
        };
        assert_eq!(EntryForm::from_entry(&entry).validate().unwrap(), command);
    }

    #[test]
    fn test_filter_query() {
        let filter = FilterQuery {
            category: Some("".to_string()),
            start_date: Some("2024-01-01".to_string()),
            end_date: None,
        }
        .to_filter()
        .unwrap();
        assert_eq!(filter.category, None);
        assert_eq!(filter.start_date, Some(date!(2024 - 01 - 01)));
        assert_eq!(filter.end_date, None);

        let bad = FilterQuery {
            end_date: Some("2024/01/01".to_string()),
            ..Default::default()
        }
        .to_filter();
        assert!(bad.unwrap_err().contains("end_date"));
    }
}

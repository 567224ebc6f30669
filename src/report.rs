//! Aggregates computed over a set of entries.
//!
//! Nothing here is stored: every view recomputes its summary from the
//! (possibly filtered) entry list it was given.

use std::{collections::BTreeMap, fmt::Display, sync::Arc};

use finledger_core::{format_date, Entry, EntryType};
use prettytable::{row, Table};
use rust_decimal::Decimal;
use thiserror::Error;
use time::Month;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("{0} exceeds the representable decimal range")]
    Overflow(&'static str),
}

fn add(total: Decimal, amount: Decimal, what: &'static str) -> Result<Decimal, ReportError> {
    total.checked_add(amount).ok_or(ReportError::Overflow(what))
}

fn sum<I: Iterator<Item = Decimal>>(mut amounts: I, what: &'static str) -> Result<Decimal, ReportError> {
    amounts.try_fold(Decimal::ZERO, |total, amount| add(total, amount, what))
}

/// Signed sum of all amounts.
pub fn net_worth(entries: &[Entry]) -> Result<Decimal, ReportError> {
    sum(entries.iter().map(|e| e.amount), "net worth")
}

pub fn total_for_type(entries: &[Entry], entry_type: &EntryType) -> Result<Decimal, ReportError> {
    sum(
        entries
            .iter()
            .filter(|e| &e.entry_type == entry_type)
            .map(|e| e.amount),
        "type total",
    )
}

pub fn totals_by_type(entries: &[Entry]) -> Result<BTreeMap<EntryType, Decimal>, ReportError> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        let total = totals.entry(entry.entry_type.clone()).or_insert(Decimal::ZERO);
        *total = add(*total, entry.amount, "type total")?;
    }
    Ok(totals)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: Arc<str>,
    /// Always non-negative.
    pub magnitude: Decimal,
}

/// Spending per category: negative amounts only, reported as magnitudes, ordered by category.
pub fn expense_breakdown(entries: &[Entry]) -> Result<Vec<CategoryTotal>, ReportError> {
    let mut by_category: BTreeMap<Arc<str>, Decimal> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.amount.is_sign_negative() && !e.amount.is_zero()) {
        let total = by_category.entry(entry.category.clone()).or_insert(Decimal::ZERO);
        *total = add(*total, entry.amount.abs(), "category spending")?;
    }
    Ok(by_category
        .into_iter()
        .map(|(category, magnitude)| CategoryTotal { category, magnitude })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyFlow {
    pub year: i32,
    pub month: Month,
    /// Raw signed sum of the month's amounts.
    pub net: Decimal,
    pub income: Decimal,
    pub expense: Decimal,
}

impl MonthlyFlow {
    fn from_net(year: i32, month: Month, net: Decimal) -> Self {
        let (income, expense) = if net > Decimal::ZERO {
            (net, Decimal::ZERO)
        } else if net < Decimal::ZERO {
            (Decimal::ZERO, -net)
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };
        Self { year, month, net, income, expense }
    }

    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month as u8)
    }
}

/// Bank Transaction amounts summed per calendar month, oldest month first.
/// Only months that contain at least one such entry are reported.
pub fn monthly_flow(entries: &[Entry]) -> Result<Vec<MonthlyFlow>, ReportError> {
    let mut buckets: BTreeMap<(i32, u8), (Month, Decimal)> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.entry_type == EntryType::BankTransaction) {
        let date = entry.entry_date;
        let bucket = buckets
            .entry((date.year(), date.month() as u8))
            .or_insert((date.month(), Decimal::ZERO));
        bucket.1 = add(bucket.1, entry.amount, "monthly flow")?;
    }
    Ok(buckets
        .into_iter()
        .map(|((year, _), (month, net))| MonthlyFlow::from_net(year, month, net))
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub net_worth: Decimal,
    pub totals_by_type: BTreeMap<EntryType, Decimal>,
    pub expense_breakdown: Vec<CategoryTotal>,
    pub monthly_flow: Vec<MonthlyFlow>,
}

impl Summary {
    pub fn from_entries(entries: &[Entry]) -> Result<Self, ReportError> {
        Ok(Self {
            net_worth: net_worth(entries)?,
            totals_by_type: totals_by_type(entries)?,
            expense_breakdown: expense_breakdown(entries)?,
            monthly_flow: monthly_flow(entries)?,
        })
    }

    pub fn total_for(&self, entry_type: &EntryType) -> Decimal {
        self.totals_by_type.get(entry_type).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn total_assets(&self) -> Decimal {
        self.total_for(&EntryType::Asset)
    }

    pub fn total_cash(&self) -> Decimal {
        self.total_for(&EntryType::Cash)
    }
}

/// Terminal rendering of an entry listing and its summary.
pub struct LedgerReport<'a> {
    pub entries: &'a [Entry],
    pub summary: &'a Summary,
}

impl<'a> LedgerReport<'a> {
    pub fn new(entries: &'a [Entry], summary: &'a Summary) -> Self {
        Self { entries, summary }
    }
}

impl Display for LedgerReport<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entries = Table::new();
        entries.add_row(row!["Date", "Description", "Category", "Type", "Amount"]);
        entries.add_empty_row();
        for e in self.entries {
            entries.add_row(row![format_date(e.entry_date), e.description, e.category, e.entry_type, e.amount]);
        }

        let mut totals = Table::new();
        totals.add_row(row!["Net Worth", self.summary.net_worth]);
        for (entry_type, total) in &self.summary.totals_by_type {
            totals.add_row(row![entry_type, total]);
        }

        let mut expenses = Table::new();
        expenses.add_row(row!["Category", "Spent"]);
        expenses.add_empty_row();
        for item in &self.summary.expense_breakdown {
            expenses.add_row(row![item.category, item.magnitude]);
        }

        let mut flow = Table::new();
        flow.add_row(row!["Month", "Income", "Expense"]);
        flow.add_empty_row();
        for m in &self.summary.monthly_flow {
            flow.add_row(row![m.label(), m.income, m.expense]);
        }

        write!(f, "\n{}\n{}\n{}\n{}\n", entries, totals, expenses, flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use time::{macros::date, Date};

    fn entry(id: i64, date: Date, amount: Decimal, category: &str, entry_type: EntryType) -> Entry {
        Entry {
            id,
            entry_date: date,
            description: Arc::from("test"),
            amount,
            category: Arc::from(category),
            entry_type,
        }
    }

    fn example() -> Vec<Entry> {
        vec![
            entry(1, date!(2024 - 01 - 01), dec!(1000), "Savings", EntryType::Asset),
            entry(2, date!(2024 - 01 - 03), dec!(-50), "Food", EntryType::BankTransaction),
            entry(3, date!(2024 - 01 - 04), dec!(-30), "Transport", EntryType::BankTransaction),
        ]
    }

    #[test]
    fn test_worked_example() {
        let entries = example();
        let summary = Summary::from_entries(&entries).unwrap();

        assert_eq!(summary.net_worth, dec!(920));
        assert_eq!(summary.total_assets(), dec!(1000));
        assert_eq!(summary.total_cash(), Decimal::ZERO);
        assert_eq!(
            summary.expense_breakdown,
            vec![
                CategoryTotal { category: Arc::from("Food"), magnitude: dec!(50) },
                CategoryTotal { category: Arc::from("Transport"), magnitude: dec!(30) },
            ]
        );
    }

    #[test]
    fn test_empty_set() {
        let summary = Summary::from_entries(&[]).unwrap();
        assert_eq!(summary.net_worth, Decimal::ZERO);
        assert_eq!(summary.total_assets(), Decimal::ZERO);
        assert_eq!(summary.total_cash(), Decimal::ZERO);
        assert!(summary.expense_breakdown.is_empty());
        assert!(summary.monthly_flow.is_empty());
    }

    #[test]
    fn test_type_totals_match_filtered_sums() {
        let entries = vec![
            entry(1, date!(2024 - 01 - 01), dec!(10.50), "A", EntryType::Cash),
            entry(2, date!(2024 - 01 - 02), dec!(-3.25), "B", EntryType::Cash),
            entry(3, date!(2024 - 01 - 03), dec!(7), "C", EntryType::from("Loan")),
        ];
        assert_eq!(total_for_type(&entries, &EntryType::Cash), Ok(dec!(7.25)));
        assert_eq!(total_for_type(&entries, &EntryType::from("Loan")), Ok(dec!(7)));
        assert_eq!(total_for_type(&entries, &EntryType::Asset), Ok(Decimal::ZERO));

        let totals = totals_by_type(&entries).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals.values().copied().sum::<Decimal>(), net_worth(&entries).unwrap());
    }

    #[test]
    fn test_breakdown_ignores_income_and_zero() {
        let entries = vec![
            entry(1, date!(2024 - 01 - 01), dec!(200), "Food", EntryType::Cash),
            entry(2, date!(2024 - 01 - 02), dec!(0), "Gifts", EntryType::Cash),
            entry(3, date!(2024 - 01 - 03), dec!(-15), "Food", EntryType::Cash),
            entry(4, date!(2024 - 01 - 04), dec!(-5), "Food", EntryType::Asset),
        ];
        let breakdown = expense_breakdown(&entries).unwrap();
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].category.as_ref(), "Food");
        assert_eq!(breakdown[0].magnitude, dec!(20));
        assert!(breakdown.iter().all(|c| c.magnitude >= Decimal::ZERO));
    }

    #[test]
    fn test_monthly_flow_buckets() {
        let entries = vec![
            entry(1, date!(2024 - 03 - 02), dec!(-40), "Food", EntryType::BankTransaction),
            entry(2, date!(2023 - 12 - 31), dec!(500), "Salary", EntryType::BankTransaction),
            entry(3, date!(2024 - 03 - 20), dec!(15), "Refund", EntryType::BankTransaction),
            entry(4, date!(2024 - 01 - 10), dec!(-999), "Car", EntryType::Cash),
            entry(5, date!(2023 - 12 - 01), dec!(-100), "Rent", EntryType::BankTransaction),
        ];
        let flow = monthly_flow(&entries).unwrap();

        let labels: Vec<String> = flow.iter().map(|m| m.label()).collect();
        assert_eq!(labels, vec!["2023-12", "2024-03"]);

        assert_eq!(flow[0].net, dec!(400));
        assert_eq!(flow[0].income, dec!(400));
        assert_eq!(flow[0].expense, Decimal::ZERO);

        assert_eq!(flow[1].net, dec!(-25));
        assert_eq!(flow[1].income, Decimal::ZERO);
        assert_eq!(flow[1].expense, dec!(25));

        for m in &flow {
            assert!(m.income >= Decimal::ZERO && m.expense >= Decimal::ZERO);
            assert_eq!(m.income - m.expense, m.net);
        }
    }

    #[test]
    fn test_overflow_is_an_error() {
        let entries = vec![
            entry(1, date!(2024 - 01 - 01), Decimal::MAX, "Food", EntryType::BankTransaction),
            entry(2, date!(2024 - 01 - 02), Decimal::MAX, "Food", EntryType::BankTransaction),
        ];
        assert_eq!(net_worth(&entries), Err(ReportError::Overflow("net worth")));
        assert!(totals_by_type(&entries).is_err());
        assert!(monthly_flow(&entries).is_err());
        assert!(Summary::from_entries(&entries).is_err());

        let spent = vec![
            entry(1, date!(2024 - 01 - 01), Decimal::MIN, "Food", EntryType::Cash),
            entry(2, date!(2024 - 01 - 02), dec!(-1), "Food", EntryType::Cash),
        ];
        assert_eq!(expense_breakdown(&spent), Err(ReportError::Overflow("category spending")));
    }

    #[test]
    fn test_report_renders_rows() {
        let entries = example();
        let summary = Summary::from_entries(&entries).unwrap();
        let text = LedgerReport::new(&entries, &summary).to_string();
        assert!(text.contains("Net Worth"));
        assert!(text.contains("920"));
        assert!(text.contains("Transport"));
        assert!(text.contains("2024-01"));
    }
}

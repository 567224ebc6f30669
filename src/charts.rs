//! Chart descriptions handed to the Plotly bundle in the browser.

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde_json::{json, Value};

use crate::report::{CategoryTotal, MonthlyFlow};

pub const EXPENSE_CHART_ID: &str = "expense-chart";
pub const FLOW_CHART_ID: &str = "flow-chart";

pub const NO_EXPENSE_DATA: &str = "No expense data to display.";
pub const NO_FLOW_DATA: &str = "No bank transaction data to display.";

#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Plot { id: &'static str, figure: Value },
    NoData { id: &'static str, message: &'static str },
}

impl Chart {
    pub fn id(&self) -> &'static str {
        match self {
            Chart::Plot { id, .. } | Chart::NoData { id, .. } => *id,
        }
    }

    pub fn is_plot(&self) -> bool {
        matches!(self, Chart::Plot { .. })
    }

    /// Figure JSON safe to embed inside a `<script>` element.
    pub fn script_json(&self) -> Option<String> {
        match self {
            Chart::Plot { figure, .. } => Some(figure.to_string().replace("</", "<\\/")),
            Chart::NoData { .. } => None,
        }
    }
}

fn number(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

pub fn expense_pie(breakdown: &[CategoryTotal]) -> Chart {
    if breakdown.is_empty() {
        return Chart::NoData { id: EXPENSE_CHART_ID, message: NO_EXPENSE_DATA };
    }

    let labels: Vec<&str> = breakdown.iter().map(|c| c.category.as_ref()).collect();
    let values: Vec<f64> = breakdown.iter().map(|c| number(c.magnitude)).collect();

    Chart::Plot {
        id: EXPENSE_CHART_ID,
        figure: json!({
            "data": [{
                "type": "pie",
                "labels": labels,
                "values": values,
                "hole": 0.3,
            }],
            "layout": {
                "title": { "text": "Expenses by Category" },
            },
        }),
    }
}

pub fn monthly_flow_bar(flow: &[MonthlyFlow]) -> Chart {
    if flow.is_empty() {
        return Chart::NoData { id: FLOW_CHART_ID, message: NO_FLOW_DATA };
    }

    let months: Vec<String> = flow.iter().map(|m| m.label()).collect();
    let income: Vec<f64> = flow.iter().map(|m| number(m.income)).collect();
    let expense: Vec<f64> = flow.iter().map(|m| number(m.expense)).collect();

    Chart::Plot {
        id: FLOW_CHART_ID,
        figure: json!({
            "data": [
                { "type": "bar", "name": "Income", "x": months, "y": income, "marker": { "color": "#2ca02c" } },
                { "type": "bar", "name": "Expense", "x": months, "y": expense, "marker": { "color": "#d62728" } },
            ],
            "layout": {
                "title": { "text": "Monthly Cash Flow" },
                "barmode": "group",
                "xaxis": { "type": "category" },
            },
        }),
    }
}

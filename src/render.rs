//! Server-side HTML pages.
//!
//! Every piece of user-supplied text goes through [`escape`] before it lands
//! in markup. Charts are emitted as a placeholder `<div>` plus a script that
//! hands the figure JSON to Plotly.

use std::borrow::Cow;

use finledger_core::{format_date, Category, Entry, EntryFilter, EntryType};
use rust_decimal::Decimal;

use crate::{charts::Chart, forms::EntryForm, report::Summary};

pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn layout(title: &str, body: &str, plotly_url: Option<&str>) -> String {
    let script = match plotly_url {
        Some(url) => format!("<script src=\"{}\" charset=\"utf-8\"></script>\n", escape(url)),
        None => String::new(),
    };
    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\">
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">
<title>{title} - Finance Ledger</title>
{script}</head>
<body>
<nav><a href=\"/\">Ledger</a> | <a href=\"/add\">Add Entry</a> | <a href=\"/categories\">Categories</a></nav>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
",
        title = escape(title),
        script = script,
        body = body,
    )
}

fn error_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", escape(e)))
        .collect();
    format!("<ul class=\"errors\">{}</ul>\n", items)
}

fn chart_block(chart: &Chart) -> String {
    match chart {
        Chart::Plot { id, .. } => {
            let figure = chart.script_json().unwrap_or_default();
            format!(
                "<div id=\"{id}\" class=\"chart\"></div>
<script>(function () {{ var fig = {figure}; Plotly.newPlot(\"{id}\", fig.data, fig.layout, {{responsive: true}}); }})();</script>
",
                id = id,
                figure = figure,
            )
        }
        Chart::NoData { id, message } => {
            format!("<div id=\"{}\" class=\"chart no-data\"><p>{}</p></div>\n", id, escape(message))
        }
    }
}

pub struct IndexView<'a> {
    pub entries: &'a [Entry],
    pub summary: &'a Summary,
    pub categories: &'a [Category],
    pub filter: &'a EntryFilter,
    pub charts: &'a [Chart],
    pub plotly_url: &'a str,
}

fn filter_form(categories: &[Category], filter: &EntryFilter) -> String {
    let selected = filter.category.as_deref();
    let mut options = String::from("<option value=\"\">All categories</option>");
    for c in categories {
        let name = escape(&c.name);
        let sel = if Some(c.name.as_ref()) == selected { " selected" } else { "" };
        options.push_str(&format!("<option value=\"{name}\"{sel}>{name}</option>"));
    }
    // A filter on a category missing from the table still shows as selected.
    if let Some(current) = selected {
        if !categories.iter().any(|c| c.name.as_ref() == current) {
            let name = escape(current);
            options.push_str(&format!("<option value=\"{name}\" selected>{name}</option>"));
        }
    }

    let date_value = |d: Option<time::Date>| d.map(format_date).unwrap_or_default();
    format!(
        "<form method=\"get\" action=\"/\" class=\"filters\">
<label>Category <select name=\"category\">{options}</select></label>
<label>From <input type=\"date\" name=\"start_date\" value=\"{start}\"></label>
<label>To <input type=\"date\" name=\"end_date\" value=\"{end}\"></label>
<button type=\"submit\">Filter</button> <a href=\"/\">Clear</a>
</form>
",
        options = options,
        start = date_value(filter.start_date),
        end = date_value(filter.end_date),
    )
}

fn summary_cards(summary: &Summary) -> String {
    format!(
        "<section class=\"summary\">
<div class=\"card\"><h2>Net Worth</h2><p>{}</p></div>
<div class=\"card\"><h2>Total Assets</h2><p>{}</p></div>
<div class=\"card\"><h2>Total Cash</h2><p>{}</p></div>
</section>
",
        money(summary.net_worth),
        money(summary.total_assets()),
        money(summary.total_cash()),
    )
}

fn entry_table(entries: &[Entry]) -> String {
    if entries.is_empty() {
        return "<p class=\"empty\">No entries yet. <a href=\"/add\">Add one.</a></p>\n".to_string();
    }
    let mut rows = String::new();
    for e in entries {
        rows.push_str(&format!(
            "<tr><td>{date}</td><td>{description}</td><td class=\"amount\">{amount}</td><td>{category}</td><td>{entry_type}</td>\
<td><a href=\"/{id}/edit\">Edit</a> \
<form method=\"post\" action=\"/{id}/delete\" class=\"inline\" onsubmit=\"return confirm('Delete this entry?');\"><button type=\"submit\">Delete</button></form></td></tr>\n",
            date = format_date(e.entry_date),
            description = escape(&e.description),
            amount = money(e.amount),
            category = escape(&e.category),
            entry_type = escape(e.entry_type.as_str()),
            id = e.id,
        ));
    }
    format!(
        "<table class=\"entries\">
<thead><tr><th>Date</th><th>Description</th><th>Amount</th><th>Category</th><th>Type</th><th></th></tr></thead>
<tbody>
{}</tbody>
</table>
",
        rows
    )
}

pub fn index_page(view: &IndexView<'_>) -> String {
    let mut body = String::new();
    body.push_str(&filter_form(view.categories, view.filter));
    body.push_str(&summary_cards(view.summary));
    body.push_str("<section class=\"charts\">\n");
    for chart in view.charts {
        body.push_str(&chart_block(chart));
    }
    body.push_str("</section>\n");
    body.push_str(&entry_table(view.entries));

    let plotly = view.charts.iter().any(Chart::is_plot).then_some(view.plotly_url);
    layout("Ledger", &body, plotly)
}

pub struct EntryFormView<'a> {
    pub title: &'a str,
    pub action: &'a str,
    pub form: &'a EntryForm,
    pub errors: &'a [String],
    pub categories: &'a [Category],
}

pub fn entry_form_page(view: &EntryFormView<'_>) -> String {
    let form = view.form;

    let suggestions: String = view
        .categories
        .iter()
        .map(|c| format!("<option value=\"{}\">", escape(&c.name)))
        .collect();

    let current_type = form.entry_type.trim();
    let mut type_options = String::new();
    let mut known = false;
    for t in EntryType::KNOWN.iter() {
        let sel = if t.as_str() == current_type {
            known = true;
            " selected"
        } else {
            ""
        };
        type_options.push_str(&format!("<option value=\"{0}\"{1}>{0}</option>", t.as_str(), sel));
    }
    // Keep a custom type from an existing entry selectable.
    if !known && !current_type.is_empty() {
        let label = escape(current_type);
        type_options.push_str(&format!("<option value=\"{0}\" selected>{0}</option>", label));
    }

    let body = format!(
        "{errors}<form method=\"post\" action=\"{action}\" class=\"entry\">
<label>Date <input type=\"date\" name=\"entry_date\" value=\"{date}\" required></label>
<label>Description <input type=\"text\" name=\"description\" value=\"{description}\" required></label>
<label>Amount <input type=\"text\" inputmode=\"decimal\" name=\"amount\" value=\"{amount}\" required></label>
<label>Category <input type=\"text\" name=\"category\" list=\"category-list\" value=\"{category}\" required></label>
<datalist id=\"category-list\">{suggestions}</datalist>
<label>Type <select name=\"entry_type\">{type_options}</select></label>
<button type=\"submit\">Save</button> <a href=\"/\">Cancel</a>
</form>
",
        errors = error_list(view.errors),
        action = escape(view.action),
        date = escape(&form.entry_date),
        description = escape(&form.description),
        amount = escape(&form.amount),
        category = escape(&form.category),
        suggestions = suggestions,
        type_options = type_options,
    );
    layout(view.title, &body, None)
}

pub fn categories_page(categories: &[Category], errors: &[String]) -> String {
    let items: String = if categories.is_empty() {
        "<li class=\"empty\">No categories yet.</li>".to_string()
    } else {
        categories
            .iter()
            .map(|c| format!("<li>{}</li>", escape(&c.name)))
            .collect()
    };
    let body = format!(
        "{errors}<form method=\"post\" action=\"/categories\">
<label>New category <input type=\"text\" name=\"name\" required></label>
<button type=\"submit\">Add</button>
</form>
<ul class=\"categories\">{items}</ul>
",
        errors = error_list(errors),
        items = items,
    );
    layout("Categories", &body, None)
}

pub fn not_found_page(message: &str) -> String {
    let body = format!("<p>{}</p>\n<p><a href=\"/\">Back to the ledger</a></p>\n", escape(message));
    layout("Not Found", &body, None)
}

pub fn error_page(title: &str, message: &str) -> String {
    let body = format!("<p>{}</p>\n<p><a href=\"/\">Back to the ledger</a></p>\n", escape(message));
    layout(title, &body, None)
}

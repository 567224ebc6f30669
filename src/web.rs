use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use finledger_core::EntryId;
use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;

use crate::{
    charts::{expense_pie, monthly_flow_bar},
    forms::{CategoryForm, EntryForm, FilterQuery},
    render::{self, EntryFormView, IndexView},
    report::{ReportError, Summary},
    storage::{StorageBackend, StorageError},
};

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageBackend>,
    pub plotly_url: Arc<str>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(storage: Arc<dyn StorageBackend>, plotly_url: &str) -> Self {
        Self {
            storage,
            plotly_url: Arc::from(plotly_url),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("storage error: {0}")]
    Storage(StorageError),
    #[error("report error: {0}")]
    Report(#[from] ReportError),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::EntryNotFound(id) => AppError::NotFound(format!("Entry {} was not found.", id)),
            other => AppError::Storage(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Html(render::not_found_page(&message))).into_response()
            }
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Html(render::error_page("Bad Request", &message))).into_response()
            }
            AppError::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(render::error_page("Server Error", "Something went wrong while reading or writing the ledger.")),
                )
                    .into_response()
            }
            AppError::Report(e) => {
                tracing::error!(error = %e, "Summary failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(render::error_page("Server Error", "The ledger totals could not be computed.")),
                )
                    .into_response()
            }
        }
    }
}

/// Ids arrive as raw path segments; one that is not a number names no entry.
fn entry_id(raw: &str) -> Result<EntryId, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("Entry '{}' was not found.", raw)))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/add", get(add_form).post(add_entry))
        .route("/:id/edit", get(edit_form).post(update_entry))
        .route("/:id/delete", post(delete_entry))
        .route("/categories", get(list_categories).post(create_category))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .with_state(state)
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Html<String>, AppError> {
    let filter = query.to_filter().map_err(AppError::BadRequest)?;
    let entries = state.storage.list_entries(&filter)?;
    let categories = state.storage.list_categories()?;

    let summary = Summary::from_entries(&entries)?;
    let charts = [
        expense_pie(&summary.expense_breakdown),
        monthly_flow_bar(&summary.monthly_flow),
    ];
    metrics::increment_counter!("finledger_index_views_total");
    tracing::debug!(entries = entries.len(), filtered = !filter.is_empty(), "Rendering ledger");

    Ok(Html(render::index_page(&IndexView {
        entries: &entries,
        summary: &summary,
        categories: &categories,
        filter: &filter,
        charts: &charts,
        plotly_url: &state.plotly_url,
    })))
}

fn entry_form_response(
    state: &AppState,
    status: StatusCode,
    title: &str,
    action: &str,
    form: &EntryForm,
    errors: &[String],
) -> Result<Response, AppError> {
    let categories = state.storage.list_categories()?;
    let html = render::entry_form_page(&EntryFormView {
        title,
        action,
        form,
        errors,
        categories: &categories,
    });
    Ok((status, Html(html)).into_response())
}

pub async fn add_form(State(state): State<AppState>) -> Result<Response, AppError> {
    entry_form_response(&state, StatusCode::OK, "Add Entry", "/add", &EntryForm::default(), &[])
}

pub async fn add_entry(
    State(state): State<AppState>,
    Form(form): Form<EntryForm>,
) -> Result<Response, AppError> {
    let command = match form.validate() {
        Ok(command) => command,
        Err(errors) => {
            return entry_form_response(&state, StatusCode::UNPROCESSABLE_ENTITY, "Add Entry", "/add", &form, &errors);
        }
    };
    let id = state.storage.create_entry(&command)?;
    metrics::increment_counter!("finledger_entries_created_total");
    tracing::info!(id, amount = %command.amount, "Entry added");
    Ok(Redirect::to("/").into_response())
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = entry_id(&id)?;
    let entry = state.storage.get_entry(id)?;
    let action = format!("/{}/edit", id);
    entry_form_response(&state, StatusCode::OK, "Edit Entry", &action, &EntryForm::from_entry(&entry), &[])
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<EntryForm>,
) -> Result<Response, AppError> {
    let id = entry_id(&id)?;
    let command = match form.validate() {
        Ok(command) => command,
        Err(errors) => {
            // Still a 404 when the entry is gone, whatever the form says.
            state.storage.get_entry(id)?;
            let action = format!("/{}/edit", id);
            return entry_form_response(&state, StatusCode::UNPROCESSABLE_ENTITY, "Edit Entry", &action, &form, &errors);
        }
    };
    state.storage.update_entry(id, &command)?;
    metrics::increment_counter!("finledger_entries_updated_total");
    tracing::info!(id, "Entry updated");
    Ok(Redirect::to("/").into_response())
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = entry_id(&id)?;
    state.storage.delete_entry(id)?;
    metrics::increment_counter!("finledger_entries_deleted_total");
    tracing::info!(id, "Entry deleted");
    Ok(Redirect::to("/"))
}

pub async fn list_categories(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let categories = state.storage.list_categories()?;
    Ok(Html(render::categories_page(&categories, &[])))
}

pub async fn create_category(
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let name = form.name.trim();
    if name.is_empty() {
        let categories = state.storage.list_categories()?;
        let errors = ["Category name is required.".to_string()];
        let html = render::categories_page(&categories, &errors);
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response());
    }
    if state.storage.create_category(name)? {
        metrics::increment_counter!("finledger_categories_created_total");
        tracing::info!(name, "Category added");
    }
    Ok(Redirect::to("/categories").into_response())
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics exporter not installed").into_response(),
    }
}

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use service_core::error::AppError;

use crate::{
    dtos::invoices::DashboardQuery,
    handlers::invoices::load_invoice,
    listing::{InvoiceList, SearchQuery, StatusFilter},
    middleware::CurrentUser,
    render::html::{DashboardTemplate, PreviewTemplate},
    services::metrics::record_invoice_operation,
    AppState,
};

pub async fn dashboard_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<DashboardQuery>,
) -> Result<DashboardTemplate, AppError> {
    let filter = StatusFilter::parse(query.status.as_deref());
    let search = SearchQuery::new(query.search.as_deref());
    let list = InvoiceList::new(state.invoices.list(current.id(), search.term()).await?);

    Ok(DashboardTemplate::new(
        &list,
        filter,
        &search,
        query.notice.as_deref(),
    ))
}

/// Delete from the dashboard. The rendered list drops the row locally rather
/// than reading the collection again.
pub async fn delete_from_dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<DashboardTemplate, AppError> {
    let search = SearchQuery::default();
    let mut list = InvoiceList::new(state.invoices.list(current.id(), None).await?);

    let notice = match state.invoices.delete(current.id(), &id).await {
        Ok(true) => {
            list.remove(&id);
            record_invoice_operation("delete");
            tracing::info!(invoice_id = %id, "Invoice deleted from dashboard");
            None
        }
        Ok(false) => Some("Invoice not found"),
        Err(e) => {
            tracing::error!(invoice_id = %id, error = %e, "Dashboard delete failed");
            Some("Failed to delete invoice")
        }
    };

    Ok(DashboardTemplate::new(&list, StatusFilter::All, &search, notice))
}

/// Preview of one invoice. Any failure to load it sends the user back to the
/// list with a notice; a half-rendered page is never shown.
pub async fn preview_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Response {
    match load_invoice(&state, &current, &id).await {
        Ok(invoice) => {
            let layout = state.exporter.layout(&invoice);
            PreviewTemplate::new(&invoice, &layout).into_response()
        }
        Err(e) => {
            tracing::warn!(invoice_id = %id, error = %e, "Preview unavailable, redirecting to list");
            let notice = match e {
                AppError::NotFound(_) => "Invoice not found",
                _ => "Failed to load invoice",
            };
            Redirect::to(&format!("/invoices?notice={}", urlencoding::encode(notice))).into_response()
        }
    }
}

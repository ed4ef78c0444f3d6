use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

use crate::{
    dtos::invoices::{
        DashboardQuery, DashboardResponse, InvoiceResponse, ItemAddedResponse, ListInvoicesQuery,
    },
    listing::{InvoiceList, SearchQuery, StatusFilter},
    middleware::CurrentUser,
    models::{Invoice, InvoiceContent, LineItemPatch, MAX_LINE_ITEMS},
    utils::ValidatedJson,
    services::metrics::record_invoice_operation,
    AppState,
};

pub(crate) fn not_found(id: &str) -> AppError {
    AppError::NotFound(anyhow::anyhow!("Invoice {} not found", id))
}

/// Load an invoice owned by the current user or fail with 404.
pub(crate) async fn load_invoice(
    state: &AppState,
    current: &CurrentUser,
    id: &str,
) -> Result<Invoice, AppError> {
    state
        .invoices
        .get(current.id(), id)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Recompute derived fields and write the invoice back.
async fn save(state: &AppState, invoice: &mut Invoice) -> Result<(), AppError> {
    if invoice.recompute() {
        tracing::warn!(invoice_id = %invoice.id, "Stored line totals were stale; recomputed");
    }
    invoice.updated_at = Utc::now();
    if !state.invoices.update(invoice).await? {
        return Err(not_found(&invoice.id));
    }
    Ok(())
}

pub async fn list_invoices(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let search = SearchQuery::new(query.search.as_deref());
    let invoices = state.invoices.list(current.id(), search.term()).await?;
    Ok(Json(
        invoices
            .into_iter()
            .map(InvoiceResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// Seeded content for a new invoice form; nothing is stored.
pub async fn invoice_template(current: CurrentUser) -> impl IntoResponse {
    let now = Utc::now();
    Json(Invoice::template_for(
        &current.user,
        now.date_naive(),
        now.timestamp_millis(),
    ))
}

/// Stats over everything the search matched; the status filter only narrows
/// the rows returned.
pub async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = StatusFilter::parse(query.status.as_deref());
    let search = SearchQuery::new(query.search.as_deref());
    let list = InvoiceList::new(state.invoices.list(current.id(), search.term()).await?);

    Ok(Json(DashboardResponse {
        stats: list.stats().into(),
        status: filter.as_str().to_string(),
        invoices: list
            .filtered(filter)
            .into_iter()
            .cloned()
            .map(InvoiceResponse::from)
            .collect(),
    }))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = load_invoice(&state, &current, &id).await?;
    Ok(Json(InvoiceResponse::from(invoice)))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(content): ValidatedJson<InvoiceContent>,
) -> Result<impl IntoResponse, AppError> {
    let client_total = content.total_amount;
    let invoice = Invoice::new(current.id().to_string(), content);
    if client_total.is_some_and(|t| t.round_cents() != invoice.total_amount().round_cents()) {
        tracing::warn!(
            invoice_id = %invoice.id,
            computed = %invoice.total_amount().value(),
            "Client total disagreed with line items; using computed total"
        );
    }

    state.invoices.insert(&invoice).await?;
    record_invoice_operation("create");
    tracing::info!(invoice_id = %invoice.id, invoice_number = %invoice.invoice_number, "Invoice created");

    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(invoice))))
}

/// Full replacement of the editable body. Last write wins.
pub async fn update_invoice(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(content): ValidatedJson<InvoiceContent>,
) -> Result<impl IntoResponse, AppError> {
    let mut invoice = load_invoice(&state, &current, &id).await?;
    if invoice.apply(content) {
        tracing::warn!(
            invoice_id = %invoice.id,
            computed = %invoice.total_amount().value(),
            "Client totals disagreed with line items; using computed totals"
        );
    }

    save(&state, &mut invoice).await?;
    record_invoice_operation("update");
    tracing::info!(invoice_id = %invoice.id, "Invoice updated");

    Ok(Json(InvoiceResponse::from(invoice)))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.invoices.delete(current.id(), &id).await? {
        return Err(not_found(&id));
    }
    record_invoice_operation("delete");
    tracing::info!(invoice_id = %id, "Invoice deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut invoice = load_invoice(&state, &current, &id).await?;
    let Some(index) = invoice.add_item() else {
        let mut errors = ValidationErrors::new();
        errors.add(
            "items",
            ValidationError::new("length").with_message(Cow::Owned(format!(
                "An invoice can have at most {} line items",
                MAX_LINE_ITEMS
            ))),
        );
        return Err(AppError::ValidationError(errors));
    };
    save(&state, &mut invoice).await?;
    record_invoice_operation("item_add");

    Ok((
        StatusCode::CREATED,
        Json(ItemAddedResponse {
            index,
            invoice: invoice.into(),
        }),
    ))
}

pub async fn update_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, index)): Path<(String, usize)>,
    Json(patch): Json<LineItemPatch>,
) -> Result<impl IntoResponse, AppError> {
    let mut invoice = load_invoice(&state, &current, &id).await?;
    if !invoice.update_item(index, patch) {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Invoice {} has no item {}",
            id,
            index
        )));
    }
    save(&state, &mut invoice).await?;
    record_invoice_operation("item_update");

    Ok(Json(InvoiceResponse::from(invoice)))
}

/// Removing the only item, or an index past the end, leaves the invoice as is.
pub async fn remove_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, index)): Path<(String, usize)>,
) -> Result<impl IntoResponse, AppError> {
    let mut invoice = load_invoice(&state, &current, &id).await?;
    if invoice.remove_item(index) {
        save(&state, &mut invoice).await?;
        record_invoice_operation("item_remove");
    } else {
        tracing::debug!(invoice_id = %invoice.id, index, "Item removal ignored");
    }

    Ok(Json(InvoiceResponse::from(invoice)))
}

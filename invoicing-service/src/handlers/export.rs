use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::invoices::{DownloadQuery, ExportStatusResponse},
    handlers::invoices::load_invoice,
    middleware::CurrentUser,
    AppState,
};

/// Single-page PDF of the invoice with the payment link annotated. Export
/// failures come back as a dismissable notice instead of an error page.
/// `?inline=true` asks the browser to open it, which is how the preview prints.
pub async fn download_invoice(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let invoice = load_invoice(&state, &current, &id).await?;

    let artifact = match state.exporter.export(&invoice).await {
        Ok(artifact) => artifact,
        Err(e) => return Ok(e.into_response()),
    };

    let disposition = format!(
        "{}; filename=\"{}\"",
        if query.inline { "inline" } else { "attachment" },
        artifact.file_name
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

pub async fn export_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = load_invoice(&state, &current, &id).await?;
    Ok(Json(ExportStatusResponse {
        preparing: state.exporter.tracker().is_preparing(&invoice.id),
    }))
}

/// The positioned layout tree, for clients that paint or rasterize themselves.
pub async fn invoice_layout(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = load_invoice(&state, &current, &id).await?;
    Ok(Json(state.exporter.layout(&invoice)))
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Anything that stops an invoice from becoming a PDF.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to load asset {src}: {reason}")]
    Asset { src: String, reason: String },

    #[error("Failed to decode image {src}: {reason}")]
    Decode { src: String, reason: String },

    #[error("Layout has no drawable area")]
    EmptyCanvas,

    #[error("Invoice is too long to export ({width}x{height} px)")]
    TooLarge { width: u32, height: u32 },

    #[error("Failed to assemble PDF: {0}")]
    Pdf(String),

    #[error("Export task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ExportError {
    pub fn outcome_label(&self) -> &'static str {
        match self {
            ExportError::Asset { .. } => "asset_error",
            ExportError::Decode { .. } => "decode_error",
            ExportError::EmptyCanvas => "empty_canvas",
            ExportError::TooLarge { .. } => "too_large",
            ExportError::Pdf(_) => "pdf_error",
            ExportError::Task(_) => "task_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ExportError::Asset { .. } => StatusCode::BAD_GATEWAY,
            ExportError::TooLarge { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Export failures are shown to the user as a notification they can dismiss.
#[derive(Debug, Serialize)]
pub struct ExportNotice {
    pub error: String,
    pub dismissable: bool,
}

impl IntoResponse for ExportError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, outcome = self.outcome_label(), "Invoice export failed");
        let status = self.status();
        (
            status,
            Json(ExportNotice {
                error: format!("Failed to generate PDF: {}", self),
                dismissable: true,
            }),
        )
            .into_response()
    }
}

pub mod config;
pub mod dtos;
pub mod export;
pub mod handlers;
pub mod listing;
pub mod middleware;
pub mod models;
pub mod render;
pub mod services;
pub mod totals;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::export::Exporter;
use crate::services::{InvoiceStore, JwtService, MongoDb, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub invoices: Arc<dyn InvoiceStore>,
    pub users: Arc<dyn UserStore>,
    pub jwt: JwtService,
    pub exporter: Exporter,
    /// Present when MongoDB backs the stores; used by readiness checks.
    pub db: Option<MongoDb>,
    pub allowed_origins: Vec<String>,
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/profile", put(handlers::auth::update_profile))
        .route(
            "/api/invoices",
            get(handlers::invoices::list_invoices).post(handlers::invoices::create_invoice),
        )
        .route("/api/invoices/template", get(handlers::invoices::invoice_template))
        .route("/api/invoices/dashboard", get(handlers::invoices::dashboard))
        .route(
            "/api/invoices/:id",
            get(handlers::invoices::get_invoice)
                .put(handlers::invoices::update_invoice)
                .delete(handlers::invoices::delete_invoice),
        )
        .route("/api/invoices/:id/items", post(handlers::invoices::add_item))
        .route(
            "/api/invoices/:id/items/:index",
            put(handlers::invoices::update_item).delete(handlers::invoices::remove_item),
        )
        .route("/api/invoices/:id/download", get(handlers::export::download_invoice))
        .route("/api/invoices/:id/export-status", get(handlers::export::export_status))
        .route("/api/invoices/:id/layout", get(handlers::export::invoice_layout))
        .route("/invoices", get(handlers::views::dashboard_page))
        .route("/invoices/:id/preview", get(handlers::views::preview_page))
        .route("/invoices/:id/delete", post(handlers::views::delete_from_dashboard))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .allowed_origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(origin) => Some(origin),
                    Err(e) => {
                        tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                        None
                    }
                })
                .collect::<Vec<HeaderValue>>(),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .merge(api)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

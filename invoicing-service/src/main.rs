use invoicing_service::{
    build_router,
    config::{InvoicingConfig, StoreBackend},
    export::Exporter,
    render::HttpAssetResolver,
    services::{InvoiceStore, JwtService, MemoryStore, MongoDb, UserStore},
    AppState,
};
use service_core::error::AppError;
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Fail fast on bad configuration
    let config = InvoicingConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    invoicing_service::services::metrics::init_metrics().map_err(AppError::InternalError)?;

    tracing::info!(
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        store = ?config.store.backend,
        "Starting invoicing service"
    );

    let (invoices, users, db): (Arc<dyn InvoiceStore>, Arc<dyn UserStore>, Option<MongoDb>) =
        match (config.store.backend, &config.store.mongodb) {
            (StoreBackend::Mongodb, Some(mongo)) => {
                let db = MongoDb::connect(&mongo.uri, &mongo.database).await?;
                db.initialize_indexes().await?;
                tracing::info!("Database initialized successfully");
                let invoices: Arc<dyn InvoiceStore> = Arc::new(db.clone());
                let users: Arc<dyn UserStore> = Arc::new(db.clone());
                (invoices, users, Some(db))
            }
            (StoreBackend::Mongodb, None) => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "MongoDB backend selected without connection settings"
                )));
            }
            (StoreBackend::Memory, _) => {
                tracing::warn!("Using in-memory store; data will not survive a restart");
                let store = MemoryStore::new();
                let invoices: Arc<dyn InvoiceStore> = Arc::new(store.clone());
                let users: Arc<dyn UserStore> = Arc::new(store);
                (invoices, users, None)
            }
        };

    let jwt = JwtService::new(&config.jwt.secret, config.jwt.access_token_expiry_minutes)
        .map_err(AppError::ConfigError)?;

    let resolver = HttpAssetResolver::new(config.export.asset_timeout()).map_err(AppError::InternalError)?;
    let exporter = Exporter::new(
        Arc::new(resolver),
        config.export.render_options(),
        config.export.scale,
    );

    let state = AppState {
        invoices,
        users,
        jwt,
        exporter,
        db,
        allowed_origins: config.security.allowed_origins.clone(),
    };
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

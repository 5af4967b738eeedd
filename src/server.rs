use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::api::{self, pages, uploads};
use crate::backend;
use crate::config::AppConfig;
use crate::identity;
use crate::security::{
    rate_limit::rate_limit_middleware,
    timeout::{RequestDeadline, timeout_middleware},
};

/// Wire the identity provider and backend named in the configuration.
pub fn build_state(config: Arc<AppConfig>) -> anyhow::Result<AppState> {
    let identity = identity::from_config(&config.identity, &config.backend)?;
    let backend = backend::from_config(&config.backend)?;

    info!(
        name: "providers.configured",
        identity = %config.identity.provider,
        backend = %config.backend.provider,
        on_failure = ?config.uploads.on_failure,
        max_concurrent = ?config.uploads.max_concurrent(),
        "Providers configured"
    );

    Ok(AppState::new(config, identity, backend))
}

/// Build the router with every route and middleware layer.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let upload_routes = Router::new()
        .route("/uploads", post(uploads::submit))
        .layer(DefaultBodyLimit::max(config.uploads.max_request_bytes));

    Router::new()
        .route("/", get(pages::dashboard))
        .route("/sign-in", get(pages::sign_in))
        .route("/healthz", get(api::healthz))
        .route("/{category}", get(pages::category))
        .route("/uploads/{uploader_id}", get(uploads::pending))
        .route("/uploads/{uploader_id}/files/{name}", delete(uploads::remove))
        .route("/uploads/{uploader_id}/toasts", get(uploads::toasts))
        .merge(upload_routes)
        .nest_service("/assets", ServeDir::new(&config.server.static_dir))
        .layer(axum::middleware::from_fn_with_state(
            RequestDeadline(config.resilience.request_timeout()),
            timeout_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = build_state(Arc::clone(&config))?;

    let sweeper = state.uploaders.spawn_sweeper(config.uploads.idle_timeout());
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;
    sweeper.abort();
    served?;

    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

//! StoreIt server
//!
//! Entry point for the file storage front end.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::info;

use storeit::config::AppConfig;
use storeit::{server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before reading any configuration
    let _ = dotenv();

    telemetry::init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(
        name: "config.loaded",
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    server::start_server(Arc::new(config)).await
}

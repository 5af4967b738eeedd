//! StoreIt
//!
//! A server-rendered file storage front end: an authenticated layout shell
//! around the file browser, and a drag-and-drop uploader that validates,
//! uploads and tracks many files at once.
//!
//! # Architecture
//!
//! - **Server**: Axum with HTMX fragments for the interactive parts
//! - **Identity**: pluggable current-user lookup (JWT, Appwrite, in-memory)
//! - **Storage**: pluggable upload backend (Appwrite, in-memory)
//! - **Uploader**: per-page pending lists with concurrent uploads
//!
//! # Modules
//!
//! - [`api`]: HTTP handlers
//! - [`backend`]: upload backend trait and implementations
//! - [`identity`]: identity provider trait and implementations
//! - [`uploader`]: batch upload orchestration and pending state
//! - [`ui`]: HTML rendering

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod file_type;
pub mod identity;
pub mod security;
pub mod server;
pub mod telemetry;
pub mod ui;
pub mod uploader;

use std::sync::Arc;

use crate::backend::UploadBackend;
use crate::config::AppConfig;
use crate::identity::IdentityProvider;
use crate::security::rate_limit::TokenBucket;
use crate::uploader::{UploaderSettings, UploaderStore};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Global configuration.
    pub config: Arc<AppConfig>,
    /// Resolves the user behind a request.
    pub identity: Arc<dyn IdentityProvider>,
    /// File storage used by uploads and listings.
    pub backend: Arc<dyn UploadBackend>,
    /// Live uploader instances.
    pub uploaders: UploaderStore,
    /// Global rate limiter.
    pub rate_limiter: Arc<TokenBucket>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        identity: Arc<dyn IdentityProvider>,
        backend: Arc<dyn UploadBackend>,
    ) -> Self {
        let uploaders = UploaderStore::new(
            Arc::clone(&backend),
            UploaderSettings::from(&config.uploads),
            config.uploads.toast_capacity,
        );
        let rate_limiter = Arc::new(TokenBucket::new(
            config.resilience.requests_per_second,
            config.resilience.burst_size,
        ));
        Self {
            config,
            identity,
            backend,
            uploaders,
            rate_limiter,
        }
    }
}

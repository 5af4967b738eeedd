//! Current-user resolution.
//!
//! Identity is owned by an external service. The layout shell asks an
//! [`IdentityProvider`] for the user behind the request credentials on every
//! render and never caches the answer.

pub mod jwt;
pub mod memory;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::backend::{AppwriteClient, BackendError};
use crate::config::{BackendConfig, IdentityConfig};

pub use jwt::JwtIdentity;
pub use memory::MemoryIdentity;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Identity provider misconfigured: {0}")]
    Config(String),
}

/// The signed-in user as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User record id, used as the owner of uploaded files.
    pub id: String,
    /// Account id of the authentication record.
    pub account_id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Session material extracted from a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub session_token: Option<String>,
}

impl Credentials {
    /// Session cookie wins over an `Authorization: Bearer` header.
    pub fn from_request(jar: &CookieJar, headers: &HeaderMap, cookie_name: &str) -> Self {
        let from_cookie = jar
            .get(cookie_name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());

        let session_token = from_cookie.or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
        });

        Self { session_token }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// `Ok(None)` when the credentials identify nobody.
    async fn current_user(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<CurrentUser>, IdentityError>;
}

/// Build the identity provider named by `identity.provider`.
pub fn from_config(
    identity: &IdentityConfig,
    backend: &BackendConfig,
) -> Result<Arc<dyn IdentityProvider>, IdentityError> {
    match identity.provider.as_str() {
        "jwt" => Ok(Arc::new(JwtIdentity::new(&identity.jwt_secret)?)),
        "appwrite" => Ok(Arc::new(AppwriteClient::from_config(backend)?)),
        "memory" => {
            let provider = MemoryIdentity::new();
            if let Some(token) = &identity.dev_token {
                provider.insert(token.clone(), MemoryIdentity::dev_user());
            }
            Ok(Arc::new(provider))
        }
        other => Err(IdentityError::Config(format!(
            "unknown identity provider: {other}"
        ))),
    }
}

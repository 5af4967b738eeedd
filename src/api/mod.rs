//! HTTP handlers.
//!
//! - [`pages`]: protected pages behind the layout shell, and the sign-in page
//! - [`uploads`]: uploader fragments (HTMX targets)

pub mod pages;
pub mod uploads;

use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use serde_json::{Value, json};

use crate::AppState;
use crate::error::AppError;
use crate::identity::{Credentials, CurrentUser};

/// Resolve the user behind the request.
///
/// `Ok(None)` means nobody is signed in; provider failures are errors.
pub async fn current_user(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<Option<CurrentUser>, AppError> {
    let credentials =
        Credentials::from_request(jar, headers, &state.config.identity.cookie_name);
    if credentials.session_token.is_none() {
        return Ok(None);
    }
    Ok(state.identity.current_user(&credentials).await?)
}

/// GET /healthz
pub async fn healthz() -> axum::Json<Value> {
    axum::Json(json!({ "status": "ok" }))
}

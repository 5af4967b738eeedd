//! Uploader endpoints.
//!
//! Every response is the HTML fragment the page swaps in. Callers without a
//! current user get 401, never a redirect.

use axum::{
    extract::{Multipart, Path, State},
    http::HeaderMap,
    response::Html,
};
use axum_extra::extract::CookieJar;

use super::current_user;
use crate::AppState;
use crate::error::AppError;
use crate::identity::CurrentUser;
use crate::ui::uploader as fragments;
use crate::uploader::{SelectedFile, UploadContext};

/// Longest accepted uploader id.
const MAX_UPLOADER_ID_LEN: usize = 64;

async fn require_user(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<CurrentUser, AppError> {
    current_user(state, jar, headers)
        .await?
        .ok_or(AppError::Unauthorized)
}

fn validate_uploader_id(id: &str) -> Result<(), AppError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_UPLOADER_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("invalid uploader id: {id}")))
    }
}

/// Parsed `POST /uploads` body.
#[derive(Debug, Default)]
struct UploadForm {
    uploader_id: Option<String>,
    path: Option<String>,
    files: Vec<SelectedFile>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "uploader_id" => form.uploader_id = Some(field.text().await?.trim().to_string()),
            "path" => form.path = Some(field.text().await?),
            "files" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let payload = field.bytes().await?;
                // Browsers send an empty unnamed part when nothing was picked.
                if file_name.is_empty() {
                    continue;
                }
                let mut file = SelectedFile::new(file_name, payload);
                if let Some(content_type) = content_type {
                    file = file.with_content_type(content_type);
                }
                form.files.push(file);
            }
            other => tracing::debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    Ok(form)
}

/// POST /uploads
///
/// Starts a batch and answers with the pending list as it stands right after
/// the batch was recorded.
pub async fn submit(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let user = require_user(&state, &jar, &headers).await?;
    let form = read_form(multipart).await?;

    let uploader_id = form
        .uploader_id
        .ok_or_else(|| AppError::BadRequest("missing uploader_id".to_string()))?;
    validate_uploader_id(&uploader_id)?;

    let path = form
        .path
        .filter(|p| p.starts_with('/'))
        .unwrap_or_else(|| "/".to_string());

    let uploader = state.uploaders.get_or_create(&user.id, &uploader_id);
    if !form.files.is_empty() {
        // The batch runs on its own task and logs its report when it settles.
        drop(uploader.submit_batch(
            form.files,
            UploadContext {
                owner_id: user.id.clone(),
                account_id: user.account_id.clone(),
                path,
            },
        ));
    }

    Ok(Html(fragments::pending_list(&uploader_id, &uploader.pending())))
}

/// GET /uploads/{uploader_id}
pub async fn pending(
    State(state): State<AppState>,
    Path(uploader_id): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Html<String>, AppError> {
    let user = require_user(&state, &jar, &headers).await?;
    let entries = state
        .uploaders
        .get(&user.id, &uploader_id)
        .map(|uploader| uploader.pending())
        .unwrap_or_default();
    Ok(Html(fragments::pending_list(&uploader_id, &entries)))
}

/// DELETE /uploads/{uploader_id}/files/{name}
pub async fn remove(
    State(state): State<AppState>,
    Path((uploader_id, name)): Path<(String, String)>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Html<String>, AppError> {
    let user = require_user(&state, &jar, &headers).await?;
    let entries = match state.uploaders.get(&user.id, &uploader_id) {
        Some(uploader) => {
            uploader.remove(&name);
            uploader.pending()
        }
        None => Vec::new(),
    };
    Ok(Html(fragments::pending_list(&uploader_id, &entries)))
}

/// GET /uploads/{uploader_id}/toasts
pub async fn toasts(
    State(state): State<AppState>,
    Path(uploader_id): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Html<String>, AppError> {
    let user = require_user(&state, &jar, &headers).await?;
    let drained = state.uploaders.take_toasts(&user.id, &uploader_id);
    Ok(Html(fragments::toasts(&drained)))
}

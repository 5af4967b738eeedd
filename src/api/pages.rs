use axum::{
    extract::{Path, State},
    http::{HeaderMap, Uri},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use super::current_user;
use crate::AppState;
use crate::error::AppError;
use crate::file_type::Category;
use crate::identity::CurrentUser;
use crate::ui::{
    layout::{self, LayoutContext},
    pages,
};

fn sign_in_redirect(state: &AppState, uri: &Uri) -> Response {
    tracing::debug!(path = %uri.path(), "No current user, redirecting to sign-in");
    Redirect::to(&state.config.identity.sign_in_path).into_response()
}

/// Wrap `content` in the layout shell.
fn render(user: &CurrentUser, uri: &Uri, title: &str, content: &str) -> Response {
    // Uploader instances are created on first upload; the page only names one.
    let uploader_id = Uuid::new_v4().to_string();
    let html = layout::protected_page(
        LayoutContext {
            user,
            path: uri.path(),
            uploader_id: &uploader_id,
            page_title: title,
        },
        content,
    );
    Html(html).into_response()
}

/// GET /
pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, AppError> {
    let Some(user) = current_user(&state, &jar, &headers).await? else {
        return Ok(sign_in_redirect(&state, &uri));
    };

    let files = state.backend.list_files(&user.id, &[]).await?;
    Ok(render(&user, &uri, "Dashboard", &pages::dashboard(&files)))
}

/// GET /{category}
pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, AppError> {
    let Some(user) = current_user(&state, &jar, &headers).await? else {
        return Ok(sign_in_redirect(&state, &uri));
    };
    let category =
        Category::from_slug(&slug).ok_or_else(|| AppError::NotFound(format!("/{slug}")))?;

    let files = state.backend.list_files(&user.id, category.kinds()).await?;
    Ok(render(
        &user,
        &uri,
        category.title(),
        &pages::category_page(category, &files),
    ))
}

/// GET /sign-in
pub async fn sign_in() -> Html<String> {
    Html(pages::sign_in_page())
}

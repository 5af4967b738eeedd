use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Duration;

/// Request deadline; `None` lets requests run unbounded.
#[derive(Debug, Clone, Copy)]
pub struct RequestDeadline(pub Option<Duration>);

/// Answer 408 when a handler outlives the deadline.
///
/// Upload batches run on their own tasks, so only the request itself is bounded.
pub async fn timeout_middleware(
    State(RequestDeadline(deadline)): State<RequestDeadline>,
    req: Request,
    next: Next,
) -> Response {
    let Some(duration) = deadline else {
        return next.run(req).await;
    };
    match tokio::time::timeout(duration, next.run(req)).await {
        Ok(res) => res,
        Err(_) => {
            tracing::warn!(timeout_secs = duration.as_secs(), "Request timed out");
            (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response()
        }
    }
}

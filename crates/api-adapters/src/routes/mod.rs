//! Resource routers mounted under `/api`.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use domains::Page;
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

pub mod events;
pub mod forums;
pub mod posts;
pub mod schools;
pub mod topics;

/// Default page size for topic and post listings.
pub(crate) const THREAD_PAGE_SIZE: u32 = 20;

/// `{<items>: [...], totalPages, currentPage, <total>}`
pub(crate) fn paged<T: Serialize>(page: Page<T>, items: &str, total: &str) -> Value {
    let mut body = json!({
        "totalPages": page.total_pages(),
        "currentPage": page.page,
    });
    body[total] = json!(page.total);
    body[items] = json!(page.items);
    body
}

pub(crate) async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/openmetrics-text; version=1.0.0; charset=utf-8")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

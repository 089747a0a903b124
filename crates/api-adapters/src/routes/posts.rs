use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use domains::{PageRequest, ReportAction};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{paged, THREAD_PAGE_SIZE};
use crate::error::ApiResult;
use crate::extract::{Authenticated, Filter, Param, Payload};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/topic/{topic_id}", get(list))
        .route("/{id}", put(update).delete(remove))
        .route("/{id}/like", post(toggle_like))
        .route("/{id}/report", post(report))
        .route("/{id}/report/{report_id}/handle", post(handle_report))
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ListQuery {
    page: u32,
    limit: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: THREAD_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewPost {
    topic_id: Uuid,
    content: String,
    parent_post_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct Edit {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ReportBody {
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct Resolution {
    #[serde(default)]
    action: String,
}

async fn list(
    State(state): State<AppState>,
    Param(topic_id): Param<Uuid>,
    Filter(query): Filter<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = state
        .services
        .posts
        .list(topic_id, PageRequest::new(query.page, query.limit))
        .await?;
    Ok(Json(paged(page, "posts", "totalPosts")))
}

async fn create(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Payload(body): Payload<NewPost>,
) -> ApiResult<impl IntoResponse> {
    let post = state
        .services
        .posts
        .create(&actor, body.topic_id, &body.content, body.parent_post_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Post created successfully", "post": post })),
    ))
}

async fn update(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
    Payload(body): Payload<Edit>,
) -> ApiResult<impl IntoResponse> {
    let post = state.services.posts.update(&actor, id, &body.content).await?;
    Ok(Json(json!({ "message": "Post updated successfully", "post": post })))
}

async fn remove(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.services.posts.delete(&actor, id).await?;
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

async fn toggle_like(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.services.posts.toggle_like(&actor, id).await?;
    let message = if outcome.liked {
        "Post liked successfully"
    } else {
        "Post unliked successfully"
    };
    Ok(Json(json!({ "message": message, "liked": outcome.liked, "likes": outcome.likes })))
}

async fn report(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
    Payload(body): Payload<ReportBody>,
) -> ApiResult<impl IntoResponse> {
    let report = state.services.posts.report(&actor, id, &body.reason).await?;
    Ok(Json(json!({ "message": "Post reported successfully", "report": report })))
}

async fn handle_report(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param((id, report_id)): Param<(Uuid, Uuid)>,
    Payload(body): Payload<Resolution>,
) -> ApiResult<impl IntoResponse> {
    let action: ReportAction = body.action.parse()?;
    let post = state
        .services
        .posts
        .resolve_report(&actor, id, report_id, action)
        .await?;
    let message = match action {
        ReportAction::Dismiss => "Report dismissed",
        ReportAction::DeletePost => "Post deleted based on report",
    };
    Ok(Json(json!({ "message": message, "post": post })))
}

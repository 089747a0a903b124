use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use domains::{NewTopic, PageRequest, TopicPatch, TopicSort};
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
        .route("/forum/{forum_id}", get(list))
        .route("/{id}", get(show).put(update).delete(remove))
        .route("/{id}/pin", post(toggle_pin))
        .route("/{id}/lock", post(toggle_lock))
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ListQuery {
    page: u32,
    limit: u32,
    sort: TopicSort,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: THREAD_PAGE_SIZE,
            sort: TopicSort::default(),
        }
    }
}

async fn list(
    State(state): State<AppState>,
    Param(forum_id): Param<Uuid>,
    Filter(query): Filter<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = state
        .services
        .topics
        .list(forum_id, query.sort, PageRequest::new(query.page, query.limit))
        .await?;
    Ok(Json(paged(page, "topics", "totalTopics")))
}

async fn show(State(state): State<AppState>, Param(id): Param<Uuid>) -> ApiResult<impl IntoResponse> {
    let topic = state.services.topics.get(id).await?;
    Ok(Json(json!({ "topic": topic })))
}

async fn create(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Payload(input): Payload<NewTopic>,
) -> ApiResult<impl IntoResponse> {
    let topic = state.services.topics.create(&actor, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Topic created successfully", "topic": topic })),
    ))
}

async fn update(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
    Payload(patch): Payload<TopicPatch>,
) -> ApiResult<impl IntoResponse> {
    let topic = state.services.topics.update(&actor, id, patch).await?;
    Ok(Json(json!({ "message": "Topic updated successfully", "topic": topic })))
}

async fn remove(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.services.topics.delete(&actor, id).await?;
    Ok(Json(json!({ "message": "Topic deleted successfully" })))
}

async fn toggle_pin(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let topic = state.services.topics.toggle_pin(&actor, id).await?;
    let message = if topic.is_pinned {
        "Topic pinned successfully"
    } else {
        "Topic unpinned successfully"
    };
    Ok(Json(json!({ "message": message, "topic": topic })))
}

async fn toggle_lock(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let topic = state.services.topics.toggle_lock(&actor, id).await?;
    let message = if topic.is_locked {
        "Topic locked successfully"
    } else {
        "Topic unlocked successfully"
    };
    Ok(Json(json!({ "message": message, "topic": topic })))
}

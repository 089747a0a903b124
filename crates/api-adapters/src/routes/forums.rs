use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use domains::{ForumPatch, NewForum};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{Authenticated, Param, Payload};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/general", get(general))
        .route("/school/{school_id}", get(by_school))
        .route("/moderator/add", post(add_moderator))
        .route("/moderator/remove", post(remove_moderator))
        .route("/{id}", get(show).put(update))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModeratorChange {
    forum_id: Uuid,
    user_id: Uuid,
}

async fn list(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let forums = state.services.forums.list().await?;
    Ok(Json(json!({ "forums": forums })))
}

async fn general(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let forum = state.services.forums.general().await?;
    Ok(Json(json!({ "forum": forum })))
}

async fn by_school(
    State(state): State<AppState>,
    Param(school_id): Param<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let forums = state.services.forums.list_by_school(school_id).await?;
    Ok(Json(json!({ "forums": forums })))
}

async fn show(State(state): State<AppState>, Param(id): Param<Uuid>) -> ApiResult<impl IntoResponse> {
    let forum = state.services.forums.get(id).await?;
    Ok(Json(json!({ "forum": forum })))
}

async fn create(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Payload(input): Payload<NewForum>,
) -> ApiResult<impl IntoResponse> {
    let forum = state.services.forums.create(&actor, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Forum created successfully", "forum": forum })),
    ))
}

async fn update(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
    Payload(patch): Payload<ForumPatch>,
) -> ApiResult<impl IntoResponse> {
    let forum = state.services.forums.update(&actor, id, patch).await?;
    Ok(Json(json!({ "message": "Forum updated successfully", "forum": forum })))
}

async fn add_moderator(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Payload(body): Payload<ModeratorChange>,
) -> ApiResult<impl IntoResponse> {
    let forum = state
        .services
        .forums
        .add_moderator(&actor, body.forum_id, body.user_id)
        .await?;
    Ok(Json(json!({ "message": "Moderator added successfully", "forum": forum })))
}

async fn remove_moderator(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Payload(body): Payload<ModeratorChange>,
) -> ApiResult<impl IntoResponse> {
    let forum = state
        .services
        .forums
        .remove_moderator(&actor, body.forum_id, body.user_id)
        .await?;
    Ok(Json(json!({ "message": "Moderator removed successfully", "forum": forum })))
}

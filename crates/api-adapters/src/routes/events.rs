use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use domains::{AttendeePatch, EventPatch, EventStatus, EventType, MediaKind, NewEvent, PageRequest};
use serde::Deserialize;
use serde_json::json;
use services::EventFilter;
use uuid::Uuid;

use super::paged;
use crate::error::ApiResult;
use crate::extract::{read_upload, Authenticated, Filter, Param, Payload, Viewer};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(remove))
        .route("/{id}/register", post(register))
        .route("/{id}/cancel-registration", post(cancel_registration))
        .route("/{id}/attendee/{user_id}", post(update_attendee))
        .route("/{id}/invite", post(invite))
        .route("/{id}/banner", post(upload_banner))
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

fn default_upcoming() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(rename = "type")]
    event_type: Option<EventType>,
    school: Option<Uuid>,
    status: Option<EventStatus>,
    #[serde(default = "default_upcoming")]
    upcoming: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Invitation {
    #[serde(default)]
    user_ids: Vec<Uuid>,
}

async fn list(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Filter(query): Filter<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = EventFilter {
        event_type: query.event_type,
        school_id: query.school,
        status: query.status,
        upcoming: query.upcoming,
    };
    let page = state
        .services
        .events
        .list(viewer.as_ref(), filter, PageRequest::new(query.page, query.limit))
        .await?;
    Ok(Json(paged(page, "events", "totalEvents")))
}

async fn show(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Param(id): Param<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let event = state.services.events.get(viewer.as_ref(), id).await?;
    Ok(Json(json!({ "event": event })))
}

async fn create(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Payload(input): Payload<NewEvent>,
) -> ApiResult<impl IntoResponse> {
    let event = state.services.events.create(&actor, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Event created successfully", "event": event })),
    ))
}

async fn update(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
    Payload(patch): Payload<EventPatch>,
) -> ApiResult<impl IntoResponse> {
    let event = state.services.events.update(&actor, id, patch).await?;
    Ok(Json(json!({ "message": "Event updated successfully", "event": event })))
}

async fn remove(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.services.events.delete(&actor, id).await?;
    Ok(Json(json!({ "message": "Event deleted successfully" })))
}

async fn register(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let registration = state.services.events.register(&actor, id).await?;
    Ok(Json(json!({
        "message": "Successfully registered for event",
        "requiresPayment": registration.requires_payment,
        "paymentStatus": registration.payment_status,
    })))
}

async fn cancel_registration(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.services.events.cancel_registration(&actor, id).await?;
    Ok(Json(json!({ "message": "Registration cancelled successfully" })))
}

async fn update_attendee(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param((id, user_id)): Param<(Uuid, Uuid)>,
    Payload(patch): Payload<AttendeePatch>,
) -> ApiResult<impl IntoResponse> {
    state
        .services
        .events
        .update_attendee(&actor, id, user_id, patch)
        .await?;
    Ok(Json(json!({ "message": "Attendee status updated successfully" })))
}

async fn invite(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
    Payload(body): Payload<Invitation>,
) -> ApiResult<impl IntoResponse> {
    let added = state.services.events.invite(&actor, id, &body.user_ids).await?;
    Ok(Json(json!({
        "message": format!("Successfully invited {} users to the event", added.len()),
        "newAttendees": added,
    })))
}

async fn upload_banner(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let upload = read_upload(multipart, MediaKind::EventBanner.field()).await?;
    let banner = state.services.events.upload_banner(&actor, id, upload).await?;
    Ok(Json(json!({ "message": "Event banner uploaded successfully", "banner": banner })))
}

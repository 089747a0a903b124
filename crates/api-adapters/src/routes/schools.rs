use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use domains::{MediaKind, NewSchool, Region, SchoolPatch};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{read_upload, Authenticated, Param, Payload};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/region/{region}", get(by_region))
        .route("/admin/add", post(add_admin))
        .route("/admin/remove", post(remove_admin))
        .route("/{id}", get(show).put(update).delete(deactivate))
        .route("/{id}/logo", post(upload_logo))
        .route("/{id}/banner", post(upload_banner))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminChange {
    school_id: Uuid,
    user_id: Uuid,
}

async fn list(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let schools = state.services.schools.list().await?;
    Ok(Json(json!({ "schools": schools })))
}

async fn by_region(
    State(state): State<AppState>,
    Param(region): Param<String>,
) -> ApiResult<impl IntoResponse> {
    let region: Region = region.parse()?;
    let schools = state.services.schools.list_by_region(region).await?;
    Ok(Json(json!({ "schools": schools })))
}

async fn show(State(state): State<AppState>, Param(id): Param<Uuid>) -> ApiResult<impl IntoResponse> {
    let school = state.services.schools.get(id).await?;
    Ok(Json(json!({ "school": school })))
}

async fn create(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Payload(input): Payload<NewSchool>,
) -> ApiResult<impl IntoResponse> {
    let school = state.services.schools.create(&actor, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "School created successfully", "school": school })),
    ))
}

async fn update(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
    Payload(patch): Payload<SchoolPatch>,
) -> ApiResult<impl IntoResponse> {
    let school = state.services.schools.update(&actor, id, patch).await?;
    Ok(Json(json!({ "message": "School updated successfully", "school": school })))
}

async fn deactivate(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.services.schools.deactivate(&actor, id).await?;
    Ok(Json(json!({ "message": "School deleted successfully" })))
}

async fn add_admin(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Payload(body): Payload<AdminChange>,
) -> ApiResult<impl IntoResponse> {
    let school = state
        .services
        .schools
        .add_admin(&actor, body.school_id, body.user_id)
        .await?;
    Ok(Json(json!({ "message": "School admin added successfully", "school": school })))
}

async fn remove_admin(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Payload(body): Payload<AdminChange>,
) -> ApiResult<impl IntoResponse> {
    let school = state
        .services
        .schools
        .remove_admin(&actor, body.school_id, body.user_id)
        .await?;
    Ok(Json(json!({ "message": "School admin removed successfully", "school": school })))
}

async fn upload_logo(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let kind = MediaKind::SchoolLogo;
    let upload = read_upload(multipart, kind.field()).await?;
    let logo = state.services.schools.upload_image(&actor, id, kind, upload).await?;
    Ok(Json(json!({ "message": "School logo uploaded successfully", "logo": logo })))
}

async fn upload_banner(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Param(id): Param<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let kind = MediaKind::SchoolBanner;
    let upload = read_upload(multipart, kind.field()).await?;
    let banner = state.services.schools.upload_image(&actor, id, kind, upload).await?;
    Ok(Json(json!({ "message": "School banner uploaded successfully", "banner": banner })))
}

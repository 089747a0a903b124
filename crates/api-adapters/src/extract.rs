//! Request extractors. Every rejection is turned into an [`ApiError`] so
//! clients always get the `{message}` body.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request};
use axum::http::header;
use axum::http::request::Parts;
use axum::Json;
use domains::{Actor, DomainError};
use services::Upload;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The caller, required.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Actor);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)
            .ok_or_else(|| DomainError::Unauthenticated("Authentication required".into()))?;
        Ok(Self(state.verifier.verify(token)?))
    }
}

/// The caller when a valid token is present. A bad token reads as anonymous.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub Option<Actor>);

impl FromRequestParts<AppState> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let actor = bearer(parts).and_then(|token| match state.verifier.verify(token) {
            Ok(actor) => Some(actor),
            Err(err) => {
                tracing::debug!(error = %err, "ignoring bad token on public route");
                None
            }
        });
        Ok(Self(actor))
    }
}

/// JSON body.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Path parameters.
pub struct Param<T>(pub T);

impl<S, T> FromRequestParts<S> for Param<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string.
pub struct Filter<T>(pub T);

impl<S, T> FromRequestParts<S> for Filter<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Pulls the file sent under `field` out of a multipart body.
pub async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
    field: &str,
) -> ApiResult<Upload> {
    let mut multipart = multipart.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::validation(err.body_text()))?
    {
        if part.name() != Some(field) {
            continue;
        }
        let file_name = part
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| ApiError::validation("Please upload a file"))?;
        let data = part
            .bytes()
            .await
            .map_err(|err| ApiError::validation(err.body_text()))?;
        return Ok(Upload { file_name, data });
    }
    Err(ApiError::validation("Please upload a file"))
}

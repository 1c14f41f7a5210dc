//! Employer profile handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};

use c4m_models::{EmployerProfile, ProfileUpdate};

use crate::auth::CurrentEmployer;
use crate::envelope::Envelope;
use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::services::AvatarUpload;
use crate::state::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    employer: CurrentEmployer,
) -> ApiResult<Envelope<EmployerProfile>> {
    let profile = state.profiles.get_profile(&employer.id).await?;
    Ok(Envelope::ok(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    employer: CurrentEmployer,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> ApiResult<Envelope<EmployerProfile>> {
    let profile = state.profiles.update_profile(&employer.id, update).await?;
    Ok(Envelope::ok(profile))
}

/// Upload a raw image body; the `Content-Type` header names its format.
pub async fn upload_avatar(
    State(state): State<AppState>,
    employer: CurrentEmployer,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Envelope<AvatarUpload>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let uploaded = state
        .profiles
        .upload_avatar(&employer.id, body.to_vec(), content_type)
        .await?;
    Ok(Envelope::ok(uploaded))
}

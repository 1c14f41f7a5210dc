//! Application review handlers.

use axum::extract::{Path, State};
use serde::Deserialize;

use c4m_models::{Application, JobId};

use crate::auth::CurrentEmployer;
use crate::envelope::Envelope;
use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::services::{JobApplications, ShortlistedTalents};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: String,
}

pub async fn list_applications(
    State(state): State<AppState>,
    employer: CurrentEmployer,
    Path(job_id): Path<String>,
) -> ApiResult<Envelope<JobApplications>> {
    let listed = state
        .applications
        .list_applications(&employer.id, &JobId::from_string(job_id))
        .await?;
    Ok(Envelope::ok(listed))
}

pub async fn list_shortlisted(
    State(state): State<AppState>,
    employer: CurrentEmployer,
    Path(job_id): Path<String>,
) -> ApiResult<Envelope<ShortlistedTalents>> {
    let shortlisted = state
        .applications
        .list_shortlisted(&employer.id, &JobId::from_string(job_id))
        .await?;
    Ok(Envelope::ok(shortlisted))
}

/// Shortlist or reject an application.
pub async fn update_application_status(
    State(state): State<AppState>,
    employer: CurrentEmployer,
    Path(application_id): Path<String>,
    JsonBody(body): JsonBody<StatusUpdateRequest>,
) -> ApiResult<Envelope<Application>> {
    let updated = state
        .applications
        .update_application_status(&employer.id, &application_id, &body.status)
        .await?;
    Ok(Envelope::ok(updated))
}

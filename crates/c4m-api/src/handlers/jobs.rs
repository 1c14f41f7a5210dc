//! Job posting handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;

use c4m_models::{Clock, JobDraft, JobId, JobPosting};

use crate::auth::CurrentEmployer;
use crate::envelope::Envelope;
use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::state::AppState;

/// A posting with its remaining lifetime rendered for display.
#[derive(Debug, Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub job: JobPosting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<String>,
}

impl JobView {
    fn new(job: JobPosting, state: &AppState) -> Self {
        let time_remaining = job.time_remaining(state.clock.utc()).map(|t| t.to_string());
        Self {
            job,
            time_remaining,
        }
    }
}

/// List the caller's active jobs; expired ones are removed on the way.
pub async fn list_jobs(
    State(state): State<AppState>,
    employer: CurrentEmployer,
) -> ApiResult<Envelope<Vec<JobView>>> {
    let jobs = state.lifecycle.list_active_jobs(&employer.id).await?;
    Ok(Envelope::ok(
        jobs.into_iter().map(|job| JobView::new(job, &state)).collect(),
    ))
}

pub async fn create_job(
    State(state): State<AppState>,
    employer: CurrentEmployer,
    JsonBody(draft): JsonBody<JobDraft>,
) -> ApiResult<(StatusCode, Envelope<JobView>)> {
    let job = state.jobs.create_job(&employer.id, draft).await?;
    Ok((StatusCode::CREATED, Envelope::ok(JobView::new(job, &state))))
}

pub async fn get_job(
    State(state): State<AppState>,
    employer: CurrentEmployer,
    Path(job_id): Path<String>,
) -> ApiResult<Envelope<JobView>> {
    let job = state
        .jobs
        .get_job(&employer.id, &JobId::from_string(job_id))
        .await?;
    Ok(Envelope::ok(JobView::new(job, &state)))
}

pub async fn update_job(
    State(state): State<AppState>,
    employer: CurrentEmployer,
    Path(job_id): Path<String>,
    JsonBody(draft): JsonBody<JobDraft>,
) -> ApiResult<Envelope<JobView>> {
    let job = state
        .jobs
        .update_job(&employer.id, &JobId::from_string(job_id), draft)
        .await?;
    Ok(Envelope::ok(JobView::new(job, &state)))
}

pub async fn delete_job(
    State(state): State<AppState>,
    employer: CurrentEmployer,
    Path(job_id): Path<String>,
) -> ApiResult<Envelope<()>> {
    state
        .jobs
        .delete_job(&employer.id, &JobId::from_string(job_id))
        .await?;
    Ok(Envelope::done())
}

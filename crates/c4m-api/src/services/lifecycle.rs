//! Active-job listing with lazy removal of expired postings.

use std::sync::Arc;

use tracing::{info, warn};

use c4m_models::{Clock, EmployerId, JobPosting};

use crate::error::ApiResult;
use crate::metrics;
use crate::services::jobs::JobService;

#[derive(Clone)]
pub struct JobLifecycle {
    jobs: JobService,
    clock: Arc<dyn Clock>,
}

impl JobLifecycle {
    pub fn new(jobs: JobService, clock: Arc<dyn Clock>) -> Self {
        Self { jobs, clock }
    }

    /// The owner's postings that have not expired.
    ///
    /// Expired postings are deleted on the way. A failed delete is logged
    /// and the posting is still left out of the result.
    pub async fn list_active_jobs(&self, owner: &EmployerId) -> ApiResult<Vec<JobPosting>> {
        let jobs = self.jobs.list_jobs_by_owner(owner).await?;
        let now = self.clock.utc();

        let mut active = Vec::with_capacity(jobs.len());
        for job in jobs {
            if !job.is_expired_at(now) {
                active.push(job);
                continue;
            }

            match self.jobs.remove_expired(&job).await {
                Ok(()) => {
                    metrics::record_expired_job_reaped("listing");
                    info!(job_id = %job.id, employer = %owner, expires_at = ?job.expires_at, "Deleted expired job");
                }
                Err(e) => {
                    metrics::record_expired_job_delete_failure("listing");
                    warn!(job_id = %job.id, employer = %owner, error = %e, "Failed to delete expired job");
                }
            }
        }

        Ok(active)
    }
}

//! Ownership-checked job record access.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use c4m_firestore::JobRepository;
use c4m_models::{Clock, EmployerId, JobDraft, JobId, JobPosting};

use crate::error::{ApiError, ApiResult};
use crate::services::deadline::within;

#[derive(Clone)]
pub struct JobService {
    repo: JobRepository,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl JobService {
    pub fn new(repo: JobRepository, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            repo,
            clock,
            timeout,
        }
    }

    pub fn repo(&self) -> &JobRepository {
        &self.repo
    }

    /// Validate and persist a new posting owned by `owner`.
    pub async fn create_job(&self, owner: &EmployerId, draft: JobDraft) -> ApiResult<JobPosting> {
        let now = self.clock.utc();
        let fields = draft.into_fields(now)?;
        let job = JobPosting::new(owner.clone(), fields, now);

        within(self.timeout, "create_job", self.repo.create(&job)).await?;
        info!(job_id = %job.id, employer = %owner, "Created job");
        Ok(job)
    }

    pub async fn get_job(&self, owner: &EmployerId, job_id: &JobId) -> ApiResult<JobPosting> {
        self.load_owned(owner, job_id).await
    }

    /// Overwrite the mutable attributes of an owned posting.
    ///
    /// Identity, owner, creation time and counters are preserved.
    pub async fn update_job(
        &self,
        owner: &EmployerId,
        job_id: &JobId,
        draft: JobDraft,
    ) -> ApiResult<JobPosting> {
        let mut job = self.load_owned(owner, job_id).await?;
        job.apply_update(draft.into_fields(self.clock.utc())?);

        within(self.timeout, "update_job", self.repo.update(&job)).await?;
        info!(job_id = %job.id, employer = %owner, "Updated job");
        Ok(job)
    }

    pub async fn delete_job(&self, owner: &EmployerId, job_id: &JobId) -> ApiResult<()> {
        let job = self.load_owned(owner, job_id).await?;
        within(self.timeout, "delete_job", self.repo.delete(&job.id)).await?;
        info!(job_id = %job.id, employer = %owner, "Deleted job");
        Ok(())
    }

    /// Every posting owned by `owner`, expired ones included.
    pub async fn list_jobs_by_owner(&self, owner: &EmployerId) -> ApiResult<Vec<JobPosting>> {
        within(self.timeout, "list_jobs", self.repo.list_by_employer(owner)).await
    }

    /// Delete a posting already known to be expired.
    pub(crate) async fn remove_expired(&self, job: &JobPosting) -> ApiResult<()> {
        within(self.timeout, "delete_expired_job", self.repo.delete(&job.id)).await
    }

    /// The job, if `owner` may act on it.
    ///
    /// `NotFound` and `Forbidden` are distinct for logging only. Both render
    /// as the same 403 response, whether or not the job exists.
    async fn load_owned(&self, owner: &EmployerId, job_id: &JobId) -> ApiResult<JobPosting> {
        let job = within(self.timeout, "get_job", self.repo.get(job_id))
            .await?
            .ok_or_else(|| ApiError::not_found(format!("job {}", job_id)))?;

        if !job.is_owned_by(owner) {
            return Err(ApiError::forbidden(format!(
                "job {} belongs to {}, not {}",
                job_id, job.employer_id, owner
            )));
        }
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clock, draft, intruder, owner, store, TIMEOUT};
    use c4m_models::MutableClock;

    fn service() -> (JobService, Arc<c4m_firestore::InMemoryStore>, Arc<MutableClock>) {
        let store = store();
        let clock = clock();
        let service = JobService::new(JobRepository::new(store.clone()), clock.clone(), TIMEOUT);
        (service, store, clock)
    }

    #[tokio::test]
    async fn test_create_requires_link_unless_in_platform() {
        let (jobs, _, _) = service();
        let mut no_link = draft("Designer");
        no_link.apply_link = None;

        let err = jobs.create_job(&owner(), no_link.clone()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        no_link.allow_in_platform_applications = true;
        let job = jobs.create_job(&owner(), no_link).await.unwrap();
        assert_eq!(job.views, 0);
        assert_eq!(job.clicks, 0);
        assert_eq!(job.created_at, crate::test_support::noon());
    }

    #[tokio::test]
    async fn test_create_surfaces_store_failure() {
        let (jobs, store, _) = service();
        store.set_fail_all(true);
        let err = jobs.create_job(&owner(), draft("Designer")).await.unwrap_err();
        assert!(matches!(err, ApiError::RemoteStore(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_identity_owner_and_counters() {
        let (jobs, _, clock) = service();
        let job = jobs.create_job(&owner(), draft("Designer")).await.unwrap();
        clock.advance(chrono::Duration::days(1));

        let mut change = draft("Senior Designer");
        change.qualities = vec!["Curious".into()];
        let updated = jobs.update_job(&owner(), &job.id, change).await.unwrap();

        assert_eq!(updated.id, job.id);
        assert_eq!(updated.employer_id, owner());
        assert_eq!(updated.created_at, job.created_at);
        assert_eq!(updated.qualities, vec!["Curious".to_string()]);

        let stored = jobs.get_job(&owner(), &job.id).await.unwrap();
        assert_eq!(stored.title, "Senior Designer");
        assert_eq!(stored.qualities, vec!["Curious".to_string()]);
    }

    #[tokio::test]
    async fn test_non_owner_cannot_mutate() {
        let (jobs, _, _) = service();
        let job = jobs.create_job(&owner(), draft("Designer")).await.unwrap();

        let err = jobs
            .update_job(&intruder(), &job.id, draft("Hijacked"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = jobs.delete_job(&intruder(), &job.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let stored = jobs.get_job(&owner(), &job.id).await.unwrap();
        assert_eq!(stored.title, "Designer");
    }

    #[tokio::test]
    async fn test_delete_twice_reports_not_found() {
        let (jobs, _, _) = service();
        let job = jobs.create_job(&owner(), draft("Designer")).await.unwrap();

        jobs.delete_job(&owner(), &job.id).await.unwrap();
        let err = jobs.delete_job(&owner(), &job.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_missing_job_is_not_found() {
        let (jobs, _, _) = service();
        let err = jobs
            .update_job(&owner(), &JobId::from("ghost"), draft("Designer"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let (jobs, _, _) = service();
        jobs.create_job(&owner(), draft("A")).await.unwrap();
        jobs.create_job(&owner(), draft("B")).await.unwrap();
        jobs.create_job(&intruder(), draft("C")).await.unwrap();

        assert_eq!(jobs.list_jobs_by_owner(&owner()).await.unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_hits_deadline() {
        let (jobs, store, _) = service();
        store.set_latency(Some(Duration::from_secs(30))).await;
        let err = jobs.list_jobs_by_owner(&owner()).await.unwrap_err();
        assert!(matches!(err, ApiError::RemoteStore(_)));
    }

    #[tokio::test]
    async fn test_missing_and_foreign_jobs_render_alike() {
        let (jobs, _, _) = service();
        let theirs = jobs.create_job(&owner(), draft("Designer")).await.unwrap();
        let ghost = JobId::from_string("ghost");

        let missing = jobs.update_job(&intruder(), &ghost, draft("Ghost")).await.unwrap_err();
        let foreign = jobs.delete_job(&intruder(), &theirs.id).await.unwrap_err();
        assert!(matches!(missing, ApiError::NotFound(_)));
        assert!(matches!(foreign, ApiError::Forbidden(_)));
        assert_eq!(missing.status_code(), foreign.status_code());
    }
}

//! Applications received for an employer's postings.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use c4m_firestore::{ApplicationRepository, TalentNotificationRepository, TalentRepository};
use c4m_models::{
    Application, ApplicationStatus, ApplicationView, Clock, EmployerId, JobId, JobPosting,
    TalentNotification, TalentSummary,
};

use crate::error::{ApiError, ApiResult};
use crate::services::deadline::within;
use crate::services::jobs::JobService;

/// A posting together with its enriched applications.
#[derive(Debug, Serialize)]
pub struct JobApplications {
    pub job: JobPosting,
    pub applications: Vec<ApplicationView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortlistedTalent {
    pub application_id: String,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShortlistedTalents {
    pub job_title: String,
    pub talents: Vec<ShortlistedTalent>,
}

#[derive(Clone)]
pub struct ApplicationService {
    jobs: JobService,
    applications: ApplicationRepository,
    talents: TalentRepository,
    talent_notifications: TalentNotificationRepository,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl ApplicationService {
    pub fn new(
        jobs: JobService,
        applications: ApplicationRepository,
        talents: TalentRepository,
        talent_notifications: TalentNotificationRepository,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            jobs,
            applications,
            talents,
            talent_notifications,
            clock,
            timeout,
        }
    }

    /// Applications for an owned posting, newest first, with talent details.
    pub async fn list_applications(
        &self,
        owner: &EmployerId,
        job_id: &JobId,
    ) -> ApiResult<JobApplications> {
        let job = self.jobs.get_job(owner, job_id).await?;
        let mut applications = self.applications_for(&job.id).await?;
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let applications = join_all(applications.into_iter().map(|application| async move {
            let talent = self.find_talent(&application.talent_id).await;
            ApplicationView {
                application,
                talent,
            }
        }))
        .await;

        Ok(JobApplications { job, applications })
    }

    /// Contact details of shortlisted applicants for an owned posting.
    pub async fn list_shortlisted(
        &self,
        owner: &EmployerId,
        job_id: &JobId,
    ) -> ApiResult<ShortlistedTalents> {
        let job = self.jobs.get_job(owner, job_id).await?;
        let shortlisted: Vec<Application> = self
            .applications_for(&job.id)
            .await?
            .into_iter()
            .filter(|a| a.status == ApplicationStatus::Shortlisted)
            .collect();

        let talents = join_all(shortlisted.iter().map(|application| async move {
            self.find_talent(&application.talent_id)
                .await
                .map(|talent| ShortlistedTalent {
                    application_id: application.id.clone(),
                    name: talent.name,
                    email: talent.email,
                })
        }))
        .await
        .into_iter()
        .flatten()
        .collect();

        Ok(ShortlistedTalents {
            job_title: job.title,
            talents,
        })
    }

    /// Record a shortlist or reject decision and tell the applicant.
    pub async fn update_application_status(
        &self,
        owner: &EmployerId,
        application_id: &str,
        status: &str,
    ) -> ApiResult<Application> {
        let status = ApplicationStatus::parse_decision(status)?;

        let application = within(
            self.timeout,
            "get_application",
            self.applications.get(application_id),
        )
        .await?
        .ok_or_else(|| ApiError::not_found(format!("application {}", application_id)))?;

        if !application.is_owned_by(owner) {
            return Err(ApiError::forbidden(format!(
                "application {} belongs to {}, not {}",
                application_id, application.employer_id, owner
            )));
        }

        let updated = within(
            self.timeout,
            "set_application_status",
            self.applications.set_status(application_id, status),
        )
        .await?;
        info!(application_id, status = %status, employer = %owner, "Application status updated");

        let notice = TalentNotification::status_update(
            updated.talent_id.clone(),
            updated.job_id.clone(),
            updated.id.clone(),
            status,
            self.clock.utc(),
        );
        if let Err(e) = within(
            self.timeout,
            "notify_talent",
            self.talent_notifications.create(&notice),
        )
        .await
        {
            warn!(application_id, talent_id = %updated.talent_id, error = %e, "Failed to notify talent");
        }

        Ok(updated)
    }

    async fn applications_for(&self, job_id: &JobId) -> ApiResult<Vec<Application>> {
        within(
            self.timeout,
            "list_applications",
            self.applications.list_by_job(job_id),
        )
        .await
    }

    /// Talent details, or `None` when missing or unreadable.
    async fn find_talent(&self, talent_id: &str) -> Option<TalentSummary> {
        match within(self.timeout, "get_talent", self.talents.find(talent_id)).await {
            Ok(talent) => talent,
            Err(e) => {
                warn!(talent_id, error = %e, "Talent lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clock, draft, intruder, owner, store, TIMEOUT};
    use c4m_firestore::{DocumentStore, Fields, InMemoryStore, ToFirestoreValue};
    use chrono::Duration as ChronoDuration;

    struct Fixture {
        service: ApplicationService,
        jobs: JobService,
        applications: ApplicationRepository,
        store: Arc<InMemoryStore>,
    }

    fn fixture() -> Fixture {
        let store = store();
        let clock = clock();
        let jobs = JobService::new(
            c4m_firestore::JobRepository::new(store.clone()),
            clock.clone(),
            TIMEOUT,
        );
        let applications = ApplicationRepository::new(store.clone());
        let service = ApplicationService::new(
            jobs.clone(),
            applications.clone(),
            TalentRepository::new(store.clone()),
            TalentNotificationRepository::new(store.clone()),
            clock,
            TIMEOUT,
        );
        Fixture {
            service,
            jobs,
            applications,
            store,
        }
    }

    async fn apply(f: &Fixture, id: &str, job: &JobPosting, talent: &str, minutes: i64) {
        f.applications
            .create(&Application {
                id: id.into(),
                job_id: job.id.clone(),
                talent_id: talent.into(),
                employer_id: job.employer_id.clone(),
                status: ApplicationStatus::Pending,
                viewed_by_employer: false,
                created_at: crate::test_support::noon() + ChronoDuration::minutes(minutes),
                cover_letter: None,
            })
            .await
            .unwrap();
    }

    async fn talent(f: &Fixture, talent_id: &str, name: &str) {
        let mut fields = Fields::new();
        fields.insert("talentId".into(), talent_id.to_firestore_value());
        fields.insert("fullname".into(), name.to_firestore_value());
        fields.insert("email".into(), format!("{}@mail.test", talent_id).to_firestore_value());
        f.store
            .create("talents", &format!("doc-{}", talent_id), fields)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_enriches_with_talent_and_orders_newest_first() {
        let f = fixture();
        let job = f.jobs.create_job(&owner(), draft("Designer")).await.unwrap();
        talent(&f, "t-1", "Ama").await;
        apply(&f, "a-old", &job, "t-1", 0).await;
        apply(&f, "a-new", &job, "t-missing", 5).await;

        let listed = f.service.list_applications(&owner(), &job.id).await.unwrap();
        assert_eq!(listed.job.id, job.id);
        assert_eq!(listed.applications.len(), 2);
        assert_eq!(listed.applications[0].application.id, "a-new");
        assert!(listed.applications[0].talent.is_none());
        assert_eq!(listed.applications[1].talent.as_ref().unwrap().name, "Ama");

        let err = f.service.list_applications(&intruder(), &job.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_invalid_status_is_validation_error() {
        let f = fixture();
        let job = f.jobs.create_job(&owner(), draft("Designer")).await.unwrap();
        apply(&f, "a-1", &job, "t-1", 0).await;

        for bad in ["pending", "accepted", ""] {
            let err = f
                .service
                .update_application_status(&owner(), "a-1", bad)
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{}", bad);
        }
    }

    #[tokio::test]
    async fn test_status_update_checks_owner_and_notifies_talent() {
        let f = fixture();
        let job = f.jobs.create_job(&owner(), draft("Designer")).await.unwrap();
        apply(&f, "a-1", &job, "t-1", 0).await;

        let err = f
            .service
            .update_application_status(&intruder(), "a-1", "shortlisted")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(f.store.count("talent_notifications").await, 0);

        let updated = f
            .service
            .update_application_status(&owner(), "a-1", "shortlisted")
            .await
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Shortlisted);
        assert!(updated.viewed_by_employer);
        assert_eq!(f.store.count("talent_notifications").await, 1);

        let err = f
            .service
            .update_application_status(&owner(), "ghost", "rejected")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_shortlisted_skips_unknown_talents() {
        let f = fixture();
        let job = f.jobs.create_job(&owner(), draft("Designer")).await.unwrap();
        talent(&f, "t-1", "Ama").await;
        apply(&f, "a-1", &job, "t-1", 0).await;
        apply(&f, "a-2", &job, "t-ghost", 1).await;
        apply(&f, "a-3", &job, "t-1", 2).await;
        for id in ["a-1", "a-2"] {
            f.service
                .update_application_status(&owner(), id, "shortlisted")
                .await
                .unwrap();
        }

        let shortlisted = f.service.list_shortlisted(&owner(), &job.id).await.unwrap();
        assert_eq!(shortlisted.job_title, "Designer");
        assert_eq!(
            shortlisted.talents,
            vec![ShortlistedTalent {
                application_id: "a-1".into(),
                name: "Ama".into(),
                email: Some("t-1@mail.test".into()),
            }]
        );
    }
}

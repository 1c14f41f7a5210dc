//! Repository for job posting documents.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use c4m_models::{parse_expiry, EmployerId, JobId, JobPosting};

use crate::error::{FirestoreError, FirestoreResult};
use crate::store::{DocumentStore, Query};
use crate::types::{Document, Fields, ToFirestoreValue, Value};

pub const JOBS_COLLECTION: &str = "jobs";

/// Stored field names.
mod field {
    pub const EMPLOYER: &str = "employer";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const LOCATION: &str = "location";
    pub const APPLY_LINK: &str = "applylink";
    pub const ALLOW_APPLICATIONS: &str = "allowCareer4MeApplications";
    pub const JOB_TYPE: &str = "jobtype";
    pub const WORK_ENVIRONMENT: &str = "workenvironment";
    pub const SENIORITY: &str = "seniorityLevel";
    pub const INDUSTRY: &str = "industry";
    pub const SKILLS: &str = "skills";
    pub const DEGREES: &str = "requiredDegrees";
    pub const CERTIFICATIONS: &str = "suggestedCertifications";
    pub const RESPONSIBILITIES: &str = "responsibilities";
    pub const QUALITIES: &str = "qualities";
    pub const RELATED_PATHS: &str = "relatedpaths";
    pub const UPLOADED: &str = "dateofUpload";
    pub const EXPIRY: &str = "expiryDate";
    pub const VIEWS: &str = "numViews";
    pub const CLICKS: &str = "numClicks";
}

/// Fields an owner may change after creation.
const MUTABLE_FIELDS: &[&str] = &[
    field::NAME,
    field::DESCRIPTION,
    field::LOCATION,
    field::APPLY_LINK,
    field::ALLOW_APPLICATIONS,
    field::JOB_TYPE,
    field::WORK_ENVIRONMENT,
    field::SENIORITY,
    field::INDUSTRY,
    field::SKILLS,
    field::DEGREES,
    field::CERTIFICATIONS,
    field::RESPONSIBILITIES,
    field::QUALITIES,
    field::RELATED_PATHS,
    field::EXPIRY,
];

#[derive(Clone)]
pub struct JobRepository {
    store: Arc<dyn DocumentStore>,
}

impl JobRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, job_id: &JobId) -> FirestoreResult<Option<JobPosting>> {
        match self.store.get(JOBS_COLLECTION, job_id.as_str()).await? {
            Some(doc) => Ok(Some(document_to_job(&doc)?)),
            None => Ok(None),
        }
    }

    pub async fn create(&self, job: &JobPosting) -> FirestoreResult<()> {
        self.store
            .create(JOBS_COLLECTION, job.id.as_str(), job_to_fields(job))
            .await?;
        info!(job_id = %job.id, employer = %job.employer_id, "Created job posting");
        Ok(())
    }

    /// Persist the mutable attributes of `job`.
    ///
    /// Owner, creation time and counters are outside the mask and never written.
    pub async fn update(&self, job: &JobPosting) -> FirestoreResult<()> {
        let mut fields = job_to_fields(job);
        fields.retain(|k, _| MUTABLE_FIELDS.contains(&k.as_str()));
        let mask = MUTABLE_FIELDS.iter().map(|f| f.to_string()).collect();

        self.store
            .update(JOBS_COLLECTION, job.id.as_str(), fields, Some(mask))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, job_id: &JobId) -> FirestoreResult<()> {
        self.store.delete(JOBS_COLLECTION, job_id.as_str()).await
    }

    /// All postings owned by `employer`, in no particular order.
    pub async fn list_by_employer(&self, employer: &EmployerId) -> FirestoreResult<Vec<JobPosting>> {
        let docs = self
            .store
            .query(
                JOBS_COLLECTION,
                Query::new().where_eq(field::EMPLOYER, employer.as_str()),
            )
            .await?;
        Ok(parse_all(&docs))
    }

    /// Postings whose stored expiry is before `cutoff`.
    pub async fn list_expiring_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> FirestoreResult<Vec<JobPosting>> {
        let docs = self
            .store
            .query(
                JOBS_COLLECTION,
                Query::new().where_lt(field::EXPIRY, cutoff).limit(limit),
            )
            .await?;
        Ok(parse_all(&docs))
    }
}

fn parse_all(docs: &[Document]) -> Vec<JobPosting> {
    docs.iter()
        .filter_map(|doc| match document_to_job(doc) {
            Ok(job) => Some(job),
            Err(e) => {
                warn!(doc = ?doc.name, error = %e, "Skipping unreadable job document");
                None
            }
        })
        .collect()
}

fn job_to_fields(job: &JobPosting) -> Fields {
    let mut f = Fields::new();
    f.insert(field::EMPLOYER.into(), job.employer_id.as_str().to_firestore_value());
    f.insert(field::NAME.into(), job.title.to_firestore_value());
    f.insert(field::DESCRIPTION.into(), job.description.to_firestore_value());
    f.insert(field::LOCATION.into(), job.location.to_firestore_value());
    f.insert(
        field::APPLY_LINK.into(),
        job.apply_link.clone().unwrap_or_default().to_firestore_value(),
    );
    f.insert(
        field::ALLOW_APPLICATIONS.into(),
        job.allow_in_platform_applications.to_firestore_value(),
    );
    f.insert(field::JOB_TYPE.into(), job.job_type.as_str().to_firestore_value());
    f.insert(
        field::WORK_ENVIRONMENT.into(),
        job.work_environment.as_str().to_firestore_value(),
    );
    f.insert(field::SENIORITY.into(), job.seniority_level.as_str().to_firestore_value());
    f.insert(field::INDUSTRY.into(), job.industry.as_str().to_firestore_value());
    f.insert(field::SKILLS.into(), job.skills.to_firestore_value());
    f.insert(field::DEGREES.into(), job.required_degrees.to_firestore_value());
    f.insert(
        field::CERTIFICATIONS.into(),
        job.suggested_certifications.to_firestore_value(),
    );
    f.insert(field::RESPONSIBILITIES.into(), job.responsibilities.to_firestore_value());
    f.insert(field::QUALITIES.into(), job.qualities.to_firestore_value());
    f.insert(field::RELATED_PATHS.into(), job.related_paths.to_firestore_value());
    f.insert(field::UPLOADED.into(), job.created_at.to_firestore_value());
    f.insert(field::EXPIRY.into(), job.expires_at.to_firestore_value());
    f.insert(field::VIEWS.into(), job.views.to_firestore_value());
    f.insert(field::CLICKS.into(), job.clicks.to_firestore_value());
    f
}

/// Read a stored expiry. Timestamps and date strings are accepted;
/// anything unreadable means "no expiry".
fn stored_expiry(doc: &Document) -> Option<DateTime<Utc>> {
    match doc.field(field::EXPIRY)? {
        Value::TimestampValue(s) | Value::StringValue(s) => parse_expiry(s),
        _ => None,
    }
}

fn document_to_job(doc: &Document) -> FirestoreResult<JobPosting> {
    let id = doc
        .id()
        .ok_or_else(|| FirestoreError::invalid_document("job document has no name"))?;
    let employer: String = doc
        .get(field::EMPLOYER)
        .ok_or_else(|| FirestoreError::invalid_document(format!("job {} has no employer", id)))?;

    let created_at = doc
        .get::<DateTime<Utc>>(field::UPLOADED)
        .or_else(|| {
            doc.create_time
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc))
        })
        .ok_or_else(|| {
            FirestoreError::invalid_document(format!("job {} has no upload date", id))
        })?;

    let text = |key: &str| doc.get::<String>(key).unwrap_or_default();
    let list = |key: &str| doc.get::<Vec<String>>(key).unwrap_or_default();

    Ok(JobPosting {
        id: JobId::from_string(id),
        employer_id: EmployerId::from(employer),
        title: text(field::NAME),
        description: text(field::DESCRIPTION),
        location: text(field::LOCATION),
        apply_link: doc
            .get::<String>(field::APPLY_LINK)
            .filter(|link| !link.trim().is_empty()),
        allow_in_platform_applications: doc.get(field::ALLOW_APPLICATIONS).unwrap_or(false),
        job_type: text(field::JOB_TYPE).parse().unwrap_or_default(),
        work_environment: text(field::WORK_ENVIRONMENT).parse().unwrap_or_default(),
        seniority_level: text(field::SENIORITY).parse().unwrap_or_default(),
        industry: text(field::INDUSTRY).parse().unwrap_or_default(),
        skills: list(field::SKILLS),
        required_degrees: list(field::DEGREES),
        suggested_certifications: list(field::CERTIFICATIONS),
        responsibilities: list(field::RESPONSIBILITIES),
        qualities: list(field::QUALITIES),
        related_paths: list(field::RELATED_PATHS),
        created_at,
        expires_at: stored_expiry(doc),
        views: doc.get(field::VIEWS).unwrap_or(0),
        clicks: doc.get(field::CLICKS).unwrap_or(0),
    })
}

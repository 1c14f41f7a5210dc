//! Repository for job applications.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use c4m_models::{Application, ApplicationStatus, EmployerId, JobId};

use crate::error::{FirestoreError, FirestoreResult};
use crate::store::{DocumentStore, Query};
use crate::types::{Document, Fields, ToFirestoreValue};

pub const APPLICATIONS_COLLECTION: &str = "applications";

#[derive(Clone)]
pub struct ApplicationRepository {
    store: Arc<dyn DocumentStore>,
}

impl ApplicationRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, application_id: &str) -> FirestoreResult<Option<Application>> {
        match self.store.get(APPLICATIONS_COLLECTION, application_id).await? {
            Some(doc) => Ok(Some(document_to_application(&doc)?)),
            None => Ok(None),
        }
    }

    pub async fn create(&self, application: &Application) -> FirestoreResult<()> {
        let mut f = Fields::new();
        f.insert("jobId".into(), application.job_id.as_str().to_firestore_value());
        f.insert("talentId".into(), application.talent_id.to_firestore_value());
        f.insert("employerId".into(), application.employer_id.as_str().to_firestore_value());
        f.insert("status".into(), application.status.as_str().to_firestore_value());
        f.insert("viewedByEmployer".into(), application.viewed_by_employer.to_firestore_value());
        f.insert("createdAt".into(), application.created_at.to_firestore_value());
        if let Some(letter) = &application.cover_letter {
            f.insert("coverLetter".into(), letter.to_firestore_value());
        }
        self.store
            .create(APPLICATIONS_COLLECTION, &application.id, f)
            .await?;
        Ok(())
    }

    pub async fn list_by_job(&self, job_id: &JobId) -> FirestoreResult<Vec<Application>> {
        self.list(Query::new().where_eq("jobId", job_id.as_str())).await
    }

    pub async fn list_by_employer(&self, employer: &EmployerId) -> FirestoreResult<Vec<Application>> {
        self.list(Query::new().where_eq("employerId", employer.as_str()))
            .await
    }

    async fn list(&self, query: Query) -> FirestoreResult<Vec<Application>> {
        let docs = self.store.query(APPLICATIONS_COLLECTION, query).await?;
        Ok(docs
            .iter()
            .filter_map(|doc| match document_to_application(doc) {
                Ok(app) => Some(app),
                Err(e) => {
                    warn!(doc = ?doc.name, error = %e, "Skipping unreadable application");
                    None
                }
            })
            .collect())
    }

    /// Record an employer decision; also marks the application as viewed.
    pub async fn set_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
    ) -> FirestoreResult<Application> {
        let mut f = Fields::new();
        f.insert("status".into(), status.as_str().to_firestore_value());
        f.insert("viewedByEmployer".into(), true.to_firestore_value());

        let doc = self
            .store
            .update(
                APPLICATIONS_COLLECTION,
                application_id,
                f,
                Some(vec!["status".into(), "viewedByEmployer".into()]),
            )
            .await?;
        document_to_application(&doc)
    }
}

fn document_to_application(doc: &Document) -> FirestoreResult<Application> {
    let id = doc
        .id()
        .ok_or_else(|| FirestoreError::invalid_document("application document has no name"))?;
    let required = |key: &str| {
        doc.get::<String>(key).ok_or_else(|| {
            FirestoreError::invalid_document(format!("application {} has no {}", id, key))
        })
    };

    Ok(Application {
        id: id.to_string(),
        job_id: JobId::from(required("jobId")?),
        talent_id: required("talentId")?,
        employer_id: EmployerId::from(required("employerId")?),
        status: doc
            .get::<String>("status")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default(),
        viewed_by_employer: doc.get("viewedByEmployer").unwrap_or(false),
        created_at: doc
            .get::<DateTime<Utc>>("createdAt")
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        cover_letter: doc.get::<String>("coverLetter").filter(|s| !s.is_empty()),
    })
}

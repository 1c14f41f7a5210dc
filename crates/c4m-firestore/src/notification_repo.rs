//! Repositories for employer and talent notifications.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use c4m_models::{EmployerId, EmployerNotification, JobId, NotificationKind, TalentNotification};

use crate::error::{FirestoreError, FirestoreResult};
use crate::store::{Direction, DocumentStore, Query};
use crate::types::{Document, Fields, ToFirestoreValue};

pub const EMPLOYER_NOTIFICATIONS_COLLECTION: &str = "employer_notifications";
pub const TALENT_NOTIFICATIONS_COLLECTION: &str = "talent_notifications";

/// Shared document body of both notification kinds.
#[allow(clippy::too_many_arguments)]
fn notification_fields(
    owner_key: &str,
    owner: &str,
    kind: NotificationKind,
    title: &str,
    message: &str,
    is_read: bool,
    job_id: Option<&JobId>,
    application_id: Option<&str>,
    created_at: DateTime<Utc>,
) -> Fields {
    let mut f = Fields::new();
    f.insert(owner_key.into(), owner.to_firestore_value());
    f.insert("type".into(), kind.as_str().to_firestore_value());
    f.insert("title".into(), title.to_firestore_value());
    f.insert("message".into(), message.to_firestore_value());
    f.insert("isRead".into(), is_read.to_firestore_value());
    f.insert(
        "relatedJobId".into(),
        job_id.map(|j| j.as_str().to_string()).to_firestore_value(),
    );
    f.insert(
        "relatedApplicationId".into(),
        application_id.map(str::to_string).to_firestore_value(),
    );
    f.insert("createdAt".into(), created_at.to_firestore_value());
    f
}

#[derive(Clone)]
pub struct EmployerNotificationRepository {
    store: Arc<dyn DocumentStore>,
}

impl EmployerNotificationRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, n: &EmployerNotification) -> FirestoreResult<()> {
        let fields = notification_fields(
            "employerId",
            n.employer_id.as_str(),
            n.kind,
            &n.title,
            &n.message,
            n.is_read,
            n.related_job_id.as_ref(),
            n.related_application_id.as_deref(),
            n.created_at,
        );
        self.store
            .create(EMPLOYER_NOTIFICATIONS_COLLECTION, &n.id, fields)
            .await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> FirestoreResult<Option<EmployerNotification>> {
        match self.store.get(EMPLOYER_NOTIFICATIONS_COLLECTION, id).await? {
            Some(doc) => Ok(Some(document_to_employer_notification(&doc)?)),
            None => Ok(None),
        }
    }

    /// Newest notifications first.
    pub async fn list_recent(
        &self,
        employer: &EmployerId,
        limit: u32,
    ) -> FirestoreResult<Vec<EmployerNotification>> {
        let docs = self
            .store
            .query(
                EMPLOYER_NOTIFICATIONS_COLLECTION,
                Query::new()
                    .where_eq("employerId", employer.as_str())
                    .order_by("createdAt", Direction::Descending)
                    .limit(limit),
            )
            .await?;

        Ok(docs
            .iter()
            .filter_map(|doc| match document_to_employer_notification(doc) {
                Ok(n) => Some(n),
                Err(e) => {
                    warn!(doc = ?doc.name, error = %e, "Skipping unreadable notification");
                    None
                }
            })
            .collect())
    }

    pub async fn count_unread(&self, employer: &EmployerId) -> FirestoreResult<u64> {
        let docs = self
            .store
            .query(
                EMPLOYER_NOTIFICATIONS_COLLECTION,
                Query::new()
                    .where_eq("employerId", employer.as_str())
                    .where_eq("isRead", false),
            )
            .await?;
        Ok(docs.len() as u64)
    }

    pub async fn mark_read(&self, id: &str) -> FirestoreResult<()> {
        let mut f = Fields::new();
        f.insert("isRead".into(), true.to_firestore_value());
        self.store
            .update(
                EMPLOYER_NOTIFICATIONS_COLLECTION,
                id,
                f,
                Some(vec!["isRead".into()]),
            )
            .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct TalentNotificationRepository {
    store: Arc<dyn DocumentStore>,
}

impl TalentNotificationRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, n: &TalentNotification) -> FirestoreResult<()> {
        let fields = notification_fields(
            "talentId",
            &n.talent_id,
            n.kind,
            &n.title,
            &n.message,
            n.is_read,
            n.related_job_id.as_ref(),
            n.related_application_id.as_deref(),
            n.created_at,
        );
        self.store
            .create(TALENT_NOTIFICATIONS_COLLECTION, &n.id, fields)
            .await?;
        Ok(())
    }
}

fn document_to_employer_notification(doc: &Document) -> FirestoreResult<EmployerNotification> {
    let id = doc
        .id()
        .ok_or_else(|| FirestoreError::invalid_document("notification document has no name"))?;
    let employer_id: String = doc.get("employerId").ok_or_else(|| {
        FirestoreError::invalid_document(format!("notification {} has no employerId", id))
    })?;
    let kind = doc
        .get::<String>("type")
        .and_then(|t| NotificationKind::parse(&t))
        .ok_or_else(|| {
            FirestoreError::invalid_document(format!("notification {} has unknown type", id))
        })?;

    Ok(EmployerNotification {
        id: id.to_string(),
        employer_id: EmployerId::from(employer_id),
        kind,
        title: doc.get("title").unwrap_or_default(),
        message: doc.get("message").unwrap_or_default(),
        is_read: doc.get("isRead").unwrap_or(false),
        related_job_id: doc.get::<String>("relatedJobId").map(JobId::from),
        related_application_id: doc.get("relatedApplicationId"),
        created_at: doc
            .get::<DateTime<Utc>>("createdAt")
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    })
}

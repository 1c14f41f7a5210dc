//! Repository for employer profile documents.

use std::sync::Arc;

use tracing::info;

use c4m_models::{EmployerId, EmployerProfile};

use crate::error::{FirestoreError, FirestoreResult};
use crate::store::{DocumentStore, Query};
use crate::types::{Document, Fields, ToFirestoreValue};

pub const EMPLOYERS_COLLECTION: &str = "employers";

/// Profile fields that may be written through an update.
pub const PROFILE_FIELDS: &[&str] = &["name", "email", "field", "about", "location", "website", "avatar"];

#[derive(Clone)]
pub struct EmployerRepository {
    store: Arc<dyn DocumentStore>,
}

impl EmployerRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Profile linked to an identity, if one exists.
    pub async fn find_by_employer_id(&self, employer: &EmployerId) -> FirestoreResult<Option<EmployerProfile>> {
        self.find_one(Query::new().where_eq("employerId", employer.as_str()).limit(1))
            .await
    }

    /// Profile registered under `email` (already lower-cased).
    pub async fn find_by_email(&self, email: &str) -> FirestoreResult<Option<EmployerProfile>> {
        self.find_one(Query::new().where_eq("email", email).limit(1)).await
    }

    async fn find_one(&self, query: Query) -> FirestoreResult<Option<EmployerProfile>> {
        let docs = self.store.query(EMPLOYERS_COLLECTION, query).await?;
        docs.first().map(document_to_profile).transpose()
    }

    pub async fn create(&self, profile: &EmployerProfile) -> FirestoreResult<()> {
        let mut f = Fields::new();
        f.insert("employerId".into(), profile.employer_id.as_str().to_firestore_value());
        f.insert("name".into(), profile.name.to_firestore_value());
        f.insert("email".into(), profile.email.to_firestore_value());
        f.insert("field".into(), profile.field.to_firestore_value());
        for (key, value) in [
            ("about", &profile.about),
            ("location", &profile.location),
            ("website", &profile.website),
            ("avatar", &profile.avatar),
        ] {
            if let Some(v) = value {
                f.insert(key.into(), v.to_firestore_value());
            }
        }

        self.store.create(EMPLOYERS_COLLECTION, &profile.id, f).await?;
        info!(employer = %profile.employer_id, "Created employer profile");
        Ok(())
    }

    /// Write the given `(field, value)` pairs and return the stored profile.
    pub async fn update_fields(
        &self,
        doc_id: &str,
        changes: &[(&str, String)],
    ) -> FirestoreResult<EmployerProfile> {
        let mut fields = Fields::new();
        let mut mask = Vec::with_capacity(changes.len());
        for (key, value) in changes {
            if !PROFILE_FIELDS.contains(key) {
                return Err(FirestoreError::request_failed(format!(
                    "field {} is not writable",
                    key
                )));
            }
            fields.insert(key.to_string(), value.to_firestore_value());
            mask.push(key.to_string());
        }

        let doc = self
            .store
            .update(EMPLOYERS_COLLECTION, doc_id, fields, Some(mask))
            .await?;
        document_to_profile(&doc)
    }
}

fn document_to_profile(doc: &Document) -> FirestoreResult<EmployerProfile> {
    let id = doc
        .id()
        .ok_or_else(|| FirestoreError::invalid_document("employer document has no name"))?;
    let employer_id: String = doc.get("employerId").ok_or_else(|| {
        FirestoreError::invalid_document(format!("employer {} has no employerId", id))
    })?;
    let optional = |key: &str| doc.get::<String>(key).filter(|s| !s.is_empty());

    Ok(EmployerProfile {
        id: id.to_string(),
        employer_id: EmployerId::from(employer_id),
        name: doc.get("name").unwrap_or_default(),
        email: doc.get("email").unwrap_or_default(),
        field: doc.get("field").unwrap_or_default(),
        about: optional("about"),
        location: optional("location"),
        website: optional("website"),
        avatar: optional("avatar"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    fn profile() -> EmployerProfile {
        EmployerProfile {
            id: "doc-1".into(),
            employer_id: EmployerId::from("emp-1"),
            name: "Acme".into(),
            email: "hr@acme.test".into(),
            field: "Technology".into(),
            about: None,
            location: Some("Nairobi".into()),
            website: None,
            avatar: None,
        }
    }

    #[tokio::test]
    async fn test_lookup_by_identity_and_email() {
        let repo = EmployerRepository::new(Arc::new(InMemoryStore::new()));
        repo.create(&profile()).await.unwrap();

        let found = repo
            .find_by_employer_id(&EmployerId::from("emp-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, profile());
        assert!(repo.find_by_email("hr@acme.test").await.unwrap().is_some());
        assert!(repo.find_by_email("nobody@acme.test").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_fields_masks_writes() {
        let repo = EmployerRepository::new(Arc::new(InMemoryStore::new()));
        repo.create(&profile()).await.unwrap();

        let updated = repo
            .update_fields("doc-1", &[("about", "We build things".to_string())])
            .await
            .unwrap();
        assert_eq!(updated.about.as_deref(), Some("We build things"));
        assert_eq!(updated.location.as_deref(), Some("Nairobi"));

        assert!(repo
            .update_fields("doc-1", &[("employerId", "emp-2".to_string())])
            .await
            .is_err());
    }
}

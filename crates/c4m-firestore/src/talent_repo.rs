//! Read-only access to talent profiles.

use std::sync::Arc;

use c4m_models::TalentSummary;

use crate::error::FirestoreResult;
use crate::store::{DocumentStore, Query};
use crate::types::Document;

pub const TALENTS_COLLECTION: &str = "talents";

#[derive(Clone)]
pub struct TalentRepository {
    store: Arc<dyn DocumentStore>,
}

impl TalentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Look a talent up by its `talentId` field, then by document id.
    pub async fn find(&self, talent_id: &str) -> FirestoreResult<Option<TalentSummary>> {
        if talent_id.is_empty() {
            return Ok(None);
        }

        let by_field = self
            .store
            .query(
                TALENTS_COLLECTION,
                Query::new().where_eq("talentId", talent_id).limit(1),
            )
            .await?;
        if let Some(doc) = by_field.first() {
            return Ok(Some(document_to_summary(doc, talent_id)));
        }

        Ok(self
            .store
            .get(TALENTS_COLLECTION, talent_id)
            .await?
            .map(|doc| document_to_summary(&doc, talent_id)))
    }
}

fn document_to_summary(doc: &Document, talent_id: &str) -> TalentSummary {
    TalentSummary {
        talent_id: doc
            .get::<String>("talentId")
            .unwrap_or_else(|| talent_id.to_string()),
        name: doc.get("fullname").unwrap_or_default(),
        email: doc.get("email"),
        avatar: doc.get::<String>("avatar").filter(|s| !s.is_empty()),
        career_stage: doc.get("careerStage"),
        selected_path: doc.get("selectedPath"),
        skills: doc.get("skills").unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::types::{Fields, ToFirestoreValue};

    fn talent(name: &str, talent_id: Option<&str>) -> Fields {
        let mut f = Fields::new();
        f.insert("fullname".into(), name.to_firestore_value());
        if let Some(id) = talent_id {
            f.insert("talentId".into(), id.to_firestore_value());
        }
        f.insert("skills".into(), vec!["Figma".to_string()].to_firestore_value());
        f
    }

    #[tokio::test]
    async fn test_find_by_field_then_document_id() {
        let store = Arc::new(InMemoryStore::new());
        store
            .create(TALENTS_COLLECTION, "doc-a", talent("Ama", Some("t-1")))
            .await
            .unwrap();
        store
            .create(TALENTS_COLLECTION, "t-2", talent("Yaw", None))
            .await
            .unwrap();
        let repo = TalentRepository::new(store);

        let ama = repo.find("t-1").await.unwrap().unwrap();
        assert_eq!(ama.name, "Ama");
        assert_eq!(ama.skills, vec!["Figma".to_string()]);

        let yaw = repo.find("t-2").await.unwrap().unwrap();
        assert_eq!(yaw.talent_id, "t-2");

        assert!(repo.find("t-3").await.unwrap().is_none());
        assert!(repo.find("").await.unwrap().is_none());
    }
}

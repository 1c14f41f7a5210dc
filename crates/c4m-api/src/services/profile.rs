//! Employer profile and avatar management.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use c4m_firestore::EmployerRepository;
use c4m_models::{EmployerId, EmployerProfile, ProfileUpdate};
use c4m_storage::{avatar_key, key_from_public_url, ObjectStore};

use crate::error::{ApiError, ApiResult};
use crate::services::deadline::within;

/// Where an uploaded avatar can be fetched.
#[derive(Debug, Clone, Serialize)]
pub struct AvatarUpload {
    pub file_id: String,
    pub file_url: String,
}

#[derive(Clone)]
pub struct ProfileService {
    employers: EmployerRepository,
    objects: Arc<dyn ObjectStore>,
    timeout: Duration,
    avatar_max_bytes: usize,
}

impl ProfileService {
    pub fn new(
        employers: EmployerRepository,
        objects: Arc<dyn ObjectStore>,
        timeout: Duration,
        avatar_max_bytes: usize,
    ) -> Self {
        Self {
            employers,
            objects,
            timeout,
            avatar_max_bytes,
        }
    }

    pub async fn get_profile(&self, owner: &EmployerId) -> ApiResult<EmployerProfile> {
        within(
            self.timeout,
            "get_employer",
            self.employers.find_by_employer_id(owner),
        )
        .await?
        .ok_or_else(|| ApiError::not_found(format!("employer profile for {}", owner)))
    }

    /// Apply the non-blank fields of `update`.
    ///
    /// A replaced avatar is removed from object storage on a best-effort basis.
    pub async fn update_profile(
        &self,
        owner: &EmployerId,
        update: ProfileUpdate,
    ) -> ApiResult<EmployerProfile> {
        let current = self.get_profile(owner).await?;
        let changes = update.changes(&current);
        if changes.is_empty() {
            return Ok(current);
        }

        let updated = within(
            self.timeout,
            "update_employer",
            self.employers.update_fields(&current.id, &changes),
        )
        .await?;
        info!(employer = %owner, fields = changes.len(), "Updated employer profile");

        if updated.avatar != current.avatar {
            if let Some(old) = current.avatar.as_deref() {
                self.discard_avatar(old).await;
            }
        }

        Ok(updated)
    }

    /// Store a new avatar image and return its public URL.
    ///
    /// The profile is not changed; callers follow up with `update_profile`.
    pub async fn upload_avatar(
        &self,
        owner: &EmployerId,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> ApiResult<AvatarUpload> {
        let content_type = content_type
            .map(str::trim)
            .filter(|ct| ct.starts_with("image/"))
            .ok_or_else(|| ApiError::validation("Avatar must be an image"))?;
        if data.is_empty() {
            return Err(ApiError::validation("Avatar file is empty"));
        }
        if data.len() > self.avatar_max_bytes {
            return Err(ApiError::validation(format!(
                "Avatar must be at most {} bytes",
                self.avatar_max_bytes
            )));
        }

        let key = avatar_key();
        let size = data.len();
        within(
            self.timeout,
            "upload_avatar",
            self.objects.put(&key, data, content_type),
        )
        .await?;
        info!(employer = %owner, key = %key, size, "Uploaded avatar");

        let file_url = self.objects.public_url(&key);
        let file_id = key.trim_start_matches(c4m_storage::AVATAR_PREFIX).to_string();
        Ok(AvatarUpload { file_id, file_url })
    }

    async fn discard_avatar(&self, url: &str) {
        let Some(key) = key_from_public_url(self.objects.public_base_url(), url) else {
            warn!(url, "Previous avatar is not in our bucket, leaving it");
            return;
        };
        if let Err(e) = within(self.timeout, "delete_avatar", self.objects.delete(&key)).await {
            warn!(key = %key, error = %e, "Failed to delete previous avatar");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{owner, store, TIMEOUT};
    use c4m_storage::InMemoryObjectStore;

    const BASE: &str = "https://cdn.career4me.test";

    struct Fixture {
        service: ProfileService,
        employers: EmployerRepository,
        objects: Arc<InMemoryObjectStore>,
    }

    async fn fixture(avatar: Option<String>) -> Fixture {
        let employers = EmployerRepository::new(store());
        let objects = Arc::new(InMemoryObjectStore::new(BASE));
        employers
            .create(&EmployerProfile {
                id: "doc-owner".into(),
                employer_id: owner(),
                name: "Acme".into(),
                email: "hr@acme.test".into(),
                field: "Technology".into(),
                about: None,
                location: None,
                website: None,
                avatar,
            })
            .await
            .unwrap();
        Fixture {
            service: ProfileService::new(employers.clone(), objects.clone(), TIMEOUT, 16),
            employers,
            objects,
        }
    }

    #[tokio::test]
    async fn test_missing_profile_is_not_found() {
        let f = fixture(None).await;
        let err = f
            .service
            .get_profile(&EmployerId::from("emp-nobody"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_writes_only_provided_fields() {
        let f = fixture(None).await;
        let update = ProfileUpdate {
            about: Some("  We build tools  ".into()),
            name: Some("   ".into()),
            ..ProfileUpdate::default()
        };
        let updated = f.service.update_profile(&owner(), update).await.unwrap();
        assert_eq!(updated.name, "Acme");
        assert_eq!(updated.about.as_deref(), Some("We build tools"));

        let stored = f.employers.find_by_employer_id(&owner()).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_avatar_replacement_deletes_old_object() {
        let f = fixture(None).await;
        let first = f
            .service
            .upload_avatar(&owner(), vec![1, 2, 3], Some("image/png"))
            .await
            .unwrap();
        f.service
            .update_profile(
                &owner(),
                ProfileUpdate {
                    avatar: Some(first.file_url.clone()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();

        let second = f
            .service
            .upload_avatar(&owner(), vec![4, 5], Some("image/jpeg"))
            .await
            .unwrap();
        assert_eq!(f.objects.len().await, 2);

        let updated = f
            .service
            .update_profile(
                &owner(),
                ProfileUpdate {
                    avatar: Some(second.file_url.clone()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.avatar.as_deref(), Some(second.file_url.as_str()));
        assert_eq!(f.objects.len().await, 1);
        assert!(f
            .objects
            .object(&format!("avatars/{}", second.file_id))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_failed_old_avatar_delete_keeps_update() {
        let f = fixture(Some(format!("{}/avatars/old", BASE))).await;
        f.objects.set_fail_deletes(true);

        let updated = f
            .service
            .update_profile(
                &owner(),
                ProfileUpdate {
                    avatar: Some(format!("{}/avatars/new", BASE)),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.avatar.unwrap().ends_with("/avatars/new"));
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_input() {
        let f = fixture(None).await;
        let cases = [
            (vec![1u8], Some("application/pdf")),
            (vec![1u8], None),
            (Vec::new(), Some("image/png")),
            (vec![0u8; 17], Some("image/png")),
        ];
        for (data, content_type) in cases {
            let err = f
                .service
                .upload_avatar(&owner(), data, content_type)
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)));
        }
        assert!(f.objects.is_empty().await);
    }
}

//! Employer notification feed.

use std::time::Duration;

use serde::Serialize;

use c4m_firestore::EmployerNotificationRepository;
use c4m_models::{EmployerId, EmployerNotification};

use crate::error::{ApiError, ApiResult};
use crate::services::deadline::within;

/// Most recent notifications returned in a feed.
pub const FEED_LIMIT: u32 = 50;

#[derive(Debug, Serialize)]
pub struct NotificationFeed {
    pub notifications: Vec<EmployerNotification>,
    pub unread_count: u64,
}

#[derive(Clone)]
pub struct NotificationService {
    repo: EmployerNotificationRepository,
    timeout: Duration,
}

impl NotificationService {
    pub fn new(repo: EmployerNotificationRepository, timeout: Duration) -> Self {
        Self { repo, timeout }
    }

    pub async fn list_notifications(&self, owner: &EmployerId) -> ApiResult<NotificationFeed> {
        let (notifications, unread_count) = tokio::try_join!(
            within(
                self.timeout,
                "list_notifications",
                self.repo.list_recent(owner, FEED_LIMIT)
            ),
            within(self.timeout, "count_unread", self.repo.count_unread(owner)),
        )?;

        Ok(NotificationFeed {
            notifications,
            unread_count,
        })
    }

    pub async fn mark_notification_read(&self, owner: &EmployerId, id: &str) -> ApiResult<()> {
        let notification = within(self.timeout, "get_notification", self.repo.get(id))
            .await?
            .ok_or_else(|| ApiError::not_found(format!("notification {}", id)))?;

        if !notification.is_owned_by(owner) {
            return Err(ApiError::forbidden(format!(
                "notification {} belongs to {}, not {}",
                id, notification.employer_id, owner
            )));
        }
        if notification.is_read {
            return Ok(());
        }

        within(self.timeout, "mark_notification_read", self.repo.mark_read(id)).await
    }
}

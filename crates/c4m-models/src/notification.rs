//! Employer and talent notifications.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::ApplicationStatus;
use crate::employer::EmployerId;
use crate::job::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewApplication,
    ApplicationStatus,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewApplication => "new_application",
            NotificationKind::ApplicationStatus => "application_status",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new_application" => Some(NotificationKind::NewApplication),
            "application_status" => Some(NotificationKind::ApplicationStatus),
            _ => None,
        }
    }
}

/// Notification addressed to an employer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmployerNotification {
    pub id: String,
    pub employer_id: EmployerId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_job_id: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_application_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EmployerNotification {
    pub fn is_owned_by(&self, employer: &EmployerId) -> bool {
        &self.employer_id == employer
    }
}

/// Notification addressed to a talent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TalentNotification {
    pub id: String,
    pub talent_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_job_id: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_application_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TalentNotification {
    /// Notice sent to an applicant after an employer decision.
    pub fn status_update(
        talent_id: impl Into<String>,
        job_id: JobId,
        application_id: impl Into<String>,
        status: ApplicationStatus,
        now: DateTime<Utc>,
    ) -> Self {
        let (title, message) = match status {
            ApplicationStatus::Shortlisted => (
                "Application Shortlisted!",
                "Congratulations! You have been shortlisted for a position. The employer may contact you soon.",
            ),
            _ => (
                "Application Update",
                "Thank you for your application. Unfortunately, you were not selected for this position.",
            ),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            talent_id: talent_id.into(),
            kind: NotificationKind::ApplicationStatus,
            title: title.to_string(),
            message: message.to_string(),
            is_read: false,
            related_job_id: Some(job_id),
            related_application_id: Some(application_id.into()),
            created_at: now,
        }
    }
}

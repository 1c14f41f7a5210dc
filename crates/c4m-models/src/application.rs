//! Job application models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::employer::EmployerId;
use crate::job::JobId;
use crate::validation::DraftError;

/// Review status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Shortlisted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Parse a status an employer is allowed to set.
    ///
    /// Only `shortlisted` and `rejected` are decisions; `pending` is the
    /// initial state and cannot be set back.
    pub fn parse_decision(s: &str) -> Result<Self, DraftError> {
        match s.parse::<Self>() {
            Ok(status @ (ApplicationStatus::Shortlisted | ApplicationStatus::Rejected)) => Ok(status),
            _ => Err(DraftError::new(
                "Invalid status. Must be \"shortlisted\" or \"rejected\"",
            )),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(ApplicationStatus::Pending),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(DraftError::new(format!("Unknown status: {}", other))),
        }
    }
}

/// An application submitted by a talent for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Application {
    pub id: String,
    pub job_id: JobId,
    pub talent_id: String,
    pub employer_id: EmployerId,

    #[serde(default)]
    pub status: ApplicationStatus,

    #[serde(default)]
    pub viewed_by_employer: bool,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
}

impl Application {
    pub fn is_owned_by(&self, employer: &EmployerId) -> bool {
        &self.employer_id == employer
    }
}

/// Subset of a talent profile shown next to an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TalentSummary {
    pub talent_id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_path: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Application enriched with the applicant's summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,

    /// `None` when the talent record no longer exists
    pub talent: Option<TalentSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decision() {
        assert_eq!(
            ApplicationStatus::parse_decision("shortlisted").unwrap(),
            ApplicationStatus::Shortlisted
        );
        assert_eq!(
            ApplicationStatus::parse_decision("rejected").unwrap(),
            ApplicationStatus::Rejected
        );
        assert!(ApplicationStatus::parse_decision("pending").is_err());
        assert!(ApplicationStatus::parse_decision("hired").is_err());
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&ApplicationStatus::Shortlisted).unwrap(),
            "\"shortlisted\""
        );
    }
}

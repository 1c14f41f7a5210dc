//! Job posting models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::employer::EmployerId;
use crate::expiry::{is_expired, is_valid_future_window, parse_expiry, time_remaining, TimeRemaining};
use crate::validation::{DraftError, DraftResult};

/// Unique identifier for a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Declares a closed set of labels stored verbatim in the document store.
macro_rules! label_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DraftError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| {
                        DraftError::new(format!("Unknown {}: {}", stringify!($name), s))
                    })
            }
        }
    };
}

label_enum! {
    /// Contract type of a posting.
    JobType {
        #[default]
        FullTime => "Full Time",
        PartTime => "Part Time",
        Contract => "Contract",
        Internship => "Internship",
    }
}

label_enum! {
    /// Where the work happens.
    WorkEnvironment {
        #[default]
        InPerson => "In Person",
        Remote => "Remote",
    }
}

label_enum! {
    SeniorityLevel {
        #[default]
        EntryLevel => "Entry-Level",
        MidLevel => "Mid-Level",
        SeniorLevel => "Senior-Level",
    }
}

label_enum! {
    /// Industry a posting is listed under.
    Industry {
        #[default]
        Technology => "Technology",
        Business => "Business",
        Healthcare => "Healthcare",
        Finance => "Finance",
        CreativeArts => "Creative Arts",
        Engineering => "Engineering",
        Science => "Science",
        Education => "Education",
        Environment => "Environment",
    }
}

/// A stored job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobPosting {
    pub id: JobId,

    /// Owning employer. Never taken from client input.
    pub employer_id: EmployerId,

    pub title: String,
    pub description: String,
    pub location: String,

    /// External application URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_link: Option<String>,

    /// Accept applications through the platform
    #[serde(default)]
    pub allow_in_platform_applications: bool,

    #[serde(default)]
    pub job_type: JobType,
    #[serde(default)]
    pub work_environment: WorkEnvironment,
    #[serde(default)]
    pub seniority_level: SeniorityLevel,
    #[serde(default)]
    pub industry: Industry,

    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub required_degrees: Vec<String>,
    #[serde(default)]
    pub suggested_certifications: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub qualities: Vec<String>,
    #[serde(default)]
    pub related_paths: Vec<String>,

    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub clicks: u64,
}

impl JobPosting {
    /// Build a fresh posting from validated fields.
    pub fn new(employer_id: EmployerId, fields: JobFields, now: DateTime<Utc>) -> Self {
        let mut job = Self {
            id: JobId::new(),
            employer_id,
            title: String::new(),
            description: String::new(),
            location: String::new(),
            apply_link: None,
            allow_in_platform_applications: false,
            job_type: JobType::default(),
            work_environment: WorkEnvironment::default(),
            seniority_level: SeniorityLevel::default(),
            industry: Industry::default(),
            skills: Vec::new(),
            required_degrees: Vec::new(),
            suggested_certifications: Vec::new(),
            responsibilities: Vec::new(),
            qualities: Vec::new(),
            related_paths: Vec::new(),
            created_at: now,
            expires_at: None,
            views: 0,
            clicks: 0,
        };
        job.apply_update(fields);
        job
    }

    pub fn is_owned_by(&self, employer: &EmployerId) -> bool {
        &self.employer_id == employer
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        is_expired(self.expires_at, now)
    }

    /// Remaining lifetime, or `None` for postings without an expiry.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<TimeRemaining> {
        self.expires_at.map(|expiry| time_remaining(expiry, now))
    }

    /// Overwrite the mutable attributes.
    ///
    /// Identity, owner, creation time and counters are left untouched.
    pub fn apply_update(&mut self, fields: JobFields) {
        self.title = fields.title;
        self.description = fields.description;
        self.location = fields.location;
        self.apply_link = fields.apply_link;
        self.allow_in_platform_applications = fields.allow_in_platform_applications;
        self.job_type = fields.job_type;
        self.work_environment = fields.work_environment;
        self.seniority_level = fields.seniority_level;
        self.industry = fields.industry;
        self.skills = fields.skills;
        self.required_degrees = fields.required_degrees;
        self.suggested_certifications = fields.suggested_certifications;
        self.responsibilities = fields.responsibilities;
        self.qualities = fields.qualities;
        self.related_paths = fields.related_paths;
        self.expires_at = fields.expires_at;
    }
}

/// Validated mutable attributes of a posting.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFields {
    pub title: String,
    pub description: String,
    pub location: String,
    pub apply_link: Option<String>,
    pub allow_in_platform_applications: bool,
    pub job_type: JobType,
    pub work_environment: WorkEnvironment,
    pub seniority_level: SeniorityLevel,
    pub industry: Industry,
    pub skills: Vec<String>,
    pub required_degrees: Vec<String>,
    pub suggested_certifications: Vec<String>,
    pub responsibilities: Vec<String>,
    pub qualities: Vec<String>,
    pub related_paths: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Posting as submitted by an employer for create or update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Validate)]
#[validate(schema(function = "validate_apply_link", skip_on_field_errors = false))]
pub struct JobDraft {
    #[validate(length(min = 1, max = 200, message = "Job title is required"))]
    #[serde(default)]
    pub title: String,

    #[validate(length(min = 1, max = 20000, message = "Job description is required"))]
    #[serde(default)]
    pub description: String,

    #[validate(length(min = 1, max = 200, message = "Job location is required"))]
    #[serde(default)]
    pub location: String,

    #[validate(url(message = "Application link must be a valid URL"))]
    #[serde(default)]
    pub apply_link: Option<String>,

    #[serde(default)]
    pub allow_in_platform_applications: bool,

    #[serde(default)]
    pub job_type: JobType,
    #[serde(default)]
    pub work_environment: WorkEnvironment,
    #[serde(default)]
    pub seniority_level: SeniorityLevel,
    /// Defaults to Technology when omitted.
    #[serde(default)]
    pub industry: Option<Industry>,

    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub required_degrees: Vec<String>,
    #[serde(default)]
    pub suggested_certifications: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub qualities: Vec<String>,
    #[serde(default)]
    pub related_paths: Vec<String>,

    /// Raw expiry input; see [`parse_expiry`] for accepted formats.
    #[serde(default)]
    pub expires_at: Option<String>,
}

fn validate_apply_link(draft: &JobDraft) -> Result<(), ValidationError> {
    if !draft.allow_in_platform_applications && draft.apply_link.is_none() {
        let mut err = ValidationError::new("apply_link_required");
        err.message =
            Some("Application link is required when in-platform applications are disabled".into());
        return Err(err);
    }
    Ok(())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl JobDraft {
    /// Normalize and validate into storable fields.
    ///
    /// Past or malformed expiry values become "no expiry". A future expiry
    /// more than two months out is rejected.
    pub fn into_fields(self, now: DateTime<Utc>) -> DraftResult<JobFields> {
        let mut draft = self;
        draft.title = draft.title.trim().to_string();
        draft.description = draft.description.trim().to_string();
        draft.location = draft.location.trim().to_string();
        draft.apply_link = draft
            .apply_link
            .map(|link| link.trim().to_string())
            .filter(|link| !link.is_empty());

        draft.validate()?;

        let expires_at = match draft.expires_at.as_deref().and_then(parse_expiry) {
            Some(expiry) if expiry > now => {
                let today = now.date_naive();
                let day = expiry.date_naive();
                if day > today && !is_valid_future_window(day, today) {
                    return Err(DraftError::new(
                        "Expiry date must be no more than two months from today",
                    ));
                }
                Some(expiry)
            }
            _ => None,
        };

        Ok(JobFields {
            title: draft.title,
            description: draft.description,
            location: draft.location,
            apply_link: draft.apply_link,
            allow_in_platform_applications: draft.allow_in_platform_applications,
            job_type: draft.job_type,
            work_environment: draft.work_environment,
            seniority_level: draft.seniority_level,
            industry: draft.industry.unwrap_or_default(),
            skills: clean_list(draft.skills),
            required_degrees: clean_list(draft.required_degrees),
            suggested_certifications: clean_list(draft.suggested_certifications),
            responsibilities: clean_list(draft.responsibilities),
            qualities: clean_list(draft.qualities),
            related_paths: clean_list(draft.related_paths),
            expires_at,
        })
    }
}

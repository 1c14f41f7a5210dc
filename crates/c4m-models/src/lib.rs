//! Shared data models for the Career4Me employer backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job postings, job drafts and their enumerations
//! - Expiry rules (expired, allowed window, time remaining)
//! - Employer profiles and registration input
//! - Applications, talent summaries and notifications
//! - Dashboard analytics

pub mod analytics;
pub mod application;
pub mod clock;
pub mod employer;
pub mod expiry;
pub mod job;
pub mod notification;

mod validation;

// Re-export common types
pub use analytics::{AnalyticsSummary, ApplicationCounts, JobStats};
pub use application::{Application, ApplicationStatus, ApplicationView, TalentSummary};
#[cfg(feature = "test-support")]
pub use clock::MutableClock;
pub use clock::{Clock, ClockExt, DefaultClock};
pub use employer::{
    EmployerId, EmployerProfile, PasswordResetCompletion, PasswordResetRequest, ProfileUpdate,
    Registration, MIN_PASSWORD_LEN,
};
pub use expiry::{is_expired, is_valid_future_window, parse_expiry, time_remaining, TimeRemaining};
pub use job::{
    Industry, JobDraft, JobFields, JobId, JobPosting, JobType, SeniorityLevel, WorkEnvironment,
};
pub use notification::{EmployerNotification, NotificationKind, TalentNotification};
pub use validation::{DraftError, DraftResult};

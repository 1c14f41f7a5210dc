//! Business logic services.

pub mod accounts;
pub mod analytics;
pub mod applications;
pub mod deadline;
pub mod expiry_sweeper;
pub mod jobs;
pub mod lifecycle;
pub mod notifications;
pub mod profile;

pub use accounts::{AccountService, SessionGrant};
pub use analytics::AnalyticsService;
pub use applications::{ApplicationService, JobApplications, ShortlistedTalent, ShortlistedTalents};
pub use expiry_sweeper::ExpirySweeper;
pub use jobs::JobService;
pub use lifecycle::JobLifecycle;
pub use notifications::{NotificationFeed, NotificationService};
pub use profile::{AvatarUpload, ProfileService};

//! Request handlers.

pub mod analytics;
pub mod applications;
pub mod health;
pub mod jobs;
pub mod notifications;
pub mod profile;
pub mod session;

pub use analytics::*;
pub use applications::*;
pub use health::*;
pub use jobs::*;
pub use notifications::*;
pub use profile::*;
pub use session::*;

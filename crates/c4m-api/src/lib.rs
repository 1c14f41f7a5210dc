//! Axum HTTP API for Career4Me employers.
//!
//! This crate provides:
//! - Job posting management with lazy and scheduled expiry cleanup
//! - Application review, notifications, profile and analytics endpoints
//! - Cookie sessions verified against Firebase Auth
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;

pub use auth::{CurrentEmployer, SessionVerifier, VerifiedSession, SESSION_COOKIE};
pub use config::{ApiConfig, StoreBackend};
pub use envelope::Envelope;
pub use error::{ApiError, ApiResult};
pub use identity::{FirebaseIdentity, IdentityProvider, InMemoryIdentity};
pub use routes::create_router;
pub use services::ExpirySweeper;
pub use state::{AppState, Collaborators};

//! Document store access for Career4Me.
//!
//! This crate provides:
//! - A Firestore REST client with token caching, retries and metrics
//! - The [`DocumentStore`] trait and an in-memory implementation
//! - Typed repositories for jobs, employers, applications, notifications
//!   and talents

pub mod application_repo;
pub mod client;
pub mod employer_repo;
pub mod error;
pub mod job_repo;
pub mod memory;
pub mod metrics;
pub mod notification_repo;
pub mod retry;
pub mod store;
pub mod talent_repo;
pub mod token_cache;
pub mod types;

pub use application_repo::ApplicationRepository;
pub use client::{FirestoreClient, FirestoreConfig};
pub use employer_repo::EmployerRepository;
pub use error::{FirestoreError, FirestoreResult};
pub use job_repo::JobRepository;
pub use memory::InMemoryStore;
pub use notification_repo::{EmployerNotificationRepository, TalentNotificationRepository};
pub use retry::RetryConfig;
pub use store::{Direction, DocumentStore, FilterOp, Query};
pub use talent_repo::TalentRepository;
pub use token_cache::TokenSource;
pub use types::{Document, Fields, FromFirestoreValue, ToFirestoreValue, Value};

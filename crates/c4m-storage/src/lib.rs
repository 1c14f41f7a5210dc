//! Object storage for Career4Me.
//!
//! This crate provides:
//! - The [`ObjectStore`] trait used for employer avatars
//! - A Cloudflare R2 (S3 API) implementation
//! - An in-memory implementation for local runs and tests
//! - Avatar key helpers

pub mod avatar;
pub mod client;
pub mod error;
pub mod memory;
pub mod object_store;

pub use avatar::{avatar_key, key_from_public_url, AVATAR_PREFIX};
pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryObjectStore;
pub use object_store::ObjectStore;

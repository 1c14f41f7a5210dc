//! API error types.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, error, warn};

use c4m_firestore::FirestoreError;
use c4m_models::DraftError;
use c4m_storage::StorageError;

use crate::envelope::Envelope;

pub type ApiResult<T> = Result<T, ApiError>;

/// Where unauthenticated callers are sent.
pub const LOGIN_REDIRECT: &str = "/login";

const NOT_PERMITTED: &str = "You are not permitted to perform this action";
const STORE_UNAVAILABLE: &str = "Service temporarily unavailable, please try again";
const INTERNAL: &str = "An internal error occurred";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Remote store error: {0}")]
    RemoteStore(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn remote_store(msg: impl Into<String>) -> Self {
        Self::RemoteStore(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            // Missing and foreign resources are indistinguishable to callers.
            ApiError::Forbidden(_) | ApiError::NotFound(_) => StatusCode::FORBIDDEN,
            ApiError::RemoteStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller.
    fn public_message(&self) -> String {
        match self {
            ApiError::Validation(msg) | ApiError::Unauthenticated(msg) => msg.clone(),
            ApiError::Forbidden(_) | ApiError::NotFound(_) => NOT_PERMITTED.to_string(),
            ApiError::RemoteStore(_) => STORE_UNAVAILABLE.to_string(),
            ApiError::RateLimited => "Rate limit exceeded. Please try again later.".to_string(),
            ApiError::Internal(_) => INTERNAL.to_string(),
        }
    }
}

impl From<FirestoreError> for ApiError {
    fn from(e: FirestoreError) -> Self {
        match e {
            FirestoreError::NotFound(path) => ApiError::NotFound(path),
            FirestoreError::InvalidDocument(msg) => ApiError::Internal(msg),
            other => ApiError::RemoteStore(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        if e.is_remote() {
            ApiError::RemoteStore(e.to_string())
        } else {
            ApiError::Internal(e.to_string())
        }
    }
}

impl From<DraftError> for ApiError {
    fn from(e: DraftError) -> Self {
        ApiError::Validation(e.0)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Validation(msg) => debug!(error = %msg, "Rejected input"),
            ApiError::Unauthenticated(msg) => debug!(error = %msg, "Unauthenticated request"),
            ApiError::NotFound(msg) => debug!(error = %msg, "Resource not found"),
            ApiError::Forbidden(msg) => warn!(error = %msg, "Ownership check failed"),
            ApiError::RemoteStore(msg) => warn!(error = %msg, "Remote store failure"),
            ApiError::RateLimited => {}
            ApiError::Internal(msg) => error!(error = %msg, "Internal error"),
        }

        let mut body = Envelope::failure(self.public_message());
        if matches!(self, ApiError::Unauthenticated(_)) {
            body = body.with_redirect(LOGIN_REDIRECT);
        }

        match self {
            ApiError::RateLimited => (status, [(header::RETRY_AFTER, "1")], body).into_response(),
            _ => (status, body).into_response(),
        }
    }
}

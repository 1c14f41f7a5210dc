//! Deadlines for remote calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// Run `fut`, failing with `RemoteStore` if it outlives `limit`.
pub async fn within<T, E, F>(limit: Duration, operation: &'static str, fut: F) -> ApiResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ApiError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            metrics::record_deadline_exceeded(operation);
            warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "Remote call exceeded its deadline"
            );
            Err(ApiError::remote_store(format!(
                "{} timed out after {:?}",
                operation, limit
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c4m_firestore::FirestoreError;

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_becomes_remote_store_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, FirestoreError>(1)
        };
        let err = within(Duration::from_secs(5), "get_job", slow).await.unwrap_err();
        assert!(matches!(err, ApiError::RemoteStore(_)));
    }

    #[tokio::test]
    async fn test_errors_are_converted() {
        let failing = async { Err::<(), _>(FirestoreError::not_found("jobs/x")) };
        let err = within(Duration::from_secs(5), "get_job", failing).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}

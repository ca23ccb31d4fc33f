//! Query timeout helpers.
//!
//! A hung storage call must surface as a retryable
//! [`StoreError::Unavailable`] instead of blocking the ingestion path
//! forever; the caller re-submits the same event, which is safe under the
//! natural idempotency key.

use super::errors::{StoreError, StoreResult};
use std::time::Duration;
use tokio::time::timeout;

/// Default timeout for single-row queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for transactional writes (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for schema changes, which wait on exclusive locks (30 seconds)
pub const MIGRATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Execute a storage operation with a timeout.
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> StoreResult<T>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(StoreError::Database(e)),
        Err(_) => Err(StoreError::Unavailable(format!(
            "storage operation timed out after {duration:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timeout_surfaces_as_retryable() {
        let err = with_timeout(Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<(), sqlx::Error>(())
        })
        .await
        .unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn fast_operations_pass_through() {
        let value = with_timeout(DEFAULT_QUERY_TIMEOUT, async { Ok::<i32, sqlx::Error>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}

//! Single retry for read-only storage access. Mutations never retry.

use std::future::Future;
use std::time::Duration;

use log::warn;

use crate::backend::domain::errors::DomainError;

pub const READ_RETRY_BACKOFF: Duration = Duration::from_millis(50);

pub async fn with_read_retry<T, F, Fut>(operation: &str, mut read: F) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    match read().await {
        Ok(value) => Ok(value),
        Err(first_error) => {
            warn!("{} failed, retrying once: {}", operation, first_error);
            tokio::time::sleep(READ_RETRY_BACKOFF).await;
            read().await.map_err(DomainError::Storage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_recovers_after_one_failure() {
        let attempts = AtomicUsize::new(0);
        let result = with_read_retry("load", || async {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(anyhow::anyhow!("busy"))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_second_failure() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), DomainError> = with_read_retry("load", || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("gone"))
        })
        .await;
        assert!(matches!(result, Err(DomainError::Storage(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use super::ApiError;

/// Exponential backoff for idempotent requests
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            max_delay_ms: 2000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Run `request` until it succeeds, fails permanently, or attempts run out
    pub async fn execute<F, Fut, T>(&self, mut request: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 0;
        let mut delay_ms = self.initial_delay_ms;

        loop {
            attempt += 1;

            match request().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= self.max_attempts => {
                    tracing::warn!("Giving up after {} attempts: {}", attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!(
                        "Attempt {} failed, retrying in {}ms: {}",
                        attempt,
                        delay_ms,
                        e
                    );

                    sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms =
                        ((delay_ms as f64 * self.backoff_factor) as u64).min(self.max_delay_ms);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig {
            initial_delay_ms: 1,
            max_delay_ms: 2,
            ..RetryConfig::default()
        }
    }

    #[tokio::test]
    async fn test_recovers_from_transient_failures() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;

        let result = fast()
            .execute(move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ApiError::NetworkError("connection refused".to_string()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;

        let result: Result<(), _> = fast()
            .execute(move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::NotFound("/api/config".to_string()))
            })
            .await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stops_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let policy = RetryConfig {
            max_attempts: 2,
            ..fast()
        };

        let result: Result<(), _> = policy
            .execute(move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::ServerError("503".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_attempt_policy() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let policy = RetryConfig {
            max_attempts: 1,
            ..RetryConfig::default()
        };

        let _: Result<(), _> = policy
            .execute(move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::Timeout("slow".to_string()))
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}

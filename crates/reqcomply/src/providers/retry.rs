//! Retry with exponential backoff for provider calls

use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Classify a non-success HTTP status from a model provider
///
/// 429 and 5xx are worth another attempt; any other status is a rejection.
pub fn status_error(provider: &str, status: StatusCode, body: &str) -> Error {
    let message = format!("{} generation failed ({}): {}", provider, status, body);
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Error::provider(message)
    } else {
        Error::ProviderRejected(message)
    }
}

/// Retry an operation up to `max_retries` extra times, doubling the delay
/// after each failure starting from `base_delay`. Errors that are not
/// retryable are returned at once.
pub async fn retry_with_backoff<F, Fut, T>(
    max_retries: u32,
    base_delay: Duration,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                if attempt < max_retries {
                    let delay = base_delay * 2u32.saturating_pow(attempt);
                    tracing::warn!(
                        "Provider call failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::provider("Unknown provider error")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(2, Duration::from_millis(1), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::provider("flaky"))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(1, Duration::from_millis(1), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::provider(format!("attempt {}", n)))
        })
        .await;

        assert!(matches!(result, Err(Error::Provider(ref m)) if m == "attempt 1"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(3, Duration::from_millis(1), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(status_error("Gemini", StatusCode::UNAUTHORIZED, "bad key"))
        })
        .await;

        assert!(matches!(result, Err(Error::ProviderRejected(ref m)) if m.contains("401")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_throttling_is_retried() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(2, Duration::from_millis(1), || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(status_error("Ollama", StatusCode::TOO_MANY_REQUESTS, ""))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_status_classification() {
        for status in [StatusCode::BAD_REQUEST, StatusCode::FORBIDDEN, StatusCode::NOT_FOUND] {
            assert!(!status_error("Gemini", status, "").is_retryable(), "{}", status);
        }
        for status in [
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            assert!(status_error("Gemini", status, "").is_retryable(), "{}", status);
        }
    }
}

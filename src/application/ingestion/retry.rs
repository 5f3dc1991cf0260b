//! Retry handler for external service calls

use std::future::Future;

use log::{error, info, warn};
use tokio::time::{sleep, Duration};

/// Bounded retry with exponential backoff around operations that may fail
/// temporarily
#[derive(Debug)]
pub struct RetryHandler {
    max_attempts: u32,
    base_delay_ms: u64,
}

impl RetryHandler {
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }

    pub fn with_config(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
        }
    }

    /// Execute an operation, retrying with backoff until the attempt budget
    /// is spent. The last error is returned to the caller.
    pub async fn execute<F, Fut, T, E>(&self, operation_name: &str, operation: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!("{} succeeded after {} retries", operation_name, attempt);
                    }
                    return Ok(result);
                }
                Err(e) => {
                    attempt += 1;

                    if attempt >= self.max_attempts {
                        error!(
                            "{} failed after {} attempts: {}",
                            operation_name, self.max_attempts, e
                        );
                        return Err(e);
                    }

                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {}ms",
                        operation_name, attempt, self.max_attempts, e, delay
                    );

                    sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }

    /// Exponential backoff delay for the given attempt number
    fn delay_for_attempt(&self, attempt: u32) -> u64 {
        self.base_delay_ms * (2_u64.pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let retry = RetryHandler::with_config(5, 500);
        assert_eq!(retry.delay_for_attempt(1), 500);
        assert_eq!(retry.delay_for_attempt(2), 1000);
        assert_eq!(retry.delay_for_attempt(3), 2000);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let retry = RetryHandler::with_config(3, 1);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<u32, String> = retry
            .execute("flaky", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("transient".to_string())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_attempt_budget() {
        let retry = RetryHandler::with_config(3, 1);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<u32, String> = retry
            .execute("down", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("still down".to_string())
                }
            })
            .await;

        assert_eq!(result, Err("still down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}

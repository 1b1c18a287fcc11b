use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::ApiError;

/// Token bucket shared by every backend request.
pub struct RateLimiter {
    /// Semaphore for token bucket (capacity = max burst size)
    semaphore: Arc<Semaphore>,
    tokens_per_second: u32,
    max_tokens: u32,
    last_refill: tokio::sync::Mutex<Instant>,
    /// First retry delay; doubles on each further `429`.
    backoff: Duration,
}

impl RateLimiter {
    /// * `tokens_per_second` - sustained requests per second
    /// * `max_tokens` - burst capacity
    pub fn new(tokens_per_second: u32, max_tokens: u32) -> Self {
        let tokens_per_second = tokens_per_second.max(1);
        let max_tokens = max_tokens.max(1);

        Self {
            semaphore: Arc::new(Semaphore::new(max_tokens as usize)),
            tokens_per_second,
            max_tokens,
            last_refill: tokio::sync::Mutex::new(Instant::now()),
            backoff: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Acquire a token, waiting for a refill when the bucket is empty.
    pub async fn acquire(&self) {
        let wait_duration = Duration::from_secs_f64(1.0 / f64::from(self.tokens_per_second));

        loop {
            self.refill_tokens().await;

            match self.semaphore.try_acquire() {
                Ok(permit) => {
                    // Consumed for good; refill_tokens() adds new permits.
                    permit.forget();
                    return;
                }
                Err(tokio::sync::TryAcquireError::NoPermits) => {
                    sleep(wait_duration).await;
                }
                Err(tokio::sync::TryAcquireError::Closed) => {
                    warn!("Rate limiter semaphore closed unexpectedly");
                    sleep(wait_duration).await;
                }
            }
        }
    }

    async fn refill_tokens(&self) {
        let mut last_refill = self.last_refill.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(*last_refill);

        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let tokens_to_add = (elapsed.as_secs_f64() * f64::from(self.tokens_per_second)) as u32;

        if tokens_to_add > 0 {
            let current_tokens = self.semaphore.available_permits() as u32;
            let tokens_needed = self.max_tokens.saturating_sub(current_tokens);
            let tokens_to_add = tokens_to_add.min(tokens_needed);
            *last_refill = now;

            if tokens_to_add > 0 {
                self.semaphore.add_permits(tokens_to_add as usize);
            }
        }
    }

    /// Runs `f` under the limiter, retrying with exponential backoff while the backend
    /// answers `429`.
    pub async fn execute<F, Fut, T>(&self, request_name: &str, mut f: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ApiError>>,
    {
        const MAX_RETRIES: u32 = 3;
        let mut retry_count = 0;
        let mut backoff_duration = self.backoff;

        loop {
            self.acquire().await;

            debug!("Executing rate-limited request: {}", request_name);

            match f().await {
                Ok(result) => {
                    if retry_count > 0 {
                        debug!(
                            "Request succeeded after {} retries: {}",
                            retry_count, request_name
                        );
                    }
                    return Ok(result);
                }
                Err(e) if e.is_rate_limited() && retry_count < MAX_RETRIES => {
                    retry_count += 1;
                    warn!(
                        "Rate limit error for request '{}' (attempt {}/{}), retrying after {:?}",
                        request_name, retry_count, MAX_RETRIES, backoff_duration
                    );
                    sleep(backoff_duration).await;
                    backoff_duration *= 2;
                }
                Err(e) => {
                    if retry_count > 0 {
                        warn!(
                            "Request failed after {} retries: {}",
                            retry_count, request_name
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    pub fn available_tokens(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_rate_limiter_basic() {
        let limiter = RateLimiter::new(10, 20);

        let start = Instant::now();
        limiter.acquire().await;
        let elapsed = start.elapsed();

        assert!(
            elapsed < Duration::from_millis(100),
            "First acquire should be immediate"
        );
        assert_eq!(limiter.available_tokens(), 19);
    }

    #[tokio::test]
    async fn test_rate_limiter_burst() {
        let limiter = RateLimiter::new(10, 5);

        for _ in 0..5 {
            limiter.acquire().await;
        }

        let start = Instant::now();
        limiter.acquire().await;
        let elapsed = start.elapsed();

        // 1 token at 10/sec = 0.1s
        assert!(
            elapsed >= Duration::from_millis(90),
            "Should wait for token refill"
        );
    }

    #[tokio::test]
    async fn test_execute_with_retry() {
        let limiter = RateLimiter::new(10, 20).with_backoff(Duration::from_millis(10));
        let mut attempt = 0;

        let result = limiter
            .execute("test_request", || {
                attempt += 1;
                let attempt = attempt;
                async move {
                    if attempt < 2 {
                        Err(ApiError::RateLimited)
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempt, 2, "Should retry once");
    }

    #[tokio::test]
    async fn test_execute_gives_up_after_max_retries() {
        let limiter = RateLimiter::new(100, 20).with_backoff(Duration::from_millis(1));
        let mut attempt = 0;

        let result: Result<(), _> = limiter
            .execute("always_limited", || {
                attempt += 1;
                async { Err(ApiError::RateLimited) }
            })
            .await;

        assert_eq!(result, Err(ApiError::RateLimited));
        assert_eq!(attempt, 4);
    }

    #[tokio::test]
    async fn test_execute_does_not_retry_other_errors() {
        let limiter = RateLimiter::new(10, 20);
        let mut attempt = 0;

        let result: Result<(), _> = limiter
            .execute("missing", || {
                attempt += 1;
                async { Err(ApiError::NotFound) }
            })
            .await;

        assert_eq!(result, Err(ApiError::NotFound));
        assert_eq!(attempt, 1);
    }
}

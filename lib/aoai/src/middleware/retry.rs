//! Retry policy for transient failures.

use std::time::Duration;

use aoai_core::Deadline;
use bytes::Bytes;
use tokio::time::Sleep;
use tower::retry::Policy;

use crate::{Error, Request, Response};

/// Delay before the first retry; doubled for each following one.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

const MAX_DELAY: Duration = Duration::from_secs(5);

/// Retry policy for [`tower::retry::RetryLayer`].
///
/// Retries:
/// - Connection errors and timeouts
/// - 5xx server errors
/// - 429 Too Many Requests
///
/// Waits with exponential backoff between attempts and gives up once the
/// request [`Deadline`] would pass before the next attempt.
///
/// # Example
///
/// ```ignore
/// use aoai::middleware::{RetryLayer, RetryPolicy};
///
/// let client = HyperClient::builder()
///     .layer(RetryLayer::new(RetryPolicy::new(3)))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    remaining: u32,
    attempt: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Retry at most `max_retries` times.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            remaining: max_retries,
            attempt: 0,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// Change the delay before the first retry.
    #[must_use]
    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    fn should_retry_response(response: &Response<Bytes>) -> bool {
        let status = response.status();
        status >= 500 || status == 429
    }

    fn should_retry_error(error: &Error) -> bool {
        error.is_connection() || error.is_timeout()
    }

    fn backoff(&self) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(self.attempt))
            .min(MAX_DELAY)
    }
}

impl Policy<Request<Bytes>, Response<Bytes>, Error> for RetryPolicy {
    type Future = Sleep;

    fn retry(
        &mut self,
        req: &mut Request<Bytes>,
        result: &mut Result<Response<Bytes>, Error>,
    ) -> Option<Self::Future> {
        if self.remaining == 0 {
            return None;
        }

        let should_retry = match result {
            Ok(response) => Self::should_retry_response(response),
            Err(error) => Self::should_retry_error(error),
        };
        if !should_retry {
            return None;
        }

        let delay = self.backoff();
        if let Some(deadline) = req.extensions().get::<Deadline>()
            && deadline.remaining() <= delay
        {
            return None;
        }

        self.remaining -= 1;
        self.attempt += 1;
        tracing::debug!(
            attempt = self.attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "retrying request"
        );
        Some(tokio::time::sleep(delay))
    }

    fn clone_request(&mut self, req: &Request<Bytes>) -> Option<Request<Bytes>> {
        Some(req.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use aoai_core::Method;

    use super::*;

    fn request() -> Request<Bytes> {
        Request::builder(
            Method::Post,
            url::Url::parse("https://example.openai.azure.com/").expect("url"),
        )
        .build()
    }

    fn status(code: u16) -> Result<Response<Bytes>, Error> {
        Ok(Response::new(code, HashMap::default(), Bytes::new()))
    }

    #[test]
    fn retryable_outcomes() {
        for code in [429, 500, 503] {
            assert!(RetryPolicy::should_retry_response(&Response::new(
                code,
                HashMap::default(),
                Bytes::new()
            )));
        }
        assert!(RetryPolicy::should_retry_error(&Error::connection("refused")));
        assert!(RetryPolicy::should_retry_error(&Error::Timeout));
    }

    #[test]
    fn final_outcomes() {
        for code in [200, 400, 401, 404] {
            assert!(!RetryPolicy::should_retry_response(&Response::new(
                code,
                HashMap::default(),
                Bytes::new()
            )));
        }
        assert!(!RetryPolicy::should_retry_error(&Error::auth("no token")));
    }

    #[tokio::test]
    async fn budget_is_consumed() {
        let mut policy = RetryPolicy::new(2).with_base_delay(Duration::ZERO);
        let mut req = request();

        assert!(policy.retry(&mut req, &mut status(503)).is_some());
        assert!(policy.retry(&mut req, &mut status(503)).is_some());
        assert!(policy.retry(&mut req, &mut status(503)).is_none());
    }

    #[tokio::test]
    async fn expired_deadline_stops_retries() {
        let mut policy = RetryPolicy::new(3);
        let mut req = request();
        req.extensions_mut().insert(Deadline::after(Duration::ZERO));

        assert!(policy.retry(&mut req, &mut status(503)).is_none());
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let mut policy = RetryPolicy::new(10);
        assert_eq!(policy.backoff(), Duration::from_millis(100));
        policy.attempt = 1;
        assert_eq!(policy.backoff(), Duration::from_millis(200));
        policy.attempt = 20;
        assert_eq!(policy.backoff(), MAX_DELAY);
    }
}

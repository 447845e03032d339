//! Retry and back-off controller
//!
//! Drives one logical request through as many attempts as the policy
//! allows. Each attempt resolves fresh authentication headers, so a
//! credential refreshed between attempts is picked up automatically.
//!
//! | Outcome | Action |
//! |---|---|
//! | 429 with reset + `Date` | sleep exactly the reset seconds, retry |
//! | 429 missing either header | protocol error, no sleep |
//! | 503 / 504 | sleep `Retry-After` or exponential back-off, retry |
//! | transport error | exponential back-off, retry |
//! | 401 | invalidate credential, retry once without spending a retry |
//! | 403 | invalidate credential, return |
//! | anything else | return |
//!
//! Exhausted retries return the last response unchanged.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use zscaler_common::time::{Clock, Sleeper};
use zscaler_domain::{RawResponse, RequestDescriptor, Result, ZscalerError};

use crate::auth::AuthProvider;
use crate::http::Transport;

/// Reset headers checked on a 429, in order
const RATE_LIMIT_RESET_HEADERS: [&str; 3] =
    ["x-ratelimit-reset", "x-rate-limit-reset", "ratelimit-reset"];

/// Retry budget derived from `rateLimit` and `requestTimeout`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// First exponential back-off step
    pub base_backoff: Duration,
    /// Budget for the whole sequence, sleeps included; checked after each
    /// sleep so no attempt starts past it
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Exponential delay for the `retry_number`-th retry (1-based)
    pub fn backoff_delay(&self, retry_number: u32) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8);
        self.base_backoff.saturating_mul(1u32 << shift)
    }
}

/// Sends one request through the transport, retrying 429/503/504 and
/// transport failures and refreshing the credential once on a 401
pub struct RetryController {
    transport: Arc<dyn Transport>,
    auth: Arc<dyn AuthProvider>,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for RetryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryController")
            .field("transport", &self.transport)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RetryController {
    /// Controller over `transport`, with `sleeper` and `clock` for delays and
    /// the deadline
    pub fn new(
        transport: Arc<dyn Transport>,
        auth: Arc<dyn AuthProvider>,
        sleeper: Arc<dyn Sleeper>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self { transport, auth, sleeper, clock, policy }
    }

    /// Policy the controller was built with
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Send `request` until it succeeds, fails terminally or runs out of
    /// retries
    ///
    /// # Errors
    /// - `ZscalerError::Protocol` for a 429 without reset or `Date` header
    /// - `ZscalerError::Timeout` when the deadline has passed by the time a
    ///   retry would be sent
    /// - `ZscalerError::Transport` once transport retries are exhausted
    /// - authentication errors from the provider, unchanged
    pub async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse> {
        let started = self.clock.now();
        let method = request.method();
        let url = request.url();
        let correlation_id = request.correlation_id();
        let mut attempt: u32 = 0;
        let mut retries: u32 = 0;
        let mut reauthenticated = false;

        loop {
            attempt += 1;
            let outgoing = request.clone().with_headers(self.auth.auth_headers().await?);
            debug!(%method, url, attempt, %correlation_id, "Sending attempt");

            let delay = match self.transport.send(&outgoing).await {
                Ok(response) => match response.status() {
                    401 if !reauthenticated => {
                        warn!(%method, url, attempt, %correlation_id, "Unauthorized, re-authenticating");
                        self.auth.invalidate().await;
                        reauthenticated = true;
                        Duration::ZERO
                    }
                    403 => {
                        warn!(%method, url, attempt, %correlation_id, "Forbidden, dropping credential");
                        self.auth.invalidate().await;
                        return Ok(response);
                    }
                    429 => {
                        let delay = rate_limit_delay(&response, url)?;
                        if retries >= self.policy.max_retries {
                            warn!(%method, url, attempt, %correlation_id, "Rate limited, retries exhausted");
                            return Ok(response);
                        }
                        warn!(%method, url, attempt, %correlation_id, delay_secs = delay.as_secs_f64(), "Rate limited");
                        retries += 1;
                        delay
                    }
                    503 | 504 => {
                        if retries >= self.policy.max_retries {
                            warn!(%method, url, attempt, %correlation_id, status = response.status(), "Service unavailable, retries exhausted");
                            return Ok(response);
                        }
                        retries += 1;
                        let delay = retry_after(&response)
                            .unwrap_or_else(|| self.policy.backoff_delay(retries));
                        warn!(%method, url, attempt, %correlation_id, status = response.status(), delay_ms = delay.as_millis() as u64, "Service unavailable");
                        delay
                    }
                    status => {
                        debug!(%method, url, attempt, %correlation_id, status, "Attempt finished");
                        return Ok(response);
                    }
                },
                Err(err @ ZscalerError::Transport { .. }) => {
                    if retries >= self.policy.max_retries {
                        warn!(%method, url, attempt, %correlation_id, error = %err, "Transport error, retries exhausted");
                        return Err(err);
                    }
                    retries += 1;
                    let delay = self.policy.backoff_delay(retries);
                    warn!(%method, url, attempt, %correlation_id, error = %err, delay_ms = delay.as_millis() as u64, "Transport error");
                    delay
                }
                Err(err) => return Err(err),
            };

            if !delay.is_zero() {
                self.sleeper.sleep(delay).await;
            }
            // No attempt leaves once the deadline has passed, sleep included
            if self.clock.elapsed_since(started) > self.policy.timeout {
                warn!(%method, url, attempt, %correlation_id, "Request deadline exceeded");
                return Err(ZscalerError::Timeout(self.policy.timeout));
            }
        }
    }
}

/// Back-off demanded by a 429
///
/// The response must carry a reset header (or numeric `Retry-After`) and a
/// valid `Date`; otherwise the server broke the protocol.
fn rate_limit_delay(response: &RawResponse, url: &str) -> Result<Duration> {
    let protocol_error = |message: String| ZscalerError::Protocol {
        status: response.status(),
        url: url.to_string(),
        message,
    };

    let reset = RATE_LIMIT_RESET_HEADERS
        .iter()
        .find_map(|name| response.header(name).and_then(parse_seconds))
        .or_else(|| retry_after(response))
        .ok_or_else(|| protocol_error("429 response without a rate-limit reset header".into()))?;

    match response.header("date") {
        Some(date) => {
            httpdate::parse_http_date(date)
                .map_err(|_| protocol_error(format!("429 response with invalid Date header: {date}")))?;
        }
        None => return Err(protocol_error("429 response without a Date header".into())),
    }

    Ok(reset)
}

fn retry_after(response: &RawResponse) -> Option<Duration> {
    response.header("retry-after").and_then(parse_seconds)
}

fn parse_seconds(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use zscaler_common::testing::{MockClock, RecordingSleeper};
    use zscaler_domain::{HttpMethod, Service};

    use super::*;

    const DATE: &str = "Wed, 21 Oct 2026 07:28:00 GMT";

    /// Transport that replays a fixed script of outcomes
    #[derive(Debug, Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<RawResponse>>>,
        sent: Mutex<Vec<RequestDescriptor>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<RawResponse>>) -> Arc<Self> {
            Arc::new(Self { script: Mutex::new(script.into()), sent: Mutex::default() })
        }

        fn attempts(&self) -> usize {
            self.sent.lock().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse> {
            self.sent.lock().push(request.clone());
            self.script.lock().pop_front().unwrap_or_else(|| Ok(ok()))
        }
    }

    #[derive(Debug, Default)]
    struct CountingAuth {
        invalidations: AtomicUsize,
    }

    #[async_trait]
    impl AuthProvider for CountingAuth {
        async fn auth_headers(&self) -> Result<Vec<(String, String)>> {
            let generation = self.invalidations.load(Ordering::SeqCst);
            Ok(vec![("authorization".into(), format!("Bearer token-{generation}"))])
        }

        async fn invalidate(&self) {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn ok() -> RawResponse {
        RawResponse::new(200, [("content-type", "application/json")], "{}")
    }

    fn status(code: u16, headers: &[(&str, &str)]) -> RawResponse {
        RawResponse::new(code, headers.iter().copied(), "")
    }

    fn transport_err() -> ZscalerError {
        ZscalerError::Transport {
            method: "GET".into(),
            url: "https://api".into(),
            message: "connection reset".into(),
        }
    }

    struct Harness {
        controller: RetryController,
        transport: Arc<ScriptedTransport>,
        auth: Arc<CountingAuth>,
        sleeper: RecordingSleeper,
    }

    fn harness(script: Vec<Result<RawResponse>>, max_retries: u32, timeout: Duration) -> Harness {
        let clock = MockClock::new();
        let sleeper = RecordingSleeper::with_clock(clock.clone());
        let transport = ScriptedTransport::new(script);
        let auth = Arc::new(CountingAuth::default());
        let controller = RetryController::new(
            transport.clone(),
            auth.clone(),
            Arc::new(sleeper.clone()),
            Arc::new(clock),
            RetryPolicy { max_retries, base_backoff: Duration::from_millis(100), timeout },
        );
        Harness { controller, transport, auth, sleeper }
    }

    fn request() -> RequestDescriptor {
        RequestDescriptor::new(HttpMethod::Get, "https://api.zsapi.net/zia/api/v1/users", Service::Zia)
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 2,
            base_backoff: Duration::from_millis(100),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(400));
        assert_eq!(policy.backoff_delay(40), Duration::from_millis(100 * 256));
    }

    /// Validates the 429, 429, 200 sequence.
    ///
    /// Assertions:
    /// - Three attempts are made.
    /// - Exactly two sleeps of the reset value are recorded.
    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let limited = || Ok(status(429, &[("x-ratelimit-reset", "2"), ("date", DATE)]));
        let h = harness(vec![limited(), limited(), Ok(ok())], 2, Duration::from_secs(60));

        let response = h.controller.send(&request()).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(h.transport.attempts(), 3);
        assert_eq!(h.sleeper.recorded(), vec![Duration::from_secs(2), Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_rate_limit_exhausted_returns_last_response() {
        let limited = || Ok(status(429, &[("ratelimit-reset", "1"), ("date", DATE)]));
        let h = harness(vec![limited(), limited(), limited()], 1, Duration::from_secs(60));

        let response = h.controller.send(&request()).await.unwrap();

        assert_eq!(response.status(), 429);
        assert_eq!(h.transport.attempts(), 2);
        assert_eq!(h.sleeper.count(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_uses_numeric_retry_after() {
        let h = harness(
            vec![Ok(status(429, &[("retry-after", "3"), ("date", DATE)])), Ok(ok())],
            2,
            Duration::from_secs(60),
        );
        h.controller.send(&request()).await.unwrap();
        assert_eq!(h.sleeper.recorded(), vec![Duration::from_secs(3)]);
    }

    #[tokio::test]
    async fn test_rate_limit_without_date_is_protocol_error() {
        let h = harness(vec![Ok(status(429, &[("x-rate-limit-reset", "5")]))], 2, Duration::from_secs(60));

        let err = h.controller.send(&request()).await.unwrap_err();

        assert!(matches!(err, ZscalerError::Protocol { status: 429, .. }));
        assert_eq!(h.sleeper.count(), 0);
        assert_eq!(h.transport.attempts(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_without_reset_is_protocol_error() {
        let h = harness(vec![Ok(status(429, &[("date", DATE)]))], 2, Duration::from_secs(60));
        let err = h.controller.send(&request()).await.unwrap_err();
        assert!(matches!(err, ZscalerError::Protocol { .. }));
        assert_eq!(h.sleeper.count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_uses_retry_after_then_backoff() {
        let h = harness(
            vec![
                Ok(status(503, &[("retry-after", "7")])),
                Ok(status(504, &[])),
                Ok(ok()),
            ],
            2,
            Duration::from_secs(60),
        );

        h.controller.send(&request()).await.unwrap();

        assert_eq!(h.sleeper.recorded(), vec![Duration::from_secs(7), Duration::from_millis(200)]);
    }

    #[tokio::test]
    async fn test_transport_errors_retry_then_surface() {
        let h = harness(
            vec![Err(transport_err()), Err(transport_err()), Err(transport_err())],
            2,
            Duration::from_secs(60),
        );

        let err = h.controller.send(&request()).await.unwrap_err();

        assert!(matches!(err, ZscalerError::Transport { .. }));
        assert_eq!(h.transport.attempts(), 3);
        assert_eq!(h.sleeper.recorded(), vec![Duration::from_millis(100), Duration::from_millis(200)]);
    }

    #[tokio::test]
    async fn test_non_retryable_status_returns_immediately() {
        let h = harness(vec![Ok(status(404, &[]))], 2, Duration::from_secs(60));
        let response = h.controller.send(&request()).await.unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(h.transport.attempts(), 1);
    }

    /// Validates re-authentication on 401.
    ///
    /// Assertions:
    /// - The credential is invalidated once and the retry carries the new one.
    /// - The re-authentication does not consume `max_retries`.
    #[tokio::test]
    async fn test_unauthorized_reauthenticates_once() {
        let h = harness(vec![Ok(status(401, &[])), Ok(ok())], 0, Duration::from_secs(60));

        let response = h.controller.send(&request()).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(h.auth.invalidations.load(Ordering::SeqCst), 1);
        let sent = h.transport.sent.lock();
        assert_eq!(sent[0].header("authorization"), Some("Bearer token-0"));
        assert_eq!(sent[1].header("authorization"), Some("Bearer token-1"));
        assert_eq!(h.sleeper.count(), 0);
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_returned() {
        let h = harness(vec![Ok(status(401, &[])), Ok(status(401, &[]))], 2, Duration::from_secs(60));
        let response = h.controller.send(&request()).await.unwrap();
        assert_eq!(response.status(), 401);
        assert_eq!(h.transport.attempts(), 2);
    }

    #[tokio::test]
    async fn test_forbidden_invalidates_without_retry() {
        let h = harness(vec![Ok(status(403, &[]))], 2, Duration::from_secs(60));
        let response = h.controller.send(&request()).await.unwrap();
        assert_eq!(response.status(), 403);
        assert_eq!(h.transport.attempts(), 1);
        assert_eq!(h.auth.invalidations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deadline_stops_retries() {
        let limited = || Ok(status(429, &[("x-ratelimit-reset", "30"), ("date", DATE)]));
        let h = harness(vec![limited(), limited(), limited()], 5, Duration::from_secs(45));

        let err = h.controller.send(&request()).await.unwrap_err();

        assert!(matches!(err, ZscalerError::Timeout(_)));
        // 60s have elapsed after the second sleep, so the third attempt never leaves
        assert_eq!(h.sleeper.count(), 2);
        assert_eq!(h.transport.attempts(), 2);
    }

    #[tokio::test]
    async fn test_retry_within_deadline_is_sent() {
        let limited = || Ok(status(429, &[("x-ratelimit-reset", "30"), ("date", DATE)]));
        let h = harness(vec![limited(), Ok(status(200, &[]))], 5, Duration::from_secs(45));

        let response = h.controller.send(&request()).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(h.transport.attempts(), 2);
    }
}

//! Retry decisions and backoff timing.
//!
//! The sleeper, clock and jitter source are injectable so backoff can be
//! tested deterministically. All three are stateless and safe to share
//! between concurrent tasks.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use super::{Headers, NetworkConfig};

/// Status codes worth another attempt.
pub const RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

const MAX_BACKOFF_SECONDS: f64 = 30.0;
const JITTER_RATIO: f64 = 0.2;
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Waits between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Current wall-clock time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Given a bound `b`, returns an offset in `[-b, b]`.
pub type Jitter = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_seconds: u64,
    sleeper: Arc<dyn Sleeper>,
    clock: Clock,
    jitter: Jitter,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay_seconds", &self.base_delay_seconds)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// A policy for `network` using the real timer, clock and random jitter.
    pub fn new(network: &NetworkConfig) -> Self {
        Self {
            max_attempts: network.max_attempts().max(1),
            base_delay_seconds: network.retry_base_delay_seconds.max(1),
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(Utc::now),
            jitter: Arc::new(|bound| {
                if bound > 0.0 {
                    rand::thread_rng().gen_range(-bound..=bound)
                } else {
                    0.0
                }
            }),
        }
    }

    /// The same collaborators, re-targeted at another network config.
    #[must_use]
    pub fn for_network(&self, network: &NetworkConfig) -> Self {
        Self {
            max_attempts: network.max_attempts().max(1),
            base_delay_seconds: network.retry_base_delay_seconds.max(1),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        self.jitter = Arc::new(jitter);
        self
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_retryable_status(status: u16) -> bool {
        RETRYABLE_STATUS_CODES.contains(&status)
    }

    /// Whether a response with `status` on 1-based `attempt` should be retried.
    pub fn should_retry(&self, status: u16, attempt: u32) -> bool {
        attempt < self.max_attempts && Self::is_retryable_status(status)
    }

    /// How long to wait after the given 1-based `attempt` failed.
    ///
    /// `Retry-After` wins when present and parseable; otherwise exponential
    /// backoff capped at 30s with ±20% jitter.
    pub fn delay(&self, attempt: u32, headers: &Headers) -> Duration {
        let seconds = retry_after(headers)
            .and_then(|value| self.parse_retry_after(value))
            .unwrap_or_else(|| self.backoff_seconds(attempt));

        Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
    }

    pub async fn sleep_before_retry(&self, attempt: u32, headers: &Headers) {
        let delay = self.delay(attempt, headers);
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying after backoff");
        self.sleeper.sleep(delay).await;
    }

    fn backoff_seconds(&self, attempt: u32) -> f64 {
        let exponent = attempt.max(1) - 1;
        let exponential = (self.base_delay_seconds as f64 * 2f64.powi(exponent.min(31) as i32))
            .min(MAX_BACKOFF_SECONDS);
        let bound = exponential * JITTER_RATIO;
        let offset = (self.jitter)(bound).clamp(-bound, bound);
        (exponential + offset).max(0.0)
    }

    fn parse_retry_after(&self, value: &str) -> Option<f64> {
        let trimmed = value.trim();
        if let Ok(seconds) = trimmed.parse::<f64>() {
            return (seconds.is_finite() && seconds >= 0.0).then_some(seconds);
        }

        let date = DateTime::parse_from_rfc2822(trimmed)
            .map(|d| d.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(trimmed, HTTP_DATE_FORMAT).map(|d| d.and_utc())
            })
            .ok()?;

        let remaining = date.signed_duration_since((self.clock)());
        Some((remaining.num_milliseconds() as f64 / 1000.0).max(0.0))
    }
}

fn retry_after(headers: &Headers) -> Option<&str> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("retry-after"))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn policy(retries: i64, base: i64) -> RetryPolicy {
        RetryPolicy::new(&NetworkConfig::clamped(30, retries, base)).with_jitter(|_| 0.0)
    }

    fn headers(name: &str, value: &str) -> Headers {
        let mut headers = Headers::new();
        headers.insert(name.to_string(), value.to_string());
        headers
    }

    #[test]
    fn test_retryable_statuses_retry_while_attempts_remain() {
        let policy = policy(3, 1);
        for status in RETRYABLE_STATUS_CODES {
            for attempt in 1..policy.max_attempts() {
                assert!(policy.should_retry(status, attempt), "{status} @ {attempt}");
            }
            assert!(!policy.should_retry(status, policy.max_attempts()));
        }
    }

    #[test]
    fn test_client_errors_never_retry() {
        let policy = policy(5, 1);
        for status in (400..500).filter(|s| *s != 429) {
            assert!(!policy.should_retry(status, 1), "{status}");
        }
    }

    #[test]
    fn test_max_attempts_is_retries_plus_one() {
        assert_eq!(policy(0, 1).max_attempts(), 1);
        assert_eq!(policy(3, 1).max_attempts(), 4);
    }

    #[test]
    fn test_retry_after_integer_seconds() {
        let policy = policy(3, 1);
        let delay = policy.delay(1, &headers("Retry-After", "7"));
        assert_eq!(delay, Duration::from_secs(7));
    }

    #[test]
    fn test_retry_after_header_name_is_case_insensitive() {
        let policy = policy(3, 1);
        let delay = policy.delay(2, &headers("retry-after", " 3 "));
        assert_eq!(delay, Duration::from_secs(3));
    }

    #[test]
    fn test_retry_after_http_date() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();
        let policy = policy(3, 1).with_clock(move || now);
        let target = now + chrono::Duration::seconds(9);
        let value = target.format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        assert_eq!(policy.delay(1, &headers("Retry-After", &value)), Duration::from_secs(9));
    }

    #[test]
    fn test_retry_after_date_in_past_is_zero() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();
        let policy = policy(3, 1).with_clock(move || now);
        let value = (now - chrono::Duration::seconds(30)).to_rfc2822();

        assert_eq!(policy.delay(1, &headers("Retry-After", &value)), Duration::ZERO);
    }

    #[test]
    fn test_unparseable_retry_after_falls_back_to_backoff() {
        let policy = policy(3, 2);
        let delay = policy.delay(1, &headers("Retry-After", "soon"));
        assert_eq!(delay, Duration::from_secs(2));
    }

    #[test]
    fn test_exponential_backoff_without_jitter() {
        let policy = policy(3, 2);
        assert_eq!(policy.delay(1, &Headers::new()), Duration::from_secs(2));
        assert_eq!(policy.delay(2, &Headers::new()), Duration::from_secs(4));
        assert_eq!(policy.delay(3, &Headers::new()), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_is_capped_at_thirty_seconds() {
        let policy = policy(10, 4);
        assert_eq!(policy.delay(8, &Headers::new()), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_is_bounded_to_twenty_percent() {
        let policy = policy(3, 10).with_jitter(|bound| bound * 5.0);
        assert_eq!(policy.delay(1, &Headers::new()), Duration::from_secs(12));

        let policy = policy.with_jitter(|bound| -bound);
        assert_eq!(policy.delay(1, &Headers::new()), Duration::from_secs(8));
    }

    #[test]
    fn test_default_jitter_stays_in_range() {
        let policy = RetryPolicy::new(&NetworkConfig::clamped(30, 3, 5));
        for _ in 0..50 {
            let delay = policy.delay(1, &Headers::new()).as_secs_f64();
            assert!((4.0..=6.0).contains(&delay), "{delay}");
        }
    }
}

use std::time::{Duration, SystemTime};

use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::{ClientOptions, GrokError};

/// Extra wait added when the peer reset the stream mid-response, giving it
/// time to recover before the next attempt.
const PROTOCOL_ERROR_SURCHARGE: Duration = Duration::from_secs(3);

/// Computes how long to sleep before retry `attempt` (1-based).
///
/// A `Retry-After` hint on a 429 response wins outright. Mid-stream
/// protocol violations pay a fixed surcharge on top of the jittered
/// exponential wait; everything else gets the jittered wait alone.
pub(crate) fn backoff_delay(attempt: u32, error: &GrokError, options: &ClientOptions) -> Duration {
    if let Some(hint) = error.retry_after_hint() {
        return hint;
    }

    let wait = random_exponential(attempt, options.retry_multiplier, options.retry_max_wait);
    if matches!(error, GrokError::Protocol(_)) {
        wait + PROTOCOL_ERROR_SURCHARGE
    } else {
        wait
    }
}

/// Uniform random wait in `[0, exponential_bound(attempt)]`.
fn random_exponential(attempt: u32, multiplier: f64, max_wait: Duration) -> Duration {
    let bound = exponential_bound(attempt, multiplier, max_wait);
    Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..=bound.as_secs_f64()))
}

/// Upper bound of the jittered wait: `min(multiplier * 2^attempt, max_wait)`.
///
/// Non-decreasing in the attempt number; the exponent is capped so large
/// attempt counts cannot overflow the arithmetic.
fn exponential_bound(attempt: u32, multiplier: f64, max_wait: Duration) -> Duration {
    let raw = multiplier.max(0.0) * 2f64.powi(attempt.min(32) as i32);
    Duration::from_secs_f64(raw.min(max_wait.as_secs_f64()))
}

/// Parses a `Retry-After` header: either whole seconds or an HTTP date.
///
/// A date in the past clamps to zero. Values that parse as neither form
/// yield `None` so the caller falls through to generic backoff.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if header.is_empty() {
        return None;
    }

    if header.bytes().all(|b| b.is_ascii_digit()) {
        return header.parse::<u64>().ok().map(Duration::from_secs);
    }

    let date = httpdate::parse_http_date(header).ok()?;
    Some(
        date.duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO),
    )
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

    use super::{backoff_delay, exponential_bound, parse_retry_after};
    use crate::{ClientOptions, GrokError};

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_str(value).expect("header value must be valid"),
        );
        headers
    }

    fn rate_limited(retry_after: Option<Duration>) -> GrokError {
        GrokError::Http {
            status: 429,
            body: String::new(),
            retry_after,
        }
    }

    #[test]
    fn seconds_form_is_exact() {
        assert_eq!(
            parse_retry_after(&headers_with("5")),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn http_date_form_measures_from_now() {
        let date = httpdate::fmt_http_date(SystemTime::now() + Duration::from_secs(10));
        let wait = parse_retry_after(&headers_with(&date)).expect("must parse");
        // fmt_http_date has one-second resolution.
        assert!(wait <= Duration::from_secs(10));
        assert!(wait >= Duration::from_secs(8), "got {wait:?}");
    }

    #[test]
    fn past_http_date_clamps_to_zero() {
        let date = httpdate::fmt_http_date(SystemTime::now() - Duration::from_secs(30));
        assert_eq!(parse_retry_after(&headers_with(&date)), Some(Duration::ZERO));
    }

    #[test]
    fn unparsable_header_is_ignored() {
        assert_eq!(parse_retry_after(&headers_with("soon")), None);
        assert_eq!(parse_retry_after(&headers_with("5.5")), None);
        assert_eq!(parse_retry_after(&HeaderMap::new()), None);
    }

    #[test]
    fn hint_overrides_backoff_on_any_attempt() {
        let options = ClientOptions::default();
        let error = rate_limited(Some(Duration::from_secs(5)));
        for attempt in 1..=5 {
            assert_eq!(
                backoff_delay(attempt, &error, &options),
                Duration::from_secs(5)
            );
        }
    }

    #[test]
    fn rate_limit_without_hint_uses_generic_backoff() {
        let options = ClientOptions::default();
        let wait = backoff_delay(1, &rate_limited(None), &options);
        assert!(wait <= exponential_bound(1, options.retry_multiplier, options.retry_max_wait));
    }

    #[test]
    fn protocol_violation_pays_surcharge() {
        let options = ClientOptions::default();
        let error = GrokError::Protocol("connection reset".to_owned());
        let wait = backoff_delay(1, &error, &options);
        let bound = exponential_bound(1, options.retry_multiplier, options.retry_max_wait);
        assert!(wait >= Duration::from_secs(3), "got {wait:?}");
        assert!(wait <= Duration::from_secs(3) + bound, "got {wait:?}");
    }

    #[test]
    fn generic_wait_stays_within_bound() {
        let options = ClientOptions::default();
        let error = GrokError::Connect("refused".to_owned());
        for attempt in 1..=6 {
            let bound =
                exponential_bound(attempt, options.retry_multiplier, options.retry_max_wait);
            assert!(backoff_delay(attempt, &error, &options) <= bound);
        }
    }

    #[test]
    fn bound_grows_until_capped() {
        let max = Duration::from_secs(10);
        let mut previous = Duration::ZERO;
        for attempt in 1..=10 {
            let bound = exponential_bound(attempt, 1.0, max);
            assert!(bound >= previous);
            assert!(bound <= max);
            previous = bound;
        }
        assert_eq!(exponential_bound(10, 1.0, max), max);
    }
}

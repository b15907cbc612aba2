use std::time::Duration;

/// Status codes worth another attempt.
pub(crate) const RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum GrokError {
    /// Endpoint or credential missing. Never retried; the message carries
    /// setup guidance for the caller to surface as-is.
    #[error("configuration error: {0}")]
    Config(String),
    /// Connection establishment or other network I/O failure.
    #[error("connect error: {0}")]
    Connect(String),
    /// Read or write deadline exceeded.
    #[error("timeout: {0}")]
    Timeout(String),
    /// The peer reset or corrupted the stream after headers were accepted.
    #[error("stream protocol error: {0}")]
    Protocol(String),
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http {
        status: u16,
        body: String,
        /// Server-provided wait hint, captured from `Retry-After` on 429.
        retry_after: Option<Duration>,
    },
    /// Local request construction failure (body serialization, bad URL).
    /// Never retried.
    #[error("request error: {0}")]
    Request(String),
}

impl GrokError {
    /// Whether another attempt is worthwhile.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connect(_) | Self::Timeout(_) | Self::Protocol(_) => true,
            Self::Http { status, .. } => RETRYABLE_STATUS_CODES.contains(status),
            Self::Config(_) | Self::Request(_) => false,
        }
    }

    /// Server wait hint. Only 429 responses carry one.
    pub(crate) fn retry_after_hint(&self) -> Option<Duration> {
        match self {
            Self::Http {
                status: 429,
                retry_after,
                ..
            } => *retry_after,
            _ => None,
        }
    }

    /// Maps an error raised while dispatching the request, before any of
    /// the response body was read.
    pub(crate) fn from_dispatch(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_builder() {
            Self::Request(err.to_string())
        } else {
            Self::Connect(err.to_string())
        }
    }

    /// Maps an error raised while reading the response stream. Headers were
    /// already accepted, so non-timeout failures are protocol violations.
    pub(crate) fn from_stream(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Protocol(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::GrokError;

    #[test]
    fn transient_kinds_are_retryable() {
        assert!(GrokError::Connect("dns failure".to_owned()).is_retryable());
        assert!(GrokError::Timeout("read".to_owned()).is_retryable());
        assert!(GrokError::Protocol("reset".to_owned()).is_retryable());
    }

    #[test]
    fn status_codes_classify() {
        for status in [408u16, 429, 500, 502, 503, 504] {
            let err = GrokError::Http {
                status,
                body: String::new(),
                retry_after: None,
            };
            assert!(err.is_retryable(), "{status} must be retryable");
        }
        for status in [400u16, 401, 403, 404, 422] {
            let err = GrokError::Http {
                status,
                body: String::new(),
                retry_after: None,
            };
            assert!(!err.is_retryable(), "{status} must be fatal");
        }
    }

    #[test]
    fn config_and_request_errors_are_fatal() {
        assert!(!GrokError::Config("missing key".to_owned()).is_retryable());
        assert!(!GrokError::Request("bad url".to_owned()).is_retryable());
    }

    #[test]
    fn retry_after_hint_only_on_429() {
        let hinted = GrokError::Http {
            status: 429,
            body: String::new(),
            retry_after: Some(Duration::from_secs(5)),
        };
        assert_eq!(hinted.retry_after_hint(), Some(Duration::from_secs(5)));

        let other = GrokError::Http {
            status: 503,
            body: String::new(),
            retry_after: Some(Duration::from_secs(5)),
        };
        assert_eq!(other.retry_after_hint(), None);
    }
}

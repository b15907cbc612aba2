use std::time::Duration;

/// Configures retry and timeout behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOptions {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Multiplier for the random exponential backoff.
    pub retry_multiplier: f64,
    /// Cap on a single backoff wait.
    pub retry_max_wait: Duration,
    /// Connection establishment budget.
    pub connect_timeout: Duration,
    /// Budget between reads on the response stream.
    pub read_timeout: Duration,
    /// Request write budget.
    pub write_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_multiplier: 1.0,
            retry_max_wait: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(6),
            read_timeout: Duration::from_secs(120),
            write_timeout: Duration::from_secs(10),
        }
    }
}

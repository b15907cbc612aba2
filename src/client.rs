use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::{header, StatusCode};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::{
    decode::StreamDecoder,
    progress::{NoProgress, Progress},
    prompt,
    retry,
    wire::ChatRequest,
    ClientOptions, GrokError, Result, SearchOptions,
};

/// Default model requested from the chat-completion endpoint.
const DEFAULT_MODEL: &str = "grok-4-fast";

const SETUP_HINT: &str = "set GROK_API_URL to the chat-completion base URL \
(e.g. https://api.x.ai/v1) and GROK_API_KEY to its bearer token";

/// HTTP client for a Grok-style chat-completion search endpoint.
#[derive(Clone)]
pub struct GrokClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    model: String,
    options: ClientOptions,
    progress: Arc<dyn Progress>,
}

impl fmt::Debug for GrokClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrokClient")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("model", &self.model)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl GrokClient {
    /// Creates a client from the endpoint base URL and an API key.
    ///
    /// A missing `Bearer ` prefix on the key is added automatically.
    pub fn new(api_url: impl Into<String>, api_key: impl AsRef<str>) -> Self {
        let authorization = normalize_bearer_authorization(api_key.as_ref());
        Self::new_raw_auth(api_url, authorization)
    }

    /// Creates a client with a full raw authorization header value.
    ///
    /// Example: `"Bearer <token>"` or any custom scheme.
    pub fn new_raw_auth(api_url: impl Into<String>, authorization: impl Into<String>) -> Self {
        let options = ClientOptions::default();
        Self {
            http: build_http(&options),
            api_url: api_url.into(),
            token: authorization.into(),
            model: DEFAULT_MODEL.to_owned(),
            options,
            progress: Arc::new(NoProgress),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `GROK_API_URL` — chat-completion base URL (e.g. `https://api.x.ai/v1`)
    /// - `GROK_API_KEY` — API key (Bearer prefix optional)
    ///
    /// Returns [`GrokError::Config`] with setup guidance if either variable
    /// is missing or empty.
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var("GROK_API_URL").unwrap_or_default();
        let api_key = std::env::var("GROK_API_KEY").unwrap_or_default();
        if api_url.trim().is_empty() {
            return Err(GrokError::Config(format!(
                "GROK_API_URL is not set; {SETUP_HINT}"
            )));
        }
        if api_key.trim().is_empty() {
            return Err(GrokError::Config(format!(
                "GROK_API_KEY is not set; {SETUP_HINT}"
            )));
        }
        Ok(Self::new(api_url, api_key))
    }

    /// Applies client options such as timeouts and retry behavior.
    ///
    /// Rebuilds the underlying HTTP client so the connect and read budgets
    /// take effect.
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.http = build_http(&options);
        self.options = options;
        self
    }

    /// Overrides the model requested from the endpoint.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Attaches a progress sink that receives human-readable status lines.
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// Performs a web search and returns the decoded answer text.
    ///
    /// The platform focus and result-count constraints from `options` are
    /// folded into the outbound prompt.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<String> {
        self.progress.report(&format!("Begin search: {query}"));
        let payload = ChatRequest {
            model: self.model.clone(),
            messages: prompt::search_messages(query, options),
            stream: true,
        };
        let content = self.send_chat_with_retry(&payload).await?;
        self.progress.report("Search finished");
        Ok(content)
    }

    /// Fetches a page through the upstream and returns it as structured
    /// Markdown.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        self.progress.report(&format!("Begin fetch: {url}"));
        let payload = ChatRequest {
            model: self.model.clone(),
            messages: prompt::fetch_messages(url),
            stream: true,
        };
        let content = self.send_chat_with_retry(&payload).await?;
        self.progress.report("Fetch finished");
        Ok(content)
    }

    /// Attempt loop: one streaming request per iteration, with jittered
    /// backoff between retryable failures. The last error is returned
    /// unmodified once attempts are exhausted.
    async fn send_chat_with_retry(&self, payload: &ChatRequest) -> Result<String> {
        let mut attempt = 0usize;
        loop {
            match self.stream_once(payload).await {
                Ok(content) => return Ok(content),
                Err(err) => {
                    if !err.is_retryable() || attempt >= self.options.max_retries {
                        return Err(err);
                    }
                    attempt += 1;
                    let delay = retry::backoff_delay(attempt as u32, &err, &self.options);
                    warn!(
                        attempt,
                        max = self.options.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retryable request failure, backing off"
                    );
                    self.progress.report(&format!(
                        "Retrying in {:.1}s: {err}",
                        delay.as_secs_f64()
                    ));
                    sleep(delay).await;
                }
            }
        }
    }

    /// Executes a single streaming attempt.
    ///
    /// The response (and its connection) is dropped on every exit path; a
    /// fresh decoder per attempt keeps partial output from a failed attempt
    /// out of later results.
    async fn stream_once(&self, payload: &ChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_url.trim_end_matches('/'));
        let dispatch = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, &self.token)
            .header(header::CONTENT_TYPE, "application/json")
            .json(payload)
            .send();
        let response = timeout(self.dispatch_budget(), dispatch)
            .await
            .map_err(|_| {
                GrokError::Timeout(format!(
                    "no response headers within {:?}",
                    self.dispatch_budget()
                ))
            })?
            .map_err(GrokError::from_dispatch)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = (status == StatusCode::TOO_MANY_REQUESTS)
                .then(|| retry::parse_retry_after(response.headers()))
                .flatten();
            let body = response.text().await.unwrap_or_default();
            return Err(GrokError::Http {
                status: status.as_u16(),
                body,
                retry_after,
            });
        }

        let mut decoder = StreamDecoder::new();
        let mut stream = response.bytes_stream();
        let mut pending: Vec<u8> = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(GrokError::from_stream)?;
            pending.extend_from_slice(&chunk);
            while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = pending.drain(..=pos).collect();
                decoder.push_line(&String::from_utf8_lossy(&line));
            }
        }
        if !pending.is_empty() {
            decoder.push_line(&String::from_utf8_lossy(&pending));
        }

        let content = decoder.finish();
        debug!(chars = content.len(), "stream decoded");
        Ok(content)
    }

    /// Wall-clock bound on the dispatch phase (connect, request write,
    /// response headers). reqwest has no standalone write timeout; summing
    /// the three budgets still catches a stalled request write.
    fn dispatch_budget(&self) -> Duration {
        self.options.connect_timeout + self.options.write_timeout + self.options.read_timeout
    }
}

fn build_http(options: &ClientOptions) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(options.connect_timeout)
        .read_timeout(options.read_timeout)
        .build()
        .expect("http client construction must succeed")
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_bearer_authorization, GrokClient};

    #[test]
    fn normalize_bearer_adds_prefix_when_missing() {
        assert_eq!(
            normalize_bearer_authorization("xai-abc123"),
            "Bearer xai-abc123".to_owned()
        );
    }

    #[test]
    fn normalize_bearer_keeps_existing_prefix() {
        assert_eq!(
            normalize_bearer_authorization("bEaReR abc123"),
            "bEaReR abc123".to_owned()
        );
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let client = GrokClient::new("https://api.x.ai/v1", "secret-token");
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }
}

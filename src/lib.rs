//! `grok-search-http` is an async HTTP client for Grok-style chat-completion
//! web search.
//!
//! The crate wraps a `/chat/completions` endpoint that streams its answer as
//! newline-delimited `data:` frames:
//! - [`GrokClient::search`] — web search with optional platform focus
//! - [`GrokClient::fetch`] — page retrieval as structured Markdown
//!
//! Transient failures (connect errors, timeouts, mid-stream resets, and a
//! small set of HTTP status codes) are retried with jittered exponential
//! backoff, honoring `Retry-After` on 429 responses.

mod client;
mod decode;
mod error;
mod options;
mod progress;
mod prompt;
mod retry;
mod wire;

pub use client::GrokClient;
pub use error::GrokError;
pub use options::ClientOptions;
pub use progress::{NoProgress, Progress};
pub use prompt::SearchOptions;

pub type Result<T> = std::result::Result<T, GrokError>;

use tracing::{debug, warn};

use crate::wire::{ChatChunk, ChatCompletion};

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Reassembles the answer text from `data:`-prefixed stream frames.
///
/// One decoder serves exactly one attempt; a retried request gets a fresh
/// decoder, so partial output from a failed attempt never reaches the
/// caller.
#[derive(Debug, Default)]
pub(crate) struct StreamDecoder {
    content: String,
    fallback_lines: Vec<String>,
}

impl StreamDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Consumes one line of the response body.
    ///
    /// Both `data:` and `data: ` prefixes are accepted. Malformed frames
    /// are skipped; feeding a line never fails.
    pub(crate) fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            self.fallback_lines.push(line.to_owned());
            return;
        };
        let payload = payload.trim_start();
        if payload == DONE_SENTINEL {
            return;
        }

        match serde_json::from_str::<ChatChunk>(payload) {
            Ok(chunk) => {
                let delta = chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content);
                if let Some(delta) = delta {
                    self.content.push_str(&delta);
                }
            }
            Err(err) => {
                warn!("skipping malformed stream frame: {err}");
            }
        }
    }

    /// Finishes decoding and returns the accumulated text.
    ///
    /// When no frame carried content but raw lines were buffered, the
    /// buffer is parsed once as a plain completion body — servers
    /// occasionally answer a stream request with a single non-chunked
    /// document.
    pub(crate) fn finish(self) -> String {
        if !self.content.is_empty() || self.fallback_lines.is_empty() {
            return self.content;
        }

        let body = self.fallback_lines.concat();
        match serde_json::from_str::<ChatCompletion>(&body) {
            Ok(completion) => completion
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .unwrap_or_default(),
            Err(err) => {
                debug!("whole-body fallback did not parse: {err}");
                String::new()
            }
        }
    }
}

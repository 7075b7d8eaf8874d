//! Streaming update types and event-stream decoding

use crate::error::{Error, Result};
use crate::types::SourceDocument;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Incremental updates produced while an answer is in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamingUpdate {
    /// Answer text to append to the accumulated answer
    Fragment { text: String },
    /// Structured payload replacing the answer wholesale
    Replace { payload: serde_json::Value },
    /// Updated set of retrieved source documents
    Sources { documents: Vec<SourceDocument> },
}

impl StreamingUpdate {
    /// Create a text fragment update
    pub fn fragment(text: impl Into<String>) -> Self {
        Self::Fragment { text: text.into() }
    }

    /// Create a structured replacement update
    pub fn replace(payload: serde_json::Value) -> Self {
        Self::Replace { payload }
    }

    /// Create a sources update
    pub fn sources(documents: Vec<SourceDocument>) -> Self {
        Self::Sources { documents }
    }
}

/// A finite stream of updates for one question; not restartable
pub type UpdateStream = Pin<Box<dyn Stream<Item = Result<StreamingUpdate>> + Send>>;

/// Sentinels some backends emit to mark the end of generation
const END_SENTINELS: [&str; 2] = ["[DONE]", "</s>"];

/// Accumulates raw body bytes and splits off complete events.
///
/// Events are blank-line delimited. A network chunk may end mid-event or
/// mid-character, so bytes are buffered until an event terminator arrives;
/// only complete events are decoded to text.
#[derive(Debug, Default)]
pub struct EventBuffer {
    buf: Vec<u8>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a body chunk, returning every event completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let event = String::from_utf8_lossy(&self.buf[..pos]).into_owned();
            self.buf.drain(..pos + 2);
            if !event.trim().is_empty() {
                events.push(event);
            }
        }
        events
    }

    /// Drain whatever is left once the body ends
    pub fn flush(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buf);
        let rest = String::from_utf8_lossy(&rest);
        let rest = rest.trim();
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }
}

/// OpenAI-style streaming chunk, the JSON shape `data:` events may carry
#[derive(Debug, Deserialize)]
struct DeltaChunk {
    #[serde(default)]
    choices: Vec<DeltaChoice>,
}

#[derive(Debug, Deserialize)]
struct DeltaChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Decode one blank-line-delimited event into an update.
///
/// `data:` events carry answer text, either as an OpenAI-style delta
/// chunk or as raw text. `json:` events carry reranked source documents.
/// End-of-generation sentinels and unrecognized fields yield `None`.
pub fn decode_event(event: &str) -> Option<StreamingUpdate> {
    for line in event.lines() {
        if let Some(data) = line.strip_prefix("data:") {
            return decode_data(data.trim());
        }
        if let Some(json) = line.strip_prefix("json:") {
            return Some(decode_sources(json.trim()));
        }
    }
    None
}

fn decode_data(data: &str) -> Option<StreamingUpdate> {
    if END_SENTINELS.iter().any(|s| data.contains(s)) {
        return None;
    }

    if let Ok(chunk) = serde_json::from_str::<DeltaChunk>(data) {
        let content = chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)?;
        if content.is_empty() {
            return None;
        }
        return Some(StreamingUpdate::fragment(content));
    }

    // Plain-text chunk: backends quote these and escape whitespace, so
    // strip the quoting and turn escapes into markdown-visible breaks.
    let quote = if data.starts_with('"') { '"' } else { '\'' };
    let text = strip_unescaped(data, quote)
        .replace("\\t", "  \t")
        .replace("\\n", "  \n");
    Some(StreamingUpdate::fragment(text))
}

fn decode_sources(json: &str) -> StreamingUpdate {
    #[derive(Deserialize)]
    struct SourcesPayload {
        #[serde(default)]
        reranked_docs: Vec<SourceDocument>,
    }

    match serde_json::from_str::<SourcesPayload>(json) {
        Ok(payload) => StreamingUpdate::sources(payload.reranked_docs),
        Err(e) => {
            tracing::warn!("failed to parse sources event: {}", e);
            StreamingUpdate::sources(vec![])
        }
    }
}

/// Remove every `quote` character not preceded by a backslash
fn strip_unescaped(input: &str, quote: char) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_backslash = false;
    for ch in input.chars() {
        if ch == quote && !prev_backslash {
            continue;
        }
        prev_backslash = ch == '\\';
        out.push(ch);
    }
    out
}

/// Wrap a body-read failure in a stream error
pub(crate) fn read_error(e: reqwest::Error) -> Error {
    Error::Stream(format!("failed to read response body: {}", e))
}

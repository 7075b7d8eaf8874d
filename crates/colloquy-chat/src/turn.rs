//! Turn model: one question/answer exchange and its lifecycle state

use colloquy_api::{Error as ApiError, POLICY_REJECTED_STATUS, SourceDocument};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classified failure kinds surfaced on a terminal turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Timeout,
    PayloadTooLarge,
    RateLimited,
    PolicyRejected,
    #[serde(rename = "unknown-transport-error")]
    Unknown,
}

impl ErrorKind {
    /// Map a transport error to the kind shown on the turn.
    ///
    /// Classification is a direct status mapping; anything the table does
    /// not cover falls back to `Unknown`. Aborts are not errors and must
    /// be resolved to a cancellation before reaching this point.
    pub fn classify(error: &ApiError) -> Self {
        match error.status_code() {
            Some(408) => ErrorKind::Timeout,
            Some(413) => ErrorKind::PayloadTooLarge,
            Some(429) => ErrorKind::RateLimited,
            Some(code) if code == POLICY_REJECTED_STATUS => ErrorKind::PolicyRejected,
            _ if error.is_timeout() => ErrorKind::Timeout,
            _ => ErrorKind::Unknown,
        }
    }

    /// User-facing description of the failure
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => {
                "Your request took too long to complete. Please try again later."
            }
            ErrorKind::PayloadTooLarge => {
                "Your prompt is too large to be processed. Please shorten it and send it again."
            }
            ErrorKind::RateLimited => {
                "You've reached the limit of requests. Please take a short break and try again soon."
            }
            ErrorKind::PolicyRejected => {
                "The request was rejected by content safety guards."
            }
            ErrorKind::Unknown => {
                "An error occurred. Please contact your administrator for further details."
            }
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::PayloadTooLarge => "payload-too-large",
            ErrorKind::RateLimited => "rate-limited",
            ErrorKind::PolicyRejected => "policy-rejected",
            ErrorKind::Unknown => "unknown-transport-error",
        };
        f.write_str(name)
    }
}

/// Answer payload of a turn: streamed text or a structured replacement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Accumulated streamed text
    Text(String),
    /// Full structured payload from a buffered response
    Structured(serde_json::Value),
}

impl Answer {
    /// The textual content of the answer, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(text) => Some(text),
            Answer::Structured(payload) => payload.get("text").and_then(|t| t.as_str()),
        }
    }
}

/// What exactly describes a turn right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// Awaiting updates or completion
    Pending,
    /// Finished with an answer (possibly empty, possibly cut short)
    Answered,
    /// Finished with a classified failure
    Failed(ErrorKind),
}

/// One question/answer exchange in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Client-generated unique identifier
    pub id: Uuid,
    pub question: String,
    pub answer: Option<Answer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceDocument>,
    pub error: Option<ErrorKind>,
    pub is_pending: bool,
}

impl Turn {
    /// Create a pending turn for a freshly submitted question
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            answer: None,
            sources: Vec::new(),
            error: None,
            is_pending: true,
        }
    }

    /// Whether this turn will receive no further updates
    pub fn is_terminal(&self) -> bool {
        !self.is_pending
    }

    /// The turn's answer text, if any
    pub fn answer_text(&self) -> Option<&str> {
        self.answer.as_ref().and_then(Answer::as_text)
    }

    /// The single status describing this turn.
    ///
    /// A failed turn may retain partial answer text; the error still
    /// decides the status.
    pub fn status(&self) -> TurnStatus {
        if let Some(kind) = self.error {
            TurnStatus::Failed(kind)
        } else if self.is_pending {
            TurnStatus::Pending
        } else {
            TurnStatus::Answered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_turn_is_pending_and_empty() {
        let turn = Turn::new("why is the sky blue?");
        assert!(turn.is_pending);
        assert!(turn.answer.is_none());
        assert!(turn.error.is_none());
        assert!(turn.sources.is_empty());
        assert_eq!(turn.status(), TurnStatus::Pending);
    }

    #[test]
    fn test_fresh_turns_get_distinct_ids() {
        let a = Turn::new("q");
        let b = Turn::new("q");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_status_error_wins_over_partial_answer() {
        let mut turn = Turn::new("q");
        turn.answer = Some(Answer::Text("partial".into()));
        turn.error = Some(ErrorKind::Timeout);
        turn.is_pending = false;
        assert_eq!(turn.status(), TurnStatus::Failed(ErrorKind::Timeout));
    }

    #[test]
    fn test_answer_text_from_structured_payload() {
        let answer = Answer::Structured(serde_json::json!({"text": "structured answer"}));
        assert_eq!(answer.as_text(), Some("structured answer"));

        let no_text = Answer::Structured(serde_json::json!({"other": 1}));
        assert_eq!(no_text.as_text(), None);
    }

    #[test]
    fn test_error_kind_serialized_names() {
        let cases = [
            (ErrorKind::Timeout, "\"timeout\""),
            (ErrorKind::PayloadTooLarge, "\"payload-too-large\""),
            (ErrorKind::RateLimited, "\"rate-limited\""),
            (ErrorKind::PolicyRejected, "\"policy-rejected\""),
            (ErrorKind::Unknown, "\"unknown-transport-error\""),
        ];
        for (kind, expected) in cases {
            assert_eq!(serde_json::to_string(&kind).unwrap(), expected);
        }
    }

    #[test]
    fn test_classify_status_table() {
        let cases = [
            (408, ErrorKind::Timeout),
            (413, ErrorKind::PayloadTooLarge),
            (429, ErrorKind::RateLimited),
            (466, ErrorKind::PolicyRejected),
            (500, ErrorKind::Unknown),
            (502, ErrorKind::Unknown),
        ];
        for (code, expected) in cases {
            let e = ApiError::status(code, "x");
            assert_eq!(ErrorKind::classify(&e), expected, "status {}", code);
        }
    }

    #[test]
    fn test_classify_non_status_errors() {
        assert_eq!(
            ErrorKind::classify(&ApiError::Stream("cut".into())),
            ErrorKind::Unknown
        );
        assert_eq!(
            ErrorKind::classify(&ApiError::UnexpectedContentType("text/html".into())),
            ErrorKind::Unknown
        );
    }
}

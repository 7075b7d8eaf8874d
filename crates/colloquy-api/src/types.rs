//! Wire types shared by the answer and chat-history services

use serde::{Deserialize, Serialize};

/// Request body for the answer endpoint
#[derive(Debug, Clone, Serialize)]
pub struct QuestionRequest {
    /// The question text
    pub text: String,
    /// History to associate the answer with, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_id: Option<String>,
}

impl QuestionRequest {
    /// Create a request for a standalone question
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            history_id: None,
        }
    }

    /// Associate the request with a persisted chat history
    pub fn with_history_id(mut self, id: impl Into<String>) -> Self {
        self.history_id = Some(id.into());
        self
    }
}

/// A retrieved source document cited by an answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Citation group identifier; documents sharing one are merged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_id: Option<String>,
    /// Originating file, when the retriever knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Cited passage text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Merged passage texts, populated by citation grouping
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<String>,
}

impl SourceDocument {
    /// Create a source with a citation id and passage text
    pub fn new(citation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            citation_id: Some(citation_id.into()),
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Retrieval metadata attached to a history entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reranked_docs: Vec<SourceDocument>,
}

/// One persisted question/answer exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HistoryMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl HistoryEntry {
    /// Create an entry from a question and its answer
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: Some(answer.into()),
            metadata: None,
            timestamp: None,
        }
    }

    /// Attach retrieved sources to the entry
    pub fn with_sources(mut self, sources: Vec<SourceDocument>) -> Self {
        self.metadata = Some(HistoryMetadata {
            reranked_docs: sources,
        });
        self
    }
}

/// A chat history as listed by the history service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    pub history_name: String,
}

/// A full chat history record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    pub history_id: String,
    #[serde(default)]
    pub history_name: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_request_serializes_without_history_id() {
        let req = QuestionRequest::new("what is a quorum?");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["text"], "what is a quorum?");
        assert!(json.get("history_id").is_none());
    }

    #[test]
    fn test_question_request_with_history_id() {
        let req = QuestionRequest::new("q").with_history_id("abc-123");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["history_id"], "abc-123");
    }

    #[test]
    fn test_history_entry_roundtrip() {
        let entry = HistoryEntry::new("Q1", "A1")
            .with_sources(vec![SourceDocument::new("c1", "passage")]);
        let json = serde_json::to_string(&entry).unwrap();
        let back: HistoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.question, "Q1");
        assert_eq!(back.answer.as_deref(), Some("A1"));
        assert_eq!(back.metadata.unwrap().reranked_docs.len(), 1);
    }

    #[test]
    fn test_history_entry_tolerates_missing_fields() {
        let entry: HistoryEntry = serde_json::from_str(r#"{"question":"bare"}"#).unwrap();
        assert_eq!(entry.question, "bare");
        assert!(entry.answer.is_none());
        assert!(entry.metadata.is_none());
    }
}

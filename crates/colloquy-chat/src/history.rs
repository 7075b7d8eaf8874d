//! Adapts persisted history records into in-memory turns

use crate::sources::parse_sources;
use crate::turn::{Answer, Turn};
use colloquy_api::HistoryEntry;
use uuid::Uuid;

/// Convert persisted history entries into terminal turns.
///
/// Order is preserved and every turn gets a fresh id. Records are taken
/// as stored; validating them is the history service's concern.
pub fn turns_from_history(history: &[HistoryEntry]) -> Vec<Turn> {
    history
        .iter()
        .map(|entry| {
            let sources = entry
                .metadata
                .as_ref()
                .map(|m| m.reranked_docs.clone())
                .unwrap_or_default();

            Turn {
                id: Uuid::new_v4(),
                question: entry.question.clone(),
                answer: entry.answer.clone().map(Answer::Text),
                sources: parse_sources(sources),
                error: None,
                is_pending: false,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_api::SourceDocument;

    #[test]
    fn test_two_records_become_two_ordered_terminal_turns() {
        let history = vec![
            HistoryEntry::new("Q1", "A1"),
            HistoryEntry::new("Q2", "A2"),
        ];

        let turns = turns_from_history(&history);
        assert_eq!(turns.len(), 2);

        assert_eq!(turns[0].question, "Q1");
        assert_eq!(turns[0].answer_text(), Some("A1"));
        assert_eq!(turns[1].question, "Q2");
        assert_eq!(turns[1].answer_text(), Some("A2"));

        for turn in &turns {
            assert!(!turn.is_pending);
            assert!(turn.error.is_none());
        }
        assert_ne!(turns[0].id, turns[1].id);
    }

    #[test]
    fn test_record_without_answer_passes_through() {
        let history = vec![HistoryEntry {
            question: "orphaned".into(),
            answer: None,
            metadata: None,
            timestamp: None,
        }];

        let turns = turns_from_history(&history);
        assert_eq!(turns.len(), 1);
        assert!(turns[0].answer.is_none());
        assert!(!turns[0].is_pending);
    }

    #[test]
    fn test_sources_are_grouped_from_metadata() {
        let history = vec![HistoryEntry::new("Q", "A").with_sources(vec![
            SourceDocument::new("c1", "one"),
            SourceDocument::new("c1", "two"),
        ])];

        let turns = turns_from_history(&history);
        assert_eq!(turns[0].sources.len(), 1);
        assert_eq!(turns[0].sources[0].citations, vec!["one", "two"]);
    }

    #[test]
    fn test_empty_history() {
        assert!(turns_from_history(&[]).is_empty());
    }
}

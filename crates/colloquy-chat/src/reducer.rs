//! Streaming update reducer

use crate::sources::parse_sources;
use crate::turn::{Answer, Turn};
use colloquy_api::StreamingUpdate;

/// Apply one streaming update to an in-flight turn.
///
/// Fragments append to the textual answer (a missing answer counts as
/// empty), replacements overwrite the answer wholesale, and source
/// updates swap the source list. Every update clears a previous error;
/// pending state is the caller's to change on completion.
pub fn apply_update(turn: &mut Turn, update: StreamingUpdate) {
    match update {
        StreamingUpdate::Fragment { text } => match turn.answer {
            Some(Answer::Text(ref mut current)) => current.push_str(&text),
            // None, or a structured payload being superseded: start fresh
            _ => turn.answer = Some(Answer::Text(text)),
        },
        StreamingUpdate::Replace { payload } => {
            turn.answer = Some(Answer::Structured(payload));
        }
        StreamingUpdate::Sources { documents } => {
            turn.sources = parse_sources(documents);
        }
    }
    turn.error = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::ErrorKind;
    use colloquy_api::SourceDocument;

    #[test]
    fn test_fragments_concatenate_in_delivery_order() {
        let mut turn = Turn::new("q");
        for piece in ["The", " sky", " is", " blue."] {
            apply_update(&mut turn, StreamingUpdate::fragment(piece));
        }
        assert_eq!(turn.answer_text(), Some("The sky is blue."));
    }

    #[test]
    fn test_first_fragment_starts_from_empty() {
        let mut turn = Turn::new("q");
        assert!(turn.answer.is_none());
        apply_update(&mut turn, StreamingUpdate::fragment("Hi"));
        assert_eq!(turn.answer, Some(Answer::Text("Hi".into())));
    }

    #[test]
    fn test_replace_discards_accumulated_text() {
        let mut turn = Turn::new("q");
        apply_update(&mut turn, StreamingUpdate::fragment("partial text"));
        apply_update(
            &mut turn,
            StreamingUpdate::replace(serde_json::json!({"text": "final"})),
        );
        assert_eq!(
            turn.answer,
            Some(Answer::Structured(serde_json::json!({"text": "final"})))
        );
    }

    #[test]
    fn test_fragment_after_replace_starts_fresh_text() {
        let mut turn = Turn::new("q");
        apply_update(
            &mut turn,
            StreamingUpdate::replace(serde_json::json!({"text": "old"})),
        );
        apply_update(&mut turn, StreamingUpdate::fragment("new"));
        assert_eq!(turn.answer, Some(Answer::Text("new".into())));
    }

    #[test]
    fn test_update_clears_error_and_keeps_pending() {
        let mut turn = Turn::new("q");
        turn.error = Some(ErrorKind::Unknown);
        apply_update(&mut turn, StreamingUpdate::fragment("recovered"));
        assert!(turn.error.is_none());
        assert!(turn.is_pending);
    }

    #[test]
    fn test_sources_update_replaces_and_groups() {
        let mut turn = Turn::new("q");
        apply_update(
            &mut turn,
            StreamingUpdate::sources(vec![
                SourceDocument::new("c1", "a"),
                SourceDocument::new("c1", "b"),
            ]),
        );
        assert_eq!(turn.sources.len(), 1);
        assert_eq!(turn.sources[0].citations, vec!["a", "b"]);

        apply_update(&mut turn, StreamingUpdate::sources(vec![]));
        assert!(turn.sources.is_empty());
    }
}

//! Source citation grouping

use colloquy_api::SourceDocument;

/// Consolidate source documents that share a citation id.
///
/// Passage texts of grouped documents are merged into the first
/// document's `citations` list. Documents without passage text pass
/// through ungrouped-as-is.
pub fn parse_sources(sources: Vec<SourceDocument>) -> Vec<SourceDocument> {
    let mut parsed: Vec<SourceDocument> = Vec::new();

    for source in sources {
        if let Some(existing) = parsed
            .iter_mut()
            .find(|s| s.citation_id == source.citation_id)
        {
            if let Some(text) = source.text {
                existing.citations.push(text);
            }
        } else if let Some(text) = source.text.clone() {
            let mut source = source;
            source.citations = vec![text];
            parsed.push(source);
        } else {
            parsed.push(source);
        }
    }

    parsed
}

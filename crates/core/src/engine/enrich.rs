use std::collections::HashMap;

use crate::corpus::TokenCorpus;
use crate::error::{CpdError, Result};
use crate::types::{Match, Occurrence};
use crate::util::{fnv1a64_u32, slice_lines};

use super::consolidate::MatchGroup;

/// Supplies literal source lines for report display.
pub trait SourceSlices {
    /// Lines `start_line..=end_line` (1-based) of `unit_id`, joined by `\n`.
    fn source_lines(&self, unit_id: &str, start_line: u32, end_line: u32) -> Result<String>;
}

/// Source texts held in memory, keyed by unit id.
#[derive(Debug, Default, Clone)]
pub struct InMemorySources {
    texts: HashMap<String, String>,
}

impl InMemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit_id: impl Into<String>, text: impl Into<String>) {
        self.texts.insert(unit_id.into(), text.into());
    }
}

impl SourceSlices for InMemorySources {
    fn source_lines(&self, unit_id: &str, start_line: u32, end_line: u32) -> Result<String> {
        let text = self
            .texts
            .get(unit_id)
            .ok_or_else(|| CpdError::UnknownUnit(unit_id.to_string()))?;
        slice_lines(text, start_line, end_line).ok_or_else(|| CpdError::MissingLines {
            unit: unit_id.to_string(),
            start_line,
            end_line,
        })
    }
}

/// Sequence index of the last token covered by a match, shifted back when it
/// lands on an end-of-unit marker.
fn last_token(corpus: &TokenCorpus, anchor: usize, token_count: usize) -> usize {
    let last = anchor + token_count - 1;
    if corpus.is_end_of_unit(last) && last > anchor {
        last - 1
    } else {
        last
    }
}

pub(crate) fn line_span(corpus: &TokenCorpus, anchor: usize, token_count: usize) -> (u32, u32) {
    let start_line = corpus.line(anchor);
    let end_line = corpus.line(last_token(corpus, anchor, token_count));
    (start_line, end_line.max(start_line))
}

fn content_hash(corpus: &TokenCorpus, anchor: usize, token_count: usize) -> u64 {
    let ids: Vec<u32> = (anchor..anchor + token_count)
        .map(|idx| corpus.text_id(idx).get())
        .collect();
    fnv1a64_u32(&ids)
}

pub(crate) fn enrich(
    corpus: &TokenCorpus,
    groups: Vec<MatchGroup>,
    sources: &dyn SourceSlices,
) -> Result<Vec<Match>> {
    let mut out = Vec::with_capacity(groups.len());
    for group in groups {
        let mut occurrences = Vec::with_capacity(group.anchors.len());
        for &anchor in &group.anchors {
            let Some(unit) = corpus.unit_of(anchor) else {
                continue;
            };
            let (start_line, end_line) = line_span(corpus, anchor, group.token_count);
            occurrences.push(Occurrence {
                anchor,
                unit_id: corpus.unit(unit).id.clone(),
                start_line,
                end_line,
                line_count: end_line - start_line + 1,
            });
        }

        let Some(canonical) = occurrences.first() else {
            continue;
        };
        let source_slice =
            sources.source_lines(&canonical.unit_id, canonical.start_line, canonical.end_line)?;
        let content_hash = content_hash(corpus, canonical.anchor, group.token_count);

        out.push(Match {
            token_count: group.token_count,
            content_hash,
            occurrences,
            source_slice,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::corpus::CorpusBuilder;

    #[test]
    fn computes_line_spans_and_slice_of_first_occurrence() -> Result<()> {
        let mut builder = CorpusBuilder::new();
        builder.add_unit("a.c", [("x", 1), ("y", 2), ("z", 3)])?;
        builder.add_unit("b.c", [("w", 1), ("x", 4), ("y", 4), ("z", 6)])?;
        let corpus = builder.freeze()?;

        let mut sources = InMemorySources::new();
        sources.insert("a.c", "x\ny\nz\n");
        sources.insert("b.c", "w\n\n\nx y\n\nz\n");

        let groups = vec![MatchGroup {
            token_count: 3,
            anchors: BTreeSet::from([0, 5]),
        }];
        let matches = enrich(&corpus, groups, &sources)?;
        assert_eq!(matches.len(), 1);

        let m = &matches[0];
        assert_eq!(m.occurrences[0].unit_id, "a.c");
        assert_eq!((m.occurrences[0].start_line, m.occurrences[0].end_line), (1, 3));
        assert_eq!(m.occurrences[1].unit_id, "b.c");
        assert_eq!(m.occurrences[1].line_count, 3);
        assert_eq!((m.occurrences[1].start_line, m.occurrences[1].end_line), (4, 6));
        assert_eq!(m.source_slice, "x\ny\nz");
        Ok(())
    }

    #[test]
    fn shifts_the_last_token_off_a_marker() -> Result<()> {
        let mut builder = CorpusBuilder::new();
        builder.add_unit("a", [("x", 1), ("y", 2)])?;
        let corpus = builder.freeze()?;
        // A span that would end on the marker at index 2.
        assert_eq!(last_token(&corpus, 1, 2), 1);
        assert_eq!(line_span(&corpus, 0, 2), (1, 2));
        Ok(())
    }

    #[test]
    fn unknown_units_are_fatal() {
        let sources = InMemorySources::new();
        assert!(matches!(
            sources.source_lines("missing", 1, 1),
            Err(CpdError::UnknownUnit(_))
        ));
    }
}

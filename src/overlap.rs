//! Overlap resolution between trie and regex candidates.
//!
//! Dictionary hits carry curated semantics and win unconditionally; a dynamic
//! candidate survives only when its span is disjoint from everything accepted
//! before it. The merged list is sorted ascending by start index so output is
//! positionally stable regardless of which pass produced a candidate.

use crate::Candidate;

/// Merge trie and regex candidates into one non-overlapping, position-sorted
/// list.
pub(crate) fn merge<P>(
    trie_candidates: Vec<Candidate<P>>,
    regex_candidates: Vec<Candidate<P>>,
) -> Vec<Candidate<P>> {
    let mut accepted = trie_candidates;

    for candidate in regex_candidates {
        if accepted.iter().all(|a| !a.span.overlaps(&candidate.span)) {
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|c| (c.span.start, c.span.end));
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    fn candidate(start: usize, end: usize, tag: u32) -> Candidate<u32> {
        Candidate { span: Span::new(start, end), payload: tag, confidence: 1.0, source: "test" }
    }

    #[test]
    fn trie_candidates_win_over_overlapping_regex_ones() {
        let merged = merge(vec![candidate(0, 4, 1)], vec![candidate(2, 6, 2), candidate(6, 8, 3)]);
        assert_eq!(merged.iter().map(|c| c.payload).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn regex_candidates_do_not_overlap_each_other() {
        let merged = merge(Vec::new(), vec![candidate(0, 4, 1), candidate(3, 6, 2), candidate(4, 8, 3)]);
        assert_eq!(merged.iter().map(|c| c.payload).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn result_is_sorted_by_start() {
        let merged = merge(vec![candidate(10, 12, 2)], vec![candidate(0, 2, 1)]);
        assert_eq!(merged.iter().map(|c| c.span.start).collect::<Vec<_>>(), vec![0, 10]);
    }

    #[test]
    fn adjacent_spans_are_not_overlapping() {
        let merged = merge(vec![candidate(0, 4, 1)], vec![candidate(4, 8, 2)]);
        assert_eq!(merged.len(), 2);
    }
}

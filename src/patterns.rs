//! Dynamic pattern matching for open-ended constructs.
//!
//! Dictionary literals cannot enumerate parametrized expressions like
//! `最近7天` or `2024-03-15`, so the engine carries a set of named regexes
//! alongside the trie. Each pattern pairs a compiled regex with an extractor
//! that turns capture groups into a domain payload; extractors also validate
//! calendar legality and return `None` to discard an impossible candidate.
//!
//! Patterns sharing a textual prefix are ordered by a granularity `rank`
//! (lower = finer): a fully-specified date claims its start index before a
//! month-only or year-only pattern gets to run, so the coarser match is
//! suppressed even when the finer one later fails validation. That is what
//! makes `2024年13月` produce *nothing* instead of a bare-year entity.

use std::collections::HashMap;

use log::warn;
use regex::{Captures, Regex};

use crate::{Candidate, Span};

/// Confidence assigned to dynamic (regex) matches.
pub(crate) const DYNAMIC_CONFIDENCE: f64 = 0.9;

/// Rank for fully-specified constructs (a concrete day, a counted span).
pub(crate) const RANK_FINE: u8 = 0;
/// Rank for month- and quarter-level constructs.
pub(crate) const RANK_MONTH: u8 = 1;
/// Rank for year-only constructs.
pub(crate) const RANK_YEAR: u8 = 2;

type Extractor<P> = Box<dyn Fn(&Captures) -> Option<P> + Send + Sync>;

struct DynamicPattern<P> {
    name: &'static str,
    regex: Regex,
    rank: u8,
    extract: Extractor<P>,
}

/// A set of named dynamic patterns, matched in ascending rank order.
pub struct PatternSet<P> {
    patterns: Vec<DynamicPattern<P>>,
}

impl<P> std::fmt::Debug for PatternSet<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.patterns.iter().map(|p| p.name).collect();
        f.debug_struct("PatternSet").field("patterns", &names).finish()
    }
}

impl<P> Default for PatternSet<P> {
    fn default() -> Self {
        PatternSet::new()
    }
}

impl<P> PatternSet<P> {
    pub fn new() -> Self {
        PatternSet { patterns: Vec::new() }
    }

    /// Compile and store a named pattern.
    ///
    /// A pattern that fails to compile is skipped with a warning; the other
    /// patterns remain usable.
    pub fn register<F>(&mut self, name: &'static str, pattern: &str, rank: u8, extract: F)
    where
        F: Fn(&Captures) -> Option<P> + Send + Sync + 'static,
    {
        match Regex::new(pattern) {
            Ok(regex) => {
                self.patterns.push(DynamicPattern { name, regex, rank, extract: Box::new(extract) });
                self.patterns.sort_by_key(|p| p.rank);
            }
            Err(err) => warn!("skipping dynamic pattern '{name}': {err}"),
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Run every pattern's non-overlapping find loop and return the surviving
    /// candidates sorted by position.
    ///
    /// A candidate whose span begins at a start index already claimed by a
    /// strictly finer-ranked pattern is dropped. The claim is recorded before
    /// extraction, so a calendrically invalid fine match still shadows the
    /// coarser patterns at the same start.
    pub(crate) fn match_all(&self, text: &str) -> Vec<Candidate<P>> {
        let mut claimed: HashMap<usize, u8> = HashMap::new();
        let mut out = Vec::new();

        for pattern in &self.patterns {
            for caps in pattern.regex.captures_iter(text) {
                let Some(m) = caps.get(0) else {
                    continue;
                };
                if m.is_empty() {
                    continue;
                }

                if let Some(&rank) = claimed.get(&m.start()) {
                    if rank < pattern.rank {
                        continue;
                    }
                }
                claimed.entry(m.start()).or_insert(pattern.rank);

                let Some(payload) = (pattern.extract)(&caps) else {
                    continue;
                };
                out.push(Candidate {
                    span: Span::new(m.start(), m.end()),
                    payload,
                    confidence: DYNAMIC_CONFIDENCE,
                    source: pattern.name,
                });
            }
        }

        out.sort_by_key(|c| (c.span.start, c.span.end));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_set() -> PatternSet<u32> {
        let mut set = PatternSet::new();
        set.register("digits", r"(\d+)", RANK_FINE, |caps| caps.get(1)?.as_str().parse().ok());
        set
    }

    #[test]
    fn broken_pattern_is_skipped_but_others_survive() {
        let mut set: PatternSet<u32> = PatternSet::new();
        set.register("broken", r"(unclosed", RANK_FINE, |_| None);
        set.register("ok", r"\d+", RANK_FINE, |_| Some(1));
        assert_eq!(set.len(), 1);
        assert_eq!(set.match_all("42").len(), 1);
    }

    #[test]
    fn extracts_capture_groups_per_match() {
        let set = number_set();
        let hits = set.match_all("a 12 b 7");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].payload, 12);
        assert_eq!(hits[1].payload, 7);
        assert_eq!(hits[0].span, Span::new(2, 4));
    }

    #[test]
    fn failed_extraction_discards_the_candidate() {
        let mut set: PatternSet<u32> = PatternSet::new();
        set.register("odd_only", r"\d+", RANK_FINE, |caps| {
            let n: u32 = caps.get(0)?.as_str().parse().ok()?;
            (n % 2 == 1).then_some(n)
        });
        let hits = set.match_all("3 4 5");
        assert_eq!(hits.iter().map(|c| c.payload).collect::<Vec<_>>(), vec![3, 5]);
    }

    #[test]
    fn finer_rank_suppresses_coarser_at_same_start() {
        let mut set: PatternSet<&'static str> = PatternSet::new();
        set.register("coarse", r"\d{4}x", RANK_YEAR, |_| Some("coarse"));
        set.register("fine", r"\d{4}xy", RANK_FINE, |_| Some("fine"));

        let hits = set.match_all("2024xy");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload, "fine");
    }

    #[test]
    fn invalid_fine_match_still_shadows_coarser_one() {
        let mut set: PatternSet<&'static str> = PatternSet::new();
        set.register("coarse", r"\d{4}", RANK_YEAR, |_| Some("coarse"));
        // Fine pattern matches but its extractor always rejects.
        set.register("fine", r"\d{4}x", RANK_FINE, |_| None);

        assert!(set.match_all("2024x").is_empty());
        // Without the fine prefix the coarse pattern is free to match.
        assert_eq!(set.match_all("2024").len(), 1);
    }

    #[test]
    fn results_are_position_sorted_across_patterns() {
        let mut set: PatternSet<u32> = PatternSet::new();
        set.register("late", r"b+", RANK_MONTH, |_| Some(2));
        set.register("early", r"a+", RANK_FINE, |_| Some(1));

        let hits = set.match_all("bb aa bb");
        assert_eq!(
            hits.iter().map(|c| c.span.start).collect::<Vec<_>>(),
            vec![0, 3, 6]
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(number_set().match_all("").is_empty());
    }
}

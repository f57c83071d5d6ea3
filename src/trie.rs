//! Generic prefix tree with a greedy longest-match scanner.
//!
//! The trie is the dictionary side of the engine: every literal surface form
//! (canonical names and aliases alike) is inserted character by character,
//! and matching at any start position returns the *longest* terminal reached
//! from there, never a shorter prefix. Scanning consumes matches greedily
//! left to right, so total work is bounded by input length times the maximum
//! term length.
//!
//! The structure is mutable only while the dictionary loader builds it; once
//! published inside a snapshot it is read-only.

use std::collections::HashMap;

use crate::{Candidate, Span};

/// Confidence assigned to dictionary (trie) matches.
pub(crate) const DICTIONARY_CONFIDENCE: f64 = 1.0;

pub(crate) const DICTIONARY_SOURCE: &str = "dictionary";

/// Payload stored at a terminal node.
#[derive(Debug, Clone, PartialEq)]
pub struct TermInfo<P> {
    /// True when this literal was registered as an alias of a canonical name.
    pub is_alias: bool,
    /// The alias literal itself, when `is_alias` is set.
    pub alias_text: Option<String>,
    /// Canonical name this literal resolves to.
    pub normalized: String,
    /// Domain-specific payload (for time: semantic kind + granularity).
    pub payload: P,
}

#[derive(Debug)]
struct TrieNode<P> {
    children: HashMap<char, TrieNode<P>>,
    term: Option<TermInfo<P>>,
}

impl<P> Default for TrieNode<P> {
    fn default() -> Self {
        TrieNode { children: HashMap::new(), term: None }
    }
}

/// Prefix tree mapping character sequences to terminal payloads.
#[derive(Debug)]
pub struct Trie<P> {
    root: TrieNode<P>,
    terms: usize,
}

impl<P> Default for Trie<P> {
    fn default() -> Self {
        Trie::new()
    }
}

impl<P> Trie<P> {
    pub fn new() -> Self {
        Trie { root: TrieNode::default(), terms: 0 }
    }

    /// Number of distinct terminals in the trie.
    pub fn len(&self) -> usize {
        self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms == 0
    }

    /// Insert `term` and attach `info` at its terminal node.
    ///
    /// The payload is applied only if the node is unset or currently holds an
    /// alias being upgraded by a canonical entry. A canonical entry is never
    /// overwritten, and an alias never replaces another alias: the earlier
    /// registration wins. Returns whether `info` was stored.
    pub fn add_term(&mut self, term: &str, info: TermInfo<P>) -> bool {
        if term.trim().is_empty() {
            return false;
        }

        let mut node = &mut self.root;
        for ch in term.chars() {
            node = node.children.entry(ch).or_default();
        }

        match &node.term {
            None => {
                node.term = Some(info);
                self.terms += 1;
                true
            }
            Some(existing) if existing.is_alias && !info.is_alias => {
                node.term = Some(info);
                true
            }
            Some(_) => false,
        }
    }

    /// Walk children starting at byte position `start`, remembering the most
    /// recent terminal. Returns the end byte of the longest match and its
    /// terminal info, or `None` when no terminal is reachable from `start`.
    pub fn longest_match_at<'a>(&'a self, text: &str, start: usize) -> Option<(usize, &'a TermInfo<P>)> {
        let mut node = &self.root;
        let mut best = None;

        for (offset, ch) in text[start..].char_indices() {
            node = match node.children.get(&ch) {
                Some(child) => child,
                None => break,
            };
            if let Some(term) = &node.term {
                best = Some((start + offset + ch.len_utf8(), term));
            }
        }

        best
    }

    /// Identical walk to the scanner below, short-circuiting on the first
    /// terminal and skipping result construction. Used for cheap boolean
    /// routing decisions upstream.
    pub fn contains_any(&self, text: &str) -> bool {
        let mut i = 0;

        while i < text.len() {
            let mut node = &self.root;
            for ch in text[i..].chars() {
                node = match node.children.get(&ch) {
                    Some(child) => child,
                    None => break,
                };
                if node.term.is_some() {
                    return true;
                }
            }
            i += text[i..].chars().next().map(char::len_utf8).unwrap_or(1);
        }

        false
    }
}

impl<P: Clone> Trie<P> {
    /// Greedy non-overlapping scan: each hit consumes its span, and the next
    /// probe starts right after it.
    pub(crate) fn scan_all(&self, text: &str) -> Vec<Candidate<P>> {
        let mut out = Vec::new();
        let mut i = 0;

        while i < text.len() {
            match self.longest_match_at(text, i) {
                Some((end, term)) => {
                    out.push(Candidate {
                        span: Span::new(i, end),
                        payload: term.payload.clone(),
                        confidence: DICTIONARY_CONFIDENCE,
                        source: DICTIONARY_SOURCE,
                    });
                    i = end;
                }
                None => {
                    i += text[i..].chars().next().map(char::len_utf8).unwrap_or(1);
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(normalized: &str, payload: u32) -> TermInfo<u32> {
        TermInfo { is_alias: false, alias_text: None, normalized: normalized.to_string(), payload }
    }

    fn alias(text: &str, normalized: &str, payload: u32) -> TermInfo<u32> {
        TermInfo {
            is_alias: true,
            alias_text: Some(text.to_string()),
            normalized: normalized.to_string(),
            payload,
        }
    }

    fn spans(candidates: &[Candidate<u32>]) -> Vec<(usize, usize)> {
        candidates.iter().map(|c| (c.span.start, c.span.end)).collect()
    }

    #[test]
    fn longest_match_beats_shared_prefix() {
        let mut trie = Trie::new();
        trie.add_term("上周", canonical("last_week", 1));
        trie.add_term("上周同期", canonical("last_week_same_period", 2));

        let hits = trie.scan_all("对比上周同期数据");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload, 2);
        // "对比" is 6 bytes, "上周同期" is 12.
        assert_eq!(spans(&hits), vec![(6, 18)]);
    }

    #[test]
    fn prefix_without_terminal_never_matches() {
        let mut trie = Trie::new();
        trie.add_term("本季度", canonical("this_quarter", 1));

        assert!(trie.scan_all("本季").is_empty());
        assert!(!trie.contains_any("本季"));
        assert!(trie.contains_any("查本季度"));
    }

    #[test]
    fn scan_is_greedy_and_non_overlapping() {
        let mut trie = Trie::new();
        trie.add_term("今天", canonical("today", 1));
        trie.add_term("昨天", canonical("yesterday", 2));

        let hits = trie.scan_all("今天和昨天");
        assert_eq!(spans(&hits), vec![(0, 6), (9, 15)]);
        assert_eq!(hits[0].payload, 1);
        assert_eq!(hits[1].payload, 2);
    }

    #[test]
    fn canonical_entry_is_never_overwritten() {
        let mut trie = Trie::new();
        assert!(trie.add_term("本月", canonical("this_month", 1)));
        assert!(!trie.add_term("本月", alias("本月", "other", 9)));
        assert!(!trie.add_term("本月", canonical("other", 9)));

        let (_, term) = trie.longest_match_at("本月", 0).unwrap();
        assert_eq!(term.payload, 1);
        assert_eq!(term.normalized, "this_month");
        assert!(!term.is_alias);
    }

    #[test]
    fn alias_is_upgraded_by_later_canonical() {
        let mut trie = Trie::new();
        assert!(trie.add_term("当天", alias("当天", "today", 1)));
        assert!(trie.add_term("当天", canonical("today_exact", 2)));
        // A second alias does not downgrade it back.
        assert!(!trie.add_term("当天", alias("当天", "stale", 3)));

        let (_, term) = trie.longest_match_at("当天", 0).unwrap();
        assert_eq!(term.payload, 2);
        assert!(!term.is_alias);
        assert!(term.alias_text.is_none());
    }

    #[test]
    fn empty_input_and_empty_terms() {
        let mut trie: Trie<u32> = Trie::new();
        assert!(!trie.add_term("", canonical("blank", 1)));
        assert!(!trie.add_term("  ", canonical("blank", 1)));
        assert!(trie.is_empty());

        trie.add_term("今年", canonical("this_year", 1));
        assert_eq!(trie.len(), 1);
        assert!(trie.scan_all("").is_empty());
        assert!(!trie.contains_any(""));
    }

    #[test]
    fn match_spans_stay_within_bounds() {
        let mut trie = Trie::new();
        trie.add_term("去年", canonical("last_year", 1));

        let text = "去年";
        let hits = trie.scan_all(text);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].span.start < hits[0].span.end);
        assert!(hits[0].span.end <= text.len());
    }
}

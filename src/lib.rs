//! Dictionary-driven entity recognition for analytics queries.
//!
//! The engine turns free-text queries like `查询最近7天销售额` into typed,
//! position-annotated entities whose resolved values (for the time domain: a
//! concrete inclusive `[start_date, end_date]`) can feed a query builder
//! directly.
//!
//! ## How the parts work together
//!
//! ```text
//! config document ──┐
//! built-in defaults ┼─ dictionary::build_trie ──▶ Trie (longest match)
//! store rows ───────┘                                    │
//!                                                        │ scan_all
//! input ── PatternSet::match_all (regex candidates) ─────┤
//!                                                        v
//!                                              overlap::merge
//!                                                        │
//!                                                        v
//!                                      EntityDomain::resolve (calendar)
//!                                                        │
//!                                                        v
//!                                         Vec<RecognizedEntity<Value>>
//! ```
//!
//! The published structure (trie + compiled patterns) is immutable between
//! [`EntityRecognizer::reload`] calls: a reload builds a complete new snapshot
//! off to the side and swaps it in atomically, so `recognize` never observes a
//! half-built tree.
//!
//! ## Responsibilities by module
//!
//! - `trie.rs`: generic prefix tree + greedy longest-match scanner.
//! - `dictionary.rs`: config document, store rows, built-in defaults, trie
//!   construction.
//! - `patterns.rs`: named regexes for open-ended constructs ("last N days",
//!   absolute dates) with finer-granularity precedence.
//! - `overlap.rs`: merges trie and regex candidates into one non-overlapping,
//!   position-sorted list.
//! - `calendar.rs`: pure calendar-range derivation.
//! - `time.rs`: the temporal domain (kinds, granularities, Chinese vocabulary,
//!   dynamic patterns, resolution).
//! - `recognizer.rs`: the façade plus the [`EntityDomain`] seam for further
//!   domains (region, metric, ...).

use chrono::{Local, NaiveDate};

mod calendar;
mod dictionary;
mod error;
mod overlap;
mod patterns;
mod recognizer;
mod time;
mod trie;

pub use dictionary::{
    ConfigDocument, ConfigEntry, DictionaryEntry, DictionaryStore, MemoryStore, ReloadReport,
    StoreRow,
};
pub use error::{RecognizerError, Result};
pub use patterns::PatternSet;
pub use recognizer::{EntityDomain, EntityRecognizer, Statistics, TimeRecognizer};
pub use time::{Granularity, TimeDomain, TimeKind, TimeParams, TimePayload, TimeValue};
pub use trie::{TermInfo, Trie};

// --- Shared types -----------------------------------------------------------

/// Half-open byte span `[start, end)` over the original input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Start byte index (inclusive).
    pub start: usize,
    /// End byte index (exclusive).
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// True when the two spans share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }
}

/// A candidate match before domain resolution: a span, the payload that will
/// be resolved into a value, and the source that produced it.
#[derive(Debug, Clone)]
pub(crate) struct Candidate<P> {
    pub span: Span,
    pub payload: P,
    pub confidence: f64,
    /// `"dictionary"` for trie hits, otherwise the dynamic pattern name.
    pub source: &'static str,
}

/// A resolved entity found in input.
///
/// `span` holds byte offsets into the original input.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedEntity<V> {
    /// Slice of the original input that matched.
    pub text: String,
    /// Byte span of the match.
    pub span: Span,
    /// Domain tag, e.g. `"time"`.
    pub domain: &'static str,
    /// Match confidence (dictionary hits rank above dynamic patterns).
    pub confidence: f64,
    /// Name of the source that produced this entity (`"dictionary"` or a
    /// dynamic pattern name).
    pub source: &'static str,
    /// Domain-specific resolved value.
    pub value: V,
}

/// Recognition context.
///
/// This holds the environment needed to resolve relative expressions (like
/// `最近7天`) against a concrete calendar date.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    /// Reference date used to resolve relative expressions.
    pub reference_date: NaiveDate,
}

impl Default for Context {
    fn default() -> Self {
        if cfg!(test) {
            // Wednesday, 2024-04-10: fixed so tests are deterministic.
            Self { reference_date: NaiveDate::from_ymd_opt(2024, 4, 10).unwrap() }
        } else {
            Self { reference_date: Local::now().date_naive() }
        }
    }
}

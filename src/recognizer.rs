//! Recognizer façade and the domain seam.
//!
//! [`EntityRecognizer`] orchestrates the pipeline — trie scan, dynamic regex
//! scan, overlap resolution, per-entity value resolution — behind a small
//! read-mostly API. The domain-specific pieces (payload decoding, default
//! vocabulary, dynamic patterns, value resolution) hang off the
//! [`EntityDomain`] trait, so further domains (region, metric, ...) plug into
//! the same core instead of subclassing it.
//!
//! ## Concurrency
//!
//! The published structure (trie + compiled patterns) is wrapped in
//! `RwLock<Arc<Snapshot>>`: readers clone the `Arc` and match against it with
//! no lock held, `reload` builds a complete new snapshot off to the side and
//! swaps it under the write lock. An in-flight `recognize` therefore observes
//! either the fully-valid old structure or the fully-valid new one, never a
//! half-built tree. All I/O (config read, store query) happens on the
//! construction/reload path only; `recognize` is pure and CPU-bound.
//!
//! Statistics are best-effort relaxed counters: approximate under heavy
//! concurrency, but they never corrupt other state.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::info;
use parking_lot::RwLock;

use crate::dictionary::{self, DictionaryEntry, DictionaryStore, ReloadReport};
use crate::patterns::PatternSet;
use crate::time::TimeDomain;
use crate::trie::Trie;
use crate::{Context, RecognizedEntity, overlap};

/// Strategy interface supplying everything domain-specific to the generic
/// recognizer core.
pub trait EntityDomain: Send + Sync + 'static {
    /// Payload attached to trie terminals and produced by dynamic patterns.
    type Payload: Clone + Send + Sync + 'static;
    /// Resolved value exposed on output entities.
    type Value: Clone;

    /// Domain tag used to filter store rows and label output entities.
    fn domain_type(&self) -> &'static str;

    /// Decode a dictionary entry's typed metadata into a payload, or `None`
    /// when the entry is undecodable (the entry is then skipped).
    fn payload_for(&self, entry: &DictionaryEntry) -> Option<Self::Payload>;

    /// Built-in fallback vocabulary, used only when no config document is
    /// readable so the recognizer is never empty.
    fn default_entries(&self) -> Vec<DictionaryEntry>;

    /// Dynamic patterns for open-ended constructs not enumerable in a
    /// dictionary.
    fn dynamic_patterns(&self) -> PatternSet<Self::Payload>;

    /// Resolve a matched payload into the domain value, or `None` to discard
    /// the candidate silently.
    fn resolve(&self, payload: &Self::Payload, context: &Context) -> Option<Self::Value>;
}

/// One immutable published structure: the trie plus the compiled patterns.
struct Snapshot<P> {
    trie: Trie<P>,
    patterns: PatternSet<P>,
}

/// Running, best-effort recognition counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Calls to `recognize`/`recognize_with`.
    pub total_recognitions: u64,
    /// Entities returned across all calls.
    pub entities_found: u64,
}

#[derive(Debug, Default)]
struct Counters {
    total: AtomicU64,
    found: AtomicU64,
}

/// Dictionary-driven entity recognizer parameterized by a domain.
pub struct EntityRecognizer<D: EntityDomain> {
    domain: D,
    config_path: Option<PathBuf>,
    store: Option<Arc<dyn DictionaryStore>>,
    snapshot: RwLock<Arc<Snapshot<D::Payload>>>,
    counters: Counters,
}

/// The temporal recognizer most callers want.
pub type TimeRecognizer = EntityRecognizer<TimeDomain>;

impl<D: EntityDomain> EntityRecognizer<D> {
    /// Build a recognizer from the built-in vocabulary only.
    pub fn new(domain: D) -> Self {
        Self::with_sources(domain, None, None)
    }

    /// Build a recognizer from a config document and/or a dictionary store.
    ///
    /// Construction never fails: each unavailable source degrades with a
    /// warning, down to the built-in vocabulary.
    pub fn with_sources(
        domain: D,
        config_path: Option<PathBuf>,
        store: Option<Arc<dyn DictionaryStore>>,
    ) -> Self {
        let (snapshot, report) = build_snapshot(&domain, config_path.as_deref(), store.as_deref());
        info!(
            "{} dictionary loaded: {} terms ({} store rows, {} skipped{})",
            domain.domain_type(),
            report.terms,
            report.store_rows,
            report.skipped_rows,
            if report.defaults_used { ", built-in defaults" } else { "" },
        );

        EntityRecognizer {
            domain,
            config_path,
            store,
            snapshot: RwLock::new(Arc::new(snapshot)),
            counters: Counters::default(),
        }
    }

    /// Hot dictionary refresh: rebuild the whole structure from the
    /// configured sources and atomically publish it.
    pub fn reload(&self) -> ReloadReport {
        let (snapshot, report) =
            build_snapshot(&self.domain, self.config_path.as_deref(), self.store.as_deref());
        *self.snapshot.write() = Arc::new(snapshot);
        info!(
            "{} dictionary reloaded: {} terms ({} store rows, {} skipped)",
            self.domain.domain_type(),
            report.terms,
            report.store_rows,
            report.skipped_rows,
        );
        report
    }

    fn current(&self) -> Arc<Snapshot<D::Payload>> {
        self.snapshot.read().clone()
    }

    /// Recognize entities against today's date (pinned under test).
    pub fn recognize(&self, text: &str) -> Vec<RecognizedEntity<D::Value>> {
        self.recognize_with(text, &Context::default())
    }

    /// Recognize entities against an explicit reference date.
    ///
    /// Returns a start-sorted, non-overlapping entity list; empty or blank
    /// input yields an empty list, never an error.
    pub fn recognize_with(&self, text: &str, context: &Context) -> Vec<RecognizedEntity<D::Value>> {
        self.counters.total.fetch_add(1, Ordering::Relaxed);
        if text.trim().is_empty() {
            return Vec::new();
        }

        let snapshot = self.current();
        let merged =
            overlap::merge(snapshot.trie.scan_all(text), snapshot.patterns.match_all(text));

        let entities: Vec<_> = merged
            .into_iter()
            .filter_map(|candidate| {
                let value = self.domain.resolve(&candidate.payload, context)?;
                Some(RecognizedEntity {
                    text: text[candidate.span.start..candidate.span.end].to_string(),
                    span: candidate.span,
                    domain: self.domain.domain_type(),
                    confidence: candidate.confidence,
                    source: candidate.source,
                    value,
                })
            })
            .collect();

        self.counters.found.fetch_add(entities.len() as u64, Ordering::Relaxed);
        entities
    }

    /// First entity by position, if any.
    pub fn recognize_first(&self, text: &str) -> Option<RecognizedEntity<D::Value>> {
        self.recognize(text).into_iter().next()
    }

    /// Fast boolean path: trie walk only, no regex pass, no entity
    /// construction. Used for routing decisions upstream.
    pub fn contains_entity(&self, text: &str) -> bool {
        !text.trim().is_empty() && self.current().trie.contains_any(text)
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            total_recognitions: self.counters.total.load(Ordering::Relaxed),
            entities_found: self.counters.found.load(Ordering::Relaxed),
        }
    }

    pub fn reset_statistics(&self) {
        self.counters.total.store(0, Ordering::Relaxed);
        self.counters.found.store(0, Ordering::Relaxed);
    }
}

fn build_snapshot<D: EntityDomain>(
    domain: &D,
    config_path: Option<&std::path::Path>,
    store: Option<&dyn DictionaryStore>,
) -> (Snapshot<D::Payload>, ReloadReport) {
    let (trie, report) = dictionary::build_trie(domain, config_path, store);
    (Snapshot { trie, patterns: domain.dynamic_patterns() }, report)
}

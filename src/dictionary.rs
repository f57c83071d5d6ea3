//! Dictionary sources and trie construction.
//!
//! The trie is built from up to three sources, in a fixed precedence order:
//!
//! 1. the JSON config document (keyed by canonical identifier),
//! 2. the built-in default vocabulary, used only when the document is absent
//!    or unreadable,
//! 3. active store rows for the recognizer's domain, ascending by priority.
//!
//! Store rows load after config rows, so a config-defined canonical entry
//! keeps precedence on a conflicting literal (the trie never overwrites an
//! earlier canonical terminal). Encoded row fields are decoded exactly once,
//! at load time; nothing here runs on the `recognize` path.
//!
//! Every failure is partial: a malformed document falls back to defaults, a
//! malformed row is skipped with a warning, and the worst case is reduced
//! recall.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::warn;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::recognizer::EntityDomain;
use crate::trie::{TermInfo, Trie};

/// One entry of the config document: literal surface patterns, a description
/// and typed metadata (for time: `time_type` + `granularity` codes).
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigEntry {
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// The dictionary config document, keyed by canonical identifier.
///
/// A `BTreeMap` keeps registration order deterministic when two entries
/// define the same literal.
pub type ConfigDocument = BTreeMap<String, ConfigEntry>;

/// Read and parse a config document.
pub fn load_config(path: &Path) -> Result<ConfigDocument> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Normalized dictionary entry shared by store rows and built-in defaults.
#[derive(Debug, Clone)]
pub struct DictionaryEntry {
    /// Canonical surface form (registered as a non-alias literal).
    pub name: String,
    pub domain_type: String,
    /// Alias literals resolving to the same semantics.
    pub aliases: Vec<String>,
    pub description: String,
    /// Typed metadata decoded by the domain into a trie payload.
    pub metadata: Map<String, Value>,
    pub priority: i32,
    pub active: bool,
}

/// Raw dictionary store row. `aliases` and `metadata` are JSON-encoded
/// strings, decoded once at load time.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreRow {
    pub name: String,
    pub domain_type: String,
    #[serde(default)]
    pub aliases: String,
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl StoreRow {
    /// Decode the JSON-encoded columns into a [`DictionaryEntry`].
    pub fn decode(&self) -> Result<DictionaryEntry> {
        let aliases: Vec<String> = if self.aliases.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&self.aliases)?
        };
        let metadata: Map<String, Value> = if self.metadata.trim().is_empty() {
            Map::new()
        } else {
            serde_json::from_str(&self.metadata)?
        };
        let description = metadata
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(DictionaryEntry {
            name: self.name.clone(),
            domain_type: self.domain_type.clone(),
            aliases,
            description,
            metadata,
            priority: self.priority,
            active: self.active,
        })
    }
}

/// A dictionary row source (in production: a database table).
///
/// Implementations return only active rows for the requested domain, ordered
/// ascending by priority.
pub trait DictionaryStore: Send + Sync {
    fn load_active(&self, domain_type: &str) -> Result<Vec<StoreRow>>;
}

/// In-memory [`DictionaryStore`] for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<StoreRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn push(&self, row: StoreRow) {
        self.rows.write().push(row);
    }
}

impl DictionaryStore for MemoryStore {
    fn load_active(&self, domain_type: &str) -> Result<Vec<StoreRow>> {
        let mut rows: Vec<StoreRow> = self
            .rows
            .read()
            .iter()
            .filter(|row| row.active && row.domain_type == domain_type)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.priority);
        Ok(rows)
    }
}

/// Counters describing one build of the published structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Entries registered from the config document.
    pub config_entries: usize,
    /// True when the built-in vocabulary was used instead of the document.
    pub defaults_used: bool,
    /// Store rows registered.
    pub store_rows: usize,
    /// Store rows skipped as malformed or undecodable.
    pub skipped_rows: usize,
    /// Distinct literals in the finished trie.
    pub terms: usize,
}

/// Build a fresh trie from the configured sources.
///
/// Never fails: every source degrades independently, down to the built-in
/// vocabulary, so the recognizer is never empty.
pub(crate) fn build_trie<D: EntityDomain>(
    domain: &D,
    config_path: Option<&Path>,
    store: Option<&dyn DictionaryStore>,
) -> (Trie<D::Payload>, ReloadReport) {
    let mut trie = Trie::new();
    let mut report = ReloadReport::default();

    let document = config_path.and_then(|path| match load_config(path) {
        Ok(document) => Some(document),
        Err(err) => {
            warn!("dictionary config {} unreadable, using built-in defaults: {err}", path.display());
            None
        }
    });

    match document {
        Some(document) => {
            for (key, entry) in &document {
                if register_config_entry(domain, &mut trie, key, entry) {
                    report.config_entries += 1;
                }
            }
        }
        None => {
            report.defaults_used = true;
            for entry in domain.default_entries() {
                register_entry(domain, &mut trie, &entry);
            }
        }
    }

    if let Some(store) = store {
        match store.load_active(domain.domain_type()) {
            Ok(rows) => {
                for row in rows {
                    match row.decode() {
                        Ok(entry) => {
                            if register_entry(domain, &mut trie, &entry) {
                                report.store_rows += 1;
                            } else {
                                report.skipped_rows += 1;
                            }
                        }
                        Err(err) => {
                            warn!("skipping dictionary row '{}': {err}", row.name);
                            report.skipped_rows += 1;
                        }
                    }
                }
            }
            Err(err) => warn!("dictionary store unavailable: {err}"),
        }
    }

    report.terms = trie.len();
    (trie, report)
}

/// Register a config entry: every pattern is a canonical literal normalized
/// to the entry's identifier.
fn register_config_entry<D: EntityDomain>(
    domain: &D,
    trie: &mut Trie<D::Payload>,
    key: &str,
    entry: &ConfigEntry,
) -> bool {
    let dict_entry = DictionaryEntry {
        name: key.to_string(),
        domain_type: domain.domain_type().to_string(),
        aliases: Vec::new(),
        description: entry.description.clone(),
        metadata: entry.metadata.clone(),
        priority: 0,
        active: true,
    };
    let Some(payload) = domain.payload_for(&dict_entry) else {
        warn!("config entry '{key}' has undecodable metadata, skipped");
        return false;
    };

    let mut registered = false;
    for pattern in &entry.patterns {
        registered |= trie.add_term(
            pattern,
            TermInfo {
                is_alias: false,
                alias_text: None,
                normalized: key.to_string(),
                payload: payload.clone(),
            },
        );
    }
    registered
}

/// Register a normalized entry: the primary name as a canonical literal, each
/// alias under the same resolved semantics.
fn register_entry<D: EntityDomain>(
    domain: &D,
    trie: &mut Trie<D::Payload>,
    entry: &DictionaryEntry,
) -> bool {
    let Some(payload) = domain.payload_for(entry) else {
        warn!("dictionary entry '{}' has undecodable metadata, skipped", entry.name);
        return false;
    };

    trie.add_term(
        &entry.name,
        TermInfo {
            is_alias: false,
            alias_text: None,
            normalized: entry.name.clone(),
            payload: payload.clone(),
        },
    );
    for alias in &entry.aliases {
        trie.add_term(
            alias,
            TermInfo {
                is_alias: true,
                alias_text: Some(alias.clone()),
                normalized: entry.name.clone(),
                payload: payload.clone(),
            },
        );
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognizerError;
    use crate::time::{TimeDomain, TimeKind};
    use std::io::Write;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn row(name: &str, aliases: &str, metadata: &str, priority: i32) -> StoreRow {
        StoreRow {
            name: name.to_string(),
            domain_type: "time".to_string(),
            aliases: aliases.to_string(),
            metadata: metadata.to_string(),
            priority,
            active: true,
        }
    }

    #[test]
    fn config_document_parses_patterns_and_metadata() {
        let file = config_file(
            r#"{
                "this_week": {
                    "patterns": ["本周", "这周"],
                    "description": "current ISO week",
                    "metadata": {"time_type": "THIS_WEEK", "granularity": "WEEK"}
                }
            }"#,
        );
        let document = load_config(file.path()).unwrap();
        let entry = &document["this_week"];
        assert_eq!(entry.patterns, vec!["本周", "这周"]);
        assert_eq!(entry.metadata["time_type"], "THIS_WEEK");
    }

    #[test]
    fn malformed_document_is_an_error() {
        let file = config_file("{ not json");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let (trie, report) =
            build_trie(&TimeDomain, Some(Path::new("/nonexistent/dict.json")), None);
        assert!(report.defaults_used);
        assert!(!trie.is_empty());
        assert!(trie.contains_any("今天"));
    }

    #[test]
    fn store_rows_register_name_and_aliases() {
        let store = MemoryStore::new();
        store.push(row("促销期", r#"["大促期"]"#, r#"{"time_type":"LAST_N_DAYS","n":2}"#, 1));

        let (trie, report) = build_trie(&TimeDomain, None, Some(&store));
        assert_eq!(report.store_rows, 1);
        assert_eq!(report.skipped_rows, 0);

        let (_, term) = trie.longest_match_at("大促期", 0).unwrap();
        assert!(term.is_alias);
        assert_eq!(term.normalized, "促销期");
        assert_eq!(term.payload.kind, TimeKind::LastNDays);
        assert_eq!(term.payload.params.n, Some(2));
    }

    #[test]
    fn malformed_row_is_skipped_but_loading_continues() {
        let store = MemoryStore::new();
        store.push(row("坏行", "not-json", r#"{"time_type":"TODAY"}"#, 0));
        store.push(row("好行", "[]", r#"{"time_type":"YESTERDAY"}"#, 1));
        store.push(row("没类型", "[]", r#"{"granularity":"DAY"}"#, 2));

        let (trie, report) = build_trie(&TimeDomain, None, Some(&store));
        assert_eq!(report.store_rows, 1);
        assert_eq!(report.skipped_rows, 2);
        assert!(trie.contains_any("好行"));
        assert!(!trie.contains_any("坏行"));
    }

    #[test]
    fn inactive_and_foreign_rows_are_not_loaded() {
        let store = MemoryStore::new();
        let mut inactive = row("停用", "[]", r#"{"time_type":"TODAY"}"#, 0);
        inactive.active = false;
        store.push(inactive);
        let mut foreign = row("华东", "[]", r#"{"region_code":"EAST"}"#, 0);
        foreign.domain_type = "region".to_string();
        store.push(foreign);

        let rows = store.load_active("time").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn store_rows_come_back_in_ascending_priority() {
        let store = MemoryStore::new();
        store.push(row("b", "[]", r#"{"time_type":"TODAY"}"#, 5));
        store.push(row("a", "[]", r#"{"time_type":"TODAY"}"#, 1));

        let rows = store.load_active("time").unwrap();
        assert_eq!(rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn config_canonical_entry_beats_conflicting_store_row() {
        let file = config_file(
            r#"{
                "this_week": {
                    "patterns": ["本周"],
                    "metadata": {"time_type": "THIS_WEEK", "granularity": "WEEK"}
                }
            }"#,
        );
        let store = MemoryStore::new();
        store.push(row("本周", "[]", r#"{"time_type":"LAST_WEEK"}"#, 1));

        let (trie, _) = build_trie(&TimeDomain, Some(file.path()), Some(&store));
        let (_, term) = trie.longest_match_at("本周", 0).unwrap();
        assert_eq!(term.payload.kind, TimeKind::ThisWeek);
        assert_eq!(term.normalized, "this_week");
    }

    #[test]
    fn store_error_is_tolerated() {
        struct BrokenStore;
        impl DictionaryStore for BrokenStore {
            fn load_active(&self, _domain_type: &str) -> Result<Vec<StoreRow>> {
                Err(RecognizerError::store("connection refused"))
            }
        }

        let (trie, report) = build_trie(&TimeDomain, None, Some(&BrokenStore));
        assert!(report.defaults_used);
        assert_eq!(report.store_rows, 0);
        assert!(trie.contains_any("昨天"));
    }
}

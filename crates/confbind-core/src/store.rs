//! The merged configuration store
//!
//! Sources are merged in increasing priority order into one flat,
//! insertion-ordered map from [`PathKey`] to an optional value. The hierarchy
//! is implied by the keys; a key that only has descendants is a structural
//! node with no value of its own.

use indexmap::IndexMap;

use crate::error::Result;
use crate::path::{segment_cmp, PathKey};
use crate::section::{is_index_segment, SectionView};
use crate::source::Source;

/// One flat `(key, value)` pair produced by a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationEntry {
    /// Full path of the entry
    pub key: PathKey,
    /// The value, or `None` for a structural node
    pub value: Option<String>,
}

impl ConfigurationEntry {
    /// An entry carrying a value
    pub fn new(key: PathKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: Some(value.into()),
        }
    }

    /// An entry with no value of its own
    pub fn structural(key: PathKey) -> Self {
        Self { key, value: None }
    }
}

/// The merged, immutable result of reading every source
#[derive(Debug, Clone, Default)]
pub struct ConfigurationStore {
    entries: IndexMap<PathKey, Option<String>>,
}

impl ConfigurationStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Start collecting [`Source`] providers
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    /// Merge sources given in increasing priority order.
    ///
    /// A later entry for an existing key replaces its value; the key keeps
    /// the spelling and position it was first inserted with.
    pub fn merge<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = ConfigurationEntry>,
    {
        let mut store = Self::new();
        for source in sources {
            store.extend(source);
        }
        store
    }

    fn extend(&mut self, entries: impl IntoIterator<Item = ConfigurationEntry>) {
        for entry in entries {
            match self.entries.get_mut(&entry.key) {
                Some(value) => *value = entry.value,
                None => {
                    self.entries.insert(entry.key, entry.value);
                }
            }
        }
    }

    /// Value stored exactly at `key`
    pub fn get(&self, key: &PathKey) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.as_deref())
    }

    /// True if `key` has a value or at least one descendant
    pub fn contains(&self, key: &PathKey) -> bool {
        if self.get(key).is_some() {
            return true;
        }
        self.entries
            .keys()
            .any(|k| k.len() > key.len() && key.is_prefix_of(k))
    }

    /// Distinct immediate child segments of `key`.
    ///
    /// Index segments come first in numeric order, then the rest
    /// case-insensitively. The first spelling seen for a segment is returned.
    pub fn child_keys(&self, key: &PathKey) -> Vec<String> {
        let mut children: Vec<&str> = self
            .entries
            .keys()
            .filter(|k| k.len() > key.len() && key.is_prefix_of(k))
            .filter_map(|k| k.segment(key.len()))
            .collect();

        // Stable sort keeps the first spelling ahead of later duplicates
        children.sort_by(|a, b| child_order(a, b));
        children.dedup_by(|a, b| segment_cmp(a, b).is_eq());
        children.into_iter().map(str::to_string).collect()
    }

    /// Every entry in insertion order
    pub fn all_entries(&self) -> impl Iterator<Item = (&PathKey, Option<&str>)> + '_ {
        self.entries.iter().map(|(k, v)| (k, v.as_deref()))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no source contributed anything
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// View of the whole store
    pub fn root(&self) -> SectionView<'_> {
        SectionView::new(self, PathKey::root())
    }

    /// View of the section at a `:`-delimited path. Empty segments are ignored.
    pub fn section(&self, key: &str) -> SectionView<'_> {
        SectionView::new(self, PathKey::root().append(key))
    }
}

impl FromIterator<ConfigurationEntry> for ConfigurationStore {
    fn from_iter<I: IntoIterator<Item = ConfigurationEntry>>(iter: I) -> Self {
        Self::merge([iter])
    }
}

fn child_order(a: &str, b: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    match (is_index_segment(a), is_index_segment(b)) {
        // Canonical indices compare by length first, then lexically
        (true, true) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => segment_cmp(a, b),
    }
}

/// Collects [`Source`] providers in priority order
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct StoreBuilder {
    sources: Vec<Box<dyn Source>>,
}

impl StoreBuilder {
    /// Add a provider; later providers override earlier ones
    pub fn add_source(mut self, source: impl Source + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Number of providers added so far
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Read every provider in order and merge the results.
    ///
    /// Fails on the first provider that cannot be read.
    pub fn build(self) -> Result<ConfigurationStore> {
        let mut store = ConfigurationStore::new();
        for source in &self.sources {
            let entries = source.entries()?;
            log::debug!(
                "Merging {} entries from source '{}'",
                entries.len(),
                source.name()
            );
            store.extend(entries);
        }
        log::debug!(
            "Built configuration store with {} entries from {} sources",
            store.len(),
            self.sources.len()
        );
        Ok(store)
    }
}

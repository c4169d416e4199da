//! Scoped, read-only views over a configuration store

use crate::binder::{self, BindOptions};
use crate::error::{Error, Result};
use crate::path::PathKey;
use crate::shape::{Options, Scalar};
use crate::store::ConfigurationStore;

/// A subtree of a [`ConfigurationStore`] rooted at a path.
///
/// Views borrow the store and never modify it, so any number of them can
/// alias the same store. Relative lookups are resolved against [`path`](Self::path).
#[derive(Debug, Clone)]
pub struct SectionView<'a> {
    store: &'a ConfigurationStore,
    path: PathKey,
}

impl<'a> SectionView<'a> {
    pub(crate) fn new(store: &'a ConfigurationStore, path: PathKey) -> Self {
        Self { store, path }
    }

    /// The store this view reads from
    pub fn store(&self) -> &'a ConfigurationStore {
        self.store
    }

    /// Absolute path of this section
    pub fn path(&self) -> &PathKey {
        &self.path
    }

    /// Last segment of the path, or `""` for the root
    pub fn key(&self) -> &str {
        self.path.last_segment().unwrap_or("")
    }

    /// The section's own value, if it has one
    pub fn value(&self) -> Option<&'a str> {
        self.store.get(&self.path)
    }

    /// Value at a path relative to this section
    pub fn get_value(&self, relative: &str) -> Option<&'a str> {
        self.store.get(&self.path.append(relative))
    }

    /// Sub-section at a relative path. Always succeeds; check [`exists`](Self::exists).
    pub fn get_section(&self, relative: &str) -> SectionView<'a> {
        Self::new(self.store, self.path.append(relative))
    }

    /// Sub-section at a relative path, or `SectionNotFound` if nothing is there
    pub fn required_section(&self, relative: &str) -> Result<SectionView<'a>> {
        let section = self.get_section(relative);
        if section.exists() {
            Ok(section)
        } else {
            Err(Error::section_not_found(section.path().to_string()))
        }
    }

    /// One view per distinct immediate child, numeric indices first
    pub fn children(&self) -> Vec<SectionView<'a>> {
        self.store
            .child_keys(&self.path)
            .into_iter()
            .map(|segment| Self::new(self.store, self.path.append(&segment)))
            .collect()
    }

    /// True if the section has a value or any descendant
    pub fn exists(&self) -> bool {
        self.store.contains(&self.path)
    }

    /// True if the section has children and every child key is an index
    /// (`0`, `1`, ... without leading zeros).
    pub fn is_collection(&self) -> bool {
        let keys = self.store.child_keys(&self.path);
        !keys.is_empty() && keys.iter().all(|k| is_index_segment(k))
    }

    /// Typed value at a relative path; `Ok(None)` when absent
    pub fn get<S: Scalar>(&self, relative: &str) -> Result<Option<S>> {
        let path = self.path.append(relative);
        match self.store.get(&path) {
            Some(raw) => binder::coerce(&path, raw)
                .map(Some)
                .map_err(Error::type_coercion),
            None => Ok(None),
        }
    }

    /// Typed value at a relative path, or `default` when absent
    pub fn get_or<S: Scalar>(&self, relative: &str, default: S) -> Result<S> {
        Ok(self.get(relative)?.unwrap_or(default))
    }

    /// Bind this section onto a new `T`
    pub fn bind<T: Options>(&self) -> Result<T> {
        binder::bind(self)
    }

    /// Bind this section onto a new `T` with explicit options
    pub fn bind_with<T: Options>(&self, options: &BindOptions) -> Result<T> {
        binder::bind_with(self, options)
    }

    /// Bind this section onto an existing value
    pub fn bind_into<T: Options>(&self, target: &mut T) -> Result<()> {
        binder::bind_into(self, target)
    }
}

/// Canonical non-negative decimal index: `"0"` or digits without a leading zero
pub(crate) fn is_index_segment(segment: &str) -> bool {
    match segment.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    }
}

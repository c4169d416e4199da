//! Hierarchical configuration keys
//!
//! A [`PathKey`] is an ordered list of segments such as `Settings:Order:Address`.
//! Segments compare case-insensitively; the original spelling is kept for
//! display. The key with no segments is the root of the hierarchy.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Separator between segments in the textual form of a key
pub const DELIMITER: char = ':';

/// A case-insensitive, delimiter-separated configuration key
#[derive(Clone, Default)]
pub struct PathKey {
    segments: Vec<String>,
}

impl PathKey {
    /// The root key (no segments)
    pub fn root() -> Self {
        Self::default()
    }

    /// Check if this is the root key
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Same as [`is_root`](Self::is_root)
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// The segments, in their original spelling
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Parse a delimited key.
    ///
    /// The empty string is the root. Every other input must consist of
    /// non-empty segments separated by a single `:`.
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for (position, segment) in input.split(DELIMITER).enumerate() {
            if segment.is_empty() {
                return Err(Error::path_parse(
                    input,
                    format!("empty segment at position {}", position),
                ));
            }
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    /// Return the child key `self:segment` without modifying `self`.
    ///
    /// A segment that itself contains `:` contributes each of its non-empty
    /// pieces, so `append("A:B")` equals `append("A").append("B")`.
    pub fn append(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(
            segment
                .split(DELIMITER)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        Self { segments }
    }

    /// Concatenate two keys
    pub fn join(&self, relative: &PathKey) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(relative.segments.iter().cloned());
        Self { segments }
    }

    /// Textual form with segments joined by `:`
    pub fn format(&self) -> String {
        self.segments.join(&DELIMITER.to_string())
    }

    /// True if every segment of `self` matches the start of `other`.
    /// A key is a prefix of itself; the root is a prefix of every key.
    pub fn is_prefix_of(&self, other: &PathKey) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| segment_eq(a, b))
    }

    /// The final segment, or `None` for the root
    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The key with the final segment removed, or `None` for the root
    pub fn parent(&self) -> Option<PathKey> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// Segment at `index`, if any
    pub(crate) fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }
}

fn fold(segment: &str) -> impl Iterator<Item = char> + '_ {
    segment.chars().flat_map(char::to_lowercase)
}

/// Case-insensitive segment equality
pub(crate) fn segment_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || fold(a).eq(fold(b))
}

/// Case-insensitive segment ordering
pub(crate) fn segment_cmp(a: &str, b: &str) -> Ordering {
    fold(a).cmp(fold(b))
}

impl PartialEq for PathKey {
    fn eq(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len() && self.is_prefix_of(other)
    }
}

impl Eq for PathKey {}

impl Hash for PathKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for segment in &self.segments {
            for c in fold(segment) {
                state.write_u32(c as u32);
            }
            // Segment boundary, so "ab" and "a:b" hash differently
            state.write_u8(0xff);
        }
    }
}

impl PartialOrd for PathKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.segments.iter().zip(&other.segments) {
            match segment_cmp(a, b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.segments.len().cmp(&other.segments.len())
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl fmt::Debug for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathKey({:?})", self.format())
    }
}

impl FromStr for PathKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for PathKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for PathKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        PathKey::parse(&text).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

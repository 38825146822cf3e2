//! Dotted parameter paths.
//!
//! A [`Path`] is the addressing scheme the whole engine is built on: every
//! argument key, every schema field, every thunk in the evaluator's graph is
//! keyed by one of these. Paths are canonical strings — two paths are equal
//! iff their textual forms are equal — which keeps `ArgumentMap` and the
//! evaluation cache simple `HashMap`s instead of needing a custom `Eq`.

use std::fmt;

/// A single path segment: either a plain identifier or a decimal index.
fn is_valid_segment(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    if segment.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    let mut chars = segment.chars();
    let first = chars.next().unwrap();
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Error returned when a string does not form a valid [`Path`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    /// One of the dot-separated segments is not a valid identifier or index.
    #[error("invalid path segment '{segment}' in '{path}'")]
    InvalidSegment { path: String, segment: String },
}

/// A dot-separated sequence of segments, e.g. `"handler.retries.0"`.
///
/// The empty path (`Path::root()`) denotes the root of the schema tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(String);

impl Path {
    /// The root path — the empty segment sequence.
    pub fn root() -> Self {
        Path(String::new())
    }

    /// Parses a canonical dotted string into a `Path`, validating every segment.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Ok(Path::root());
        }
        for segment in s.split('.') {
            if !is_valid_segment(segment) {
                return Err(PathError::InvalidSegment {
                    path: s.to_string(),
                    segment: segment.to_string(),
                });
            }
        }
        Ok(Path(s.to_string()))
    }

    /// Returns whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the canonical dotted string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the segments of this path, in order. Empty for the root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        if self.0.is_empty() {
            Either::Empty
        } else {
            Either::Some(self.0.split('.'))
        }
    }

    /// Returns the number of segments (0 for the root).
    pub fn len(&self) -> usize {
        self.segments().count()
    }

    /// Returns whether this path has no segments.
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// Returns a new path with `segment` appended.
    ///
    /// `segment` is not re-validated beyond non-emptiness; callers constructing
    /// segments programmatically (e.g. numeric indices) are expected to pass
    /// well-formed identifiers.
    pub fn join(&self, segment: &str) -> Path {
        if self.0.is_empty() {
            Path(segment.to_string())
        } else {
            Path(format!("{}.{}", self.0, segment))
        }
    }

    /// Returns a new path with a decimal index segment appended.
    pub fn join_index(&self, index: usize) -> Path {
        self.join(&index.to_string())
    }

    /// Returns the last segment, or `None` for the root.
    pub fn last_segment(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Returns the parent path (all but the last segment), or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('.') {
            Some(idx) => Some(Path(self.0[..idx].to_string())),
            None => Some(Path::root()),
        }
    }

    /// Returns whether `self` is `prefix` or a descendant of `prefix`.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        if prefix.is_root() {
            return true;
        }
        if self.0 == prefix.0 {
            return true;
        }
        self.0
            .strip_prefix(prefix.0.as_str())
            .map(|rest| rest.starts_with('.'))
            .unwrap_or(false)
    }

    /// Returns the path relative to `prefix`, if `self` is under `prefix`.
    pub fn strip_prefix(&self, prefix: &Path) -> Option<Path> {
        if !self.starts_with(prefix) {
            return None;
        }
        if prefix.is_root() {
            return Some(self.clone());
        }
        if self.0 == prefix.0 {
            return Some(Path::root());
        }
        Some(Path(self.0[prefix.0.len() + 1..].to_string()))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl std::str::FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

/// Tiny either-iterator so `Path::segments` doesn't need to allocate a `Vec`
/// just to unify the empty and non-empty cases.
enum Either<'a> {
    Empty,
    Some(std::str::Split<'a, char>),
}

impl<'a> Iterator for Either<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Either::Empty => None,
            Either::Some(iter) => iter.next(),
        }
    }
}

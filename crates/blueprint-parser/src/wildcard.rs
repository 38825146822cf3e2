//! Compiles `...`-bearing path templates into matchers over concrete paths
//! (§4.2).
//!
//! A pattern is split into alternating literal-segment runs and wildcard
//! markers. Any run of three or more consecutive `.` characters in the raw
//! pattern string is one wildcard marker — this lets authors write a
//! wildcard either glued directly to a neighboring segment (`...x`, no
//! padding dot needed) or separated from one by the usual single dot
//! (`a....b`, one separator dot plus the three-dot marker); both compile to
//! the same three-part pattern `[Literal("a"), Wildcard, Literal("b")]`
//! matching `a`, `x`, `b` with anything (including nothing) in between.

use blueprint_types::Path;

/// One element of a compiled wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    /// Matches zero or more intermediate segments.
    Wildcard,
}

/// A compiled wildcard pattern, anchored at both ends of the path it is
/// matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardPattern {
    raw: String,
    parts: Vec<Part>,
}

impl WildcardPattern {
    /// Compiles a raw pattern string. Returns `None` if the pattern contains
    /// no wildcard marker (callers should treat it as an ordinary qualified
    /// path in that case).
    pub fn compile(pattern: &str) -> Option<WildcardPattern> {
        if !pattern.contains("...") {
            return None;
        }
        let mut parts = Vec::new();
        let bytes = pattern.as_bytes();
        let mut literal_start = 0usize;
        let mut i = 0usize;
        while i < bytes.len() {
            if bytes[i] == b'.' {
                let run_start = i;
                while i < bytes.len() && bytes[i] == b'.' {
                    i += 1;
                }
                if i - run_start >= 3 {
                    push_literal(&mut parts, &pattern[literal_start..run_start]);
                    parts.push(Part::Wildcard);
                    literal_start = i;
                }
            } else {
                i += 1;
            }
        }
        push_literal(&mut parts, &pattern[literal_start..]);

        Some(WildcardPattern {
            raw: pattern.to_string(),
            parts,
        })
    }

    /// The original, uncompiled pattern string.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns whether this pattern matches `path` in full (anchored at both ends).
    pub fn matches(&self, path: &Path) -> bool {
        let segments: Vec<&str> = path.segments().collect();
        match_parts(&self.parts, &segments)
    }

    /// Ranks `candidates` by edit distance to this pattern's raw text, for
    /// "did you mean" suggestions when the pattern matched nothing.
    pub fn approximate<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a str>,
        max_distance: usize,
    ) -> Vec<&'a str> {
        let mut scored: Vec<(usize, &str)> = candidates
            .into_iter()
            .map(|c| (strsim::levenshtein(&self.raw, c), c))
            .filter(|(d, _)| *d <= max_distance)
            .collect();
        scored.sort_by_key(|(d, _)| *d);
        scored.into_iter().map(|(_, c)| c).collect()
    }
}

fn push_literal(parts: &mut Vec<Part>, chunk: &str) {
    for segment in chunk.split('.') {
        if !segment.is_empty() {
            parts.push(Part::Literal(segment.to_string()));
        }
    }
}

fn match_parts(parts: &[Part], path: &[&str]) -> bool {
    match parts.first() {
        None => path.is_empty(),
        Some(Part::Literal(seg)) => match path.first() {
            Some(first) if first == seg => match_parts(&parts[1..], &path[1..]),
            _ => false,
        },
        Some(Part::Wildcard) => {
            for k in 0..=path.len() {
                if match_parts(&parts[1..], &path[k..]) {
                    return true;
                }
            }
            false
        }
    }
}

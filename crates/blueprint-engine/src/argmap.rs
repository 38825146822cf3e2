//! The layered, wildcard-aware argument map (§4.3).

use std::collections::{HashMap, HashSet};

use blueprint_parser::WildcardPattern;
use blueprint_types::{ArgValue, Layer, Path};

/// The value resolved for a path, along with the name of the layer it came
/// from (for error messages and `DESIGN.md`'s I5 traceability guarantee).
#[derive(Debug, Clone)]
pub struct Resolved {
    pub value: ArgValue,
    pub layer_name: String,
}

struct CompiledLayer {
    name: String,
    qualified: HashMap<Path, ArgValue>,
    wildcard: Vec<(WildcardPattern, ArgValue)>,
    /// Raw keys that never became a `Path` (currently: hyphen-leading keys
    /// seen without `allow_hyphens`). Never consulted by the walker — they
    /// exist solely so `extraneous()` can still report them.
    unparseable: Vec<String>,
}

/// An extraneous key: present in a layer but never consulted by the schema
/// walker. `path` is the raw key text — for a key that parsed into a
/// `Path`, its canonical string form; for a key that never parsed at all
/// (e.g. hyphen-leading without `allow_hyphens`), the original raw key.
#[derive(Debug, Clone)]
pub struct ExtraneousEntry {
    pub path: String,
    pub layer_name: String,
    pub suggestions: Vec<String>,
}

/// The ordered stack of [`Layer`]s plus the bookkeeping needed for
/// extraneous-key detection (§4.3).
///
/// Wildcard patterns are compiled once, at construction, rather than on
/// every `get`.
pub struct ArgumentMap {
    layers: Vec<CompiledLayer>,
    used: HashSet<Path>,
}

impl ArgumentMap {
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new(layers: Vec<Layer>) -> Self {
        let layers = layers
            .into_iter()
            .map(|layer| {
                let wildcard = layer
                    .wildcard
                    .into_iter()
                    .filter_map(|entry| {
                        WildcardPattern::compile(&entry.pattern).map(|pattern| (pattern, entry.value))
                    })
                    .collect();
                CompiledLayer {
                    name: layer.name,
                    qualified: layer.qualified,
                    wildcard,
                    unparseable: layer.unparseable.into_iter().map(|(key, _value)| key).collect(),
                }
            })
            .collect();
        ArgumentMap {
            layers,
            used: HashSet::new(),
        }
    }

    /// Resolves `path`'s effective value. Precedence (I6): later qualified
    /// layer beats earlier qualified layer beats any wildcard match; among
    /// wildcards, the most recently added entry (scanning layers latest
    /// first, and within a layer, its own entries latest-pushed first) wins.
    ///
    /// A successful qualified-layer hit marks `path` used; wildcard hits are
    /// not tracked for extraneous-key purposes since the wildcard entry
    /// itself, not `path`, is the thing that could go unconsulted.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn get(&mut self, path: &Path) -> Option<Resolved> {
        for layer in self.layers.iter().rev() {
            if let Some(value) = layer.qualified.get(path) {
                self.used.insert(path.clone());
                tracing::trace!(path = %path, layer = %layer.name, "qualified hit");
                return Some(Resolved {
                    value: value.clone(),
                    layer_name: layer.name.clone(),
                });
            }
        }
        for layer in self.layers.iter().rev() {
            for (pattern, value) in layer.wildcard.iter().rev() {
                if pattern.matches(path) {
                    tracing::trace!(path = %path, layer = %layer.name, pattern = pattern.raw(), "wildcard hit");
                    return Some(Resolved {
                        value: value.clone(),
                        layer_name: layer.name.clone(),
                    });
                }
            }
        }
        None
    }

    /// Immediate child segments of `prefix` across every layer's *qualified*
    /// entries, sorted lexicographically for identifier segments and
    /// numerically for all-digit (index) segments.
    pub fn subpaths(&self, prefix: &Path) -> Vec<String> {
        let mut children = HashSet::new();
        for layer in &self.layers {
            for path in layer.qualified.keys() {
                if let Some(rest) = path.strip_prefix(prefix) {
                    if let Some(first) = rest.segments().next() {
                        children.insert(first.to_string());
                    }
                }
            }
        }
        let mut children: Vec<String> = children.into_iter().collect();
        children.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
            (Ok(na), Ok(nb)) => na.cmp(&nb),
            _ => a.cmp(b),
        });
        children
    }

    /// Marks `path` as having been consulted, without performing a lookup.
    /// The walker uses this when it resolves a value through some other
    /// path (e.g. reference chasing already calls `get` on the target).
    pub fn mark_used(&mut self, path: &Path) {
        self.used.insert(path.clone());
    }

    /// Qualified keys that were never consulted during the walk, each with
    /// up to three suggestions (§4.3): the closest known path by edit
    /// distance, the closest valid ancestor prefix, and — if the key begins
    /// with `-` — a hint to enable `allow_hyphens`.
    pub fn extraneous(&self, known_paths: &[Path]) -> Vec<ExtraneousEntry> {
        let mut out = Vec::new();
        for layer in &self.layers {
            for path in layer.qualified.keys() {
                if self.used.contains(path) {
                    continue;
                }
                out.push(ExtraneousEntry {
                    path: path.to_string(),
                    layer_name: layer.name.clone(),
                    suggestions: suggest(path.as_str(), known_paths),
                });
            }
            for raw in &layer.unparseable {
                out.push(ExtraneousEntry {
                    path: raw.clone(),
                    layer_name: layer.name.clone(),
                    suggestions: suggest(raw, known_paths),
                });
            }
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        out
    }
}

/// Suggestions for an unconsulted key (§4.3): the closest known path by edit
/// distance, the closest valid ancestor prefix (only when `raw` itself
/// parses as a `Path` — an unparseable hyphen-leading key has none), and —
/// if `raw` begins with `-` — a hint to enable `allow_hyphens`.
fn suggest(raw: &str, known_paths: &[Path]) -> Vec<String> {
    let mut suggestions = Vec::new();

    let max_distance = 1 + (raw.chars().count() as f64 * 0.4).floor() as usize;
    let mut ranked: Vec<(usize, &str)> = known_paths
        .iter()
        .map(|p| (strsim::levenshtein(raw, p.as_str()), p.as_str()))
        .filter(|(d, _)| *d <= max_distance)
        .collect();
    ranked.sort_by_key(|(d, _)| *d);
    if let Some((_, closest)) = ranked.first() {
        suggestions.push(closest.to_string());
    }

    if let Ok(path) = Path::parse(raw) {
        let mut ancestor = path.parent();
        while let Some(candidate) = ancestor {
            if known_paths.iter().any(|p| p.starts_with(&candidate)) {
                suggestions.push(candidate.to_string());
                break;
            }
            ancestor = candidate.parent();
        }
    }

    if raw.starts_with('-') {
        suggestions.push("enable allow_hyphens to strip leading '-'/'--' from keys".to_string());
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn layer_with(name: &str, entries: &[(&str, &str)]) -> Layer {
        let mut layer = Layer::new(name);
        for (k, v) in entries {
            layer.insert_qualified(path(k), ArgValue::castable(*v));
        }
        layer
    }

    #[test]
    fn test_later_layer_overrides_earlier_for_qualified_key() {
        let base = layer_with("base", &[("a", "1")]);
        let override_layer = layer_with("override", &[("a", "2")]);
        let mut map = ArgumentMap::new(vec![base, override_layer]);
        let resolved = map.get(&path("a")).unwrap();
        assert_eq!(resolved.layer_name, "override");
        assert!(matches!(resolved.value, ArgValue::Castable(ref s) if s == "2"));
    }

    #[test]
    fn test_qualified_beats_wildcard() {
        let mut wild = Layer::new("wild");
        wild.push_wildcard("...x", ArgValue::castable("wild"));
        let qualified = layer_with("qualified", &[("a.x", "direct")]);
        let mut map = ArgumentMap::new(vec![wild, qualified]);
        let resolved = map.get(&path("a.x")).unwrap();
        assert!(matches!(resolved.value, ArgValue::Castable(ref s) if s == "direct"));
    }

    #[test]
    fn test_wildcard_fallback_when_no_qualified_match() {
        let mut wild = Layer::new("wild");
        wild.push_wildcard("...x", ArgValue::castable("7"));
        let mut map = ArgumentMap::new(vec![wild]);
        assert!(matches!(
            map.get(&path("a.x")).unwrap().value,
            ArgValue::Castable(ref s) if s == "7"
        ));
        assert!(matches!(
            map.get(&path("b.x")).unwrap().value,
            ArgValue::Castable(ref s) if s == "7"
        ));
    }

    #[test]
    fn test_most_recent_wildcard_wins() {
        let mut layer = Layer::new("cli");
        layer.push_wildcard("...x", ArgValue::castable("first"));
        layer.push_wildcard("a....x", ArgValue::castable("second"));
        let mut map = ArgumentMap::new(vec![layer]);
        assert!(matches!(
            map.get(&path("a.x")).unwrap().value,
            ArgValue::Castable(ref s) if s == "second"
        ));
    }

    #[test]
    fn test_subpaths_numeric_sort() {
        let layer = layer_with("cli", &[("coords.10", "x"), ("coords.2", "y"), ("coords.1", "z")]);
        let map = ArgumentMap::new(vec![layer]);
        assert_eq!(map.subpaths(&path("coords")), vec!["1", "2", "10"]);
    }

    #[test]
    fn test_extraneous_flags_unconsulted_keys() {
        let layer = layer_with("cli", &[("raet", "0.5")]);
        let mut map = ArgumentMap::new(vec![layer]);
        let _ = map.get(&path("untouched"));
        let known = vec![path("rate")];
        let extraneous = map.extraneous(&known);
        assert_eq!(extraneous.len(), 1);
        assert_eq!(extraneous[0].path, "raet");
        assert_eq!(extraneous[0].suggestions.first().map(String::as_str), Some("rate"));
    }

    #[test]
    fn test_unparseable_hyphen_key_flagged_with_allow_hyphens_hint() {
        let mut layer = Layer::new("cli");
        layer.push_unparseable("--rate", ArgValue::castable("0.5"));
        let map = ArgumentMap::new(vec![layer]);
        let known = vec![path("rate")];
        let extraneous = map.extraneous(&known);
        assert_eq!(extraneous.len(), 1);
        assert_eq!(extraneous[0].path, "--rate");
        assert!(extraneous[0]
            .suggestions
            .iter()
            .any(|s| s.contains("allow_hyphens")));
    }

    #[test]
    fn test_consulted_key_is_not_extraneous() {
        let layer = layer_with("cli", &[("a", "1")]);
        let mut map = ArgumentMap::new(vec![layer]);
        map.get(&path("a"));
        assert!(map.extraneous(&[]).is_empty());
    }
}

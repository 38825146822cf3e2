//! Layers: named, atomically-applied batches of argument entries.

use std::collections::HashMap;

use crate::path::Path;
use crate::value::ArgValue;

/// A single wildcard entry: the raw pattern string (containing one or more
/// `...` tokens) paired with the value it contributes when matched.
///
/// The pattern is kept as a raw string here rather than a compiled matcher so
/// that `blueprint-types` stays dependency-free; `blueprint-parser::wildcard`
/// compiles it on demand.
#[derive(Debug, Clone)]
pub struct WildcardEntry {
    pub pattern: String,
    pub value: ArgValue,
}

/// A named batch of argument entries applied atomically to a blueprint.
///
/// Layers are stacked in an [`crate::ArgumentMap`][argmap]; later layers
/// override earlier ones for qualified keys, while wildcard entries only ever
/// act as a fallback (I6: wildcard keys never shadow qualified keys).
///
/// [argmap]: https://docs.rs/blueprint-engine (see `blueprint_engine::argmap::ArgumentMap`)
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub qualified: HashMap<Path, ArgValue>,
    pub wildcard: Vec<WildcardEntry>,
    /// Raw keys that could not be parsed into a [`Path`] but are kept around
    /// rather than rejected outright — currently just hyphen-leading keys
    /// seen without `allow_hyphens` (§4.3's `allow_hyphens` suggestion hint
    /// needs the original key to still be reportable via `extraneous()`).
    pub unparseable: Vec<(String, ArgValue)>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Layer {
            name: name.into(),
            qualified: HashMap::new(),
            wildcard: Vec::new(),
            unparseable: Vec::new(),
        }
    }

    /// Inserts a qualified (non-wildcard) entry, last-wins within the layer.
    pub fn insert_qualified(&mut self, path: Path, value: ArgValue) {
        self.qualified.insert(path, value);
    }

    /// Appends a wildcard entry. Order matters: the most recently added
    /// wildcard entry wins among those that match a given path.
    pub fn push_wildcard(&mut self, pattern: impl Into<String>, value: ArgValue) {
        self.wildcard.push(WildcardEntry {
            pattern: pattern.into(),
            value,
        });
    }

    /// Records a key that failed to parse as a [`Path`] but should still
    /// surface as an extraneous entry rather than aborting the whole layer.
    pub fn push_unparseable(&mut self, key: impl Into<String>, value: ArgValue) {
        self.unparseable.push((key.into(), value));
    }

    /// Rewrites every key in this layer to be prefixed by `prefix`, producing
    /// a new layer suitable for nesting a sub-blueprint's arguments under a
    /// parent path.
    pub fn nest(&self, prefix: &Path) -> Layer {
        let qualified = self
            .qualified
            .iter()
            .map(|(k, v)| {
                let nested = if k.is_root() {
                    prefix.clone()
                } else {
                    Path::parse(&format!("{}.{}", prefix.as_str(), k.as_str()))
                        .expect("prefix join of two valid paths is valid")
                };
                (nested, v.clone())
            })
            .collect();
        let wildcard = self
            .wildcard
            .iter()
            .map(|entry| WildcardEntry {
                pattern: format!("{}.{}", prefix.as_str(), entry.pattern),
                value: entry.value.clone(),
            })
            .collect();
        let unparseable = self
            .unparseable
            .iter()
            .map(|(key, value)| (format!("{}.{}", prefix.as_str(), key), value.clone()))
            .collect();
        Layer {
            name: self.name.clone(),
            qualified,
            wildcard,
            unparseable,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Separator between the namespace and the path of an id.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Prefix marking a tag reference inside ingredient cells and tag members.
pub const TAG_PREFIX: char = '#';

/// Identifies an item by its namespaced string (`namespace:name`).
///
/// Cheap to clone. Ordering is plain lexicographic order of the string, which
/// is the order used for every sorted output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Arc<str>);

impl ItemId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace part, or `None` for a bare name.
    pub fn namespace(&self) -> Option<&str> {
        split_namespace(&self.0).0
    }

    /// The part after the namespace separator (the whole id for bare names).
    pub fn path(&self) -> &str {
        split_namespace(&self.0).1
    }

    /// Human-readable name: `minecraft:oak_log` becomes `Oak Log`.
    pub fn display_name(&self) -> String {
        self.path()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

/// Identifies a tag, written without the leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(Arc<str>);

impl TagId {
    /// Build a tag id, dropping a leading `#` if present.
    pub fn new(id: impl AsRef<str>) -> Self {
        let id = id.as_ref();
        Self(Arc::from(id.strip_prefix(TAG_PREFIX).unwrap_or(id)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> Option<&str> {
        split_namespace(&self.0).0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TAG_PREFIX}{}", self.0)
    }
}

impl Borrow<str> for TagId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Split `ns:path` into `(Some(ns), path)`; bare names give `(None, name)`.
pub fn split_namespace(id: &str) -> (Option<&str>, &str) {
    match id.split_once(NAMESPACE_SEPARATOR) {
        Some((ns, path)) => (Some(ns), path),
        None => (None, id),
    }
}

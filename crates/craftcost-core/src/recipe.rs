//! Normalized recipe model.
//!
//! Declarations arrive in several incompatible shapes. The loader converts
//! each shape into the small tagged variants here ([`OutputSpec`],
//! [`IngredientSpec`]); everything downstream only sees a [`RecipeRecord`]
//! with concrete item ids and integer counts.

use crate::id::{ItemId, TAG_PREFIX, TagId, split_namespace};
use crate::registry::TagRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Namespace of the base game. Kinds in this namespace rank above mod kinds.
pub const NATIVE_NAMESPACE: &str = "minecraft";

// ---------------------------------------------------------------------------
// Recipe kind
// ---------------------------------------------------------------------------

/// Opaque production mechanism, e.g. `minecraft:crafting_shaped`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeKind(Arc<str>);

impl RecipeKind {
    pub fn new(kind: impl AsRef<str>) -> Self {
        Self(Arc::from(kind.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for kinds in the base-game namespace.
    pub fn is_native(&self) -> bool {
        split_namespace(&self.0).0 == Some(NATIVE_NAMESPACE)
    }
}

impl fmt::Display for RecipeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Provenance and selection score
// ---------------------------------------------------------------------------

/// Where a declaration came from. Declaration order is also the traversal
/// order used for tie-breaks within one content root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// A loose file on disk.
    Loose,
    /// An entry inside a packaged archive.
    Archive,
    /// A block embedded in a script source file.
    Script,
}

impl Provenance {
    /// Selection rank: archives lose to loose files and scripts.
    pub fn rank(self) -> u8 {
        match self {
            Provenance::Archive => 0,
            Provenance::Loose | Provenance::Script => 1,
        }
    }
}

/// How much the selector trusts a recipe kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindPriority {
    OtherMod = 0,
    OtherNative = 1,
    NativeSupported = 2,
}

impl KindPriority {
    /// Classify a kind given whether it has a dedicated extraction strategy.
    pub fn classify(kind: &RecipeKind, has_registered_strategy: bool) -> Self {
        match (kind.is_native(), has_registered_strategy) {
            (true, true) => KindPriority::NativeSupported,
            (true, false) => KindPriority::OtherNative,
            (false, _) => KindPriority::OtherMod,
        }
    }
}

/// `(parseable, kind priority, provenance rank)`, compared lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SelectionScore {
    pub parseable: bool,
    pub kind_priority: KindPriority,
    pub provenance_rank: u8,
}

// ---------------------------------------------------------------------------
// Output and ingredient specs
// ---------------------------------------------------------------------------

/// Declared recipe result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSpec {
    /// Bare id, count 1.
    Id(ItemId),
    /// Explicit id and count.
    Stack { id: ItemId, count: u32 },
    /// A list of results; only the first counts.
    List(Vec<OutputSpec>),
}

impl OutputSpec {
    /// Normalize to `(item, count)`. A zero count or an empty list yields
    /// `None`.
    pub fn normalize(&self) -> Option<(ItemId, u32)> {
        match self {
            OutputSpec::Id(id) => Some((id.clone(), 1)),
            OutputSpec::Stack { count: 0, .. } => None,
            OutputSpec::Stack { id, count } => Some((id.clone(), *count)),
            OutputSpec::List(list) => list.first().and_then(OutputSpec::normalize),
        }
    }
}

/// One ingredient cell of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngredientSpec {
    Item { id: ItemId, count: u32 },
    Tag { tag: TagId, count: u32 },
    /// Alternatives; the first candidate is always taken.
    Choice(Vec<IngredientSpec>),
    /// A cell shape the loader does not understand (fluids, custom types).
    Unsupported,
}

impl IngredientSpec {
    /// Multiply the stated count, e.g. by a symbol's frequency in a grid.
    pub fn scaled(self, factor: u32) -> Self {
        match self {
            IngredientSpec::Item { id, count } => IngredientSpec::Item {
                id,
                count: count.saturating_mul(factor),
            },
            IngredientSpec::Tag { tag, count } => IngredientSpec::Tag {
                tag,
                count: count.saturating_mul(factor),
            },
            IngredientSpec::Choice(candidates) => IngredientSpec::Choice(
                candidates.into_iter().map(|c| c.scaled(factor)).collect(),
            ),
            IngredientSpec::Unsupported => IngredientSpec::Unsupported,
        }
    }

    /// Resolve to a concrete `(item, count)`.
    ///
    /// Tags resolve to their first member. An undeclared or empty tag, or a
    /// tag whose first member is itself a `#` reference, yields `None`:
    /// nested tags are not expanded.
    pub fn normalize(&self, tags: &TagRegistry) -> Option<(ItemId, u32)> {
        match self {
            IngredientSpec::Item { id, count } => Some((id.clone(), *count)),
            IngredientSpec::Tag { tag, count } => {
                let first = tags.first_member(tag)?;
                if first.starts_with(TAG_PREFIX) {
                    tracing::debug!(%tag, member = first, "nested tag reference not expanded");
                    return None;
                }
                Some((ItemId::new(first), *count))
            }
            IngredientSpec::Choice(candidates) => {
                candidates.first().and_then(|c| c.normalize(tags))
            }
            IngredientSpec::Unsupported => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Recipe record
// ---------------------------------------------------------------------------

/// A normalized ingredient: concrete item and per-craft count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeEntry {
    pub item: ItemId,
    pub count: u32,
}

/// One normalized recipe declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeRecord {
    pub output: ItemId,
    pub output_count: u32,
    pub kind: RecipeKind,
    pub ingredients: Vec<RecipeEntry>,
    pub provenance: Provenance,
    pub parseable: bool,
    /// Injected fallback rather than a declaration found in the content.
    pub synthetic: bool,
    /// Human-readable origin (file path, archive entry, script line).
    pub source: String,
}

impl RecipeRecord {
    pub fn score(&self, kind_priority: KindPriority) -> SelectionScore {
        SelectionScore {
            parseable: self.parseable,
            kind_priority,
            provenance_rank: self.provenance.rank(),
        }
    }
}

/// Merge duplicate items, summing counts and keeping first-seen order.
pub fn merge_entries(entries: impl IntoIterator<Item = (ItemId, u32)>) -> Vec<RecipeEntry> {
    let mut merged: Vec<RecipeEntry> = Vec::new();
    for (item, count) in entries {
        match merged.iter_mut().find(|e| e.item == item) {
            Some(existing) => existing.count = existing.count.saturating_add(count),
            None => merged.push(RecipeEntry { item, count }),
        }
    }
    merged
}

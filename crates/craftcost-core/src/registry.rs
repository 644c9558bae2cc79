//! Immutable recipe and tag registries.
//!
//! Both registries follow a builder lifecycle: candidates are offered to a
//! builder (possibly several builders, one per content root, merged later),
//! and `build()` freezes the selection. Selection is an online maximum over a
//! total order, so offer order and merge order never change the result.

use crate::alias::AliasTable;
use crate::fallback::FallbackRecipe;
use crate::id::{ItemId, TagId};
use crate::recipe::{KindPriority, Provenance, RecipeRecord, SelectionScore};
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Discovery key
// ---------------------------------------------------------------------------

/// Stable position of a declaration in the sorted traversal of all content
/// roots. Only used to break score ties: smaller keys were discovered first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DiscoveryKey {
    /// Index of the content root in the caller's root list.
    pub root: u32,
    /// Source class; loose files are traversed before archives and scripts.
    pub source: Provenance,
    /// Path relative to the root, `/`-separated.
    pub path: String,
    /// Entry name inside an archive (empty otherwise).
    pub entry: String,
    /// Ordinal of the block inside a script file (0 otherwise).
    pub ordinal: u32,
}

// ---------------------------------------------------------------------------
// Recipe registry
// ---------------------------------------------------------------------------

/// A recipe declaration competing for its output item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeCandidate {
    pub record: RecipeRecord,
    pub kind_priority: KindPriority,
    pub discovery: DiscoveryKey,
}

impl RecipeCandidate {
    pub fn score(&self) -> SelectionScore {
        self.record.score(self.kind_priority)
    }

    /// Total order used for selection: higher score first, then earlier
    /// discovery.
    fn rank(&self, other: &Self) -> Ordering {
        (self.score(), Reverse(&self.discovery)).cmp(&(other.score(), Reverse(&other.discovery)))
    }
}

/// Collects recipe candidates and keeps the best one per output item.
#[derive(Debug, Default)]
pub struct RecipeRegistryBuilder {
    selected: HashMap<ItemId, RecipeCandidate>,
    offered: usize,
}

impl RecipeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a candidate. Returns `true` if it is now the selection for its
    /// output item.
    pub fn offer(&mut self, candidate: RecipeCandidate) -> bool {
        self.offered += 1;
        match self.selected.get_mut(&candidate.record.output) {
            Some(current) => {
                if candidate.rank(current) == Ordering::Greater {
                    *current = candidate;
                    true
                } else {
                    false
                }
            }
            None => {
                self.selected
                    .insert(candidate.record.output.clone(), candidate);
                true
            }
        }
    }

    /// Fold another builder into this one.
    pub fn merge(&mut self, other: RecipeRegistryBuilder) {
        let offered = self.offered + other.offered;
        for (_, candidate) in other.selected {
            self.offer(candidate);
        }
        self.offered = offered;
    }

    /// Number of candidates offered so far, including losers.
    pub fn offered(&self) -> usize {
        self.offered
    }

    /// Current selection for an item, if any.
    pub fn selected(&self, item: &str) -> Option<&RecipeCandidate> {
        self.selected.get(item)
    }

    /// Freeze the selection. Winners that are not parseable are dropped, so
    /// their output items resolve as raw materials.
    pub fn build(self) -> RecipeRegistry {
        let recipes = self
            .selected
            .into_iter()
            .filter(|(_, candidate)| candidate.record.parseable)
            .map(|(item, candidate)| (item, candidate.record))
            .collect();
        RecipeRegistry { recipes }
    }
}

/// Immutable map from canonical output item to its selected recipe.
/// Absence means the item is a raw material.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeRegistry {
    recipes: HashMap<ItemId, RecipeRecord>,
}

impl RecipeRegistry {
    /// Build directly from records. The first record per output wins.
    pub fn from_records(records: impl IntoIterator<Item = RecipeRecord>) -> Self {
        let mut recipes = HashMap::new();
        for record in records {
            recipes.entry(record.output.clone()).or_insert(record);
        }
        Self { recipes }
    }

    pub fn get(&self, item: &str) -> Option<&RecipeRecord> {
        self.recipes.get(item)
    }

    pub fn contains(&self, item: &str) -> bool {
        self.recipes.contains_key(item)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &RecipeRecord)> {
        self.recipes.iter()
    }

    /// Output items in lexicographic order.
    pub fn items(&self) -> Vec<&ItemId> {
        let mut items: Vec<&ItemId> = self.recipes.keys().collect();
        items.sort();
        items
    }

    /// Number of injected fallback records.
    pub fn synthetic_count(&self) -> usize {
        self.recipes.values().filter(|r| r.synthetic).count()
    }

    /// Return a new registry with fallback recipes added for every anchor
    /// item that has no selected recipe. Existing records are never replaced.
    pub fn with_fallbacks(self, fallbacks: &[FallbackRecipe], aliases: &AliasTable) -> Self {
        let mut recipes = self.recipes;
        for fallback in fallbacks {
            let record = fallback.to_record(aliases);
            if !recipes.contains_key(&record.output) {
                tracing::debug!(item = %record.output, "injecting fallback recipe");
                recipes.insert(record.output.clone(), record);
            }
        }
        Self { recipes }
    }
}

// ---------------------------------------------------------------------------
// Tag registry
// ---------------------------------------------------------------------------

/// A tag declaration found in a content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDeclaration {
    pub tag: TagId,
    /// Canonical member strings in declared order; `#` marks nested tags.
    pub members: Vec<String>,
    pub provenance: Provenance,
    pub discovery: DiscoveryKey,
}

impl TagDeclaration {
    fn rank(&self, other: &Self) -> Ordering {
        (self.provenance.rank(), Reverse(&self.discovery))
            .cmp(&(other.provenance.rank(), Reverse(&other.discovery)))
    }
}

/// Collects tag declarations. Loose declarations beat archive ones; among
/// equal provenance the first discovered wins.
#[derive(Debug, Default)]
pub struct TagRegistryBuilder {
    selected: HashMap<TagId, TagDeclaration>,
}

impl TagRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, declaration: TagDeclaration) -> bool {
        match self.selected.get_mut(&declaration.tag) {
            Some(current) => {
                if declaration.rank(current) == Ordering::Greater {
                    *current = declaration;
                    true
                } else {
                    false
                }
            }
            None => {
                self.selected.insert(declaration.tag.clone(), declaration);
                true
            }
        }
    }

    pub fn merge(&mut self, other: TagRegistryBuilder) {
        for (_, declaration) in other.selected {
            self.offer(declaration);
        }
    }

    pub fn build(self) -> TagRegistry {
        TagRegistry {
            tags: self
                .selected
                .into_iter()
                .map(|(tag, declaration)| (tag, declaration.members))
                .collect(),
        }
    }
}

/// Immutable map from tag id to ordered members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRegistry {
    tags: HashMap<TagId, Vec<String>>,
}

impl TagRegistry {
    pub fn members(&self, tag: &str) -> Option<&[String]> {
        self.tags.get(tag).map(Vec::as_slice)
    }

    pub fn first_member(&self, tag: &TagId) -> Option<&str> {
        self.tags
            .get(tag)
            .and_then(|members| members.first())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TagId, &[String])> {
        self.tags.iter().map(|(tag, members)| (tag, members.as_slice()))
    }
}

//! The immutable recipe, tag, and alias bundle that resolution runs read from.

use crate::alias::AliasTable;
use crate::engine::{Bom, Engine, ResolveError};
use crate::id::{ItemId, TAG_PREFIX};
use crate::recipe::RecipeRecord;
use crate::registry::{RecipeRegistry, TagRegistry};
use std::collections::BTreeSet;

/// Everything a resolution run reads: alias table, selected recipes, tags.
///
/// Built once per content-root set and never mutated. Safe to share across
/// threads; each concurrent request creates its own [`Engine`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    aliases: AliasTable,
    recipes: RecipeRegistry,
    tags: TagRegistry,
}

impl Catalog {
    pub fn new(aliases: AliasTable, recipes: RecipeRegistry, tags: TagRegistry) -> Self {
        Self {
            aliases,
            recipes,
            tags,
        }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn recipes(&self) -> &RecipeRegistry {
        &self.recipes
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    /// Canonical form of a requested id.
    pub fn canonicalize(&self, raw: &str) -> ItemId {
        self.aliases.canonicalize(raw)
    }

    /// Selected recipe for a raw (possibly aliased) id.
    pub fn recipe(&self, raw: &str) -> Option<&RecipeRecord> {
        self.recipes.get(self.canonicalize(raw).as_str())
    }

    /// Every item the catalog knows about: recipe outputs plus concrete tag
    /// members. Nested tag references are excluded.
    pub fn known_items(&self) -> BTreeSet<ItemId> {
        let mut items: BTreeSet<ItemId> = self.recipes.iter().map(|(id, _)| id.clone()).collect();
        for (_, members) in self.tags.iter() {
            items.extend(
                members
                    .iter()
                    .filter(|m| !m.starts_with(TAG_PREFIX))
                    .map(ItemId::new),
            );
        }
        items
    }

    /// One-shot analysis with a fresh engine.
    pub fn analyze(&self, item: &str, quantity: f64) -> Result<Bom, ResolveError> {
        Engine::new(self).analyze(item, quantity)
    }
}

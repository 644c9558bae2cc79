//! Craftcost Core -- bill-of-materials resolution for modded crafting packs.
//!
//! This crate owns the normalized recipe model, the immutable recipe and tag
//! registries, namespace canonicalization, and the resolution engine that
//! walks a production graph down to raw materials.
//!
//! # Resolution Pipeline
//!
//! A [`catalog::Catalog`] is assembled once (usually by `craftcost-data`) and
//! is then shared read-only. Each request creates its own
//! [`engine::Engine`], which owns a private memo:
//!
//! ```rust,ignore
//! let mut engine = Engine::new(&catalog);
//! let bom = engine.analyze("minecraft:stone_pickaxe", 1.0)?;
//! let graph = GraphDescription::from_steps(&bom.steps);
//! ```
//!
//! # Key Types
//!
//! - [`id::ItemId`] -- Namespaced item identifier, cheap to clone.
//! - [`alias::AliasTable`] -- Maps historical namespaces onto canonical ones.
//! - [`recipe::RecipeRecord`] -- One normalized recipe declaration.
//! - [`registry::RecipeRegistry`] -- Selected recipe per output item (frozen).
//! - [`registry::TagRegistry`] -- Ordered tag members (frozen).
//! - [`engine::Engine`] -- Per-run resolver with memo and cycle guard.
//! - [`export`] -- Sorted material lists, graph descriptions, quantity text.

pub mod alias;
pub mod catalog;
pub mod engine;
pub mod export;
pub mod fallback;
pub mod id;
pub mod recipe;
pub mod registry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

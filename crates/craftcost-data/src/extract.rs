//! Per-kind ingredient extraction.
//!
//! Each recipe kind maps to one [`Strategy`]. Kinds without a registered
//! strategy get one inferred from the declaration's shape; a declaration
//! with no recognizable shape is unparseable and loses selection to any
//! parseable competitor.

use crate::schema::{IngredientsData, RecipeDeclaration};
use craftcost_core::alias::AliasTable;
use craftcost_core::recipe::{
    IngredientSpec, KindPriority, Provenance, RecipeKind, RecipeRecord, merge_entries,
};
use craftcost_core::registry::{DiscoveryKey, RecipeCandidate, TagRegistry};

/// Mode value under which inscriber presses are catalysts.
pub const INSCRIBE_MODE: &str = "inscribe";

/// How ingredient cells are laid out in a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `pattern` rows plus a symbol `key`.
    Grid,
    /// An `ingredients` array.
    List,
    /// One `ingredient` cell.
    Single,
    /// `ingredients.{top,middle,bottom}`.
    NestedSlots,
    /// Top-level `template`, `base`, `addition`.
    TopLevelSlots,
}

const REGISTERED: &[(&str, Strategy)] = &[
    ("minecraft:crafting_shaped", Strategy::Grid),
    ("minecraft:crafting_shapeless", Strategy::List),
    ("minecraft:smelting", Strategy::Single),
    ("minecraft:blasting", Strategy::Single),
    ("minecraft:smoking", Strategy::Single),
    ("minecraft:campfire_cooking", Strategy::Single),
    ("minecraft:stonecutting", Strategy::Single),
    ("minecraft:smithing_transform", Strategy::TopLevelSlots),
    ("ae2:inscriber", Strategy::NestedSlots),
];

/// Strategy registered for a canonical kind.
pub fn registered_strategy(kind: &str) -> Option<Strategy> {
    REGISTERED
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, strategy)| *strategy)
}

/// Strategy implied by which fields are present.
pub fn infer_strategy(decl: &RecipeDeclaration) -> Option<Strategy> {
    if decl.pattern.is_some() && decl.key.is_some() {
        return Some(Strategy::Grid);
    }
    match &decl.ingredients {
        Some(IngredientsData::List(_) | IngredientsData::Single(_)) => {
            return Some(Strategy::List);
        }
        Some(IngredientsData::Slots(_)) => return Some(Strategy::NestedSlots),
        _ => {}
    }
    if decl.ingredient.is_some() {
        return Some(Strategy::Single);
    }
    if decl.base.is_some() && (decl.template.is_some() || decl.addition.is_some()) {
        return Some(Strategy::TopLevelSlots);
    }
    None
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn grid(decl: &RecipeDeclaration, aliases: &AliasTable) -> Vec<IngredientSpec> {
    let (Some(pattern), Some(key)) = (&decl.pattern, &decl.key) else {
        return Vec::new();
    };

    // Symbol frequencies in first-appearance order.
    let mut symbols: Vec<(char, u32)> = Vec::new();
    for symbol in pattern.iter().flat_map(|row| row.chars()).filter(|c| *c != ' ') {
        match symbols.iter_mut().find(|(s, _)| *s == symbol) {
            Some((_, n)) => *n += 1,
            None => symbols.push((symbol, 1)),
        }
    }

    symbols
        .into_iter()
        .filter_map(|(symbol, frequency)| {
            let cell = key.get(&symbol.to_string())?;
            Some(cell.to_spec(aliases).scaled(frequency))
        })
        .collect()
}

fn list(decl: &RecipeDeclaration, aliases: &AliasTable) -> Vec<IngredientSpec> {
    match &decl.ingredients {
        Some(IngredientsData::List(cells)) => cells.iter().map(|c| c.to_spec(aliases)).collect(),
        Some(IngredientsData::Single(cell)) => vec![cell.to_spec(aliases)],
        Some(IngredientsData::Slots(_)) => nested_slots(decl, aliases),
        None => Vec::new(),
    }
}

fn single(decl: &RecipeDeclaration, aliases: &AliasTable) -> Vec<IngredientSpec> {
    decl.ingredient
        .iter()
        .map(|cell| cell.to_spec(aliases))
        .collect()
}

fn nested_slots(decl: &RecipeDeclaration, aliases: &AliasTable) -> Vec<IngredientSpec> {
    let slots = match &decl.ingredients {
        Some(IngredientsData::Slots(slots)) => slots,
        // Some slot-style kinds also ship array declarations.
        Some(_) => return list(decl, aliases),
        None => return Vec::new(),
    };
    let cells = if decl.mode.as_deref() == Some(INSCRIBE_MODE) {
        vec![&slots.middle]
    } else {
        vec![&slots.top, &slots.middle, &slots.bottom]
    };
    cells
        .into_iter()
        .flatten()
        .map(|cell| cell.to_spec(aliases))
        .collect()
}

fn top_level_slots(decl: &RecipeDeclaration, aliases: &AliasTable) -> Vec<IngredientSpec> {
    [&decl.template, &decl.base, &decl.addition]
        .into_iter()
        .flatten()
        .map(|cell| cell.to_spec(aliases))
        .collect()
}

/// Raw ingredient cells of a declaration under a strategy.
pub fn ingredient_specs(
    strategy: Strategy,
    decl: &RecipeDeclaration,
    aliases: &AliasTable,
) -> Vec<IngredientSpec> {
    match strategy {
        Strategy::Grid => grid(decl, aliases),
        Strategy::List => list(decl, aliases),
        Strategy::Single => single(decl, aliases),
        Strategy::NestedSlots => nested_slots(decl, aliases),
        Strategy::TopLevelSlots => top_level_slots(decl, aliases),
    }
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// Where a declaration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub provenance: Provenance,
    pub discovery: DiscoveryKey,
    /// Human-readable location, e.g. `mods/ae2.jar!data/ae2/recipes/x.json`.
    pub source: String,
}

/// Outcome of normalizing one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// A competing candidate (parseable or not).
    Candidate(RecipeCandidate),
    /// No usable output; nothing competes.
    NoOutput,
}

/// Normalize a declaration into a selection candidate.
///
/// Tags must already be loaded: tag cells resolve to their first member
/// here, and cells that resolve to nothing are dropped.
pub fn extract(
    decl: &RecipeDeclaration,
    origin: Origin,
    aliases: &AliasTable,
    tags: &TagRegistry,
) -> Extracted {
    let Some((output, output_count)) = decl.output(aliases).and_then(|o| o.normalize()) else {
        return Extracted::NoOutput;
    };

    let kind = RecipeKind::new(
        decl.kind
            .as_deref()
            .map(|k| aliases.canonical_str(k))
            .unwrap_or_default(),
    );
    let registered = registered_strategy(kind.as_str());
    let strategy = registered.or_else(|| infer_strategy(decl));

    let ingredients = match strategy {
        Some(strategy) => merge_entries(
            ingredient_specs(strategy, decl, aliases)
                .iter()
                .filter_map(|spec| spec.normalize(tags))
                .filter(|(_, count)| *count > 0),
        ),
        None => Vec::new(),
    };
    let parseable = strategy.is_some() && !ingredients.is_empty();

    Extracted::Candidate(RecipeCandidate {
        kind_priority: KindPriority::classify(&kind, registered.is_some()),
        record: RecipeRecord {
            output,
            output_count,
            kind,
            ingredients,
            provenance: origin.provenance,
            parseable,
            synthetic: false,
            source: origin.source,
        },
        discovery: origin.discovery,
    })
}

// ===========================================================================
// Tests
// ===========================================================================

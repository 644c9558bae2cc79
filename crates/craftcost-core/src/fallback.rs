//! Synthetic fallback recipes for anchor items.
//!
//! Some items sit at the heart of large production trees but are declared
//! with schemas the loader cannot read in many packs (processors and printed
//! circuits are the usual culprits). Without a recipe they would surface as
//! raw materials and cut the tree short. The anchors below are injected only
//! when no parseable declaration was selected, and every injected record is
//! marked `synthetic` so consumers can flag the result as an approximation.

use crate::alias::AliasTable;
use crate::recipe::{Provenance, RecipeKind, RecipeRecord, merge_entries};

/// A statically declared recipe used as a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackRecipe {
    pub output: &'static str,
    pub output_count: u32,
    pub kind: &'static str,
    pub ingredients: &'static [(&'static str, u32)],
}

impl FallbackRecipe {
    /// Convert to a synthetic record with canonical ids.
    pub fn to_record(&self, aliases: &AliasTable) -> RecipeRecord {
        RecipeRecord {
            output: aliases.canonicalize(self.output),
            output_count: self.output_count,
            kind: RecipeKind::new(self.kind),
            ingredients: merge_entries(
                self.ingredients
                    .iter()
                    .map(|(item, count)| (aliases.canonicalize(item), *count)),
            ),
            provenance: Provenance::Loose,
            parseable: true,
            synthetic: true,
            source: format!("fallback:{}", self.output),
        }
    }
}

const INSCRIBER: &str = "ae2:inscriber";

/// Built-in anchors. Presses are catalysts and are not listed.
pub const ANCHOR_RECIPES: &[FallbackRecipe] = &[
    FallbackRecipe {
        output: "ae2:printed_silicon",
        output_count: 1,
        kind: INSCRIBER,
        ingredients: &[("ae2:silicon", 1)],
    },
    FallbackRecipe {
        output: "ae2:printed_logic_processor",
        output_count: 1,
        kind: INSCRIBER,
        ingredients: &[("minecraft:gold_ingot", 1)],
    },
    FallbackRecipe {
        output: "ae2:printed_calculation_processor",
        output_count: 1,
        kind: INSCRIBER,
        ingredients: &[("ae2:certus_quartz_crystal", 1)],
    },
    FallbackRecipe {
        output: "ae2:printed_engineering_processor",
        output_count: 1,
        kind: INSCRIBER,
        ingredients: &[("minecraft:diamond", 1)],
    },
    FallbackRecipe {
        output: "ae2:logic_processor",
        output_count: 1,
        kind: INSCRIBER,
        ingredients: &[
            ("ae2:printed_logic_processor", 1),
            ("minecraft:redstone", 1),
            ("ae2:printed_silicon", 1),
        ],
    },
    FallbackRecipe {
        output: "ae2:calculation_processor",
        output_count: 1,
        kind: INSCRIBER,
        ingredients: &[
            ("ae2:printed_calculation_processor", 1),
            ("minecraft:redstone", 1),
            ("ae2:printed_silicon", 1),
        ],
    },
    FallbackRecipe {
        output: "ae2:engineering_processor",
        output_count: 1,
        kind: INSCRIBER,
        ingredients: &[
            ("ae2:printed_engineering_processor", 1),
            ("minecraft:redstone", 1),
            ("ae2:printed_silicon", 1),
        ],
    },
];

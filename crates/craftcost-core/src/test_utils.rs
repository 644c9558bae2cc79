//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::alias::AliasTable;
use crate::catalog::Catalog;
use crate::id::ItemId;
use crate::recipe::{Provenance, RecipeKind, RecipeRecord, merge_entries};
use crate::registry::{DiscoveryKey, RecipeRegistry, TagRegistry};

// ===========================================================================
// Record constructors
// ===========================================================================

/// A parseable shaped-crafting record with ids taken verbatim.
pub fn record(output: &str, output_count: u32, ingredients: &[(&str, u32)]) -> RecipeRecord {
    RecipeRecord {
        output: ItemId::new(output),
        output_count,
        kind: RecipeKind::new("minecraft:crafting_shaped"),
        ingredients: merge_entries(
            ingredients
                .iter()
                .map(|(item, count)| (ItemId::new(item), *count)),
        ),
        provenance: Provenance::Loose,
        parseable: true,
        synthetic: false,
        source: "test".to_string(),
    }
}

/// Discovery key whose order follows `n`.
pub fn discovery(n: u32) -> DiscoveryKey {
    DiscoveryKey {
        root: 0,
        source: Provenance::Loose,
        path: format!("{n:08}.json"),
        entry: String::new(),
        ordinal: n,
    }
}

// ===========================================================================
// Canned production graphs
// ===========================================================================

/// `stick x4 <- plank x2`, `plank x4 <- log x1`.
pub fn stick_chain() -> Vec<RecipeRecord> {
    vec![
        record("stick", 4, &[("plank", 2)]),
        record("plank", 4, &[("log", 1)]),
    ]
}

/// [`stick_chain`] plus `pickaxe x1 <- cobblestone x3, stick x2`.
pub fn pickaxe_chain() -> Vec<RecipeRecord> {
    let mut records = vec![record("pickaxe", 1, &[("cobblestone", 3), ("stick", 2)])];
    records.extend(stick_chain());
    records
}

/// `tier_i x1 <- tier_{i+1} x1` for `i in 0..depth`; `tier_{depth}` is raw.
pub fn deep_chain(depth: usize) -> Vec<RecipeRecord> {
    (0..depth)
        .map(|i| {
            let input = format!("tier_{}", i + 1);
            record(&format!("tier_{i}"), 1, &[(input.as_str(), 1)])
        })
        .collect()
}

/// Catalog with no aliases and no tags.
pub fn catalog_from(records: Vec<RecipeRecord>) -> Catalog {
    Catalog::new(
        AliasTable::empty(),
        RecipeRegistry::from_records(records),
        TagRegistry::default(),
    )
}

// ===========================================================================
// Assertions
// ===========================================================================

pub fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

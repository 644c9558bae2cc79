//! Loading whole content packs: loose datapacks, mod archives, and scripts
//! competing for the same items.

mod common;

use std::collections::BTreeMap;
use std::path::PathBuf;

use common::{Pack, shaped, shapeless, smelting, tag, vanilla_pack};
use craftcost_core::fallback::ANCHOR_RECIPES;
use craftcost_core::recipe::Provenance;
use craftcost_data::{DataLoadError, LoaderConfig, load_catalog};
use serde_json::json;

fn ingredients(catalog: &craftcost_core::catalog::Catalog, item: &str) -> Vec<(String, u32)> {
    catalog
        .recipe(item)
        .unwrap_or_else(|| panic!("no recipe for {item}"))
        .ingredients
        .iter()
        .map(|e| (e.item.to_string(), e.count))
        .collect()
}

fn no_anchors() -> LoaderConfig {
    LoaderConfig {
        anchors: false,
        ..LoaderConfig::default()
    }
}

// ===========================================================================
// Loose datapacks
// ===========================================================================

#[test]
fn vanilla_pack_loads_with_tags_resolved() {
    let pack = vanilla_pack("vanilla");
    let (catalog, report) = load_catalog(&[pack.root.clone()], &no_anchors()).unwrap();

    assert_eq!(report.roots, 1);
    assert_eq!(report.loose_files, 4);
    assert_eq!(report.tag_declarations, 1);
    assert_eq!(report.recipe_declarations, 3);
    assert_eq!(report.selected_recipes, 3);
    assert_eq!(report.unreadable, 0);

    // `#minecraft:planks` resolves to its first member.
    assert_eq!(
        ingredients(&catalog, "minecraft:stick"),
        [("minecraft:oak_planks".to_string(), 2)]
    );
    assert_eq!(
        ingredients(&catalog, "minecraft:wooden_pickaxe"),
        [
            ("minecraft:oak_planks".to_string(), 3),
            ("minecraft:stick".to_string(), 2),
        ]
    );
    assert_eq!(
        catalog.tags().members("minecraft:planks"),
        Some(&["minecraft:oak_planks".to_string(), "minecraft:spruce_planks".to_string()][..])
    );
}

#[test]
fn unreadable_sources_are_counted_and_skipped() {
    let pack = vanilla_pack("unreadable");
    pack.file("data/minecraft/recipes/broken.json", "{ not json")
        .file("mods/corrupt.jar", "PK? not really");

    let (catalog, report) = load_catalog(&[pack.root.clone()], &no_anchors()).unwrap();
    assert_eq!(report.unreadable, 2);
    assert_eq!(report.selected_recipes, 3);
    assert!(catalog.recipe("minecraft:stick").is_some());

    let sources: Vec<&str> = report.diagnostics.iter().map(|d| d.source.as_str()).collect();
    assert!(sources.contains(&"data/minecraft/recipes/broken.json"));
    assert!(sources.contains(&"mods/corrupt.jar"));
}

// ===========================================================================
// Selection across sources
// ===========================================================================

#[test]
fn loose_file_beats_archive_entry() {
    let pack = vanilla_pack("loose_vs_archive");
    pack.archive(
        "mods/bamboo_everything.jar",
        &[(
            "data/minecraft/recipes/stick.json",
            shapeless(json!("minecraft:stick"), json!(["minecraft:bamboo", "minecraft:bamboo"])),
        )],
    );

    let (catalog, report) = load_catalog(&[pack.root.clone()], &no_anchors()).unwrap();
    assert_eq!(report.archives, 1);
    assert_eq!(report.archive_entries, 1);

    let stick = catalog.recipe("minecraft:stick").unwrap();
    assert_eq!(stick.provenance, Provenance::Loose);
    assert_eq!(stick.source, "data/minecraft/recipes/stick.json");
}

#[test]
fn parseable_archive_beats_unparseable_loose_file() {
    let pack = Pack::new("parseable_wins");
    pack.json(
        "data/minecraft/recipes/stick.json",
        json!({"type": "minecraft:crafting_shaped", "result": {"item": "minecraft:stick", "count": 4}}),
    )
    .archive(
        "mods/sticks.jar",
        &[(
            "data/minecraft/recipes/stick.json",
            shapeless(json!({"item": "minecraft:stick", "count": 2}), json!(["minecraft:bamboo"])),
        )],
    );

    let (catalog, report) = load_catalog(&[pack.root.clone()], &no_anchors()).unwrap();
    let stick = catalog.recipe("minecraft:stick").unwrap();
    assert_eq!(stick.provenance, Provenance::Archive);
    assert_eq!(stick.source, "mods/sticks.jar!data/minecraft/recipes/stick.json");
    assert_eq!(report.unsupported, 1);
}

#[test]
fn native_kind_beats_loose_mod_kind() {
    let pack = Pack::new("kind_priority");
    pack.json(
        "data/create/recipes/milling/silicon.json",
        json!({
            "type": "create:milling",
            "ingredients": [{"item": "minecraft:sand"}],
            "results": [{"item": "ae2:silicon"}]
        }),
    )
    .archive(
        "mods/ae2.jar",
        &[("data/ae2/recipes/smelting/silicon.json", smelting("ae2:certus_quartz_dust", "ae2:silicon"))],
    );

    let (catalog, _) = load_catalog(&[pack.root.clone()], &no_anchors()).unwrap();
    let silicon = catalog.recipe("ae2:silicon").unwrap();
    assert_eq!(silicon.kind.as_str(), "minecraft:smelting");
    assert_eq!(ingredients(&catalog, "ae2:silicon"), [("ae2:certus_quartz_dust".to_string(), 1)]);
}

#[test]
fn scripts_beat_archives_and_tie_with_loose_files() {
    let pack = vanilla_pack("scripts");
    pack.archive(
        "mods/ae2.jar",
        &[("data/ae2/recipes/smelting/silicon.json", smelting("ae2:certus_quartz_dust", "ae2:silicon"))],
    )
    .file(
        "kubejs/server_scripts/recipes.js",
        r#"
// Cheaper silicon for the pack.
ServerEvents.recipes(event => {
  event.shapeless(Item.of('ae2:silicon', 2), ['minecraft:sand', 'minecraft:sand'])
  event.shaped('minecraft:stick', ['A', 'A'], { A: 'minecraft:bamboo' })
})
"#,
    );

    let (catalog, report) = load_catalog(&[pack.root.clone()], &no_anchors()).unwrap();
    assert_eq!(report.scripts, 1);
    assert_eq!(report.script_blocks, 2);

    let silicon = catalog.recipe("ae2:silicon").unwrap();
    assert_eq!(silicon.provenance, Provenance::Script);
    assert_eq!(silicon.output_count, 2);
    assert_eq!(silicon.source, "kubejs/server_scripts/recipes.js#0");
    assert_eq!(ingredients(&catalog, "ae2:silicon"), [("minecraft:sand".to_string(), 2)]);

    // Same score as the loose stick; the loose file was discovered first.
    assert_eq!(catalog.recipe("minecraft:stick").unwrap().provenance, Provenance::Loose);
}

#[test]
fn earlier_root_wins_ties() {
    let first = vanilla_pack("root_a");
    let second = Pack::new("root_b");
    second.json(
        "data/minecraft/recipes/stick.json",
        shapeless(json!("minecraft:stick"), json!(["minecraft:bamboo"])),
    );

    let roots = [first.root.clone(), second.root.clone()];
    let (catalog, report) = load_catalog(&roots, &no_anchors()).unwrap();
    assert_eq!(report.roots, 2);
    assert_eq!(
        ingredients(&catalog, "minecraft:stick"),
        [("minecraft:oak_planks".to_string(), 2)]
    );

    let reversed = [second.root.clone(), first.root.clone()];
    let (catalog, _) = load_catalog(&reversed, &no_anchors()).unwrap();
    assert_eq!(ingredients(&catalog, "minecraft:stick"), [("minecraft:bamboo".to_string(), 1)]);
}

// ===========================================================================
// Aliases and anchors
// ===========================================================================

#[test]
fn legacy_namespaces_are_canonicalized() {
    let pack = Pack::new("aliases");
    pack.archive(
        "mods/appliedenergistics2.jar",
        &[(
            "data/appliedenergistics2/recipes/controller.json",
            shaped(
                json!({"item": "appliedenergistics2:controller"}),
                &["FFF"],
                json!({"F": {"item": "appliedenergistics2:fluix_block"}}),
            ),
        )],
    )
    .json(
        "data/thermalexpansion/recipes/frame.json",
        shapeless(json!("thermalexpansion:machine_frame"), json!(["minecraft:iron_ingot"])),
    );

    let config = LoaderConfig {
        aliases: BTreeMap::from([("thermalexpansion".to_string(), "thermal".to_string())]),
        ..no_anchors()
    };
    let (catalog, _) = load_catalog(&[pack.root.clone()], &config).unwrap();

    assert_eq!(ingredients(&catalog, "ae2:controller"), [("ae2:fluix_block".to_string(), 3)]);
    assert!(catalog.recipe("appliedenergistics2:controller").is_some());
    assert!(catalog.recipe("thermal:machine_frame").is_some());
    assert!(catalog.recipes().get("thermalexpansion:machine_frame").is_none());
}

#[test]
fn anchors_fill_only_missing_items() {
    let pack = Pack::new("anchors");
    pack.archive(
        "mods/ae2.jar",
        &[(
            "data/ae2/recipes/inscriber/silicon_print.json",
            json!({
                "type": "ae2:inscriber",
                "mode": "inscribe",
                "ingredients": {
                    "top": {"item": "ae2:silicon_press"},
                    "middle": {"item": "ae2:silicon"}
                },
                "result": {"item": "ae2:printed_silicon"}
            }),
        )],
    );

    let (catalog, report) = load_catalog(&[pack.root.clone()], &LoaderConfig::default()).unwrap();
    assert_eq!(report.selected_recipes, 1);
    assert_eq!(report.fallback_recipes, ANCHOR_RECIPES.len() - 1);

    let printed = catalog.recipe("ae2:printed_silicon").unwrap();
    assert!(!printed.synthetic);
    assert_eq!(ingredients(&catalog, "ae2:printed_silicon"), [("ae2:silicon".to_string(), 1)]);
    assert!(catalog.recipe("ae2:logic_processor").unwrap().synthetic);

    let (without, report) = load_catalog(&[pack.root.clone()], &no_anchors()).unwrap();
    assert_eq!(report.fallback_recipes, 0);
    assert!(without.recipe("ae2:logic_processor").is_none());
}

#[test]
fn tags_in_archives_lose_to_loose_tags() {
    let pack = Pack::new("tag_precedence");
    pack.json("data/c/tags/items/ingots/iron.json", tag(&["minecraft:iron_ingot"]))
        .archive(
            "mods/othermod.jar",
            &[
                ("data/c/tags/items/ingots/iron.json", tag(&["othermod:iron_ingot"])),
                (
                    "data/othermod/recipes/gear.json",
                    shaped(json!("othermod:iron_gear"), &[" I ", "I I", " I "], json!({"I": "#c:ingots/iron"})),
                ),
            ],
        );

    let (catalog, report) = load_catalog(&[pack.root.clone()], &no_anchors()).unwrap();
    assert_eq!(report.tag_declarations, 2);
    assert_eq!(
        ingredients(&catalog, "othermod:iron_gear"),
        [("minecraft:iron_ingot".to_string(), 4)]
    );
}

// ===========================================================================
// Hard failures
// ===========================================================================

#[test]
fn missing_root_is_fatal() {
    let missing = std::env::temp_dir().join(format!("craftcost_it_missing_{}", std::process::id()));
    let result = load_catalog(&[missing.clone()], &LoaderConfig::default());
    match result {
        Err(DataLoadError::RootUnreadable { root, .. }) => assert_eq!(root, missing),
        other => panic!("expected RootUnreadable, got {other:?}"),
    }
}

#[test]
fn no_roots_is_fatal() {
    let roots: [PathBuf; 0] = [];
    assert!(matches!(
        load_catalog(&roots, &LoaderConfig::default()),
        Err(DataLoadError::NoRoots)
    ));
}

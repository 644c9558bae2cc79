//! On-disk content pack fixtures shared by the integration tests.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// A content root under the system temp dir, removed on drop.
pub struct Pack {
    pub root: PathBuf,
}

impl Pack {
    pub fn new(suffix: &str) -> Self {
        let root = std::env::temp_dir().join(format!(
            "craftcost_it_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).unwrap();
        Self { root }
    }

    /// Write a text file at `relative`.
    pub fn file(&self, relative: &str, contents: &str) -> &Self {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        self
    }

    /// Write a JSON document at `relative`.
    pub fn json(&self, relative: &str, value: Value) -> &Self {
        self.file(relative, &serde_json::to_string_pretty(&value).unwrap())
    }

    /// Write an archive at `relative` holding the given JSON entries.
    pub fn archive(&self, relative: &str, entries: &[(&str, Value)]) -> &Self {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, value) in entries {
            writer.start_file(*name, options).unwrap();
            writer
                .write_all(serde_json::to_string(value).unwrap().as_bytes())
                .unwrap();
        }
        writer.finish().unwrap();
        self
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl Drop for Pack {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

// ---------------------------------------------------------------------------
// Declaration builders
// ---------------------------------------------------------------------------

pub fn shaped(result: Value, pattern: &[&str], key: Value) -> Value {
    json!({
        "type": "minecraft:crafting_shaped",
        "pattern": pattern,
        "key": key,
        "result": result
    })
}

pub fn shapeless(result: Value, ingredients: Value) -> Value {
    json!({
        "type": "minecraft:crafting_shapeless",
        "ingredients": ingredients,
        "result": result
    })
}

pub fn smelting(input: &str, result: &str) -> Value {
    json!({
        "type": "minecraft:smelting",
        "ingredient": {"item": input},
        "result": result
    })
}

pub fn tag(values: &[&str]) -> Value {
    json!({ "replace": false, "values": values })
}

/// The vanilla wooden tool chain: logs to planks (via the planks tag) to
/// sticks to a wooden pickaxe.
pub fn vanilla_pack(suffix: &str) -> Pack {
    let pack = Pack::new(suffix);
    pack.json(
        "data/minecraft/tags/items/planks.json",
        tag(&["minecraft:oak_planks", "minecraft:spruce_planks"]),
    )
    .json(
        "data/minecraft/recipes/oak_planks.json",
        shapeless(
            json!({"item": "minecraft:oak_planks", "count": 4}),
            json!([{"item": "minecraft:oak_log"}]),
        ),
    )
    .json(
        "data/minecraft/recipes/stick.json",
        shaped(
            json!({"item": "minecraft:stick", "count": 4}),
            &["#", "#"],
            json!({"#": {"tag": "minecraft:planks"}}),
        ),
    )
    .json(
        "data/minecraft/recipes/wooden_pickaxe.json",
        shaped(
            json!({"item": "minecraft:wooden_pickaxe"}),
            &["XXX", " # ", " # "],
            json!({"#": {"item": "minecraft:stick"}, "X": {"tag": "minecraft:planks"}}),
        ),
    );
    pack
}

//! Serde shapes for recipe and tag declarations.
//!
//! Declarations come in many incompatible shapes. Every field that varies
//! between mods is an untagged enum ending in an `Other` catch-all, so a
//! well-formed JSON document always deserializes; cells the loader does not
//! understand become [`IngredientSpec::Unsupported`] instead of errors.

use craftcost_core::alias::AliasTable;
use craftcost_core::id::TAG_PREFIX;
use craftcost_core::recipe::{IngredientSpec, OutputSpec};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

// ===========================================================================
// Recipes
// ===========================================================================

/// One recipe declaration. Only the fields used by some extraction strategy
/// are modeled; everything else (conditions, experience, cook time) is
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeDeclaration {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    // Grid
    #[serde(default)]
    pub pattern: Option<Vec<String>>,
    #[serde(default)]
    pub key: Option<BTreeMap<String, IngredientData>>,

    // List, nested slots
    #[serde(default)]
    pub ingredients: Option<IngredientsData>,
    #[serde(default)]
    pub mode: Option<String>,

    // Single
    #[serde(default)]
    pub ingredient: Option<IngredientData>,

    // Top-level slots
    #[serde(default)]
    pub template: Option<IngredientData>,
    #[serde(default)]
    pub base: Option<IngredientData>,
    #[serde(default)]
    pub addition: Option<IngredientData>,

    #[serde(default)]
    pub result: Option<OutputData>,
    #[serde(default)]
    pub results: Option<Vec<OutputData>>,
}

impl RecipeDeclaration {
    /// Declared output: `result` first, then the first of `results`.
    pub fn output(&self, aliases: &AliasTable) -> Option<OutputSpec> {
        if let Some(result) = &self.result {
            return result.to_spec(aliases);
        }
        self.results
            .as_ref()
            .and_then(|results| results.first())
            .and_then(|first| first.to_spec(aliases))
    }
}

/// The `ingredients` field: an array, named slots, or a lone cell.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngredientsData {
    List(Vec<IngredientData>),
    Slots(SlotData),
    Single(IngredientData),
}

/// Named press slots of an inscriber-style declaration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotData {
    #[serde(default)]
    pub top: Option<IngredientData>,
    #[serde(default)]
    pub middle: Option<IngredientData>,
    #[serde(default)]
    pub bottom: Option<IngredientData>,
}

/// One ingredient cell.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngredientData {
    /// `"ns:item"`, `"#ns:tag"`, or `"2x ns:item"`.
    Id(String),
    Item {
        item: String,
        #[serde(default)]
        count: Option<u32>,
    },
    Tag {
        tag: String,
        #[serde(default)]
        count: Option<u32>,
    },
    /// Alternatives; the first is taken.
    Choice(Vec<IngredientData>),
    Other(Value),
}

impl IngredientData {
    pub fn to_spec(&self, aliases: &AliasTable) -> IngredientSpec {
        match self {
            IngredientData::Id(raw) => {
                let (count, id) = split_stack(raw);
                match id.strip_prefix(TAG_PREFIX) {
                    Some(tag) => IngredientSpec::Tag {
                        tag: aliases.canonicalize_tag(tag),
                        count,
                    },
                    None => IngredientSpec::Item {
                        id: aliases.canonicalize(id),
                        count,
                    },
                }
            }
            IngredientData::Item { item, count } => IngredientSpec::Item {
                id: aliases.canonicalize(item),
                count: count.unwrap_or(1),
            },
            IngredientData::Tag { tag, count } => IngredientSpec::Tag {
                tag: aliases.canonicalize_tag(tag),
                count: count.unwrap_or(1),
            },
            IngredientData::Choice(candidates) => {
                IngredientSpec::Choice(candidates.iter().map(|c| c.to_spec(aliases)).collect())
            }
            IngredientData::Other(_) => IngredientSpec::Unsupported,
        }
    }
}

/// A declared result.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OutputData {
    /// `"ns:item"` or `"4x ns:item"`.
    Id(String),
    Stack {
        #[serde(alias = "id")]
        item: String,
        #[serde(default = "default_count")]
        count: u32,
    },
    List(Vec<OutputData>),
    Other(Value),
}

fn default_count() -> u32 {
    1
}

impl OutputData {
    pub fn to_spec(&self, aliases: &AliasTable) -> Option<OutputSpec> {
        match self {
            OutputData::Id(raw) => {
                let (count, id) = split_stack(raw);
                let id = aliases.canonicalize(id);
                Some(if count == 1 {
                    OutputSpec::Id(id)
                } else {
                    OutputSpec::Stack { id, count }
                })
            }
            OutputData::Stack { item, count } => Some(OutputSpec::Stack {
                id: aliases.canonicalize(item),
                count: *count,
            }),
            OutputData::List(list) => Some(OutputSpec::List(
                list.iter().filter_map(|o| o.to_spec(aliases)).collect(),
            )),
            OutputData::Other(_) => None,
        }
    }
}

/// Split a `"4x ns:item"` stack string into its count and id. Strings
/// without a numeric `x` prefix have count 1.
pub fn split_stack(raw: &str) -> (u32, &str) {
    let trimmed = raw.trim();
    if let Some((prefix, rest)) = trimmed.split_once(' ') {
        if let Some(digits) = prefix.strip_suffix(['x', 'X']) {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(count) = digits.parse::<u32>() {
                    return (count, rest.trim_start());
                }
            }
        }
    }
    (1, trimmed)
}

// ===========================================================================
// Tags
// ===========================================================================

/// A tag file: `{"values": [...]}`. Tags are selected whole by provenance,
/// never merged, so `replace` is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagFile {
    #[serde(default)]
    pub values: Vec<TagMemberData>,
}

/// One entry of a tag's `values`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagMemberData {
    Id(String),
    /// `{"id": ..., "required": ...}`; `required` is ignored.
    Entry { id: String },
    Other(Value),
}

impl TagFile {
    /// Canonical member strings in declared order; unknown entry shapes are
    /// skipped and nested `#` references kept.
    pub fn members(&self, aliases: &AliasTable) -> Vec<String> {
        self.values
            .iter()
            .filter_map(|value| match value {
                TagMemberData::Id(id) | TagMemberData::Entry { id } => {
                    Some(aliases.canonicalize_member(id))
                }
                TagMemberData::Other(_) => None,
            })
            .collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

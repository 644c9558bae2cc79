//! Loader configuration.
//!
//! Read from RON, TOML, or JSON (chosen by file extension). Every field has a
//! default, so an empty file is a valid configuration.

use crate::loader::DataLoadError;
use craftcost_core::alias::AliasTable;
use craftcost_core::engine::Traversal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ===========================================================================
// File formats
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Lookup order for [`find_data_file`].
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    fn parse<T: DeserializeOwned>(self, text: &str) -> Result<T, String> {
        match self {
            Format::Ron => ron::from_str(text).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(text).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

/// Format implied by a path's extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let extension = path.extension().and_then(|e| e.to_str());
    Format::ALL
        .into_iter()
        .find(|format| Some(format.extension()) == extension)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

/// The one `{base_name}.{ron,toml,json}` in `dir`, if any. Two or more
/// candidates are ambiguous.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = Format::ALL
        .into_iter()
        .map(|format| dir.join(format!("{base_name}.{}", format.extension())))
        .filter(|candidate| candidate.is_file());
    match (present.next(), present.next()) {
        (Some(a), Some(b)) => Err(DataLoadError::ConflictingFormats { a, b }),
        (found, _) => Ok(found),
    }
}

/// Deserialize a file in the format its extension names.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let text = std::fs::read_to_string(path)?;
    format.parse(&text).map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

// ===========================================================================
// Loader configuration
// ===========================================================================

/// Default archive directory, relative to each content root.
pub const DEFAULT_MODS_DIR: &str = "mods";

/// Default script directory, relative to each content root.
pub const DEFAULT_SCRIPT_DIR: &str = "kubejs/server_scripts";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Extra namespace aliases, `alias -> canonical`.
    pub aliases: BTreeMap<String, String>,
    /// Start from the built-in alias table.
    pub builtin_aliases: bool,
    /// Inject fallback recipes for anchor items.
    pub anchors: bool,
    /// Archive directory relative to each root.
    pub mods_dir: PathBuf,
    /// Script directories relative to each root.
    pub script_dirs: Vec<PathBuf>,
    /// Traversal used by engines built from this configuration.
    pub traversal: Traversal,
    /// Content roots used when none are given on the command line.
    pub roots: Vec<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            aliases: BTreeMap::new(),
            builtin_aliases: true,
            anchors: true,
            mods_dir: PathBuf::from(DEFAULT_MODS_DIR),
            script_dirs: vec![PathBuf::from(DEFAULT_SCRIPT_DIR)],
            traversal: Traversal::default(),
            roots: Vec::new(),
        }
    }
}

impl LoaderConfig {
    /// Read a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, DataLoadError> {
        deserialize_file(path)
    }

    /// The alias table this configuration describes.
    pub fn alias_table(&self) -> Result<AliasTable, DataLoadError> {
        let base = if self.builtin_aliases {
            AliasTable::builtin()
        } else {
            AliasTable::empty()
        };
        Ok(base.extended(
            self.aliases
                .iter()
                .map(|(alias, canonical)| (alias.as_str(), canonical.as_str())),
        )?)
    }
}

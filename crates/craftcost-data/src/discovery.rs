//! Content-root discovery.
//!
//! A content root is scanned in three passes, always in sorted order so the
//! resulting discovery keys are stable:
//!
//! 1. loose `.json` files anywhere under the root whose relative path holds
//!    a `<namespace>/recipes/` (or `recipe/`) or `<namespace>/tags/items/`
//!    (or `tags/item/`) segment,
//! 2. the same paths inside `.jar`/`.zip` archives under the mods directory,
//! 3. recipe calls in `.js` files under the script directories.
//!
//! Unreadable sources are counted and skipped; only an unreadable root is
//! an error.

use crate::config::LoaderConfig;
use crate::extract::Origin;
use crate::loader::{DataLoadError, LoadReport};
use crate::schema::{RecipeDeclaration, TagFile};
use crate::script::find_blocks;
use craftcost_core::alias::AliasTable;
use craftcost_core::recipe::Provenance;
use craftcost_core::registry::{DiscoveryKey, TagDeclaration, TagRegistryBuilder};
use serde_json::Value;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// ===========================================================================
// Path classification
// ===========================================================================

/// What a declaration path holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationPath {
    Recipe,
    /// Tag id (`namespace:path`, no `#`, no extension).
    Tag { id: String },
}

const RECIPE_DIRS: &[&str] = &["recipes", "recipe"];
const TAG_DIRS: &[&str] = &["items", "item"];
const ADVANCEMENT_DIRS: &[&str] = &["advancements", "advancement"];

/// Classify a `/`-separated relative path. Only `.json` files qualify.
pub fn classify_path(relative: &str) -> Option<DeclarationPath> {
    let stem = relative.strip_suffix(".json")?;
    let parts: Vec<&str> = stem.split('/').filter(|p| !p.is_empty()).collect();

    // `<ns>/tags/items/<path...>`
    if let Some(i) = anchor(&parts, |i| {
        parts[i] == "tags" && parts.get(i + 1).is_some_and(|p| TAG_DIRS.contains(p))
    }) {
        let rest = &parts[i + 2..];
        if !rest.is_empty() {
            return Some(DeclarationPath::Tag {
                id: format!("{}:{}", parts[i - 1], rest.join("/")),
            });
        }
    }

    // `<ns>/recipes/<path...>`; `advancements/recipes/` holds unlock criteria.
    anchor(&parts, |i| {
        RECIPE_DIRS.contains(&parts[i])
            && !ADVANCEMENT_DIRS.contains(&parts[i - 1])
            && i + 1 < parts.len()
    })
    .map(|_| DeclarationPath::Recipe)
}

/// Index of the anchor segment: the one directly under `data/<ns>/` if any,
/// otherwise the last match. Anchors need a namespace segment before them.
fn anchor(parts: &[&str], is_anchor: impl Fn(usize) -> bool) -> Option<usize> {
    let matches: Vec<usize> = (1..parts.len()).filter(|&i| is_anchor(i)).collect();
    matches
        .iter()
        .copied()
        .find(|&i| i >= 2 && parts[i - 2] == "data")
        .or_else(|| matches.last().copied())
}

// ===========================================================================
// Root scan
// ===========================================================================

/// Everything found under one content root.
#[derive(Debug, Default)]
pub struct RootScan {
    pub recipes: Vec<(RecipeDeclaration, Origin)>,
    pub tags: TagRegistryBuilder,
    pub report: LoadReport,
}

impl RootScan {
    /// Record one declaration document.
    fn document(
        &mut self,
        class: &DeclarationPath,
        text: &str,
        origin: Origin,
        aliases: &AliasTable,
    ) {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => return self.report.unreadable(origin.source, e),
        };
        self.value(class, value, origin, aliases);
    }

    fn value(&mut self, class: &DeclarationPath, value: Value, origin: Origin, aliases: &AliasTable) {
        match class {
            DeclarationPath::Recipe => match serde_json::from_value::<RecipeDeclaration>(value) {
                Ok(decl) => {
                    self.report.recipe_declarations += 1;
                    self.recipes.push((decl, origin));
                }
                Err(e) => self.report.unsupported(origin.source, e),
            },
            DeclarationPath::Tag { id } => match serde_json::from_value::<TagFile>(value) {
                Ok(file) => {
                    self.report.tag_declarations += 1;
                    self.tags.offer(TagDeclaration {
                        tag: aliases.canonicalize_tag(id),
                        members: file.members(aliases),
                        provenance: origin.provenance,
                        discovery: origin.discovery,
                    });
                }
                Err(e) => self.report.unsupported(origin.source, e),
            },
        }
    }
}

/// Scan one content root.
pub fn scan_root(
    index: u32,
    root: &Path,
    config: &LoaderConfig,
    aliases: &AliasTable,
) -> Result<RootScan, DataLoadError> {
    let metadata = fs::metadata(root).map_err(|source| DataLoadError::RootUnreadable {
        root: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(DataLoadError::RootNotDirectory {
            root: root.to_path_buf(),
        });
    }
    // Surface permission problems on the root itself.
    fs::read_dir(root).map_err(|source| DataLoadError::RootUnreadable {
        root: root.to_path_buf(),
        source,
    })?;

    let mut scan = RootScan::default();
    scan.report.roots = 1;

    scan_loose(index, root, aliases, &mut scan);
    scan_archives(index, root, &root.join(&config.mods_dir), aliases, &mut scan);
    for dir in &config.script_dirs {
        scan_scripts(index, root, &root.join(dir), &mut scan);
    }

    tracing::info!(
        root = %root.display(),
        loose_files = scan.report.loose_files,
        archives = scan.report.archives,
        archive_entries = scan.report.archive_entries,
        script_blocks = scan.report.script_blocks,
        "scanned content root"
    );
    Ok(scan)
}

fn scan_loose(index: u32, root: &Path, aliases: &AliasTable, scan: &mut RootScan) {
    for path in collect_files_sorted(root, &["json"], &mut scan.report) {
        let relative = relative_path(root, &path);
        let Some(class) = classify_path(&relative) else {
            continue;
        };
        scan.report.loose_files += 1;

        let origin = Origin {
            provenance: Provenance::Loose,
            discovery: DiscoveryKey {
                root: index,
                source: Provenance::Loose,
                path: relative.clone(),
                entry: String::new(),
                ordinal: 0,
            },
            source: relative,
        };
        match fs::read_to_string(&path) {
            Ok(text) => scan.document(&class, &text, origin, aliases),
            Err(e) => scan.report.unreadable(origin.source, e),
        }
    }
}

fn scan_archives(index: u32, root: &Path, mods: &Path, aliases: &AliasTable, scan: &mut RootScan) {
    if !mods.is_dir() {
        return;
    }
    for path in collect_files_sorted(mods, &["jar", "zip"], &mut scan.report) {
        let relative = relative_path(root, &path);
        let mut archive = match File::open(&path)
            .map_err(zip::result::ZipError::Io)
            .and_then(zip::ZipArchive::new)
        {
            Ok(archive) => archive,
            Err(e) => {
                scan.report.unreadable(relative, e);
                continue;
            }
        };
        scan.report.archives += 1;

        let mut entries: Vec<(String, DeclarationPath)> = archive
            .file_names()
            .filter_map(|name| classify_path(name).map(|class| (name.to_string(), class)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (entry, class) in entries {
            scan.report.archive_entries += 1;
            let origin = Origin {
                provenance: Provenance::Archive,
                discovery: DiscoveryKey {
                    root: index,
                    source: Provenance::Archive,
                    path: relative.clone(),
                    entry: entry.clone(),
                    ordinal: 0,
                },
                source: format!("{relative}!{entry}"),
            };
            let mut text = String::new();
            let read = archive
                .by_name(&entry)
                .map_err(|e| e.to_string())
                .and_then(|mut file| file.read_to_string(&mut text).map_err(|e| e.to_string()));
            match read {
                Ok(_) => scan.document(&class, &text, origin, aliases),
                Err(e) => scan.report.unreadable(origin.source, e),
            }
        }
    }
}

fn scan_scripts(index: u32, root: &Path, dir: &Path, scan: &mut RootScan) {
    if !dir.is_dir() {
        return;
    }
    for path in collect_files_sorted(dir, &["js"], &mut scan.report) {
        let relative = relative_path(root, &path);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                scan.report.unreadable(relative, e);
                continue;
            }
        };
        scan.report.scripts += 1;

        for block in find_blocks(&source) {
            scan.report.script_blocks += 1;
            let origin = Origin {
                provenance: Provenance::Script,
                discovery: DiscoveryKey {
                    root: index,
                    source: Provenance::Script,
                    path: relative.clone(),
                    entry: String::new(),
                    ordinal: block.ordinal,
                },
                source: format!("{relative}#{}", block.ordinal),
            };
            match block.declaration {
                Ok(value) => match serde_json::from_value::<RecipeDeclaration>(value) {
                    Ok(decl) => {
                        scan.report.recipe_declarations += 1;
                        scan.recipes.push((decl, origin));
                    }
                    Err(e) => scan.report.unsupported(origin.source, e),
                },
                Err(e) => scan.report.unreadable(origin.source, e),
            }
        }
    }
}

// ===========================================================================
// Helpers
// ===========================================================================

/// All files under `dir` with one of `extensions` (case-insensitive),
/// sorted by path. Walk errors are reported as unreadable.
pub fn collect_files_sorted(dir: &Path, extensions: &[&str], report: &mut LoadReport) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let source = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| dir.display().to_string());
                report.unreadable(source, e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)));
        if matches {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    paths
}

/// `/`-separated path of `path` relative to `root`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

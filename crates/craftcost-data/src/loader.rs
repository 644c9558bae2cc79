//! Loading pipeline: scans content roots, builds the tag registry, extracts
//! and selects recipes, applies fallbacks, and assembles a [`Catalog`].

use crate::config::LoaderConfig;
use crate::discovery::{RootScan, scan_root};
use crate::extract::{Extracted, Origin, extract};
use crate::schema::RecipeDeclaration;
use craftcost_core::alias::{AliasError, AliasTable};
use craftcost_core::catalog::Catalog;
use craftcost_core::fallback::ANCHOR_RECIPES;
use craftcost_core::registry::{RecipeRegistryBuilder, TagRegistry, TagRegistryBuilder};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that abort loading. Problems with individual sources are never
/// errors; they are counted in the [`LoadReport`].
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A content root could not be read at all.
    #[error("content root {root} is unreadable: {source}")]
    RootUnreadable {
        root: PathBuf,
        source: std::io::Error,
    },

    /// A content root exists but is not a directory.
    #[error("content root {root} is not a directory")]
    RootNotDirectory { root: PathBuf },

    /// No content roots were given.
    #[error("no content roots given")]
    NoRoots,

    /// Configuration file extension is not `.ron`, `.toml`, or `.json`.
    #[error("{file}: configuration must be .ron, .toml, or .json")]
    UnsupportedFormat { file: PathBuf },

    /// More than one configuration file shares a base name.
    #[error("ambiguous configuration: both {a} and {b} exist")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("cannot parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The configured alias table is invalid.
    #[error(transparent)]
    Alias(#[from] AliasError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Load report
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A file, archive, entry, or script block could not be read or parsed.
    Unreadable,
    /// A declaration was read but its schema is not understood.
    Unsupported,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::Unreadable => "unreadable",
            DiagnosticKind::Unsupported => "unsupported",
        })
    }
}

/// One non-fatal problem found while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub source: String,
    pub detail: String,
}

/// Counts of everything the loader saw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub roots: usize,
    pub loose_files: usize,
    pub archives: usize,
    pub archive_entries: usize,
    pub scripts: usize,
    pub script_blocks: usize,
    pub recipe_declarations: usize,
    pub tag_declarations: usize,
    pub unreadable: usize,
    pub unsupported: usize,
    pub selected_recipes: usize,
    pub fallback_recipes: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadReport {
    pub fn unreadable(&mut self, source: impl Into<String>, detail: impl fmt::Display) {
        let source = source.into();
        tracing::warn!(%source, %detail, "skipping unreadable source");
        self.unreadable += 1;
        self.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::Unreadable,
            source,
            detail: detail.to_string(),
        });
    }

    pub fn unsupported(&mut self, source: impl Into<String>, detail: impl fmt::Display) {
        let source = source.into();
        tracing::debug!(%source, %detail, "unsupported declaration");
        self.unsupported += 1;
        self.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::Unsupported,
            source,
            detail: detail.to_string(),
        });
    }

    /// Add another report's counts and diagnostics to this one.
    pub fn absorb(&mut self, other: LoadReport) {
        self.roots += other.roots;
        self.loose_files += other.loose_files;
        self.archives += other.archives;
        self.archive_entries += other.archive_entries;
        self.scripts += other.scripts;
        self.script_blocks += other.script_blocks;
        self.recipe_declarations += other.recipe_declarations;
        self.tag_declarations += other.tag_declarations;
        self.unreadable += other.unreadable;
        self.unsupported += other.unsupported;
        self.selected_recipes += other.selected_recipes;
        self.fallback_recipes += other.fallback_recipes;
        self.diagnostics.extend(other.diagnostics);
    }
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Load every content root into a catalog.
///
/// Roots are scanned independently (in parallel with the `parallel`
/// feature); the first unreadable root aborts the load.
pub fn load_catalog(
    roots: &[PathBuf],
    config: &LoaderConfig,
) -> Result<(Catalog, LoadReport), DataLoadError> {
    if roots.is_empty() {
        return Err(DataLoadError::NoRoots);
    }
    let aliases = config.alias_table()?;

    let scans = scan_roots(roots, config, &aliases)?;

    let mut report = LoadReport::default();
    let mut tag_builder = TagRegistryBuilder::new();
    let mut pending: Vec<(RecipeDeclaration, Origin)> = Vec::new();
    for scan in scans {
        report.absorb(scan.report);
        tag_builder.merge(scan.tags);
        pending.extend(scan.recipes);
    }
    let tags = tag_builder.build();

    let selection = select(pending, &aliases, &tags);
    report.absorb(selection.report);

    let mut recipes = selection.builder.build();
    report.selected_recipes = recipes.len();
    if config.anchors {
        recipes = recipes.with_fallbacks(ANCHOR_RECIPES, &aliases);
        report.fallback_recipes = recipes.len() - report.selected_recipes;
    }

    tracing::info!(
        roots = report.roots,
        recipes = recipes.len(),
        tags = tags.len(),
        fallbacks = report.fallback_recipes,
        unreadable = report.unreadable,
        unsupported = report.unsupported,
        "catalog loaded"
    );

    Ok((Catalog::new(aliases, recipes, tags), report))
}

#[cfg(not(feature = "parallel"))]
fn scan_roots(
    roots: &[PathBuf],
    config: &LoaderConfig,
    aliases: &AliasTable,
) -> Result<Vec<RootScan>, DataLoadError> {
    roots
        .iter()
        .enumerate()
        .map(|(index, root)| scan_root(index as u32, root, config, aliases))
        .collect()
}

#[cfg(feature = "parallel")]
fn scan_roots(
    roots: &[PathBuf],
    config: &LoaderConfig,
    aliases: &AliasTable,
) -> Result<Vec<RootScan>, DataLoadError> {
    roots
        .par_iter()
        .enumerate()
        .map(|(index, root)| scan_root(index as u32, root, config, aliases))
        .collect()
}

/// Recipe builder plus the unsupported-schema diagnostics found while
/// filling it.
#[derive(Default)]
struct Selection {
    builder: RecipeRegistryBuilder,
    report: LoadReport,
}

impl Selection {
    fn offer(mut self, decl: &RecipeDeclaration, origin: Origin, aliases: &AliasTable, tags: &TagRegistry) -> Self {
        let source = origin.source.clone();
        match extract(decl, origin, aliases, tags) {
            Extracted::Candidate(candidate) => {
                if !candidate.record.parseable {
                    self.report.unsupported(
                        source,
                        format_args!(
                            "no usable ingredients for {} ({})",
                            candidate.record.output, candidate.record.kind
                        ),
                    );
                }
                self.builder.offer(candidate);
            }
            Extracted::NoOutput => self.report.unsupported(source, "no usable result"),
        }
        self
    }

    fn merge(mut self, other: Selection) -> Self {
        self.builder.merge(other.builder);
        self.report.absorb(other.report);
        self
    }
}

#[cfg(not(feature = "parallel"))]
fn select(pending: Vec<(RecipeDeclaration, Origin)>, aliases: &AliasTable, tags: &TagRegistry) -> Selection {
    pending
        .into_iter()
        .fold(Selection::default(), |selection, (decl, origin)| {
            selection.offer(&decl, origin, aliases, tags)
        })
}

#[cfg(feature = "parallel")]
fn select(pending: Vec<(RecipeDeclaration, Origin)>, aliases: &AliasTable, tags: &TagRegistry) -> Selection {
    pending
        .into_par_iter()
        .fold(Selection::default, |selection, (decl, origin)| {
            selection.offer(&decl, origin, aliases, tags)
        })
        .reduce(Selection::default, Selection::merge)
}

// ===========================================================================
// Tests
// ===========================================================================

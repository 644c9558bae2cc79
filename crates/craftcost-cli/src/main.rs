//! `craftcost`: bill of materials for a modpack item.
//!
//! Loads every content root into a catalog, then either resolves one item
//! into raw materials (`bom`) or lists the items the catalog knows (`items`).

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use craftcost_core::catalog::Catalog;
use craftcost_core::engine::{Engine, Traversal};
use craftcost_core::export::{GraphDescription, text_report, to_json};
use craftcost_data::config::find_data_file;
use craftcost_data::{LoadReport, LoaderConfig, load_catalog};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming the default content root.
const ROOT_ENV: &str = "ATM10_PATH";
const DEFAULT_ROOT: &str = "instance";
const CONFIG_BASE_NAME: &str = "craftcost";

#[derive(Parser)]
#[command(name = "craftcost")]
#[command(about = "Total raw materials and production steps for a modpack item")]
struct Cli {
    /// Content root to scan; repeat for several roots.
    #[arg(long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Loader configuration (RON, TOML, or JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an item into raw materials
    Bom {
        /// Target item id, e.g. `minecraft:stick`
        item: String,

        /// Target quantity
        #[arg(short = 'n', long = "quantity", default_value_t = 1.0, conflicts_with = "cube")]
        quantity: f64,

        /// Quantity as N^3
        #[arg(long)]
        cube: Option<u32>,

        /// Omit the production steps
        #[arg(long)]
        no_steps: bool,

        /// Also print a Mermaid flowchart
        #[arg(long)]
        diagram: bool,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use the explicit-stack traversal
        #[arg(long)]
        iterative: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// List known items
    Items {
        /// Case-insensitive filter on id or display name
        query: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let roots = content_roots(&cli.roots, &config, std::env::var_os(ROOT_ENV).map(PathBuf::from));

    let (catalog, report) = load_catalog(&roots, &config)
        .with_context(|| format!("Failed to load content roots {roots:?}"))?;
    log_report(&report);

    match cli.command {
        Commands::Bom {
            item,
            quantity,
            cube,
            no_steps,
            diagram,
            output,
            iterative,
            format,
        } => {
            let quantity = cube.map_or(quantity, |n| f64::from(n).powi(3));
            let traversal = if iterative {
                Traversal::Iterative
            } else {
                config.traversal
            };
            let options = BomOptions {
                steps: !no_steps,
                diagram,
                output,
                traversal,
                format,
            };
            run_bom(&catalog, &item, quantity, &options)
        }
        Commands::Items { query, limit } => {
            for line in item_lines(&catalog, query.as_deref(), limit) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Explicit `--config`, otherwise `craftcost.{ron,toml,json}` in the
/// working directory, otherwise defaults.
fn load_config(explicit: Option<&Path>) -> Result<LoaderConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            find_data_file(&cwd, CONFIG_BASE_NAME).context("Failed to locate configuration")?
        }
    };
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading configuration");
            LoaderConfig::from_file(&path)
                .with_context(|| format!("Failed to read configuration {}", path.display()))
        }
        None => Ok(LoaderConfig::default()),
    }
}

/// Command-line roots, then configured roots, then the environment, then
/// `instance`.
fn content_roots(flags: &[PathBuf], config: &LoaderConfig, env: Option<PathBuf>) -> Vec<PathBuf> {
    if !flags.is_empty() {
        return flags.to_vec();
    }
    if !config.roots.is_empty() {
        return config.roots.clone();
    }
    vec![env.unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT))]
}

fn log_report(report: &LoadReport) {
    tracing::info!(
        roots = report.roots,
        selected = report.selected_recipes,
        fallbacks = report.fallback_recipes,
        unreadable = report.unreadable,
        unsupported = report.unsupported,
        "catalog ready"
    );
}

struct BomOptions {
    steps: bool,
    diagram: bool,
    output: Option<PathBuf>,
    traversal: Traversal,
    format: OutputFormat,
}

fn run_bom(catalog: &Catalog, item: &str, quantity: f64, options: &BomOptions) -> Result<()> {
    if !quantity.is_finite() || quantity < 0.0 {
        bail!("Quantity must be a finite non-negative number, got {quantity}");
    }
    let mut engine = Engine::new(catalog).with_traversal(options.traversal);
    // Steps feed the diagram even when the report omits them.
    let mut bom = if options.steps || options.diagram {
        engine.analyze(item, quantity)
    } else {
        engine.analyze_totals(item, quantity)
    }
    .with_context(|| format!("Failed to resolve {item}"))?;

    let diagram = options
        .diagram
        .then(|| GraphDescription::from_steps(&bom.steps).to_mermaid());
    if !options.steps {
        bom.steps.clear();
    }
    let rendered = match options.format {
        OutputFormat::Json => to_json(&bom).context("Failed to serialize bill of materials")?,
        OutputFormat::Text => text_report(&bom),
    };

    match &options.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => println!("{rendered}"),
    }

    if let Some(diagram) = diagram {
        if options.output.is_none() {
            println!("\n---\n");
        }
        println!("{diagram}");
    }
    Ok(())
}

/// `id\tDisplay Name` lines sorted by display name.
fn item_lines(catalog: &Catalog, query: Option<&str>, limit: Option<usize>) -> Vec<String> {
    let needle = query.map(str::to_lowercase);
    let mut items: Vec<(String, String)> = catalog
        .known_items()
        .into_iter()
        .map(|id| (id.display_name(), id.to_string()))
        .filter(|(name, id)| match &needle {
            Some(needle) => {
                name.to_lowercase().contains(needle.as_str())
                    || id.to_lowercase().contains(needle.as_str())
            }
            None => true,
        })
        .collect();
    items.sort();
    items
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|(name, id)| format!("{id}\t{name}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use craftcost_core::test_utils::{catalog_from, record, stick_chain};

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn bom_arguments_parse() {
        let cli = Cli::try_parse_from([
            "craftcost", "--root", "a", "--root", "b", "bom", "minecraft:stick", "--cube", "3",
            "--diagram", "--iterative",
        ])
        .unwrap();
        assert_eq!(cli.roots, [PathBuf::from("a"), PathBuf::from("b")]);
        match cli.command {
            Commands::Bom { item, cube, diagram, iterative, format, .. } => {
                assert_eq!(item, "minecraft:stick");
                assert_eq!(cube, Some(3));
                assert!(diagram && iterative);
                assert_eq!(format, OutputFormat::Json);
            }
            Commands::Items { .. } => panic!("expected bom"),
        }
    }

    #[test]
    fn quantity_and_cube_conflict() {
        let result = Cli::try_parse_from(["craftcost", "bom", "x:y", "-n", "2", "--cube", "3"]);
        assert!(result.is_err());
    }

    #[test]
    fn root_precedence() {
        let config = LoaderConfig {
            roots: vec![PathBuf::from("configured")],
            ..LoaderConfig::default()
        };
        let env = Some(PathBuf::from("from_env"));

        assert_eq!(
            content_roots(&[PathBuf::from("flag")], &config, env.clone()),
            [PathBuf::from("flag")]
        );
        assert_eq!(content_roots(&[], &config, env.clone()), [PathBuf::from("configured")]);
        assert_eq!(
            content_roots(&[], &LoaderConfig::default(), env),
            [PathBuf::from("from_env")]
        );
        assert_eq!(
            content_roots(&[], &LoaderConfig::default(), None),
            [PathBuf::from("instance")]
        );
    }

    #[test]
    fn items_are_filtered_and_sorted_by_name() {
        let mut records = stick_chain();
        records.push(record("minecraft:oak_planks", 4, &[("minecraft:oak_log", 1)]));
        let catalog = catalog_from(records);

        let all = item_lines(&catalog, None, None);
        let names: Vec<&str> = all.iter().filter_map(|l| l.split('\t').nth(1)).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        let oak = item_lines(&catalog, Some("OAK"), None);
        assert_eq!(oak, ["minecraft:oak_planks\tOak Planks"]);

        assert_eq!(item_lines(&catalog, None, Some(1)).len(), 1);
    }
}

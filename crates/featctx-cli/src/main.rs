//! CLI binary for featctx: trace imports of source files back to their definitions.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use featctx_core::config::FeatctxConfig;
use featctx_core::definition::Extraction;
use featctx_core::module::Resolution;
use featctx_core::options::TraceOptions;
use featctx_core::reference::ImportedSymbol;
use featctx_core::tree::DependencyTree;
use featctx_trace::{ExtractorRegistry, trace_feature};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "featctx", about = "Import resolution and dependency tracing")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dependency tree of one or more entry files
    Trace {
        /// Entry files
        #[arg(required = true)]
        entries: Vec<PathBuf>,

        #[command(flatten)]
        trace: TraceArgs,
    },

    /// Trace every source file of a feature directory
    Feature {
        /// Feature directory
        dir: PathBuf,

        /// Keep the feature's own files in the trees
        #[arg(long)]
        keep_feature_files: bool,

        /// Folder glob patterns to skip while walking (repeatable)
        #[arg(long)]
        exclude_folder: Vec<String>,

        #[command(flatten)]
        trace: TraceArgs,
    },

    /// List the imports of a file and where each one resolves
    Imports {
        /// Source file
        file: PathBuf,

        #[command(flatten)]
        trace: TraceArgs,
    },

    /// Find a symbol's definition in a file and follow its re-exports
    Definition {
        /// Source file
        file: PathBuf,

        /// Symbol name
        symbol: String,

        #[command(flatten)]
        trace: TraceArgs,
    },
}

/// Flags shared by every command; each overrides `.featctx/config.toml`.
#[derive(Args)]
struct TraceArgs {
    /// Origin directory, highest priority first (repeatable)
    #[arg(short, long)]
    origin: Vec<PathBuf>,

    /// Emit whole files instead of imported definitions
    #[arg(long)]
    whole: bool,

    /// File to leave out of the tree (repeatable)
    #[arg(long)]
    exclude: Vec<PathBuf>,

    /// Enabled file extensions, e.g. ".py,.vue"
    #[arg(long, value_delimiter = ',')]
    types: Vec<String>,

    /// Output format: json, outline
    #[arg(short, long, default_value = "outline")]
    format: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Outline,
}

impl TraceArgs {
    fn output_format(&self) -> Result<OutputFormat> {
        match self.format.as_str() {
            "json" => Ok(OutputFormat::Json),
            "outline" | "text" => Ok(OutputFormat::Outline),
            other => anyhow::bail!("Unknown output format: {}. Use 'json' or 'outline'.", other),
        }
    }

    /// Apply command-line overrides on top of the loaded config.
    fn apply(&self, config: &mut FeatctxConfig) {
        if !self.origin.is_empty() {
            config.trace.origins.clone_from(&self.origin);
        }
        if self.whole {
            config.trace.whole_module_content = true;
        }
        config.trace.exclude_files.extend(self.exclude.iter().cloned());
        if !self.types.is_empty() {
            config.trace.file_types.clone_from(&self.types);
        }
    }
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

/// Config file, then command-line flags.
fn load_options(project_root: &Path, args: &TraceArgs) -> Result<(FeatctxConfig, TraceOptions)> {
    let mut config = FeatctxConfig::load(project_root)?;
    args.apply(&mut config);
    if config.trace.origins.is_empty() {
        anyhow::bail!(
            "No origin directories. Pass --origin or set [trace] origins in .featctx/config.toml."
        );
    }
    let options = config.trace_options(project_root)?;
    Ok((config, options))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;

    match cli.command {
        Commands::Trace { entries, trace } => cmd_trace(&project_root, &entries, &trace),
        Commands::Feature {
            dir,
            keep_feature_files,
            exclude_folder,
            trace,
        } => cmd_feature(
            &project_root,
            &dir,
            keep_feature_files,
            exclude_folder,
            &trace,
        ),
        Commands::Imports { file, trace } => cmd_imports(&project_root, &file, &trace),
        Commands::Definition {
            file,
            symbol,
            trace,
        } => cmd_definition(&project_root, &file, &symbol, &trace),
    }
}

fn print_trees(trees: &[DependencyTree], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(trees)
                .context("failed to serialize dependency trees")?;
            println!("{}", json);
        }
        OutputFormat::Outline => {
            for tree in trees {
                print!("{}", tree.format_outline());
                let stats = tree.stats();
                eprintln!(
                    "  {} modules, {} cycles, {} already expanded, {} unresolved, {} unreadable",
                    stats.expanded,
                    stats.cycles,
                    stats.already_expanded,
                    stats.unresolved,
                    stats.unreadable
                );
            }
        }
    }
    Ok(())
}

fn cmd_trace(project_root: &Path, entries: &[PathBuf], args: &TraceArgs) -> Result<()> {
    let format = args.output_format()?;
    let (_, options) = load_options(project_root, args)?;
    let registry = ExtractorRegistry::builtin();

    let mut trees = Vec::with_capacity(entries.len());
    for entry in entries {
        tracing::debug!("tracing {}", entry.display());
        let extractor = registry
            .for_path(entry)
            .with_context(|| format!("unsupported file type: {}", entry.display()))?;
        let tree = extractor
            .build_tree(entry, &options)
            .with_context(|| format!("failed to trace {}", entry.display()))?;
        trees.push(tree);
    }
    print_trees(&trees, format)
}

fn cmd_feature(
    project_root: &Path,
    dir: &Path,
    keep_feature_files: bool,
    exclude_folder: Vec<String>,
    args: &TraceArgs,
) -> Result<()> {
    let format = args.output_format()?;
    let (mut config, options) = load_options(project_root, args)?;
    if keep_feature_files {
        config.feature.exclude_feature_files = false;
    }
    config.feature.exclude_folders.extend(exclude_folder);

    let registry = ExtractorRegistry::builtin();
    let report = trace_feature(dir, &options, &config.feature, &registry)
        .with_context(|| format!("failed to trace feature {}", dir.display()))?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .context("failed to serialize feature report")?;
            println!("{}", json);
        }
        OutputFormat::Outline => {
            print_trees(&report.trees, format)?;
            for failure in &report.failures {
                eprintln!("  failed: {}: {}", failure.file.display(), failure.error);
            }
        }
    }
    Ok(())
}

fn cmd_imports(project_root: &Path, file: &Path, args: &TraceArgs) -> Result<()> {
    let format = args.output_format()?;
    let (_, options) = load_options(project_root, args)?;
    let registry = ExtractorRegistry::builtin();
    let extractor = registry
        .for_path(file)
        .with_context(|| format!("unsupported file type: {}", file.display()))?;
    let imports = extractor.detect_imports(file)?;

    let resolutions: Vec<_> = imports
        .iter()
        .map(|reference| (reference, extractor.resolve(reference, &options.origins)))
        .collect();

    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = resolutions
                .iter()
                .map(|(reference, resolution)| {
                    serde_json::json!({
                        "reference": reference,
                        "resolution": resolution,
                    })
                })
                .collect();
            let json =
                serde_json::to_string_pretty(&rows).context("failed to serialize imports")?;
            println!("{}", json);
        }
        OutputFormat::Outline => {
            for (reference, resolution) in &resolutions {
                let target = match resolution {
                    Resolution::Resolved(module) => module.path.display().to_string(),
                    Resolution::NotFound { .. } => "(unresolved)".to_string(),
                };
                println!(
                    "{:>5}  {}  {} -> {}",
                    reference.line, reference.module, reference.symbol, target
                );
            }
            eprintln!("  {} imports", resolutions.len());
        }
    }
    Ok(())
}

fn cmd_definition(project_root: &Path, file: &Path, symbol: &str, args: &TraceArgs) -> Result<()> {
    let format = args.output_format()?;
    let (_, options) = load_options(project_root, args)?;
    let registry = ExtractorRegistry::builtin();
    let extractor = registry
        .for_path(file)
        .with_context(|| format!("unsupported file type: {}", file.display()))?;
    let module = extractor.open_module(file, &options.origins)?;

    let definition = match extractor.extract(
        &module,
        &ImportedSymbol::named(symbol),
        options.whole_module_content,
    ) {
        Extraction::Found(definition) => definition,
        Extraction::DefinitionNotFound { reason, .. } => {
            anyhow::bail!("'{}' not found in {}: {}", symbol, file.display(), reason)
        }
    };
    let traced = extractor.trace_to_origin(definition, &options.origins);

    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&traced).context("failed to serialize definition")?;
            println!("{}", json);
        }
        OutputFormat::Outline => {
            for hop in &traced.hops {
                eprintln!(
                    "  via {}:{}  {}",
                    hop.module.display(),
                    hop.line,
                    hop.statement
                );
            }
            eprintln!(
                "{} ({:?})",
                traced.definition.module.display(),
                traced.status
            );
            println!("{}", traced.definition.text);
        }
    }
    Ok(())
}

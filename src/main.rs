//! CLI for the semantic note graph explorer.
//!
//! Subcommands:
//!  - `validate` : check a snapshot and report errors/warnings.
//!  - `stats`    : print aggregate counts for a snapshot.
//!  - `scene`    : extract a render-ready scene as JSON on stdout.
//!  - `edit`     : update a note's text or related links, then save.
//!  - `delete`   : remove a note and every reference to it, then save.
//!
//! The binary is a thin boundary over the library crates: file I/O and
//! argument parsing live here, everything else is delegated.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use notegraph_core::{
    read_snapshot, validate, write_snapshot, GraphStore, MutationEngine, NoteEdit, Session,
    ValidationResult,
};
use scene_projection::{build_scene, ViewParams, ViewRequest};

#[derive(Parser)]
#[command(
    name = "notegraph",
    about = "Semantic note graph explorer: snapshot inspection, editing, and scene extraction",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a snapshot and report errors and warnings.
    Validate(SnapshotArgs),

    /// Print aggregate counts for a snapshot.
    Stats(SnapshotArgs),

    /// Extract a render-ready scene as JSON on stdout.
    Scene(SceneArgs),

    /// Edit a note's text fields or related links, then save.
    Edit(EditArgs),

    /// Delete a note and every reference to it, then save.
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    /// Path to the snapshot JSON file.
    #[arg(value_name = "SNAPSHOT")]
    snapshot: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SceneMode {
    Neighborhood,
    ClusterMap,
    LongRange,
    ClusterMatrix,
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Path to the snapshot JSON file.
    #[arg(value_name = "SNAPSHOT")]
    snapshot: PathBuf,

    /// View mode to build.
    #[arg(long, value_enum)]
    mode: SceneMode,

    /// Selected note id (required for the neighborhood mode).
    #[arg(long)]
    selected: Option<i64>,

    /// Per-note cap on outbound/inbound expansion candidates.
    #[arg(long, default_value_t = 8)]
    related_limit: usize,

    /// Breadth-first expansion depth (1-3).
    #[arg(long, default_value_t = 1)]
    depth: usize,

    /// Normalized [0,1] score cutoff.
    #[arg(long, default_value_t = 0.0)]
    min_score: f64,

    /// Global cap on long-range edges considered.
    #[arg(long, default_value_t = 40)]
    top_k: usize,

    /// Leave long-range links out of the scene.
    #[arg(long)]
    no_long_range: bool,
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Path to the snapshot JSON file.
    #[arg(value_name = "SNAPSHOT")]
    snapshot: PathBuf,

    /// Note id to edit.
    #[arg(long)]
    id: i64,

    /// Replacement raw content.
    #[arg(long)]
    raw_content: Option<String>,

    /// Replacement context.
    #[arg(long)]
    context: Option<String>,

    /// Replacement related links as "id:score" tokens (comma, space, or
    /// newline delimited; a bare id implies score 0).
    #[arg(long)]
    links: Option<String>,

    /// Write the result here instead of back to SNAPSHOT.
    #[arg(long, short = 'o', value_name = "PATH")]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    /// Path to the snapshot JSON file.
    #[arg(value_name = "SNAPSHOT")]
    snapshot: PathBuf,

    /// Note id to delete.
    #[arg(long)]
    id: i64,

    /// Write the result here instead of back to SNAPSHOT.
    #[arg(long, short = 'o', value_name = "PATH")]
    out: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(args) => run_validate(args),
        Commands::Stats(args) => run_stats(args),
        Commands::Scene(args) => run_scene(args),
        Commands::Edit(args) => run_edit(args),
        Commands::Delete(args) => run_delete(args),
    }
}

fn load_store(path: &PathBuf) -> Result<GraphStore> {
    let graph = read_snapshot(path)
        .with_context(|| format!("failed to load snapshot {}", path.display()))?;
    let store = GraphStore::from_graph(graph);
    tracing::debug!(path = %path.display(), notes = store.graph().notes.len(), "snapshot loaded");
    Ok(store)
}

fn print_issues(result: &ValidationResult) {
    for error in &result.errors {
        eprintln!("error[{}]: {}", error.code(), error);
    }
    for warning in &result.warnings {
        eprintln!("warning[{}]: {}", warning.code(), warning);
    }
}

fn run_validate(args: SnapshotArgs) -> Result<ExitCode> {
    let graph = read_snapshot(&args.snapshot)
        .with_context(|| format!("failed to load snapshot {}", args.snapshot.display()))?;
    let result = validate(&graph);
    print_issues(&result);
    println!(
        "{} error(s), {} warning(s)",
        result.errors.len(),
        result.warnings.len()
    );
    Ok(if result.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_stats(args: SnapshotArgs) -> Result<ExitCode> {
    let store = load_store(&args.snapshot)?;
    println!("{}", serde_json::to_string_pretty(&store.stats())?);
    Ok(ExitCode::SUCCESS)
}

fn run_scene(args: SceneArgs) -> Result<ExitCode> {
    let store = load_store(&args.snapshot)?;

    let params = ViewParams {
        related_limit: args.related_limit,
        depth: args.depth,
        min_score_normalized: args.min_score,
        long_range_top_k: args.top_k,
        include_long_range: !args.no_long_range,
    };
    let request = match args.mode {
        SceneMode::Neighborhood => {
            let Some(selected) = args.selected else {
                bail!("--selected is required for the neighborhood mode");
            };
            ViewRequest::Neighborhood { selected, params }
        }
        SceneMode::ClusterMap => ViewRequest::ClusterMap {
            selected: args.selected,
            params,
        },
        SceneMode::LongRange => ViewRequest::LongRange {
            selected: args.selected,
            params,
        },
        SceneMode::ClusterMatrix => ViewRequest::ClusterMatrix { params },
    };

    let scene = build_scene(&store, &request);
    println!("{}", serde_json::to_string_pretty(&scene)?);
    Ok(ExitCode::SUCCESS)
}

fn run_edit(args: EditArgs) -> Result<ExitCode> {
    let mut store = load_store(&args.snapshot)?;
    if !store.contains(args.id) {
        bail!("note {} not found in snapshot", args.id);
    }

    let mut session = Session::with_selection(args.id);
    let warnings = MutationEngine::new(&mut store, &mut session).edit_note(
        args.id,
        NoteEdit {
            raw_content: args.raw_content,
            context: args.context,
            related_links_text: args.links,
        },
    );
    for warning in &warnings {
        eprintln!("warning[{}]: {}", warning.code(), warning);
    }

    let out = args.out.unwrap_or(args.snapshot);
    write_snapshot(store.graph(), &out)
        .with_context(|| format!("failed to save snapshot {}", out.display()))?;
    println!("edited note {} ({} warning(s))", args.id, warnings.len());
    Ok(ExitCode::SUCCESS)
}

fn run_delete(args: DeleteArgs) -> Result<ExitCode> {
    let mut store = load_store(&args.snapshot)?;

    let mut session = Session::new();
    let removed = MutationEngine::new(&mut store, &mut session).delete_note(args.id);
    if !removed {
        bail!("note {} not found in snapshot", args.id);
    }

    let out = args.out.unwrap_or(args.snapshot);
    write_snapshot(store.graph(), &out)
        .with_context(|| format!("failed to save snapshot {}", out.display()))?;
    match session.current_note {
        Some(next) => println!("deleted note {}; current note is now {}", args.id, next),
        None => println!("deleted note {}; the graph is now empty", args.id),
    }
    Ok(ExitCode::SUCCESS)
}

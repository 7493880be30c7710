//! LDAC RO-Crate export CLI
//!
//! Command-line tool for compiling a project snapshot into an RO-Crate
//! metadata file.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ldac_rocrate_export::{
    export_rocrate, to_json_string, DirectoryVocabularyLoader, ExportError, ExportOptions, ExportRoot,
    NoVocabularies, Project, VocabularyLoader,
};

#[derive(Parser)]
#[command(name = "ldac-rocrate-export")]
#[command(about = "Compile project metadata into an LDAC-profiled RO-Crate document")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a project, session or person as ro-crate-metadata.json
    Export(ExportArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Project snapshot (JSON)
    #[arg(long)]
    snapshot: PathBuf,

    /// What to export: `project`, `session:<folder>` or `person:<folder>`
    #[arg(long, default_value = "project", value_parser = parse_root)]
    root: RootArg,

    /// Directory containing vocabulary files (e.g. genres.json)
    #[arg(long)]
    vocabularies: Option<PathBuf>,

    /// Output file, `-` for stdout
    #[arg(short, long, default_value = "ro-crate-metadata.json")]
    output: PathBuf,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Fail when two different entities share an @id
    #[arg(long)]
    strict: bool,

    /// Emit every language entity, not only referenced ones
    #[arg(long)]
    all_languages: bool,

    /// Fixed datePublished instead of the current time
    #[arg(long)]
    date_published: Option<String>,
}

#[derive(Debug, Clone)]
enum RootArg {
    Project,
    Session(String),
    Person(String),
}

fn parse_root(value: &str) -> Result<RootArg, String> {
    match value.split_once(':') {
        None if value == "project" => Ok(RootArg::Project),
        Some(("session", prefix)) if !prefix.is_empty() => Ok(RootArg::Session(prefix.to_string())),
        Some(("person", prefix)) if !prefix.is_empty() => Ok(RootArg::Person(prefix.to_string())),
        _ => Err(format!(
            "expected `project`, `session:<folder>` or `person:<folder>`, got '{}'",
            value
        )),
    }
}

fn load_snapshot(path: &PathBuf) -> Result<Project, ExportError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn resolve_root<'p>(project: &'p Project, root: &RootArg) -> Result<ExportRoot<'p>, ExportError> {
    match root {
        RootArg::Project => Ok(ExportRoot::Project),
        RootArg::Session(prefix) => project
            .sessions
            .iter()
            .find(|s| &s.file_prefix == prefix)
            .map(ExportRoot::Session)
            .ok_or_else(|| ExportError::InvalidSnapshot(format!("no session '{}'", prefix))),
        RootArg::Person(prefix) => project
            .people
            .iter()
            .find(|p| &p.file_prefix == prefix)
            .map(ExportRoot::Person)
            .ok_or_else(|| ExportError::InvalidSnapshot(format!("no person '{}'", prefix))),
    }
}

/// Write output to file or stdout
fn write_output(content: &str, output: &PathBuf) -> Result<(), ExportError> {
    if output.as_os_str() == "-" {
        println!("{}", content);
    } else {
        fs::write(output, content)?;
        info!(path = %output.display(), "wrote RO-Crate metadata");
    }
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<(), ExportError> {
    let project = load_snapshot(&args.snapshot)?;
    let root = resolve_root(&project, &args.root)?;

    let loader: Box<dyn VocabularyLoader> = match args.vocabularies {
        Some(dir) => Box::new(DirectoryVocabularyLoader::new(dir)),
        None => Box::new(NoVocabularies),
    };

    let options = ExportOptions {
        prune_unused_languages: !args.all_languages,
        strict_duplicates: args.strict,
        date_published: args.date_published,
    };

    let result = export_rocrate(&project, root, loader.as_ref(), &options)?;

    info!(
        entities = result.stats.total_entities,
        sessions = result.stats.sessions,
        people = result.stats.people,
        files = result.stats.files,
        duplicates = result.stats.duplicates_dropped,
        conflicts = result.stats.conflicting_entities,
        "export finished"
    );

    let output = to_json_string(&result, args.pretty)?;
    write_output(&output, &args.output)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Export(args) => run_export(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "maestro",
    about = "Demand orchestrator — classify a request, build an agent pipeline, run it",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .maestro/ or .git/)
    #[arg(long, global = true, env = "MAESTRO_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Verbose logging
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize maestro in the current project
    Init,

    /// Dispatch a demand through the agent pipeline
    Do(cmd::demand::DemandArgs),

    /// Show the persisted execution state
    Status,

    /// List the loaded agent catalog
    Agents,

    /// Show per-agent metrics, health and badges
    Health {
        /// Drop metrics entries older than this many days before reporting
        #[arg(long)]
        cleanup_days: Option<i64>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root_path = cli.root.as_deref();
    let root = root::resolve_root(root_path);

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Do(args) => cmd::demand::run(&root, args, cli.json),
        Commands::Status => cmd::status::run(&root, cli.json),
        Commands::Agents => cmd::agents::run(&root, cli.json),
        Commands::Health { cleanup_days } => cmd::health::run(&root, cleanup_days, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

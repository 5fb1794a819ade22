//! Arbor CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Incremental file tracking and import resolution for TypeScript projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Host options file (defaults to <root>/arbor.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Track a file and everything it imports, then list tracked files
    Track {
        file: String,
    },
    /// List the direct imports of a file
    Imports {
        file: String,
    },
    /// Print the import graph reachable from a file
    Closure {
        file: String,
    },
    /// Track every script file under the root
    Index,
    /// Index the root, then keep it in sync with the filesystem
    Watch,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("arbor={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Repository root: {}", cli.root.display());

    let ctx = commands::Context {
        root: cli.root,
        config: cli.config,
        json: cli.json,
    };

    match cli.command {
        Commands::Track { file } => commands::track(&ctx, &file),
        Commands::Imports { file } => commands::imports(&ctx, &file),
        Commands::Closure { file } => commands::closure(&ctx, &file),
        Commands::Index => commands::index(&ctx),
        Commands::Watch => commands::watch(&ctx).await,
        Commands::Version => {
            println!("{}", commands::version_string());
            Ok(())
        }
    }
}

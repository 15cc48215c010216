mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mfsd_core::config::DatabaseOptions;
use mfsd_core::Database;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use commands::dumplist::ListArgs;
use commands::protocol::{ModelsArgs, ProtocolArgs};

/// mfsd — catalog and query tool for the MSU mobile face spoofing dataset
#[derive(Parser)]
#[command(name = "mfsd", version, about)]
struct Cli {
    /// Path to the catalog database
    #[arg(long, env = "MFSD_CATALOG", default_value_t = default_catalog_path())]
    catalog: String,

    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the catalog from the shipped dataset tables
    Create {
        /// Replace an existing catalog
        #[arg(short = 'R', long)]
        recreate: bool,
    },
    /// Dump the list of files matching the given criteria
    Dumplist(ListArgs),
    /// Check that the files matching the given criteria exist on disk
    Checkfiles(ListArgs),
    /// Show clients and files per fold and group
    Summary,
    /// List frame-level samples of a verification protocol
    Protocol(ProtocolArgs),
    /// List the enrolled identities of a verification protocol
    Models(ModelsArgs),
}

fn default_catalog_path() -> String {
    dirs_path().to_string_lossy().to_string()
}

fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".mfsd").join("catalog.db")
}

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

fn init_tracing(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let catalog_path = PathBuf::from(&cli.catalog);
    debug!(catalog = %catalog_path.display(), "using catalog");

    let open = || Database::open(&catalog_path, DatabaseOptions::default());

    match cli.command {
        Commands::Create { recreate } => commands::create::run(&catalog_path, recreate)?,
        Commands::Dumplist(args) => commands::dumplist::run(&open()?, &args)?,
        Commands::Checkfiles(args) => commands::checkfiles::run(&open()?, &args)?,
        Commands::Summary => commands::summary::run(&open()?)?,
        Commands::Protocol(args) => commands::protocol::run(open()?, &args)?,
        Commands::Models(args) => commands::protocol::models(open()?, &args)?,
    }

    Ok(())
}

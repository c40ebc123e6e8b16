//! optstore CLI
//!
//! Command-line access to a tenant-scoped option store

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod error;

use commands::ScopeArgs;
use optstore_core_types::schema::FIELD_ERR_CODE;

#[derive(Debug, Parser)]
#[command(name = "optstore")]
#[command(about = "optstore - tenant-scoped key/value options", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./optstore.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path, overrides configuration
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(flatten)]
    scope: ScopeArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print an option value
    Get(commands::options::GetArgs),
    /// Create or overwrite an option
    Set(commands::options::SetArgs),
    /// Create or overwrite several options in one scope
    SetMany(commands::options::SetManyArgs),
    /// Print whether an option exists
    Exists(commands::options::KeyArgs),
    /// Delete an option
    Remove(commands::options::KeyArgs),
    /// Create or upgrade the database schema
    Migrate,
}

fn main() {
    // A missing .env is normal
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = config::Settings::load(cli.config.as_deref())
        .map(|settings| settings.with_database_override(cli.db))
        .and_then(|settings| {
            let profile = settings.log_profile()?;
            optstore_core::logging_facility::init(profile);
            tracing::debug!(?settings, ?profile, "settings loaded");
            match cli.command {
                Commands::Get(args) => commands::options::get(&settings, &cli.scope, args),
                Commands::Set(args) => commands::options::set(&settings, &cli.scope, args),
                Commands::SetMany(args) => commands::options::set_many(&settings, &cli.scope, args),
                Commands::Exists(args) => commands::options::exists(&settings, &cli.scope, args),
                Commands::Remove(args) => commands::options::remove(&settings, &cli.scope, args),
                Commands::Migrate => commands::migrate::execute(&settings),
            }
        });

    if let Err(e) = result {
        tracing::debug!({ FIELD_ERR_CODE } = e.kind().code(), "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

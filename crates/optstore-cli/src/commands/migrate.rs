//! Schema migration command
//!
//! Usage: optstore migrate

use optstore_store::{db, migrations};

use crate::config::Settings;
use crate::error::CliError;

/// Bring the configured database up to the current schema
pub fn execute(settings: &Settings) -> Result<(), CliError> {
    let mut conn = db::open(&settings.database_path)?;
    db::configure(&conn, settings.busy_timeout_ms)?;

    let applied = migrations::apply_migrations(&mut conn)?;
    if applied.is_empty() {
        println!("Schema up to date ({})", settings.database_path.display());
    } else {
        for id in &applied {
            println!("Applied {}", id);
        }
    }
    Ok(())
}

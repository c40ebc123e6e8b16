//! CLI configuration
//!
//! Layers, lowest precedence first: built-in defaults, a TOML file
//! (`--config PATH`, else `./optstore.toml` if present), then `OPTSTORE_*`
//! environment variables (e.g. `OPTSTORE_DATABASE_PATH`). Command-line flags
//! are applied on top by the caller.

use optstore_core::logging_facility::Profile;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::CliError;

const DEFAULT_DATABASE_PATH: &str = ".optstore/options.db";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_LOG_PROFILE: &str = "development";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_path: PathBuf,
    pub busy_timeout_ms: u64,
    pub log_profile: String,
}

impl Settings {
    /// Load settings from the file (if any) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let builder = config::Config::builder()
            .set_default("database_path", DEFAULT_DATABASE_PATH)?
            .set_default("busy_timeout_ms", DEFAULT_BUSY_TIMEOUT_MS)?
            .set_default("log_profile", DEFAULT_LOG_PROFILE)?;

        let builder = match path {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder.add_source(config::File::with_name("optstore").required(false)),
        };

        let builder = builder.add_source(
            config::Environment::with_prefix("OPTSTORE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_database_override(mut self, database_path: Option<PathBuf>) -> Self {
        if let Some(path) = database_path {
            self.database_path = path;
        }
        self
    }

    pub fn log_profile(&self) -> Result<Profile, CliError> {
        self.log_profile.parse().map_err(|reason| CliError::InvalidArgument {
            field: "log_profile",
            reason,
        })
    }

    fn validate(&self) -> Result<(), CliError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(CliError::InvalidArgument {
                field: "database_path",
                reason: "must not be empty".to_string(),
            });
        }
        self.log_profile()?;
        Ok(())
    }
}

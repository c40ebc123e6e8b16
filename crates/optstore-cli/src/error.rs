use optstore_core::{ExError, ExErrorKind, OptionStoreError};
use thiserror::Error;

/// Errors surfaced by the CLI
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    #[error(transparent)]
    Store(#[from] ExError),

    #[error(transparent)]
    Options(#[from] OptionStoreError),
}

impl CliError {
    pub fn kind(&self) -> ExErrorKind {
        match self {
            CliError::Config(_) => ExErrorKind::Config,
            CliError::InvalidArgument { .. } => ExErrorKind::InvalidInput,
            CliError::Store(err) => err.kind(),
            CliError::Options(err) => ExError::from(err.clone()).kind(),
        }
    }
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

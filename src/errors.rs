use std::result::Result as StdResult;

use tally_config::ConfigError;
use tally_core::CoreError;
use thiserror::Error;

/// Unified error type for the ledger, configuration and export layers.
#[derive(Error, Debug)]
pub enum TallyError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TallyError {
    /// True when the failure was caused by caller input.
    pub fn is_user_error(&self) -> bool {
        matches!(self, TallyError::Core(err) if err.is_user_error())
    }
}

pub type Result<T> = StdResult<T, TallyError>;

/// User-facing CLI error wrapper.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] TallyError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

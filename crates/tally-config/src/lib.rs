//! tally-config
//!
//! Persistent preferences: ledger policy, export defaults, storage location.
//! Owns the Config data structure plus disk persistence helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::{ConfigBackup, ConfigManager};
pub use model::{default_data_root, Config, ExportDefaults, HOME_ENV};

use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};

use tally_domain::{NetIncomePolicy, RangeMode, RowOrder, TotalsStyle};

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "TALLY_HOME";
const DEFAULT_DIR_NAME: &str = ".tally";

/// Stores ledger rules and user preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default)]
    pub net_income_policy: NetIncomePolicy,
    #[serde(default)]
    pub export: ExportDefaults,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom data directory. Defaults to `$TALLY_HOME` or `~/.tally`.
    pub data_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "es-MX".into(),
            currency: "MXN".into(),
            net_income_policy: NetIncomePolicy::default(),
            export: ExportDefaults::default(),
            backup_retention: Self::default_backup_retention(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            data_root: None,
        }
    }
}

impl Config {
    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }
        default_data_root()
    }
}

/// Application directory: `$TALLY_HOME`, else `~/.tally`.
pub fn default_data_root() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Defaults applied when a caller does not choose export options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportDefaults {
    #[serde(default)]
    pub range: RangeMode,
    #[serde(default)]
    pub order: RowOrder,
    #[serde(default)]
    pub totals_style: TotalsStyle,
    #[serde(default = "ExportDefaults::default_file_name")]
    pub file_name: String,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            range: RangeMode::default(),
            order: RowOrder::default(),
            totals_style: TotalsStyle::default(),
            file_name: Self::default_file_name(),
        }
    }
}

impl ExportDefaults {
    pub fn default_file_name() -> String {
        "finance_report.csv".into()
    }
}

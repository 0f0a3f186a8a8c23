use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{Config, ConfigError};

const CONFIG_FILE: &str = "config.json";
const BACKUP_PREFIX: &str = "config_";
const BACKUP_SUFFIX: &str = ".json";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A saved copy of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBackup {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Loads and saves [`Config`] and keeps a bounded set of backups next to it.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf, backups_dir: PathBuf) -> Self {
        Self {
            config_path,
            backups_dir,
        }
    }

    /// `<base>/config/config.json`, backups in `<base>/config/backups`.
    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        let dir = base.join("config");
        fs::create_dir_all(dir.join("backups"))?;
        Ok(Self::new(dir.join(CONFIG_FILE), dir.join("backups")))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Reads the configuration; a missing file yields [`Config::default`].
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }
        read_config(&self.config_path)
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        write_config(&self.config_path, config)
    }

    /// Loads, applies `change`, saves and returns the new configuration.
    /// Nothing is written when `change` fails.
    pub fn update<E>(
        &self,
        change: impl FnOnce(&mut Config) -> Result<(), E>,
    ) -> Result<Result<Config, E>, ConfigError> {
        let mut config = self.load()?;
        if let Err(err) = change(&mut config) {
            return Ok(Err(err));
        }
        self.save(&config)?;
        Ok(Ok(config))
    }

    /// Writes a timestamped copy of `config` and prunes old copies down to
    /// `config.backup_retention`.
    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String, ConfigError> {
        let stamp = Utc::now().format(STAMP_FORMAT);
        let name = match note.and_then(slug) {
            Some(label) => format!("{BACKUP_PREFIX}{stamp}_{label}{BACKUP_SUFFIX}"),
            None => format!("{BACKUP_PREFIX}{stamp}{BACKUP_SUFFIX}"),
        };
        write_config(&self.backups_dir.join(&name), config)?;
        self.prune(config.backup_retention.max(1))?;
        Ok(name)
    }

    /// Backups, newest first.
    pub fn list_backups(&self) -> Result<Vec<ConfigBackup>, ConfigError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_SUFFIX) {
                backups.push(ConfigBackup {
                    created_at: backup_time(&name),
                    name,
                });
            }
        }
        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.name.cmp(&a.name)));
        Ok(backups)
    }

    /// Makes the named backup the live configuration.
    pub fn restore(&self, name: &str) -> Result<Config, ConfigError> {
        let path = self.backups_dir.join(name);
        if !path.is_file() {
            return Err(ConfigError::MissingBackup(name.to_string()));
        }
        let config = read_config(&path)?;
        self.save(&config)?;
        Ok(config)
    }

    fn prune(&self, keep: usize) -> Result<(), ConfigError> {
        for stale in self.list_backups()?.into_iter().skip(keep) {
            fs::remove_file(self.backups_dir.join(stale.name))?;
        }
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| ConfigError::Serde(err.to_string()))
}

fn write_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json =
        serde_json::to_string_pretty(config).map_err(|err| ConfigError::Serde(err.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Lowercase ASCII words joined by single dashes.
fn slug(note: &str) -> Option<String> {
    let words: Vec<String> = note
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join("-"))
    }
}

// `config_<YYYYMMDD>_<HHMMSS>[_<note>].json`
fn backup_time(name: &str) -> Option<DateTime<Utc>> {
    let stamp = name.strip_prefix(BACKUP_PREFIX)?.get(..15)?;
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_collapse_punctuation() {
        assert_eq!(slug("Before v2.0 rollout!").as_deref(), Some("before-v2-0-rollout"));
        assert_eq!(slug(" -- "), None);
    }

    #[test]
    fn backup_names_carry_their_timestamp() {
        let parsed = backup_time("config_20250131_235959_year-end.json").expect("timestamp");
        assert_eq!(parsed.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-01-31 23:59:59");
        assert!(backup_time("config_latest.json").is_none());
    }
}

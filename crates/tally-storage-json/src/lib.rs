use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use tally_core::{BookStore, CoreError};
use tally_domain::{Book, CURRENT_SCHEMA_VERSION};

const BOOK_FILE: &str = "book.json";
const BOOK_STEM: &str = "book";
const EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Directories used by [`JsonBookStore`].
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub data_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    /// Book file in `base`, backups in `base/backups`.
    pub fn under(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            backup_root: base.join("backups"),
            data_root: base,
        }
    }
}

/// Describes a persisted backup of the book.
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// Filesystem-backed JSON persistence with rotating backups.
#[derive(Debug, Clone)]
pub struct JsonBookStore {
    book_path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonBookStore {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.data_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            book_path: paths.data_root.join(BOOK_FILE),
            backups_dir: paths.backup_root,
            retention: retention.max(1),
        })
    }

    pub fn book_path(&self) -> &Path {
        &self.book_path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Snapshots the current book file under an optional note.
    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, CoreError> {
        let book = self.load()?;
        let timestamp = Utc::now();
        let mut stem = format!(
            "{}_{}",
            BOOK_STEM,
            timestamp.format(BACKUP_TIMESTAMP_FORMAT)
        );
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let file_name = format!("{stem}.{EXTENSION}");
        let path = self.backups_dir.join(&file_name);
        let data = serialize_book(&book)?;
        write_atomic(&path, &data)?;
        self.prune_backups()?;
        tracing::info!(backup = %file_name, "backup written");
        Ok(BackupInfo {
            id: file_name,
            created_at: Some(timestamp),
            size_bytes: data.len() as u64,
            path,
        })
    }

    /// Backups, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                let size_bytes = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
                entries.push(BackupInfo {
                    id: file_name.to_string(),
                    created_at: parse_backup_timestamp(file_name),
                    size_bytes,
                    path: path.clone(),
                });
            }
        }
        entries.sort_by(|a, b| {
            Reverse(a.created_at)
                .cmp(&Reverse(b.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(entries)
    }

    /// Replaces the live book with a backup and returns the restored data.
    pub fn restore_backup(&self, backup: &BackupInfo) -> Result<Book, CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::NotFound(format!("backup `{}`", backup.id)));
        }
        let book = load_book_from_path(&backup.path)?;
        self.save(&book)?;
        tracing::info!(backup = %backup.id, "backup restored");
        Ok(book)
    }

    pub fn find_backup(&self, id: &str) -> Result<BackupInfo, CoreError> {
        self.list_backups()?
            .into_iter()
            .find(|info| info.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("backup `{id}`")))
    }

    fn backup_existing_file(&self) -> Result<(), CoreError> {
        if !self.book_path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.backups_dir)?;
        let file_name = format!(
            "{}_{}.{}",
            BOOK_STEM,
            Utc::now().format(BACKUP_TIMESTAMP_FORMAT),
            EXTENSION
        );
        fs::copy(&self.book_path, self.backups_dir.join(file_name))?;
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for entry in self.list_backups()?.into_iter().skip(self.retention) {
            let _ = fs::remove_file(entry.path);
        }
        Ok(())
    }
}

impl BookStore for JsonBookStore {
    fn load(&self) -> Result<Book, CoreError> {
        if !self.book_path.exists() {
            tracing::debug!(path = %self.book_path.display(), "no book file yet");
            return Ok(Book::new());
        }
        load_book_from_path(&self.book_path)
    }

    fn save(&self, book: &Book) -> Result<(), CoreError> {
        self.backup_existing_file()?;
        save_book_to_path(book, &self.book_path)
    }
}

/// Saves a book to an arbitrary path on disk.
pub fn save_book_to_path(book: &Book, path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    write_atomic(&tmp, &serialize_book(book)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads a book from the provided filesystem path.
pub fn load_book_from_path(path: &Path) -> Result<Book, CoreError> {
    let data = fs::read_to_string(path)?;
    let book: Book =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    if book.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "{} uses schema v{} but this build supports up to v{}",
            path.display(),
            book.schema_version,
            CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(book)
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

// `book_<date>_<time>[_<note>].json`
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{EXTENSION}"))?;
    let segments: Vec<&str> = trimmed.split('_').collect();
    if segments.len() < 3 || segments[0] != BOOK_STEM {
        return None;
    }
    let (date, time) = (segments[1], segments[2]);
    if !is_digits(date, 8) || !is_digits(time, 6) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

fn serialize_book(book: &Book) -> Result<String, CoreError> {
    serde_json::to_string_pretty(book).map_err(|err| CoreError::Serde(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_names_carry_parsable_timestamps() {
        let parsed = parse_backup_timestamp("book_20250131_235959_before-import.json").unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-01-31 23:59:59");
        assert!(parse_backup_timestamp("book.json").is_none());
        assert!(parse_backup_timestamp("other_20250131_235959.json").is_none());
    }

    #[test]
    fn notes_are_slugged() {
        assert_eq!(
            sanitize_backup_note(Some("  Before Q1 import! ")),
            Some("before-q1-import".into())
        );
        assert_eq!(sanitize_backup_note(Some("***")), None);
        assert_eq!(sanitize_backup_note(None), None);
    }
}

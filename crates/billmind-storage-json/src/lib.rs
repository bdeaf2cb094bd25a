//! billmind-storage-json
//!
//! Stores bill books as pretty-printed JSON files with rolling backups.

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use billmind_core::{
    storage::{BillBookStorage, BookBackupInfo},
    CoreError,
};
use billmind_domain::BillBook;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

const FILE_EXTENSION: &str = "json";
const TMP_EXTENSION: &str = "json.tmp";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%3f";
const BACKUP_TIMESTAMP_LEN: usize = 18;
const DEFAULT_RETENTION: usize = 5;

/// Directories used by [`JsonBookStorage`].
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub book_root: PathBuf,
    pub backup_root: PathBuf,
}

/// Filesystem-backed JSON persistence for bill books and their backups.
#[derive(Debug, Clone)]
pub struct JsonBookStorage {
    paths: StoragePaths,
    retention: usize,
}

impl JsonBookStorage {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.book_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            paths,
            retention: retention.max(1),
        })
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    pub fn book_path(&self, name: &str) -> PathBuf {
        self.paths
            .book_root
            .join(format!("{}.{FILE_EXTENSION}", canonical_name(name)))
    }

    /// One row per stored book, ordered by display name.
    pub fn list_book_metadata(&self) -> Result<Vec<BookMetadata>, CoreError> {
        let mut rows = Vec::new();
        for slug in self.list_books()? {
            let book = self.load_book(&slug)?;
            let open: Vec<_> = book.bills.iter().filter(|bill| bill.is_open()).collect();
            rows.push(BookMetadata {
                path: self.book_path(&slug),
                slug,
                name: book.name.clone(),
                created_at: book.created_at,
                updated_at: book.updated_at,
                bill_count: book.bills.len(),
                open_bill_count: open.len(),
                open_total: open.iter().map(|bill| bill.amount).sum(),
                transaction_count: book.transactions.len(),
            });
        }
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.paths.backup_root.join(canonical_name(name))
    }

    /// Picks a fresh backup file name; same-millisecond backups get a counter.
    fn next_backup_path(&self, name: &str, note: Option<&str>) -> Result<PathBuf, CoreError> {
        let dir = self.backup_dir(name);
        fs::create_dir_all(&dir)?;
        let mut stem = format!(
            "{}-{}",
            canonical_name(name),
            Utc::now().format(BACKUP_TIMESTAMP_FORMAT)
        );
        if let Some(label) = note.and_then(slug_note) {
            stem.push('-');
            stem.push_str(&label);
        }
        let mut path = dir.join(format!("{stem}.{FILE_EXTENSION}"));
        let mut counter = 2;
        while path.exists() {
            path = dir.join(format!("{stem}-{counter}.{FILE_EXTENSION}"));
            counter += 1;
        }
        Ok(path)
    }

    fn backup_info(&self, name: &str, path: PathBuf) -> Option<BookBackupInfo> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let created_at = parse_backup_timestamp(name, &file_name)
            .map(|at| at.to_rfc3339())
            .unwrap_or_default();
        Some(BookBackupInfo {
            book: canonical_name(name),
            id: file_name,
            created_at,
            path,
        })
    }

    fn prune_backups(&self, name: &str) -> Result<(), CoreError> {
        for stale in self.list_backups(name)?.into_iter().skip(self.retention) {
            debug!(backup = %stale.id, "pruning backup");
            fs::remove_file(&stale.path)?;
        }
        Ok(())
    }
}

impl BillBookStorage for JsonBookStorage {
    /// Copies any existing file into the backups first, then replaces it atomically.
    fn save_book(&self, name: &str, book: &BillBook) -> Result<(), CoreError> {
        let path = self.book_path(name);
        if path.exists() {
            let backup = self.next_backup_path(name, None)?;
            fs::copy(&path, &backup)?;
            self.prune_backups(name)?;
        }
        write_book(book, &path)
    }

    fn load_book(&self, name: &str) -> Result<BillBook, CoreError> {
        read_book(&self.book_path(name))
    }

    fn list_books(&self) -> Result<Vec<String>, CoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.paths.book_root)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_book(&self, name: &str) -> Result<(), CoreError> {
        let path = self.book_path(name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn backup_book(
        &self,
        name: &str,
        book: &BillBook,
        note: Option<&str>,
    ) -> Result<BookBackupInfo, CoreError> {
        let path = self.next_backup_path(name, note)?;
        write_file(&path, &serialize_book(book)?)?;
        let info = self
            .backup_info(name, path)
            .ok_or_else(|| CoreError::InvalidOperation("backup path is not valid UTF-8".into()))?;
        self.prune_backups(name)?;
        Ok(info)
    }

    /// Backups for `name`, newest first.
    fn list_backups(&self, name: &str) -> Result<Vec<BookBackupInfo>, CoreError> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(info) = self.backup_info(name, path) {
                entries.push(info);
            }
        }
        entries.sort_by_key(|info| {
            let stem = info.path.file_stem().map(|stem| stem.to_os_string());
            Reverse((parse_backup_timestamp(&info.book, &info.id), stem))
        });
        Ok(entries)
    }

    /// Makes the backup the current book file and returns its contents.
    fn restore_backup(&self, backup: &BookBackupInfo) -> Result<BillBook, CoreError> {
        let book = read_book(&backup.path)?;
        self.save_book(&backup.book, &book)?;
        Ok(book)
    }
}

/// Summary of a stored book for listings.
#[derive(Debug, Clone)]
pub struct BookMetadata {
    pub slug: String,
    pub name: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub bill_count: usize,
    pub open_bill_count: usize,
    pub open_total: f64,
    pub transaction_count: usize,
}

/// Writes a book to an arbitrary path via a temporary sibling file.
pub fn write_book(book: &BillBook, path: &Path) -> Result<(), CoreError> {
    let tmp = path.with_extension(TMP_EXTENSION);
    write_file(&tmp, &serialize_book(book)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Reads a book from `path`. A missing file surfaces as `CoreError::Io` with `NotFound`.
pub fn read_book(path: &Path) -> Result<BillBook, CoreError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))
}

/// Lower-case file-system safe name; everything but ASCII alphanumerics becomes `_`.
pub fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "book".into()
    } else {
        sanitized
    }
}

fn slug_note(note: &str) -> Option<String> {
    let words: Vec<String> = note
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    (!words.is_empty()).then(|| words.join("-"))
}

fn parse_backup_timestamp(name: &str, file_name: &str) -> Option<DateTime<Utc>> {
    let prefix = format!("{}-", canonical_name(name));
    let stamp = file_name.strip_prefix(&prefix)?.get(..BACKUP_TIMESTAMP_LEN)?;
    NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn write_file(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn serialize_book(book: &BillBook) -> Result<String, CoreError> {
    serde_json::to_string_pretty(book).map_err(|err| CoreError::Serde(err.to_string()))
}

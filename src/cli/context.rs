use std::path::PathBuf;

use chrono_tz::Tz;
use tracing::{debug, warn};
use uuid::Uuid;

use billmind_config::{Config, ConfigManager};
use billmind_core::{book_warnings, BillBookStorage, Clock, CoreError, SystemClock};
use billmind_domain::BillBook;
use billmind_storage_json::{JsonBookStorage, StoragePaths};

use crate::errors::{CliError, CliResult};

pub const DEFAULT_BOOK: &str = "default";

/// Everything a command needs: preferences, storage and the active book.
pub struct AppContext {
    pub config: Config,
    pub config_manager: ConfigManager,
    pub storage: JsonBookStorage,
    pub book_name: String,
    pub clock: SystemClock,
}

impl AppContext {
    /// Resolves config and storage. With `data_dir`, config and books both
    /// live under that directory; otherwise the platform defaults are used.
    pub fn open(data_dir: Option<PathBuf>, book: Option<String>, tz: Option<String>) -> CliResult<Self> {
        let config_manager = match &data_dir {
            Some(dir) => ConfigManager::with_base_dir(dir.clone())?,
            None => ConfigManager::user_default()?,
        };
        let mut config = config_manager.load()?;
        if let Some(dir) = &data_dir {
            config.data_root.get_or_insert_with(|| dir.join("books"));
            config.backup_root.get_or_insert_with(|| dir.join("backups"));
        }
        if let Some(zone) = tz {
            config.time_zone = zone;
        }
        let zone: Tz = config.tz()?;

        let storage = JsonBookStorage::new(StoragePaths {
            book_root: config.resolve_data_root(),
            backup_root: config.resolve_backup_root(),
        })?;
        let book_name = book
            .or_else(|| config.last_opened_book.clone())
            .unwrap_or_else(|| DEFAULT_BOOK.to_string());
        debug!(book = %book_name, tz = %zone, "opened context");

        Ok(Self {
            config,
            config_manager,
            storage,
            book_name,
            clock: SystemClock::new(zone),
        })
    }

    pub fn tz(&self) -> Tz {
        self.clock.time_zone()
    }

    /// Loads the active book, starting an empty one when none is stored yet.
    pub fn load_book(&self) -> CliResult<BillBook> {
        match self.storage.load_book(&self.book_name) {
            Ok(book) => {
                for warning in book_warnings(&book) {
                    warn!(book = %self.book_name, "{warning}");
                }
                Ok(book)
            }
            Err(CoreError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(BillBook::new(self.book_name.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn save_book(&self, book: &BillBook) -> CliResult<()> {
        self.storage.save_book(&self.book_name, book)?;
        Ok(())
    }
}

/// Finds the single bill whose id starts with `prefix`.
pub fn resolve_bill_id(book: &BillBook, prefix: &str) -> CliResult<Uuid> {
    let wanted = prefix.trim().to_ascii_lowercase();
    if wanted.is_empty() {
        return Err(CliError::Input("bill id must not be empty".into()));
    }
    let matches: Vec<Uuid> = book
        .bills
        .iter()
        .map(|bill| bill.id)
        .filter(|id| id.to_string().starts_with(&wanted))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CliError::UnknownBill(prefix.to_string())),
        _ => Err(CliError::AmbiguousBill {
            prefix: prefix.to_string(),
            count: matches.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billmind_domain::Bill;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn bill_ids_resolve_by_prefix() {
        let mut book = BillBook::new("Ids");
        let bill = Bill::new("Rent", Utc::now(), 1.0);
        let id = bill.id;
        book.put_bill(bill);

        assert_eq!(resolve_bill_id(&book, &id.to_string()[..8]).unwrap(), id);
        assert!(matches!(resolve_bill_id(&book, "zzzz"), Err(CliError::UnknownBill(_))));
        assert!(matches!(resolve_bill_id(&book, " "), Err(CliError::Input(_))));
    }

    #[test]
    fn data_dir_keeps_everything_local() {
        let dir = tempdir().unwrap();
        let ctx = AppContext::open(Some(dir.path().to_path_buf()), None, Some("UTC".into())).unwrap();

        assert_eq!(ctx.book_name, DEFAULT_BOOK);
        assert_eq!(ctx.tz(), Tz::UTC);
        assert!(ctx.storage.paths().book_root.starts_with(dir.path()));
        let book = ctx.load_book().unwrap();
        assert!(book.bills.is_empty());
    }

    #[test]
    fn bad_zone_is_a_config_error() {
        let dir = tempdir().unwrap();
        let result = AppContext::open(Some(dir.path().to_path_buf()), None, Some("Nope/Zone".into()));
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}

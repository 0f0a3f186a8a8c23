//! Session facade used by the CLI: one book store, the active configuration,
//! a notifier and the logged-in user.
//!
//! The acting user is looked up again inside every transaction so role or
//! activation changes made elsewhere take effect immediately.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use rust_decimal::Decimal;
use tally_config::Config;
use tally_core::{
    storage::book_warnings,
    validate::{normalize_period, parse_category},
    AuditService, BookHandle, BookStore, CoreError, ExportOptions, LedgerService, LogNotifier,
    MemoryBookStore, NewUser, Notifier, ReportService, Reversal, TabularDocument, UserCreation,
    UserService,
};
use tally_domain::{
    Book, LedgerRecord, MovementFilter, MovementId, MovementLog, ProfileChanges, Role, RowOrder,
    SystemLog, TotalsStyle, User,
};
use tally_storage_json::{load_book_from_path, BackupInfo, JsonBookStore, StoragePaths};
use uuid::Uuid;

use crate::errors::Result;
use crate::export;

pub struct TallySession {
    handle: BookHandle,
    config: Config,
    notifier: Box<dyn Notifier>,
    current_user: Option<Uuid>,
    backups: Option<JsonBookStore>,
}

impl TallySession {
    pub fn new(store: Box<dyn BookStore>, config: Config, notifier: Box<dyn Notifier>) -> Self {
        Self {
            handle: BookHandle::new(store),
            config,
            notifier,
            current_user: None,
            backups: None,
        }
    }

    /// Opens the JSON book under the configured data root.
    pub fn open(config: Config) -> Result<Self> {
        let root = config.resolve_data_root();
        let store = JsonBookStore::with_retention(
            StoragePaths::under(&root),
            config.backup_retention,
        )?;
        tracing::debug!(book = %store.book_path().display(), "opening book");
        let mut session = Self::new(Box::new(store.clone()), config, Box::new(LogNotifier));
        session.backups = Some(store);
        Ok(session)
    }

    pub fn in_memory(config: Config) -> Self {
        Self::new(
            Box::new(MemoryBookStore::new()),
            config,
            Box::new(LogNotifier),
        )
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the active configuration. Storage settings apply on the next
    /// [`TallySession::open`].
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn handle(&self) -> &BookHandle {
        &self.handle
    }

    pub fn data_root(&self) -> PathBuf {
        self.config.resolve_data_root()
    }

    // Users and login.

    pub fn needs_bootstrap(&self) -> Result<bool> {
        Ok(self.handle.read(|book| book.users.is_empty())?)
    }

    /// Creates the first administrator and logs in as them.
    pub fn bootstrap(&mut self, username: &str, email: &str, password: &str) -> Result<User> {
        let user = self
            .handle
            .transact(|book| UserService::bootstrap_admin(book, username, email, password))?;
        self.current_user = Some(user.id);
        Ok(user)
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<User> {
        let user = self
            .handle
            .read(|book| UserService::authenticate(book, username, password))??;
        self.current_user = Some(user.id);
        tracing::info!(username = %user.username, "logged in");
        Ok(user)
    }

    pub fn logout(&mut self) {
        self.current_user = None;
    }

    pub fn current_user(&self) -> Result<User> {
        let id = self.current_user;
        Ok(self.handle.read(|book| actor(book, id).cloned())??)
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_user.is_some()
    }

    /// Creates a user, then sends the welcome notification once the change is
    /// saved. A failed notification only produces a warning.
    pub fn create_user(&self, new_user: NewUser) -> Result<UserCreation> {
        let id = self.current_user;
        let user = self.handle.transact(|book| {
            let actor = actor(book, id)?.clone();
            UserService::create_user(book, &actor, new_user)
        })?;
        let warning = UserService::welcome(self.notifier.as_ref(), &user);
        Ok(UserCreation { user, warning })
    }

    pub fn update_profile(&self, username: &str, changes: ProfileChanges) -> Result<User> {
        self.with_target(username, |book, actor, target| {
            UserService::update_profile(book, actor, target, changes)
        })
    }

    /// Changes the password of `username`, or of the logged-in user when
    /// `username` is `None`.
    pub fn change_password(
        &self,
        username: Option<&str>,
        current: Option<&str>,
        new_password: &str,
    ) -> Result<()> {
        let id = self.current_user;
        Ok(self.handle.transact(|book| {
            let actor = actor(book, id)?.clone();
            let target = match username {
                Some(name) => user_id_by_name(book, name)?,
                None => actor.id,
            };
            UserService::change_password(book, &actor, target, current, new_password)
        })?)
    }

    pub fn set_role(&self, username: &str, role: Role) -> Result<User> {
        self.with_target(username, |book, actor, target| {
            UserService::set_role(book, actor, target, role)
        })
    }

    pub fn deactivate(&self, username: &str) -> Result<User> {
        self.with_target(username, |book, actor, target| {
            UserService::deactivate(book, actor, target)
        })
    }

    pub fn users(&self) -> Result<Vec<User>> {
        Ok(self
            .handle
            .read(|book| UserService::list_users(book).into_iter().cloned().collect())?)
    }

    // Ledger.

    pub fn apply_delta(&self, period: &str, category: &str, amount: Decimal) -> Result<LedgerRecord> {
        let category = parse_category(category)?;
        let policy = self.config.net_income_policy;
        self.as_actor(|book, actor| {
            LedgerService::apply_delta(book, period, category, amount, actor, policy)
        })
    }

    pub fn set_field(&self, period: &str, category: &str, value: Decimal) -> Result<LedgerRecord> {
        let category = parse_category(category)?;
        let policy = self.config.net_income_policy;
        self.as_actor(|book, actor| {
            let id = LedgerService::record_by_period(book, period)?.id;
            LedgerService::set_field(book, id, category, value, actor, policy)
        })
    }

    pub fn set_notes(&self, period: &str, notes: Option<String>) -> Result<LedgerRecord> {
        self.as_actor(|book, actor| {
            let id = LedgerService::record_by_period(book, period)?.id;
            LedgerService::set_notes(book, id, notes, actor)
        })
    }

    pub fn delete_record(&self, period: &str) -> Result<LedgerRecord> {
        self.as_actor(|book, actor| {
            let id = LedgerService::record_by_period(book, period)?.id;
            LedgerService::delete_record(book, id, actor)
        })
    }

    pub fn reverse_movement(&self, movement_id: MovementId) -> Result<Reversal> {
        let policy = self.config.net_income_policy;
        self.as_actor(|book, actor| LedgerService::reverse_movement(book, movement_id, actor, policy))
    }

    pub fn record(&self, period: &str) -> Result<LedgerRecord> {
        Ok(self
            .handle
            .read(|book| LedgerService::record_by_period(book, period).cloned())??)
    }

    pub fn records(&self, order: RowOrder) -> Result<Vec<LedgerRecord>> {
        Ok(self.handle.read(|book| {
            LedgerService::list_records(book, order)
                .into_iter()
                .cloned()
                .collect()
        })?)
    }

    pub fn periods(&self) -> Result<Vec<String>> {
        Ok(self.handle.read(LedgerService::periods)?)
    }

    pub fn movements(&self, filter: &MovementFilter) -> Result<Vec<MovementLog>> {
        let filter = MovementFilter {
            period: filter
                .period
                .as_deref()
                .map(normalize_period)
                .transpose()?,
            kind: filter.kind,
        };
        Ok(self.handle.read(|book| {
            LedgerService::list_movements(book, &filter)
                .into_iter()
                .cloned()
                .collect()
        })?)
    }

    // Audit.

    pub fn system_log(&self) -> Result<Vec<SystemLog>> {
        let id = self.current_user;
        Ok(self.handle.read(|book| -> std::result::Result<Vec<SystemLog>, CoreError> {
            actor(book, id)?;
            Ok(AuditService::list_system_log(book)
                .into_iter()
                .cloned()
                .collect())
        })??)
    }

    pub fn delete_movement_log(&self, movement_id: MovementId) -> Result<MovementLog> {
        self.as_actor(|book, actor| AuditService::delete_movement_log(book, actor, movement_id))
    }

    pub fn clear_system_log(&self) -> Result<usize> {
        self.as_actor(AuditService::clear_system_log)
    }

    // Reports.

    /// Export options from the configured defaults.
    pub fn default_export_options(&self) -> ExportOptions {
        ExportOptions {
            range: self.config.export.range,
            order: self.config.export.order,
        }
    }

    pub fn export(&self, start: &str, end: &str, options: ExportOptions) -> Result<TabularDocument> {
        Ok(self
            .handle
            .read(|book| ReportService::export(book, start, end, options))??)
    }

    /// Writes a CSV export to `path` and returns the number of data rows.
    pub fn export_to_path(
        &self,
        start: &str,
        end: &str,
        path: &Path,
        options: ExportOptions,
        style: TotalsStyle,
    ) -> Result<usize> {
        let document = self.export(start, end, options)?;
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        export::write_csv(&document, file, style)?;
        tracing::info!(path = %path.display(), rows = document.rows.len(), "spreadsheet written");
        Ok(document.rows.len())
    }

    // Backups.

    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo> {
        self.current_user()?;
        Ok(self.json_store()?.backup(note)?)
    }

    pub fn backups(&self) -> Result<Vec<BackupInfo>> {
        Ok(self.json_store()?.list_backups()?)
    }

    /// Replaces the live book with a backup. Administrators only.
    pub fn restore_backup(&self, id: &str) -> Result<()> {
        let user = self.current_user()?;
        tally_core::validate::require_admin(&user)?;
        let store = self.json_store()?;
        let info = store.find_backup(id)?;
        self.handle.transact(|book| {
            *book = load_book_from_path(&info.path)?;
            book.log_system(
                Some((&user).into()),
                "restore_backup",
                format!("Restored book from backup {}", info.id),
            );
            Ok(())
        })?;
        Ok(())
    }

    fn json_store(&self) -> Result<&JsonBookStore> {
        self.backups.as_ref().ok_or_else(|| {
            CoreError::Storage("backups are only available for on-disk books".into()).into()
        })
    }

    /// Consistency findings for the stored book.
    pub fn warnings(&self) -> Result<Vec<String>> {
        Ok(self.handle.read(book_warnings)?)
    }

    fn as_actor<T>(
        &self,
        f: impl FnOnce(&mut Book, &User) -> std::result::Result<T, CoreError>,
    ) -> Result<T> {
        let id = self.current_user;
        Ok(self.handle.transact(|book| {
            let actor = actor(book, id)?.clone();
            f(book, &actor)
        })?)
    }

    fn with_target<T>(
        &self,
        username: &str,
        f: impl FnOnce(&mut Book, &User, Uuid) -> std::result::Result<T, CoreError>,
    ) -> Result<T> {
        self.as_actor(|book, actor| {
            let target = user_id_by_name(book, username)?;
            f(book, actor, target)
        })
    }
}

fn actor(book: &Book, id: Option<Uuid>) -> std::result::Result<&User, CoreError> {
    let id = id.ok_or_else(|| CoreError::PermissionDenied("not logged in".into()))?;
    book.user(id)
        .ok_or_else(|| CoreError::PermissionDenied("logged-in user no longer exists".into()))
}

fn user_id_by_name(book: &Book, username: &str) -> std::result::Result<Uuid, CoreError> {
    book.user_by_name(username)
        .map(|user| user.id)
        .ok_or_else(|| CoreError::NotFound(format!("user `{}`", username.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn session() -> TallySession {
        let mut session = TallySession::in_memory(Config::default());
        session
            .bootstrap("admin", "admin@example.com", "correct horse")
            .expect("bootstrap");
        session
    }

    #[test]
    fn mutations_require_login() {
        let mut session = session();
        session.logout();

        let err = session
            .apply_delta("Jan-25", "sanciones", dec!(10))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::TallyError::Core(CoreError::PermissionDenied(_))
        ));
        assert!(session.periods().expect("periods").is_empty());
    }

    #[test]
    fn unknown_category_is_rejected_before_touching_the_book() {
        let session = session();
        let err = session
            .apply_delta("Jan-25", "propinas", dec!(10))
            .unwrap_err();
        assert!(err.is_user_error());
        assert!(session.records(RowOrder::Insertion).expect("records").is_empty());
    }

    #[test]
    fn period_operations_resolve_by_label() {
        let session = session();
        session
            .apply_delta("Jan-25", "sanciones", dec!(40))
            .expect("add");
        let record = session
            .set_field("Jan-25", "sanciones", dec!(15))
            .expect("set");
        assert_eq!(record.sanctions, dec!(15));

        let noted = session
            .set_notes("Jan-25", Some("bank statement pending".into()))
            .expect("notes");
        assert_eq!(noted.notes.as_deref(), Some("bank statement pending"));

        session.delete_record("Jan-25").expect("delete");
        assert!(session.record("Jan-25").is_err());
    }
}

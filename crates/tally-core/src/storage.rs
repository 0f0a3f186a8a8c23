use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use tally_domain::Book;

use crate::CoreError;

/// Abstraction over persistence backends capable of storing a [`Book`].
pub trait BookStore: Send + Sync {
    fn load(&self) -> Result<Book, CoreError>;
    fn save(&self, book: &Book) -> Result<(), CoreError>;
}

/// Volatile store used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    book: Mutex<Book>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_book(book: Book) -> Self {
        Self {
            book: Mutex::new(book),
        }
    }
}

impl BookStore for MemoryBookStore {
    fn load(&self) -> Result<Book, CoreError> {
        Ok(lock(&self.book)?.clone())
    }

    fn save(&self, book: &Book) -> Result<(), CoreError> {
        *lock(&self.book)? = book.clone();
        Ok(())
    }
}

/// Serializes access to a [`BookStore`] and gives each call a fresh snapshot.
///
/// [`BookHandle::transact`] persists only when the closure succeeds, so a
/// failed operation never leaves partial changes behind. Nothing is cached
/// between calls.
pub struct BookHandle {
    store: Box<dyn BookStore>,
    gate: Mutex<()>,
}

impl BookHandle {
    pub fn new(store: Box<dyn BookStore>) -> Self {
        Self {
            store,
            gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &dyn BookStore {
        self.store.as_ref()
    }

    /// Loads the current book and hands it to `f` read-only.
    pub fn read<T>(&self, f: impl FnOnce(&Book) -> T) -> Result<T, CoreError> {
        let _guard = lock(&self.gate)?;
        let book = self.store.load()?;
        Ok(f(&book))
    }

    /// Loads, mutates and saves the book as one unit.
    pub fn transact<T>(
        &self,
        f: impl FnOnce(&mut Book) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let _guard = lock(&self.gate)?;
        let mut book = self.store.load()?;
        let value = f(&mut book)?;
        self.store.save(&book)?;
        tracing::debug!(records = book.records.len(), "book saved");
        Ok(value)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, CoreError> {
    mutex
        .lock()
        .map_err(|_| CoreError::Storage("book lock poisoned".into()))
}

/// Detects inconsistencies within a book snapshot.
pub fn book_warnings(book: &Book) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();

    for record in &book.records {
        if !seen.insert(record.period.as_str()) {
            warnings.push(format!("period {} appears more than once", record.period));
        }
        if !record.is_reconciled() {
            warnings.push(format!(
                "period {} has a stale reconciliation difference",
                record.period
            ));
        }
    }
    if !book.users.is_empty() && !book.users.iter().any(|user| user.is_admin()) {
        warnings.push("no active administrator".into());
    }
    warnings
}

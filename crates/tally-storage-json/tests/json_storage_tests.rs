use rust_decimal_macros::dec;
use tally_core::{BookHandle, BookStore, LedgerService, UserService};
use tally_domain::{Book, Category, NetIncomePolicy};
use tally_storage_json::{JsonBookStore, StoragePaths};
use tempfile::tempdir;

fn seeded_book() -> Book {
    let mut book = Book::new();
    let admin = UserService::bootstrap_admin(&mut book, "admin", "admin@example.com", "admin-pass")
        .expect("bootstrap");
    LedgerService::apply_delta(
        &mut book,
        "Jan-25",
        Category::Sanctions,
        dec!(100.00),
        &admin,
        NetIncomePolicy::Always,
    )
    .expect("apply delta");
    book
}

#[test]
fn missing_file_loads_as_empty_book() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonBookStore::new(StoragePaths::under(dir.path())).expect("create storage");

    let book = storage.load().expect("load");
    assert!(book.records.is_empty());
    assert!(!storage.book_path().exists());
}

#[test]
fn json_storage_can_save_and_load_book() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonBookStore::new(StoragePaths::under(dir.path())).expect("create storage");
    let book = seeded_book();

    storage.save(&book).expect("save book");
    let loaded = storage.load().expect("load book");

    assert_eq!(loaded, book);
    assert_eq!(loaded.records[0].sanctions, dec!(100.00));
    let raw = std::fs::read_to_string(storage.book_path()).expect("read file");
    assert!(raw.contains("\"sanctions\": \"100.00\""));
}

#[test]
fn overwrites_keep_a_backup_of_the_previous_file() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonBookStore::new(StoragePaths::under(dir.path())).expect("create storage");

    storage.save(&Book::new()).expect("first save");
    assert!(storage.list_backups().expect("list").is_empty());

    storage.save(&seeded_book()).expect("second save");
    let backups = storage.list_backups().expect("list");
    assert_eq!(backups.len(), 1);
    assert!(backups[0].created_at.is_some());
}

#[test]
fn json_storage_creates_and_restores_backups() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonBookStore::new(StoragePaths::under(dir.path())).expect("create storage");
    let original = seeded_book();
    storage.save(&original).expect("save");

    let info = storage.backup(Some("before cleanup")).expect("backup");
    assert!(info.id.ends_with("_before-cleanup.json"));
    assert!(storage.list_backups().unwrap().iter().any(|b| b.id == info.id));

    storage.save(&Book::new()).expect("overwrite");
    assert!(storage.load().unwrap().records.is_empty());

    let found = storage.find_backup(&info.id).expect("find backup");
    let restored = storage.restore_backup(&found).expect("restore");
    assert_eq!(restored.records.len(), 1);
    assert_eq!(storage.load().unwrap().records[0].period, "Jan-25");
}

#[test]
fn retention_limits_backup_count() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonBookStore::with_retention(StoragePaths::under(dir.path()), 2)
        .expect("create storage");
    storage.save(&Book::new()).expect("save");
    for note in ["one", "two", "three", "four"] {
        storage.backup(Some(note)).expect("backup");
    }
    assert_eq!(storage.list_backups().unwrap().len(), 2);
}

#[test]
fn handle_transactions_persist_to_disk() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonBookStore::new(StoragePaths::under(dir.path())).expect("create storage");
    storage.save(&seeded_book()).expect("seed");
    let handle = BookHandle::new(Box::new(storage.clone()));

    let admin = handle
        .read(|book| book.user_by_name("admin").cloned())
        .expect("read")
        .expect("admin exists");
    handle
        .transact(|book| {
            LedgerService::apply_delta(
                book,
                "Jan-25",
                Category::Sanctions,
                dec!(25.50),
                &admin,
                NetIncomePolicy::Always,
            )
        })
        .expect("transact");

    let reopened = JsonBookStore::new(StoragePaths::under(dir.path())).expect("reopen");
    let book = reopened.load().expect("load");
    assert_eq!(book.records[0].sanctions, dec!(125.50));
    assert_eq!(book.movements.len(), 2);
}

#[test]
fn newer_schema_versions_are_refused() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonBookStore::new(StoragePaths::under(dir.path())).expect("create storage");
    let mut book = Book::new();
    book.schema_version = 99;
    tally_storage_json::save_book_to_path(&book, storage.book_path()).expect("write");

    assert!(storage.load().is_err());
}

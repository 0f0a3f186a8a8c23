//! The persisted aggregate holding every record, log entry and user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    audit::{ActorRef, MovementId, MovementLog, SystemLog, SystemLogId},
    record::{LedgerRecord, RecordId},
    user::User,
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Everything a store persists. Vectors keep insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default = "Book::schema_version_default")]
    pub schema_version: u8,
    #[serde(default)]
    pub records: Vec<LedgerRecord>,
    #[serde(default)]
    pub movements: Vec<MovementLog>,
    #[serde(default)]
    pub system_log: Vec<SystemLog>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    next_record_id: u64,
    #[serde(default)]
    next_movement_id: u64,
    #[serde(default)]
    next_system_log_id: u64,
    pub updated_at: DateTime<Utc>,
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}

impl Book {
    pub fn new() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            records: Vec::new(),
            movements: Vec::new(),
            system_log: Vec::new(),
            users: Vec::new(),
            next_record_id: 1,
            next_movement_id: 1,
            next_system_log_id: 1,
            updated_at: Utc::now(),
        }
    }

    fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn record(&self, id: RecordId) -> Option<&LedgerRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn record_mut(&mut self, id: RecordId) -> Option<&mut LedgerRecord> {
        self.records.iter_mut().find(|record| record.id == id)
    }

    pub fn record_by_period(&self, period: &str) -> Option<&LedgerRecord> {
        self.records.iter().find(|record| record.period == period)
    }

    pub fn record_by_period_mut(&mut self, period: &str) -> Option<&mut LedgerRecord> {
        self.records.iter_mut().find(|record| record.period == period)
    }

    /// Appends a fresh zeroed record and returns its identifier.
    pub fn insert_record(&mut self, period: impl Into<String>) -> RecordId {
        let id = RecordId(self.bump_record_id());
        self.records.push(LedgerRecord::new(id, period));
        self.touch();
        id
    }

    pub fn remove_record(&mut self, id: RecordId) -> Option<LedgerRecord> {
        let index = self.records.iter().position(|record| record.id == id)?;
        self.touch();
        Some(self.records.remove(index))
    }

    pub fn movement(&self, id: MovementId) -> Option<&MovementLog> {
        self.movements.iter().find(|movement| movement.id == id)
    }

    pub fn next_movement_id(&mut self) -> MovementId {
        MovementId(self.bump_movement_id())
    }

    pub fn push_movement(&mut self, movement: MovementLog) {
        self.movements.push(movement);
        self.touch();
    }

    pub fn remove_movement(&mut self, id: MovementId) -> Option<MovementLog> {
        let index = self.movements.iter().position(|movement| movement.id == id)?;
        self.touch();
        Some(self.movements.remove(index))
    }

    /// Appends an administrative log entry stamped with the current time.
    pub fn log_system(
        &mut self,
        actor: Option<ActorRef>,
        action: impl Into<String>,
        detail: impl Into<String>,
    ) -> SystemLogId {
        let id = SystemLogId(self.bump_system_log_id());
        self.system_log.push(SystemLog {
            id,
            timestamp: Utc::now(),
            actor,
            action: action.into(),
            detail: detail.into(),
        });
        self.touch();
        id
    }

    pub fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|user| user.id == id)
    }

    pub fn user_by_name(&self, username: &str) -> Option<&User> {
        let needle = username.trim();
        self.users
            .iter()
            .find(|user| user.username.eq_ignore_ascii_case(needle))
    }

    pub fn add_user(&mut self, user: User) -> Uuid {
        let id = user.id;
        self.users.push(user);
        self.touch();
        id
    }

    // Counters loaded from older files may be zero or lag behind the data.
    fn bump_record_id(&mut self) -> u64 {
        let floor = self.records.iter().map(|r| r.id.0).max().unwrap_or(0) + 1;
        let id = self.next_record_id.max(floor);
        self.next_record_id = id + 1;
        id
    }

    fn bump_movement_id(&mut self) -> u64 {
        let floor = self.movements.iter().map(|m| m.id.0).max().unwrap_or(0) + 1;
        let id = self.next_movement_id.max(floor);
        self.next_movement_id = id + 1;
        id
    }

    fn bump_system_log_id(&mut self) -> u64 {
        let floor = self.system_log.iter().map(|s| s.id.0).max().unwrap_or(0) + 1;
        let id = self.next_system_log_id.max(floor);
        self.next_system_log_id = id + 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_follow_insertion_order() {
        let mut book = Book::new();
        let first = book.insert_record("Jan-25");
        let second = book.insert_record("Feb-25");
        assert!(first < second);
        assert_eq!(book.record_by_period("Feb-25").map(|r| r.id), Some(second));
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut book = Book::new();
        let first = book.insert_record("Jan-25");
        book.remove_record(first).expect("removed");
        let second = book.insert_record("Jan-25");
        assert_ne!(first, second);
    }

    #[test]
    fn empty_json_object_loads_as_empty_book() {
        let book: Book =
            serde_json::from_str(r#"{"updated_at":"2025-01-01T00:00:00Z"}"#).unwrap();
        assert!(book.records.is_empty());
        assert_eq!(book.schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn counters_recover_from_stale_values() {
        let mut book = Book::new();
        book.insert_record("Jan-25");
        let mut json = serde_json::to_value(&book).unwrap();
        json["next_record_id"] = serde_json::json!(0);
        let mut reloaded: Book = serde_json::from_value(json).unwrap();
        let id = reloaded.insert_record("Feb-25");
        assert_eq!(id, RecordId(2));
    }
}

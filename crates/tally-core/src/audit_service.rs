//! Read and prune the audit trails.

use tally_domain::{ActorRef, Book, MovementId, MovementLog, SystemLog, User};

use crate::{validate::require_admin, CoreError};

pub struct AuditService;

impl AuditService {
    /// System log, newest first.
    pub fn list_system_log(book: &Book) -> Vec<&SystemLog> {
        book.system_log.iter().rev().collect()
    }

    /// Removes a movement without touching the ledger; the removal itself is
    /// recorded in the system log.
    pub fn delete_movement_log(
        book: &mut Book,
        actor: &User,
        movement_id: MovementId,
    ) -> Result<MovementLog, CoreError> {
        require_admin(actor)?;
        let removed = book
            .remove_movement(movement_id)
            .ok_or_else(|| CoreError::NotFound(format!("movement {movement_id}")))?;
        book.log_system(
            Some(ActorRef::from(actor)),
            "delete_movement_log",
            format!(
                "Deleted {} movement {} for {}: {}",
                removed.kind, removed.id, removed.period, removed.detail
            ),
        );
        tracing::info!(movement = %movement_id, actor = %actor.username, "movement log entry deleted");
        Ok(removed)
    }

    /// Empties the system log, leaving a single entry that records the purge.
    pub fn clear_system_log(book: &mut Book, actor: &User) -> Result<usize, CoreError> {
        require_admin(actor)?;
        let removed = book.system_log.len();
        book.system_log.clear();
        book.log_system(
            Some(ActorRef::from(actor)),
            "clear_system_log",
            format!("Cleared {removed} system log entries"),
        );
        tracing::info!(removed, actor = %actor.username, "system log cleared");
        Ok(removed)
    }
}

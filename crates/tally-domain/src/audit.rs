//! Append-only audit trails for ledger movements and administrative actions.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{category::Category, user::User};

/// Snapshot of the user who performed an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRef {
    pub user_id: Uuid,
    pub username: String,
}

impl From<&User> for ActorRef {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
        }
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Add,
    Edit,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(pub u64);

impl fmt::Display for MovementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One add, edit or delete applied to a ledger record.
///
/// `period` is copied from the record so the entry survives the record's
/// deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementLog {
    pub id: MovementId,
    pub timestamp: DateTime<Utc>,
    pub kind: MovementKind,
    pub period: String,
    pub category: Option<Category>,
    pub amount: Option<Decimal>,
    pub actor: ActorRef,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemLogId(pub u64);

impl fmt::Display for SystemLogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Administrative actions: user management, reversals, log deletions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemLog {
    pub id: SystemLogId,
    pub timestamp: DateTime<Utc>,
    pub actor: Option<ActorRef>,
    pub action: String,
    pub detail: String,
}

/// Narrows a movement listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub period: Option<String>,
    pub kind: Option<MovementKind>,
}

impl MovementFilter {
    pub fn matches(&self, movement: &MovementLog) -> bool {
        if let Some(period) = &self.period {
            if movement.period != *period {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if movement.kind != kind {
                return false;
            }
        }
        true
    }
}

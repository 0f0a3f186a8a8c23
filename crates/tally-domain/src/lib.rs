//! tally-domain
//!
//! Pure domain models (LedgerRecord, Category, audit logs, users, Book).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod audit;
pub mod book;
pub mod category;
pub mod options;
pub mod period;
pub mod record;
pub mod user;

pub use audit::*;
pub use book::*;
pub use category::*;
pub use options::*;
pub use period::*;
pub use record::*;
pub use user::*;

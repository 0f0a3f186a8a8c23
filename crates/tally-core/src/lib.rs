//! tally-core
//!
//! Business rules for the income ledger: period mutations, audit trails,
//! reports and user administration. Depends on tally-domain. No CLI and no
//! direct filesystem access; persistence goes through [`storage::BookStore`].

pub mod audit_service;
pub mod error;
pub mod ledger_service;
pub mod notify;
pub mod password;
pub mod report_service;
pub mod storage;
pub mod user_service;
pub mod validate;

pub use audit_service::*;
pub use error::CoreError;
pub use ledger_service::*;
pub use notify::*;
pub use report_service::*;
pub use storage::{BookHandle, BookStore, MemoryBookStore};
pub use user_service::*;

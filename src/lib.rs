#![doc(test(attr(deny(warnings))))]

//! Tally keeps a monthly income ledger for a property administration: one
//! record per period across fourteen fixed categories, an audit trail of
//! every movement, users with roles, and range exports to spreadsheets.

pub mod cli;
pub mod errors;
pub mod export;
pub mod session;
pub mod utils;

pub use errors::{CliError, TallyError};
pub use session::TallySession;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Tally tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}

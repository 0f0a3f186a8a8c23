pub mod build_info;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVES: &str = "tally=info,tally_core=info";

/// Installs the global tracing subscriber. Events go to stderr.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = env_filter(std::env::var("RUST_LOG").ok().as_deref());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// `RUST_LOG` when it is set and valid, otherwise the crate defaults.
fn env_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_overrides_the_defaults() {
        let filter = env_filter(Some("tally=debug")).to_string();
        assert!(filter.contains("tally=debug"));
        assert!(!filter.contains("tally=info"));
    }

    #[test]
    fn defaults_apply_without_rust_log() {
        let filter = env_filter(None).to_string();
        assert!(filter.contains("tally=info"));
        assert!(filter.contains("tally_core=info"));
    }
}

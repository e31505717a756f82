//! tracing subscriber bootstrap for binaries and integration harnesses embedding the crate.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to `info`.
/// Returns false when a global subscriber was already set.
pub fn init() -> bool { init_with_default("info") }

pub fn init_with_default(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = fmt().with_env_filter(filter).try_init().is_ok();
    if installed {
        let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
        tracing::info!(target: "sikerma", "logging initialised: RUST_LOG='{}'", rust_log);
    }
    installed
}

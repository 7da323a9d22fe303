//! Opt-in tracing output for debugging the compiler itself.
//!
//! ```bash
//! BISH_LOG=debug bish script.bish
//! BISH_LOG="bish::lower=trace,bish::codegen=debug" bish script.bish
//! ```
//!
//! The subscriber is only installed when `BISH_LOG` (or `RUST_LOG`) is set.

use tracing_subscriber::EnvFilter;

/// Build an `EnvFilter` from `BISH_LOG`, falling back to `RUST_LOG`.
fn build_filter() -> EnvFilter {
    match std::env::var("BISH_LOG") {
        Ok(val) => EnvFilter::builder().parse_lossy(val),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Install the global subscriber. All output goes to stderr so generated
/// scripts on stdout stay clean.
pub fn init_tracing() {
    let requested = std::env::var_os("BISH_LOG").is_some() || std::env::var_os("RUST_LOG").is_some();
    if !requested {
        return;
    }

    // A subscriber installed by an embedding program wins.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

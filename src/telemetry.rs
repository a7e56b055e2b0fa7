//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "mixforge=info,mf_av=info,mf_core=info";

/// Install a formatting subscriber filtered by `RUST_LOG`, or by
/// `default_filter` when the variable is unset or unparsable.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Fails only when a global subscriber is already set.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "savings_calculator=info,website=info,tower_http=info";

/// Initialize logging
///
/// The filter comes from `RUST_LOG` when set, e.g.
/// `RUST_LOG=savings_calculator=debug`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt().with_env_filter(filter).with_target(true).init();
}

/// Initialize logging for the CLI: warnings only unless `RUST_LOG` says
/// otherwise, written to stderr so tables on stdout stay clean
pub fn init_cli() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

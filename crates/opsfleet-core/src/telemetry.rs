use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber with `RUST_LOG` env-filter
/// support, defaulting to `info`. Later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

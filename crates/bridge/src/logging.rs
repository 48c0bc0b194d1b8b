use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. Later calls are no-ops.
///
/// `RUST_LOG` overrides the default filter.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,vdm=debug")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

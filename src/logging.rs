use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber on stderr. `RUST_LOG` wins over `default_directive`.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

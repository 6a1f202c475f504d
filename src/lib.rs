pub mod align;
pub mod bounds;
pub mod cli;
pub mod component;
pub mod consolidate;
pub mod error;
pub mod pipeline;
pub mod plan;
pub mod trace;

/// Install the global `tracing` subscriber. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli::config::log_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

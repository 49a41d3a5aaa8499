//! CLI entry point for the scraper.

use crimedata_scraper::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    // Page progress is logged at INFO, so that is the default; RUST_LOG overrides.
    // Logs go to stderr so stdout carries only the spinner and the summary.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

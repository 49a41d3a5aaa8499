//! Command-line interface for the scraper.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::config::{load_config, DEFAULT_CONFIG_FILE};
use crate::crime::fetch_felonies_with_progress;
use crate::error::Result;
use crate::http::{create_client, SocrataClient};
use crate::output::write_csv;

/// Fetch felony crime records from a Socrata portal into CSV.
#[derive(Parser)]
#[command(name = "fetch-crime-data")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    fetch_command(&cli.config)?;
    Ok(())
}

/// Fetch the current-year felony dataset and write it as CSV.
///
/// Returns the path of the written file.
pub fn fetch_command(config_path: &Path) -> Result<PathBuf> {
    let config = load_config(config_path)?;

    let raw_data_path = config.raw_data_path();
    if !raw_data_path.exists() {
        fs::create_dir_all(&raw_data_path)?;
        tracing::info!(path = %raw_data_path.display(), "Created output directory");
    }

    let dataset = config.current_year_dataset();
    println!(
        "{} felonies from {}",
        style("Fetching").bold(),
        style(&dataset).cyan()
    );

    let http = create_client(config.retrieval.timeout())?;
    let client = SocrataClient::new(http, dataset)?;

    // Log events go to stderr, the spinner shares stdout with the summary
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stdout());
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Requesting first page...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let fetched = fetch_felonies_with_progress(
        &client,
        &config.retrieval.options(),
        |page, total| {
            pb.set_message(format!(
                "Fetched {total} records (offset {})...",
                page.offset
            ));
        },
    );
    let (records, stats) = match fetched {
        Ok(fetched) => fetched,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.finish_and_clear();

    println!(
        "  Time to execute: {:.2} seconds",
        stats.elapsed.as_secs_f64()
    );
    println!(
        "  Query summary: {} rows and {} columns",
        style(stats.rows).green(),
        style(stats.columns).green()
    );

    let output_path = config.current_year_output_path();
    write_csv(&records, &output_path)?;

    println!(
        "{} {}",
        style("Saved to:").green().bold(),
        output_path.display()
    );

    Ok(output_path)
}

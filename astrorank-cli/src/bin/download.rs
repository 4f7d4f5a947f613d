use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use astrorank_cli::download::{self, DEFAULT_OUTPUT_DIR, DEFAULT_PREFIX};
use astrorank_core::logging;
use astrorank_core::secondary::HttpRasterSource;

/// Download Legacy Survey g, r, z cutouts for CSV sources and write RGB JPEGs
#[derive(Debug, Parser)]
#[command(name = "astrorank-download", version, about)]
struct Args {
    /// CSV file with RA/Dec columns (first row is a header)
    csv_file: PathBuf,

    /// Directory for the generated JPEGs
    #[arg(default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Prefix for output file names
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// Column 0 holds a source name; RA/Dec are columns 1 and 2
    #[arg(long)]
    skip_first_column: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let _logging_guard = logging::init_logging("logs", "astrorank-download", &args.log_level)?;

    if !args.csv_file.exists() {
        anyhow::bail!("CSV file not found: {:?}", args.csv_file);
    }

    let sources = download::read_sources(&args.csv_file, args.skip_first_column)?;
    let client = HttpRasterSource::new(Duration::from_secs(args.timeout))?;
    let summary =
        download::process_sources(&client, &sources.rows, &args.output_dir, &args.prefix).await?;

    tracing::info!(
        "Done: {} written, {} failed, {} rows skipped",
        summary.written,
        summary.failed,
        sources.skipped
    );
    Ok(())
}

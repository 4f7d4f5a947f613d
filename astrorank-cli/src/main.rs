use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use astrorank_cli::console::{self, Console};
use astrorank_core::config::{AppConfig, DEFAULT_CONFIG_FILE};
use astrorank_core::keys::KeyBindings;
use astrorank_core::logging;
use astrorank_core::secondary::{HttpRasterSource, SecondaryManager};
use astrorank_core::session::Session;

/// Rank a directory of astronomical image cutouts
#[derive(Debug, Parser)]
#[command(name = "astrorank", version, about)]
struct Args {
    /// Directory containing .jpg images to rank
    image_directory: PathBuf,

    /// Output file for rankings
    #[arg(short, long, default_value = "rankings.txt")]
    output: PathBuf,

    /// Configuration file (TOML, or JSON with a .json extension)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Start at the first unranked image
    #[arg(long)]
    resume: bool,
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
    let config = AppConfig::load_or_default(&args.config);
    let _logging_guard = logging::init_logging(&config.log_dir, "astrorank", &config.log_level)?;

    tracing::info!("astrorank starting on {:?}", args.image_directory);

    let mut session = Session::open(
        &args.image_directory,
        &args.output,
        config.rank_scale(),
        config.save_every(),
    )
    .inspect_err(|e| tracing::error!("{}", e))
    .with_context(|| format!("Cannot review {:?}", args.image_directory))?;
    if args.resume {
        session.resume();
    }

    let bindings = KeyBindings::new(session.scale(), &config.keys);

    let source = HttpRasterSource::new(Duration::from_secs(
        config.secondary_download.timeout_secs,
    ))?;
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let manager = SecondaryManager::new(
        &config,
        &args.image_directory,
        Arc::new(source),
        events_tx,
    );

    let console = Console::new(session, bindings, manager, config, std::io::stdout())
        .with_browser_launch(true);
    console::run(console, events_rx).await?;

    tracing::info!("astrorank finished");
    Ok(())
}

//! # fanclub_radio
//!
//! Keeps a markdown checklist of the radio episodes published on a
//! members-only fan club site.
//!
//! ## Usage
//!
//! ```sh
//! fanclub_radio login
//! fanclub_radio fetch | fanclub_radio merge episodes.md --replace
//! ```
//!
//! ## Architecture
//!
//! 1. **Listing**: walk the paginated listing and extract episode entries
//! 2. **Resolution**: follow each entry's detail page to its streaming page
//!    (10 at a time, cached on disk)
//! 3. **Rendering**: print one checklist line per episode, newest first
//! 4. **Merging**: carry `[x]` marks from the local checklist onto a fresh list

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod fetcher;
mod merger;
mod models;
mod outputs;
mod session;

use cli::{Cli, Command};
use config::Config;
use fetcher::cache::Cache;
use outputs::markdown;
use session::Session;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init (stderr; stdout carries the checklist) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[instrument(level = "info", skip_all)]
async fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    debug!(?args.command, origin = %config.origin, "Parsed CLI arguments");

    match args.command {
        Command::Login => {
            println!("Starting login process...");
            let session = Session::new(&config)?;
            session.ensure_authenticated().await?;
            println!("Login successful!");
        }
        Command::Fetch { ignore_cache, .. } => {
            let session = Session::new(&config)?;
            session.ensure_authenticated().await?;

            let cache = Cache::new(&config.cache_dir);
            let episodes =
                fetcher::fetch_episodes(&session, &config, &cache, ignore_cache).await?;
            print!("{}", markdown::render_sorted(&episodes, config.sort_key));
        }
        Command::Merge { file: path, replace } => {
            let fresh = merger::read_stdin().await?;
            let output = merger::merge_into(&path, replace, &fresh).await?;
            if !replace {
                print!("{output}");
            }
        }
        Command::Version => {
            println!("fanclub_radio version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, "Execution complete");
    Ok(())
}

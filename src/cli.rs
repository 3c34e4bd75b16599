//! Command-line interface definitions.
//!
//! Global options may also come from environment variables; subcommand
//! flags override whatever the configuration file says.

use crate::config::{Config, SortKey, YearMode};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Track fan club radio episodes as a markdown checklist.
///
/// # Examples
///
/// ```sh
/// # Store a session cookie
/// fanclub_radio login
///
/// # Fetch the current listing, bypassing cached streaming links
/// fanclub_radio fetch --ignore-cache > fresh.md
///
/// # Carry listened marks from episodes.md over to the fresh list
/// fanclub_radio fetch | fanclub_radio merge episodes.md --replace
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, global = true, env = "FANCLUB_RADIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for cached streaming links
    #[arg(long, global = true, env = "FANCLUB_RADIO_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in to the fan club site and store the session cookies
    Login,

    /// Fetch all episodes and print them as a markdown checklist
    Fetch {
        /// Re-resolve every streaming link instead of using the cache
        #[arg(long)]
        ignore_cache: bool,

        /// Ordering of the printed list (most recent first)
        #[arg(long, value_enum)]
        sort: Option<SortKey>,

        /// Use the current year for dates the page does not date
        #[arg(long)]
        current_year: bool,
    },

    /// Merge fetched episodes from stdin with the listened marks in FILE
    Merge {
        /// Local checklist holding the listened marks
        file: PathBuf,

        /// Rewrite FILE with the merged list instead of printing it
        #[arg(short, long)]
        replace: bool,
    },

    /// Print the version number
    Version,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Command::Fetch {
            sort, current_year, ..
        } = &self.command
        {
            if let Some(sort) = sort {
                config.sort_key = *sort;
            }
            if *current_year {
                config.year_mode = YearMode::CurrentYear;
            }
        }
    }
}

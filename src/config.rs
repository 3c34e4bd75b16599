//! Runtime configuration.
//!
//! A single [`Config`] is built in `main` from defaults, an optional YAML
//! file and CLI overrides, then handed by reference to every component that
//! talks to the site or the disk.

use crate::error::{Error, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

const COOKIE_FILE_NAME: &str = ".fanclub_radio_cookies";

/// How to fill in the year of a listing date that carries only month/day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum YearMode {
    /// Leave the year unset unless the page states one.
    #[default]
    Placeholder,
    /// Fall back to the current local year.
    CurrentYear,
}

/// Ordering key for rendered output (always descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Number,
    Date,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scheme and host of the fan club site, without trailing slash.
    pub origin: String,
    /// Listing page path; `{page}` is replaced with the 1-based page number.
    pub listing_path: String,
    /// Episode detail path; `{contents_id}` and `{id}` are substituted.
    pub episode_path: String,
    pub login_path: String,
    /// Token a text node must contain to be considered an episode entry.
    pub marker: String,
    /// Exact anchor text on the detail page that links to the stream.
    pub streaming_caption: String,
    pub user_agent: String,
    pub cache_dir: PathBuf,
    pub cookie_file: PathBuf,
    pub max_pages: usize,
    pub max_concurrency: usize,
    pub empty_page_limit: usize,
    pub request_timeout_secs: u64,
    pub year_mode: YearMode,
    pub sort_key: SortKey,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: "https://kitoakari-fc.com".to_string(),
            listing_path: "/special_contents/?category_id=4&page={page}".to_string(),
            episode_path: "/special_contents/?contents_id={contents_id}&id={id}".to_string(),
            login_path: "/slogin.php".to_string(),
            marker: "STREAMING".to_string(),
            streaming_caption: "配信ページはこちら".to_string(),
            user_agent: concat!("fanclub_radio/", env!("CARGO_PKG_VERSION")).to_string(),
            cache_dir: PathBuf::from(".fanclub-radio-cache"),
            cookie_file: default_cookie_file(),
            max_pages: 100,
            max_concurrency: 10,
            empty_page_limit: 3,
            request_timeout_secs: 30,
            year_mode: YearMode::default(),
            sort_key: SortKey::default(),
        }
    }
}

impl Config {
    /// Load defaults, overlaid with the YAML file at `path` when given.
    ///
    /// Keys missing from the file keep their default value.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Config = serde_yaml::from_str(&raw).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(origin = %config.origin, "Loaded configuration file");
        Ok(config)
    }

    pub fn listing_url(&self, page: usize) -> String {
        let path = self.listing_path.replace("{page}", &page.to_string());
        format!("{}{}", self.origin, path)
    }

    pub fn episode_url(&self, contents_id: &str, id: &str) -> String {
        let path = self
            .episode_path
            .replace("{contents_id}", contents_id)
            .replace("{id}", id);
        format!("{}{}", self.origin, path)
    }

    pub fn login_url(&self) -> String {
        format!("{}{}", self.origin, self.login_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_cookie_file() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => Path::new(&home).join(COOKIE_FILE_NAME),
        None => PathBuf::from(COOKIE_FILE_NAME),
    }
}

//! Error type shared by the fetch, merge and login paths.
//!
//! Only whole-operation failures live here: a listing page that cannot be
//! fetched, a missing local file, a rejected login. Per-item misses (an
//! unresolved URL, a line that does not parse, a cache entry that cannot be
//! read) are handled where they happen and never reach the caller as an
//! [`Error`].

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection, TLS, timeout or body-read failure for a single request.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered, but not with `200 OK`.
    #[error("unexpected status code {status} from {url}")]
    Status { url: String, status: u16 },

    /// A listing page failed; aborts the whole walk.
    #[error("failed to fetch page {page}: {source}")]
    Page {
        page: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("local file not found: {}", .0.display())]
    LocalFileMissing(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid episode line: {0}")]
    MalformedLine(String),

    #[error("authentication failed - please check your credentials")]
    AuthenticationFailed,

    #[error("failed to read credentials: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("invalid configuration in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid URL {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to encode session cookies: {0}")]
    Cookies(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

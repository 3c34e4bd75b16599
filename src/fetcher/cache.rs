//! Content-addressed cache of resolved streaming URLs.
//!
//! Each entry is a tiny JSON file named after the SHA-256 of the provisional
//! URL. The cache is an optimization only: every failure here degrades to a
//! miss or a skipped write, and is never reported to the caller.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, instrument};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    url: String,
}

#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    /// The directory is created on first write, not here.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn entry_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.root.join(format!("{}.json", hex::encode(digest)))
    }

    /// Previously stored resolution for `url`, if any can be read.
    #[instrument(level = "debug", skip(self))]
    pub async fn lookup(&self, url: &str) -> Option<String> {
        let path = self.entry_path(url);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) => {
                debug!(error = %e, "Cache miss");
                return None;
            }
        };
        match serde_json::from_slice::<CacheEntry>(&data) {
            Ok(entry) => Some(entry.url),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Unreadable cache entry");
                None
            }
        }
    }

    /// Best-effort write; errors are logged at debug and dropped.
    #[instrument(level = "debug", skip(self))]
    pub async fn store(&self, url: &str, resolved: &str) {
        if let Err(e) = fs::create_dir_all(&self.root).await {
            debug!(root = %self.root.display(), error = %e, "Cannot create cache directory");
            return;
        }
        let entry = CacheEntry {
            url: resolved.to_string(),
        };
        let data = match serde_json::to_vec(&entry) {
            Ok(data) => data,
            Err(e) => {
                debug!(error = %e, "Cannot encode cache entry");
                return;
            }
        };
        let path = self.entry_path(url);
        if let Err(e) = fs::write(&path, data).await {
            debug!(path = %path.display(), error = %e, "Cannot write cache entry");
        }
    }
}

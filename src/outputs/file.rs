//! Rewriting the local checklist in place.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

/// Replace `path` with `contents`.
///
/// The data is written and synced to a sibling temp file first and then
/// renamed over the target, so a failed write never truncates the user's list.
#[instrument(level = "info", skip(contents), fields(bytes = contents.len()))]
pub async fn replace_file(path: &Path, contents: &str) -> Result<()> {
    let tmp = temp_sibling(path);
    {
        let mut file = fs::File::create(&tmp)
            .await
            .map_err(|e| Error::io(&tmp, e))?;
        file.write_all(contents.as_bytes())
            .await
            .map_err(|e| Error::io(&tmp, e))?;
        file.sync_all().await.map_err(|e| Error::io(&tmp, e))?;
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(Error::io(path, e));
    }
    info!(path = %path.display(), "Rewrote local episode list");
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "episodes".into());
    name.push(".tmp");
    path.with_file_name(name)
}

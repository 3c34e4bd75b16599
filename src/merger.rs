//! Reading persisted episode lists and carrying listened flags forward.
//!
//! The persisted format is the one produced by [`Episode`]'s `Display`:
//!
//! ```text
//! [x] 05/28 [#37](https://kitoakari-fc.com/special_contents/?contents_id=1&id=54)
//! [ ] 06/11 [#38]
//! ```
//!
//! Users edit these files by hand, so a line that does not parse is skipped
//! rather than failing the whole read.

use crate::error::{Error, Result};
use crate::models::{Episode, EpisodeDate};
use crate::outputs::{file, markdown};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[ xX]\]\s+(\d{2})/(\d{2})").expect("valid date regex"));
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(#\d+)\]").expect("valid number regex"));
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((https?://.+)\)$").expect("valid url regex"));

/// Parse one persisted line.
///
/// Blank lines yield `Ok(None)`; lines without a date or episode number are
/// [`Error::MalformedLine`].
pub fn parse_line(line: &str) -> Result<Option<Episode>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let listened = line.starts_with("[x]") || line.starts_with("[X]");

    let malformed = || Error::MalformedLine(line.to_string());
    let date = DATE_RE.captures(line).ok_or_else(malformed)?;
    let month = date[1].parse().map_err(|_| malformed())?;
    let day = date[2].parse().map_err(|_| malformed())?;
    let number = NUMBER_RE.captures(line).ok_or_else(malformed)?;
    let url = URL_RE
        .captures(line)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();

    Ok(Some(Episode {
        number: number[1].to_string(),
        date: EpisodeDate {
            year: None,
            month,
            day,
        },
        url,
        listened,
    }))
}

/// Every parseable episode in `text`, in line order.
pub fn parse_episodes(text: &str) -> Vec<Episode> {
    text.lines()
        .filter_map(|line| match parse_line(line) {
            Ok(episode) => episode,
            Err(e) => {
                debug!(error = %e, "Skipping line");
                None
            }
        })
        .collect()
}

/// Read a persisted list; a missing file is [`Error::LocalFileMissing`].
#[instrument(level = "info")]
pub async fn read_episodes_from_file(path: &Path) -> Result<Vec<Episode>> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::LocalFileMissing(path.to_path_buf())
        } else {
            Error::io(path, e)
        }
    })?;
    Ok(parse_episodes(&text))
}

/// Everything piped on stdin, typically the output of `fetch`.
pub async fn read_stdin() -> Result<String> {
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .map_err(|e| Error::io("<stdin>", e))?;
    Ok(text)
}

/// Merge `fresh_text` into the checklist at `path` and return the rendered
/// result.
///
/// Without `replace` the file must exist and is left untouched. With
/// `replace` a missing file counts as an empty list and the result is
/// written back in place.
#[instrument(level = "info", skip(fresh_text))]
pub async fn merge_into(path: &Path, replace: bool, fresh_text: &str) -> Result<String> {
    let fresh = parse_episodes(fresh_text);
    let local = match read_episodes_from_file(path).await {
        Ok(local) => local,
        Err(Error::LocalFileMissing(_)) if replace => Vec::new(),
        Err(e) => return Err(e),
    };

    let output = markdown::render(&merge(&fresh, &local));
    if replace {
        file::replace_file(path, &output).await?;
    }
    Ok(output)
}

/// Reconcile a fresh fetch with the local list.
///
/// The output is exactly `fresh`, in its order, with `listened` set for every
/// episode number marked listened in `local`. Local-only episodes are dropped.
pub fn merge(fresh: &[Episode], local: &[Episode]) -> Vec<Episode> {
    let listened: HashSet<&str> = local
        .iter()
        .filter(|ep| ep.listened)
        .map(|ep| ep.number.as_str())
        .collect();

    let dropped = local
        .iter()
        .filter(|ep| ep.listened && !fresh.iter().any(|f| f.number == ep.number))
        .count();
    if dropped > 0 {
        debug!(dropped, "Listened episodes missing from the fresh list");
    }

    fresh
        .iter()
        .map(|ep| Episode {
            listened: ep.listened || listened.contains(ep.number.as_str()),
            ..ep.clone()
        })
        .collect()
}

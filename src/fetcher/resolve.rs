//! Resolution of provisional detail links to streaming-page URLs.
//!
//! Each episode detail page carries one anchor with a fixed caption that
//! points at the actual streaming page. [`Resolver::resolve`] follows a single
//! link (through the [`Cache`]); [`Resolver::resolve_all`] fans out over a
//! batch with a bounded number of requests in flight and writes the results
//! back by index once every resolution has finished.

use super::cache::Cache;
use crate::config::Config;
use crate::error::Result;
use crate::models::Episode;
use crate::session::HttpGet;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

static ANCHOR_WITH_HREF: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// `href` of the first anchor whose trimmed text equals `caption`.
pub fn find_streaming_link(body: &str, caption: &str) -> Option<String> {
    let document = Html::parse_document(body);
    document
        .select(&ANCHOR_WITH_HREF)
        .find(|a| a.text().collect::<String>().trim() == caption)
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

/// Make `href` absolute against the site origin.
pub fn absolutize(origin: &str, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}/{}", origin, href)
    }
}

pub struct Resolver<'a, H> {
    http: &'a H,
    config: &'a Config,
    cache: &'a Cache,
    ignore_cache: bool,
}

impl<'a, H: HttpGet> Resolver<'a, H> {
    pub fn new(http: &'a H, config: &'a Config, cache: &'a Cache) -> Self {
        Self {
            http,
            config,
            cache,
            ignore_cache: false,
        }
    }

    /// Skip cache lookups. Successful resolutions are still written back.
    pub fn ignore_cache(mut self, ignore: bool) -> Self {
        self.ignore_cache = ignore;
        self
    }

    /// Streaming URL for one provisional link; empty when the detail page
    /// has no streaming anchor yet.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self, url: &str) -> Result<String> {
        if !self.ignore_cache {
            if let Some(hit) = self.cache.lookup(url).await {
                debug!(resolved = %hit, "Cache hit");
                return Ok(hit);
            }
        }

        let body = self.http.get(url).await?.into_ok_body(url)?;
        let resolved = find_streaming_link(&body, &self.config.streaming_caption)
            .map(|href| absolutize(&self.config.origin, &href))
            .unwrap_or_default();

        if resolved.is_empty() {
            debug!("No streaming link on detail page");
        } else {
            self.cache.store(url, &resolved).await;
        }
        Ok(resolved)
    }

    /// Resolve every episode that has a provisional URL.
    ///
    /// A failed or empty resolution leaves that episode's URL untouched.
    #[instrument(level = "info", skip_all, fields(count = episodes.len()))]
    pub async fn resolve_all(&self, episodes: &mut [Episode]) {
        let work: Vec<(usize, String)> = episodes
            .iter()
            .enumerate()
            .filter(|(_, ep)| !ep.url.is_empty())
            .map(|(i, ep)| (i, ep.url.clone()))
            .collect();
        let total = work.len();

        let results: Vec<(usize, Result<String>)> = stream::iter(work)
            .map(|(i, url)| async move { (i, self.resolve(&url).await) })
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut resolved = 0usize;
        for (i, result) in results {
            match result {
                Ok(url) if !url.is_empty() => {
                    episodes[i].url = url;
                    resolved += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(episode = %episodes[i].number, error = %e, "Resolution failed; keeping provisional URL");
                }
            }
        }
        info!(total, resolved, "Resolved streaming URLs");
    }
}

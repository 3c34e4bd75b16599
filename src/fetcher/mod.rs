//! The fetch pipeline: walk the listing, extract episodes, resolve links.
//!
//! # Stages
//!
//! | Stage | Module | Concurrency |
//! |-------|--------|-------------|
//! | Listing traversal | [`pagination`] | sequential, one page at a time |
//! | Field extraction | [`extract`] | per page, synchronous |
//! | Link resolution | [`resolve`] | bounded fan-out, joined before returning |
//! | Resolution cache | [`cache`] | shared by all resolutions, keyed by URL digest |
//!
//! A failed listing page aborts the whole fetch. A failed detail page only
//! leaves that one episode with its provisional URL.

pub mod cache;
pub mod extract;
pub mod pagination;
pub mod resolve;

use crate::config::Config;
use crate::error::Result;
use crate::models::Episode;
use crate::session::HttpGet;
use cache::Cache;
use resolve::Resolver;
use tracing::instrument;

/// Collect every listed episode and resolve its streaming URL.
#[instrument(level = "info", skip(http, config, cache))]
pub async fn fetch_episodes<H: HttpGet>(
    http: &H,
    config: &Config,
    cache: &Cache,
    ignore_cache: bool,
) -> Result<Vec<Episode>> {
    let mut episodes = pagination::fetch_all_pages(http, config).await?;
    Resolver::new(http, config, cache)
        .ignore_cache(ignore_cache)
        .resolve_all(&mut episodes)
        .await;
    Ok(episodes)
}

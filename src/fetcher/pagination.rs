//! Page-by-page traversal of the episode listing.
//!
//! Pages are fetched strictly one after another, since whether to ask for
//! page N+1 depends on what page N contained. The site's pagination controls
//! vary, so their absence is only a hint: the walk ends on a run of empty
//! pages, on an empty page with no "next" control, or at the page ceiling.

use super::extract::extract_episodes;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::Episode;
use crate::session::HttpGet;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};

static NEXT_CONTROLS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [".pagination .next", "a[rel='next']", ".pager .next"]
        .iter()
        .map(|s| Selector::parse(s).expect("valid selector"))
        .collect()
});
static PAGE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".page-link").expect("valid selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid selector"));
static PAGE_TWO_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href*='page=2']").expect("valid selector"));

const NEXT_LABELS: [&str; 2] = ["次へ", "Next"];

/// What one listing page yielded.
#[derive(Debug, Default)]
pub struct PageResult {
    pub episodes: Vec<Episode>,
    /// The page shows some form of "next page" control.
    pub has_more: bool,
}

/// Whether the page advertises a following page.
pub fn has_next_page(document: &Html, page: usize) -> bool {
    if NEXT_CONTROLS
        .iter()
        .any(|selector| document.select(selector).next().is_some())
    {
        return true;
    }

    let text_of = |el: scraper::ElementRef<'_>| el.text().collect::<String>();
    if document
        .select(&PAGE_LINK)
        .any(|el| text_of(el).contains('>'))
    {
        return true;
    }
    if document
        .select(&ANCHOR)
        .any(|el| NEXT_LABELS.iter().any(|label| text_of(el).contains(label)))
    {
        return true;
    }

    page == 1 && document.select(&PAGE_TWO_LINK).next().is_some()
}

/// Fetch and extract a single listing page.
#[instrument(level = "info", skip(http, config))]
pub async fn fetch_page<H: HttpGet>(http: &H, config: &Config, page: usize) -> Result<PageResult> {
    let url = config.listing_url(page);
    let body = http.get(&url).await?.into_ok_body(&url)?;

    let document = Html::parse_document(&body);
    let episodes = extract_episodes(&document, config);
    let has_more = has_next_page(&document, page);
    debug!(count = episodes.len(), has_more, "Parsed listing page");

    Ok(PageResult { episodes, has_more })
}

/// Walk the listing from page 1 and collect every episode found.
///
/// A failed page aborts the walk with [`Error::Page`].
#[instrument(level = "info", skip_all)]
pub async fn fetch_all_pages<H: HttpGet>(http: &H, config: &Config) -> Result<Vec<Episode>> {
    let mut all = Vec::new();
    let mut empty_streak = 0usize;

    for page in 1..=config.max_pages {
        let PageResult { episodes, has_more } = fetch_page(http, config, page)
            .await
            .map_err(|e| Error::Page {
                page,
                source: Box::new(e),
            })?;

        if episodes.is_empty() {
            empty_streak += 1;
            if empty_streak >= config.empty_page_limit {
                debug!(page, empty_streak, "Too many empty pages in a row");
                break;
            }
            if !has_more {
                debug!(page, "Empty page without a next control");
                break;
            }
        } else {
            empty_streak = 0;
            all.extend(episodes);
        }
    }

    info!(count = all.len(), "Collected episodes from listing");
    Ok(all)
}

//! Episode extraction from a listing page.
//!
//! The listing has no stable structure, so every element whose text carries
//! the configured marker token is treated as a candidate. Independent
//! matchers pull the episode number, the broadcast date and the detail link
//! out of that text; a candidate survives only if it has both a number and a
//! link. Ancestors of an entry repeat its text, so candidates are
//! de-duplicated on `(number, date)` in document order.

use crate::config::{Config, YearMode};
use crate::models::{Episode, EpisodeDate};
use chrono::{Datelike, Local};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\d+").expect("valid number regex"));
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})\([^)]+\)").expect("valid date regex"));
static LINK_IDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"contents_id=(\d+)&id=(\d+)").expect("valid link regex"));
static PAGE_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})\.\d{1,2}\.\d{1,2}").expect("valid year regex"));

static ANY: Lazy<Selector> = Lazy::new(|| Selector::parse("*").expect("valid selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid selector"));

/// First `#<digits>` token, including the `#`.
pub fn extract_number(text: &str) -> Option<String> {
    NUMBER_RE.find(text).map(|m| m.as_str().to_string())
}

/// First `M/D(weekday)` date; `None` when absent or either part is zero.
pub fn extract_date(text: &str) -> Option<EpisodeDate> {
    let caps = DATE_RE.captures(text)?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    EpisodeDate::new(month, day)
}

/// `(contents_id, id)` from an episode link.
pub fn extract_link_ids(href: &str) -> Option<(&str, &str)> {
    let caps = LINK_IDS_RE.captures(href)?;
    let contents_id = caps.get(1)?.as_str();
    let id = caps.get(2)?.as_str();
    Some((contents_id, id))
}

/// Year of the first `YYYY.MM.DD` stamp anywhere on the page.
///
/// Applied to every episode of that page, which can mis-date entries that
/// straddle New Year.
pub fn page_year(document: &Html) -> Option<i32> {
    let text = document.root_element().text().collect::<String>();
    PAGE_YEAR_RE
        .captures(&text)
        .and_then(|caps| caps[1].parse().ok())
}

/// All episodes found on one listing page, in document order.
pub fn extract_episodes(document: &Html, config: &Config) -> Vec<Episode> {
    let year = page_year(document).or(match config.year_mode {
        YearMode::CurrentYear => Some(Local::now().year()),
        YearMode::Placeholder => None,
    });

    let episodes: Vec<Episode> = document
        .select(&ANY)
        .filter_map(|element| candidate(element, config, year))
        .unique_by(|ep| (ep.number.clone(), ep.date))
        .collect();

    let undated = episodes.iter().filter(|ep| ep.date.is_unknown()).count();
    debug!(count = episodes.len(), undated, ?year, "Extracted episodes from page");
    episodes
}

fn candidate(element: ElementRef<'_>, config: &Config, year: Option<i32>) -> Option<Episode> {
    let text = element.text().collect::<String>();
    if !text.contains(&config.marker) {
        return None;
    }

    let number = extract_number(&text)?;
    let url = element_href(element)
        .and_then(extract_link_ids)
        .map(|(contents_id, id)| config.episode_url(contents_id, id))?;
    let date = extract_date(&text)
        .map(|d| d.with_year(year))
        .unwrap_or_default();

    Some(Episode::new(number, date, url))
}

/// Link of the first anchor inside the element, else the element's own.
fn element_href(element: ElementRef<'_>) -> Option<&str> {
    element
        .select(&ANCHOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .or_else(|| element.value().attr("href"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            origin: "https://fc.example".to_string(),
            ..Config::default()
        }
    }

    const LISTING: &str = r#"
        <html><body>
          <ul class="list">
            <li><span>#038 6/11(水) STREAMING</span>
                <a href="/special_contents/?contents_id=1&amp;id=55&amp;utm=x">more</a></li>
            <li><span>#037 5/28(水) STREAMING</span>
                <a href="https://fc.example/special_contents/?contents_id=1&amp;id=54">more</a></li>
            <li>NEWS: goods on sale</li>
          </ul>
        </body></html>
    "#;

    #[test]
    fn test_extract_number() {
        assert_eq!(extract_number("#037 STREAMING"), Some("#037".to_string()));
        assert_eq!(extract_number("vol.37 #12 and #13"), Some("#12".to_string()));
        assert_eq!(extract_number("no number here"), None);
        assert_eq!(extract_number("# 12"), None);
    }

    #[test]
    fn test_extract_date() {
        assert_eq!(extract_date("6/11(水) STREAMING"), EpisodeDate::new(6, 11));
        assert_eq!(extract_date("12/3(Tue)"), EpisodeDate::new(12, 3));
        assert_eq!(extract_date("0/11(水)"), None);
        assert_eq!(extract_date("6/11 without weekday"), None);
    }

    #[test]
    fn test_extract_link_ids() {
        assert_eq!(
            extract_link_ids("/special_contents/?contents_id=1&id=55&x=y"),
            Some(("1", "55"))
        );
        assert_eq!(extract_link_ids("/special_contents/?id=55"), None);
    }

    #[test]
    fn test_extract_episodes_in_document_order() {
        let document = Html::parse_document(LISTING);
        let episodes = extract_episodes(&document, &config());

        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].number, "#038");
        assert_eq!(episodes[0].date, EpisodeDate::new(6, 11).unwrap());
        assert_eq!(
            episodes[0].url,
            "https://fc.example/special_contents/?contents_id=1&id=55"
        );
        assert!(!episodes[0].listened);
        assert_eq!(episodes[1].number, "#037");
        assert_eq!(
            episodes[1].url,
            "https://fc.example/special_contents/?contents_id=1&id=54"
        );
    }

    #[test]
    fn test_duplicate_nodes_collapse_to_one_episode() {
        let html = r#"<html><body>
            <div>#37 5/28(水) STREAMING <a href="?contents_id=1&amp;id=54">a</a></div>
            <div>#37 5/28(水) STREAMING <a href="?contents_id=1&amp;id=54">b</a></div>
        </body></html>"#;
        let document = Html::parse_document(html);
        let episodes = extract_episodes(&document, &config());

        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].number, "#37");
        assert_eq!(episodes[0].date.to_string(), "05/28");
    }

    #[test]
    fn test_marker_without_number_or_link_is_dropped() {
        let html = r#"<html><body>
            <p>STREAMING schedule <a href="?contents_id=1&amp;id=9">x</a></p>
        </body></html>"#;
        let document = Html::parse_document(html);
        assert!(extract_episodes(&document, &config()).is_empty());

        let html = r#"<html><body><p>#40 7/1(火) STREAMING soon</p></body></html>"#;
        let document = Html::parse_document(html);
        assert!(extract_episodes(&document, &config()).is_empty());
    }

    #[test]
    fn test_missing_date_is_zero_value() {
        let html = r#"<html><body>
            <a href="/special_contents/?contents_id=2&amp;id=7">#7 STREAMING</a>
        </body></html>"#;
        let document = Html::parse_document(html);
        let episodes = extract_episodes(&document, &config());

        assert_eq!(episodes.len(), 1);
        assert!(episodes[0].date.is_unknown());
        assert_eq!(
            episodes[0].url,
            "https://fc.example/special_contents/?contents_id=2&id=7"
        );
    }

    #[test]
    fn test_page_year_applies_to_all_episodes() {
        let html = r#"<html><body>
            <p class="posted">2024.12.30</p>
            <div>#50 12/24(火) STREAMING <a href="?contents_id=1&amp;id=70">a</a></div>
            <p>2023.01.01</p>
        </body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(page_year(&document), Some(2024));

        let episodes = extract_episodes(&document, &config());
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].date.year, Some(2024));
    }

    #[test]
    fn test_year_mode_without_page_year() {
        let document = Html::parse_document(LISTING);
        assert_eq!(page_year(&document), None);

        let placeholder = extract_episodes(&document, &config());
        assert_eq!(placeholder[0].date.year, None);

        let current = Config {
            year_mode: YearMode::CurrentYear,
            ..config()
        };
        let episodes = extract_episodes(&document, &current);
        assert_eq!(episodes[0].date.year, Some(Local::now().year()));
    }
}

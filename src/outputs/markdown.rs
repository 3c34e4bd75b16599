//! Markdown checklist rendering.
//!
//! One line per episode in the persisted format, so the output of `fetch`
//! can be fed straight back into `merge`.

use crate::config::SortKey;
use crate::models::Episode;
use itertools::Itertools;
use std::cmp::Reverse;

/// Episodes ordered most recent first by `key`.
///
/// The sort is stable, so ties keep their input order.
pub fn sort_episodes(episodes: &[Episode], key: SortKey) -> Vec<Episode> {
    match key {
        SortKey::Number => episodes
            .iter()
            .cloned()
            .sorted_by_key(|ep| Reverse(ep.number_value()))
            .collect(),
        SortKey::Date => episodes
            .iter()
            .cloned()
            .sorted_by_key(|ep| Reverse(ep.date))
            .collect(),
    }
}

/// One line per episode, in the given order.
pub fn render(episodes: &[Episode]) -> String {
    episodes.iter().map(|ep| format!("{ep}\n")).collect()
}

pub fn render_sorted(episodes: &[Episode], key: SortKey) -> String {
    render(&sort_episodes(episodes, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger::parse_episodes;
    use crate::models::EpisodeDate;

    fn episodes() -> Vec<Episode> {
        vec![
            Episode::new("#9", EpisodeDate::new(12, 30).unwrap(), "https://fc.example/9"),
            Episode::new("#38", EpisodeDate::new(6, 11).unwrap(), "https://fc.example/38"),
            Episode::new("#037", EpisodeDate::new(5, 28).unwrap(), ""),
        ]
    }

    #[test]
    fn test_sort_by_number_is_numeric_descending() {
        let sorted = sort_episodes(&episodes(), SortKey::Number);
        let numbers: Vec<_> = sorted.iter().map(|e| e.number.as_str()).collect();
        assert_eq!(numbers, vec!["#38", "#037", "#9"]);
    }

    #[test]
    fn test_sort_by_date_descending() {
        let sorted = sort_episodes(&episodes(), SortKey::Date);
        let numbers: Vec<_> = sorted.iter().map(|e| e.number.as_str()).collect();
        assert_eq!(numbers, vec!["#9", "#38", "#037"]);
    }

    #[test]
    fn test_render_sorted_lines() {
        let text = render_sorted(&episodes(), SortKey::Number);
        assert_eq!(
            text,
            "[ ] 06/11 [#38](https://fc.example/38)\n\
             [ ] 05/28 [#037]\n\
             [ ] 12/30 [#9](https://fc.example/9)\n"
        );
    }

    #[test]
    fn test_render_output_parses_back() {
        let mut input = episodes();
        input[1].listened = true;
        let text = render(&input);
        assert_eq!(parse_episodes(&text), input);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]), "");
    }
}

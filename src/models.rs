//! Episode data model.
//!
//! An [`Episode`] is identified by its `#`-prefixed number. Everything else
//! is payload: the broadcast date, the resolved streaming URL and the
//! user's listened flag.
//!
//! The `Display` impl is the persisted line format:
//!
//! ```text
//! [ ] 06/11 [#38](https://kitoakari-fc.com/special_contents/?contents_id=1&id=55)
//! [x] 05/28 [#37]
//! ```

use std::fmt;

/// Calendar month/day of a broadcast, with an optional year.
///
/// The zero value (`00/00`, no year) stands for "date not found"; it is a
/// degraded display, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeDate {
    pub year: Option<i32>,
    pub month: u32,
    pub day: u32,
}

impl EpisodeDate {
    /// Build a month/day date; `None` unless both are positive.
    pub fn new(month: u32, day: u32) -> Option<Self> {
        if month == 0 || day == 0 {
            return None;
        }
        Some(Self {
            year: None,
            month,
            day,
        })
    }

    pub fn with_year(self, year: Option<i32>) -> Self {
        Self { year, ..self }
    }

    pub fn is_unknown(&self) -> bool {
        self.month == 0 && self.day == 0
    }
}

impl fmt::Display for EpisodeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.day)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Episode {
    /// Episode token including the leading `#`, e.g. `#037`.
    pub number: String,
    pub date: EpisodeDate,
    /// Provisional detail URL until resolved; empty when unknown.
    pub url: String,
    pub listened: bool,
}

impl Episode {
    pub fn new(number: impl Into<String>, date: EpisodeDate, url: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            date,
            url: url.into(),
            listened: false,
        }
    }

    /// Numeric part of the episode token (`#038` -> 38), 0 if absent.
    pub fn number_value(&self) -> u64 {
        self.number
            .trim_start_matches('#')
            .parse::<u64>()
            .unwrap_or(0)
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.listened { "[x]" } else { "[ ]" };
        if self.url.is_empty() {
            write!(f, "{} {} [{}]", mark, self.date, self.number)
        } else {
            write!(f, "{} {} [{}]({})", mark, self.date, self.number, self.url)
        }
    }
}

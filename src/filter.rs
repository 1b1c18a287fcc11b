//! Client-side news filtering.
//!
//! [`filter_news`] is a pure function of the fetched items, the selected
//! [`FilterCriteria`] and the wall-clock instant. Pages call it again whenever any of
//! the three changes; nothing is cached between calls.

use std::collections::BTreeSet;

use time::{Duration, OffsetDateTime, Time};

use crate::{
    data::NewsItem,
    helper::cycle::{self, Step},
};

/// Outlets offered by the source selector even before any item mentions them.
pub const KNOWN_SOURCES: &[&str] = &[
    "Bloomberg",
    "CNBC",
    "Benzinga",
    "MarketWatch",
    "Reuters",
    "SeekingAlpha",
    "Yahoo",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum DateRange {
    #[default]
    Any,
    Today,
    Last7Days,
    Last30Days,
    Last90Days,
    ThisWeek,
    ThisMonth,
    ThisYear,
}

impl DateRange {
    /// Earliest instant an item may carry to pass the filter, `None` when unconstrained.
    pub fn cutoff(self, now: OffsetDateTime) -> Option<OffsetDateTime> {
        let midnight = |date: time::Date| date.with_time(Time::MIDNIGHT).assume_offset(now.offset());
        let today = now.date();
        match self {
            Self::Any => None,
            Self::Today => Some(midnight(today)),
            Self::Last7Days => Some(now - Duration::days(7)),
            Self::Last30Days => Some(now - Duration::days(30)),
            Self::Last90Days => Some(now - Duration::days(90)),
            Self::ThisWeek => Some(midnight(
                today - Duration::days(i64::from(today.weekday().number_days_from_sunday())),
            )),
            Self::ThisMonth => Some(midnight(
                today - Duration::days(i64::from(today.day()) - 1),
            )),
            Self::ThisYear => Some(midnight(
                today - Duration::days(i64::from(today.ordinal()) - 1),
            )),
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::Any => t!("Filter.Any"),
            Self::Today => t!("Filter.Today"),
            Self::Last7Days => t!("Filter.Last7Days"),
            Self::Last30Days => t!("Filter.Last30Days"),
            Self::Last90Days => t!("Filter.Last90Days"),
            Self::ThisWeek => t!("Filter.ThisWeek"),
            Self::ThisMonth => t!("Filter.ThisMonth"),
            Self::ThisYear => t!("Filter.ThisYear"),
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        let all: Vec<Self> = <Self as strum::IntoEnumIterator>::iter().collect();
        let idx = all.iter().position(|range| *range == self);
        cycle::wrapping(idx, all.len(), Step::Forward)
            .and_then(|i| all.get(i).copied())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SourceFilter {
    #[default]
    Any,
    Outlet(String),
}

impl SourceFilter {
    pub fn label(&self) -> String {
        match self {
            Self::Any => t!("Filter.Any"),
            Self::Outlet(name) => name.clone(),
        }
    }

    /// Next entry of `Any` followed by `outlets`, wrapping back to `Any`.
    #[must_use]
    pub fn next(&self, outlets: &[String]) -> Self {
        let idx = match self {
            Self::Any => None,
            Self::Outlet(name) => outlets.iter().position(|o| o == name),
        };
        cycle::through_outside(idx, outlets.len(), Step::Forward)
            .and_then(|i| outlets.get(i))
            .map_or(Self::Any, |name| Self::Outlet(name.clone()))
    }
}

/// Selected constraints on the news list. Default is fully unconstrained.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterCriteria {
    pub date_range: DateRange,
    pub source: SourceFilter,
    /// Free text; matched trimmed and case-insensitively.
    pub ticker: String,
}

impl FilterCriteria {
    pub fn is_unconstrained(&self) -> bool {
        self.date_range == DateRange::Any
            && self.source == SourceFilter::Any
            && self.ticker.trim().is_empty()
    }

    fn matches(&self, item: &NewsItem, cutoff: Option<OffsetDateTime>, ticker: &str) -> bool {
        if let Some(cutoff) = cutoff {
            if published_at(item, cutoff) < cutoff {
                return false;
            }
        }
        if let SourceFilter::Outlet(source) = &self.source {
            if item.source != *source {
                return false;
            }
        }
        ticker.is_empty() || item.tickers.iter().any(|t| t.eq_ignore_ascii_case(ticker))
    }
}

/// Items satisfying every active constraint of `criteria`, in their original order.
pub fn filter_news(
    items: &[NewsItem],
    criteria: &FilterCriteria,
    now: OffsetDateTime,
) -> Vec<NewsItem> {
    if criteria.is_unconstrained() {
        return items.to_vec();
    }
    let cutoff = criteria.date_range.cutoff(now);
    let ticker = criteria.ticker.trim();
    items
        .iter()
        .filter(|item| criteria.matches(item, cutoff, ticker))
        .cloned()
        .collect()
}

/// Outlets for the source selector: the known list plus whatever the items mention.
pub fn source_options(items: &[NewsItem]) -> Vec<String> {
    KNOWN_SOURCES
        .iter()
        .map(ToString::to_string)
        .chain(
            items
                .iter()
                .map(|item| item.source.clone())
                .filter(|s| !s.is_empty()),
        )
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Publication instant in the cutoff's offset. Items carry only `HH:MM`, so this is the
/// start of the publishing minute and rolling windows compare at minute resolution. A
/// malformed time counts as midnight.
fn published_at(item: &NewsItem, reference: OffsetDateTime) -> OffsetDateTime {
    let time = parse_time(&item.time).unwrap_or(Time::MIDNIGHT);
    item.date.with_time(time).assume_offset(reference.offset())
}

fn parse_time(raw: &str) -> Option<Time> {
    let mut parts = raw.trim().split(':').map(|p| p.parse::<u8>().ok());
    let hour = parts.next()??;
    let minute = parts.next()??;
    let second = parts.next().unwrap_or(Some(0))?;
    Time::from_hms(hour, minute, second).ok()
}

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, UtcOffset};

/// Article as returned by Finnhub's `news` and `company-news` endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(default)]
    pub category: String,
    /// Publication time, UNIX seconds.
    #[serde(default)]
    pub datetime: i64,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub image: Option<String>,
    /// Comma (or pipe) separated tickers.
    #[serde(default)]
    pub related: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: String,
}

/// A news entry as the pages see it. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewsItem {
    pub id: String,
    pub date: Date,
    /// `HH:MM` in the local offset.
    pub time: String,
    pub headline: String,
    pub source: String,
    pub category: String,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub tickers: BTreeSet<String>,
}

impl NewsItem {
    /// Returns `None` for articles without a usable timestamp or headline.
    pub fn from_article(article: NewsArticle, offset: UtcOffset) -> Option<Self> {
        if article.headline.trim().is_empty() || article.datetime <= 0 {
            return None;
        }
        let published = OffsetDateTime::from_unix_timestamp(article.datetime)
            .ok()?
            .to_offset(offset);
        Some(Self {
            id: article.id.to_string(),
            date: published.date(),
            time: crate::helper::clock::hh_mm(published),
            headline: article.headline.trim().to_string(),
            source: article.source.trim().to_string(),
            category: article.category,
            summary: non_empty(article.summary),
            url: non_empty(article.url),
            tickers: article
                .related
                .as_deref()
                .map(split_tickers)
                .unwrap_or_default(),
        })
    }

    /// Converts a batch, dropping unusable articles. Company news often leaves `related`
    /// empty, so `owner` is added to every item when given.
    pub fn from_articles(
        articles: Vec<NewsArticle>,
        offset: UtcOffset,
        owner: Option<&str>,
    ) -> Vec<Self> {
        articles
            .into_iter()
            .filter_map(|article| Self::from_article(article, offset))
            .map(|mut item| {
                if let Some(owner) = owner {
                    item.tickers.insert(owner.to_ascii_uppercase());
                }
                item
            })
            .collect()
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn split_tickers(related: &str) -> BTreeSet<String> {
    related
        .split([',', '|'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_uppercase)
        .collect()
}

/// Market news categories offered by the upstream API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum NewsCategory {
    #[default]
    General,
    Forex,
    Crypto,
    Merger,
}

impl NewsCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Forex => "forex",
            Self::Crypto => "crypto",
            Self::Merger => "merger",
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::General => t!("News.Category.General"),
            Self::Forex => t!("News.Category.Forex"),
            Self::Crypto => t!("News.Category.Crypto"),
            Self::Merger => t!("News.Category.Merger"),
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::General => Self::Forex,
            Self::Forex => Self::Crypto,
            Self::Crypto => Self::Merger,
            Self::Merger => Self::General,
        }
    }

    #[must_use]
    pub fn prev(self) -> Self {
        match self {
            Self::General => Self::Merger,
            Self::Forex => Self::General,
            Self::Crypto => Self::Forex,
            Self::Merger => Self::Crypto,
        }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

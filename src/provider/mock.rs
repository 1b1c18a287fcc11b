//! Offline datasets for `--mock`.
//!
//! Everything is derived from the ticker through a seeded generator, so the same symbol
//! always looks the same within a day, and dates are laid out relative to "now".

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use std::{sync::LazyLock, time::Duration};

use futures::FutureExt;
use indexmap::IndexMap;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::Deserialize;
use time::{Date, Duration as Span, Month, OffsetDateTime};

use super::{DataProvider, ProviderFuture};
use crate::{
    api::ApiError,
    data::{
        financials::FinancialSeries, BasicFinancials, Candle, Candles, CompanyProfile,
        DataSource, Freshness, InsiderTransaction, InstitutionHolder, NewsArticle,
        NewsCategory, Quote, RecommendationTrend, Resolution, ScreenerQuery,
        ScreenerResponse, ScreenerRow, Symbol, SymbolMatch,
    },
    eps::EarningsEntry,
    filter::KNOWN_SOURCES,
    metrics::MetricSeriesEntry,
};

#[derive(Clone, Debug, Deserialize)]
struct MockCompany {
    ticker: String,
    name: String,
    industry: String,
    exchange: String,
    ipo: String,
    weburl: String,
    price: f64,
    /// Millions.
    shares: f64,
}

static COMPANIES: LazyLock<Vec<MockCompany>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../../assets/mock/companies.json")).unwrap_or_else(
        |err| {
            tracing::error!("mock company list is malformed: {err}");
            Vec::new()
        },
    )
});

const MAX_CANDLES: i64 = 600;
const MAX_PEERS: usize = 10;

/// FNV-1a over the parts; only used to turn a ticker and a salt into a seed.
fn seed(parts: &[&str]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for part in parts {
        for byte in part.bytes().chain(std::iter::once(0xff)) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

/// Generator seeded from the given parts.
fn seeded(parts: &[&str]) -> StdRng {
    StdRng::seed_from_u64(seed(parts))
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn iso(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Last day of the quarter `back` quarters before the one containing `today`.
fn quarter_end(today: Date, back: i32) -> Option<Date> {
    let index = today.year() * 4 + i32::from((u8::from(today.month()) - 1) / 3) - 1 - back;
    let year = index.div_euclid(4);
    let quarter = u8::try_from(index.rem_euclid(4)).ok()?;
    let month = Month::try_from(quarter * 3 + 3).ok()?;
    Date::from_calendar_date(year, month, month.length(year)).ok()
}

/// Synthetic provider for offline use.
pub struct MockProvider {
    latency: Duration,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(Duration::from_millis(150))
    }
}

impl MockProvider {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    fn respond<T: Send + 'static>(
        &self,
        build: impl FnOnce() -> Result<T, ApiError> + Send + 'static,
    ) -> ProviderFuture<T> {
        let latency = self.latency;
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            build()
        }
        .boxed()
    }
}

fn company(symbol: &Symbol) -> Result<&'static MockCompany, ApiError> {
    COMPANIES
        .iter()
        .find(|c| c.ticker == symbol.as_str())
        .ok_or(ApiError::NotFound)
}

fn today() -> Date {
    crate::helper::clock::now().date()
}

fn day_key() -> String {
    iso(today())
}

fn quote_for(company: &MockCompany) -> Quote {
    let mut rng = seeded(&[&company.ticker, "quote", &day_key()]);
    let previous_close = round_to(company.price * rng.gen_range(0.97..1.03), 2);
    let current = round_to(previous_close * rng.gen_range(0.96..1.04), 2);
    let change = round_to(current - previous_close, 2);
    Quote {
        current: Some(current),
        change: Some(change),
        percent_change: Some(round_to(change / previous_close * 100.0, 4)),
        high: Some(round_to(current.max(previous_close) * rng.gen_range(1.0..1.015), 2)),
        low: Some(round_to(current.min(previous_close) * rng.gen_range(0.985..1.0), 2)),
        open: Some(round_to(previous_close * rng.gen_range(0.99..1.01), 2)),
        previous_close: Some(previous_close),
        timestamp: Some(crate::helper::clock::unix_now()),
    }
}

/// Companies of the same industry, most similar in size first.
fn peers_for(company: &MockCompany) -> Vec<Symbol> {
    let cap = company.price * company.shares;
    let mut peers: Vec<&MockCompany> = COMPANIES
        .iter()
        .filter(|c| c.industry == company.industry && c.ticker != company.ticker)
        .collect();
    peers.sort_by(|a, b| {
        let gap = |c: &MockCompany| (c.price * c.shares / cap).ln().abs();
        gap(a).total_cmp(&gap(b))
    });
    peers
        .into_iter()
        .take(MAX_PEERS)
        .map(|c| Symbol::new(&c.ticker))
        .collect()
}

fn profile_for(company: &MockCompany) -> CompanyProfile {
    CompanyProfile {
        country: Some("US".to_string()),
        currency: Some("USD".to_string()),
        exchange: Some(company.exchange.clone()),
        finnhub_industry: Some(company.industry.clone()),
        ipo: Some(company.ipo.clone()),
        logo: None,
        market_capitalization: Some(round_to(company.price * company.shares, 1)),
        name: Some(company.name.clone()),
        phone: None,
        share_outstanding: Some(company.shares),
        ticker: Some(company.ticker.clone()),
        weburl: Some(company.weburl.clone()),
    }
}

fn flat_metrics(company: &MockCompany) -> IndexMap<String, serde_json::Value> {
    let mut rng = seeded(&[&company.ticker, "metrics"]);
    let pe = round_to(rng.gen_range(8.0..60.0), 2);
    let entries = [
        ("peTTM", pe),
        ("pbAnnual", round_to(rng.gen_range(1.0..40.0), 2)),
        ("psTTM", round_to(rng.gen_range(0.5..25.0), 2)),
        ("epsTTM", round_to(company.price / pe, 2)),
        ("beta", round_to(rng.gen_range(0.5..2.0), 3)),
        ("52WeekHigh", round_to(company.price * rng.gen_range(1.05..1.4), 2)),
        ("52WeekLow", round_to(company.price * rng.gen_range(0.6..0.95), 2)),
        ("dividendYieldIndicatedAnnual", round_to(rng.gen_range(0.0..3.5), 2)),
        ("roeTTM", round_to(rng.gen_range(5.0..60.0), 2)),
        ("netProfitMarginTTM", round_to(rng.gen_range(2.0..40.0), 2)),
        ("grossMarginTTM", round_to(rng.gen_range(20.0..75.0), 2)),
        ("currentRatioAnnual", round_to(rng.gen_range(0.6..3.0), 2)),
        ("totalDebt/totalEquityAnnual", round_to(rng.gen_range(0.1..3.0), 2)),
        ("marketCapitalization", round_to(company.price * company.shares, 1)),
    ];
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), serde_json::json!(value)))
        .collect()
}

fn series_for(
    company: &MockCompany,
    periods: &[Date],
    salt: &str,
) -> IndexMap<String, Vec<MetricSeriesEntry>> {
    const SERIES: &[(&str, f64, f64)] = &[
        ("eps", 0.5, 12.0),
        ("pe", 8.0, 60.0),
        ("roe", 0.05, 0.6),
        ("roa", 0.02, 0.3),
        ("grossMargin", 0.2, 0.75),
        ("netMargin", 0.02, 0.4),
        ("operatingMargin", 0.05, 0.45),
        ("currentRatio", 0.6, 3.0),
        ("totalDebtToEquity", 0.1, 3.0),
        ("salesPerShare", 5.0, 120.0),
        ("fcfMargin", 0.01, 0.35),
        ("bookValue", 10_000.0, 300_000.0),
    ];
    let mut rng = seeded(&[&company.ticker, "series", salt]);
    let mut series: IndexMap<String, Vec<MetricSeriesEntry>> = SERIES
        .iter()
        .map(|(key, lo, hi)| {
            let mut value = rng.gen_range(*lo..*hi);
            // Newest first, as the upstream API sends them.
            let entries = periods
                .iter()
                .enumerate()
                .map(|(i, period)| {
                    value *= rng.gen_range(0.9..1.1);
                    MetricSeriesEntry {
                        period: iso(*period),
                        // The odd gap, as real filings have.
                        v: (i % 5 != 4).then_some(round_to(value, 4)),
                    }
                })
                .collect();
            ((*key).to_string(), entries)
        })
        .collect();
    series.insert("ptbv".to_string(), Vec::new());
    series
}

fn financials_for(company: &MockCompany) -> BasicFinancials {
    let today = today();
    let annual: Vec<Date> = (0..6)
        .filter_map(|back| {
            Date::from_calendar_date(today.year() - 1 - back, Month::December, 31).ok()
        })
        .collect();
    let quarterly: Vec<Date> = (0..12).filter_map(|back| quarter_end(today, back)).collect();
    BasicFinancials {
        metric: flat_metrics(company),
        series: FinancialSeries {
            annual: series_for(company, &annual, "annual"),
            quarterly: series_for(company, &quarterly, "quarterly"),
        },
    }
}

fn recommendations_for(company: &MockCompany) -> Vec<RecommendationTrend> {
    let mut rng = seeded(&[&company.ticker, "recommendation"]);
    let today = today();
    (0..4)
        .filter_map(|back| {
            let index = today.year() * 12 + i32::from(u8::from(today.month())) - 1 - back;
            let month = Month::try_from((index.rem_euclid(12) + 1) as u8).ok()?;
            let first = Date::from_calendar_date(index.div_euclid(12), month, 1).ok()?;
            Some(RecommendationTrend {
                period: iso(first),
                strong_buy: rng.gen_range(0..15) as u32,
                buy: 5 + rng.gen_range(0..20) as u32,
                hold: 2 + rng.gen_range(0..15) as u32,
                sell: rng.gen_range(0..4) as u32,
                strong_sell: rng.gen_range(0..2) as u32,
            })
        })
        .collect()
}

fn earnings_for(company: &MockCompany, limit: u32) -> Vec<EarningsEntry> {
    let mut rng = seeded(&[&company.ticker, "earnings"]);
    let today = today();
    let mut estimate = company.price / rng.gen_range(60.0..120.0);
    (0..limit as i32)
        .filter_map(|back| {
            let period = quarter_end(today, back)?;
            estimate *= rng.gen_range(0.92..1.06);
            let estimate = round_to(estimate, 2);
            // The latest quarter has not reported yet.
            let actual = (back > 0).then(|| round_to(estimate * rng.gen_range(0.9..1.12), 2));
            let surprise = actual.map(|a| round_to(a - estimate, 4));
            Some(EarningsEntry {
                period: iso(period),
                actual,
                estimate: Some(estimate),
                surprise,
                surprise_percent: surprise.map(|s| round_to(s / estimate * 100.0, 4)),
                symbol: Some(company.ticker.clone()),
                quarter: Some((u8::from(period.month()) - 1) / 3 + 1),
                year: Some(period.year()),
            })
        })
        .collect()
}

fn insiders_for(company: &MockCompany) -> Vec<InsiderTransaction> {
    const NAMES: &[&str] = &[
        "SMITH JOHN A",
        "LEE KAREN",
        "GARCIA MARIA",
        "CHEN WEI",
        "O'BRIEN PATRICK",
        "PATEL ANITA",
    ];
    let mut rng = seeded(&[&company.ticker, "insider"]);
    let today = today();
    let mut holdings: Vec<i64> = NAMES
        .iter()
        .map(|_| 10_000 + rng.gen_range(0..900_000) as i64)
        .collect();
    let mut transactions: Vec<_> = (0..18)
        .map(|i| {
            let who = rng.gen_range(0..NAMES.len());
            let change = if rng.gen::<f64>() < 0.7 {
                -(1_000 + rng.gen_range(0..40_000) as i64)
            } else {
                500 + rng.gen_range(0..20_000) as i64
            };
            holdings[who] = (holdings[who] + change).max(0);
            let date = today - Span::days(i * 11 + rng.gen_range(0..10) as i64);
            InsiderTransaction {
                name: NAMES[who].to_string(),
                share: Some(holdings[who]),
                change: Some(change),
                filing_date: Some(iso(date + Span::days(2))),
                transaction_date: Some(iso(date)),
                transaction_price: Some(round_to(company.price * rng.gen_range(0.8..1.1), 2)),
                transaction_code: Some(if change < 0 { "S" } else { "P" }.to_string()),
            }
        })
        .collect();
    transactions.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
    transactions
}

fn holders_for(company: &MockCompany, limit: u32) -> Vec<InstitutionHolder> {
    const HOLDERS: &[&str] = &[
        "Vanguard Group Inc",
        "BlackRock Inc",
        "State Street Corp",
        "FMR LLC",
        "Geode Capital Management",
        "T. Rowe Price Associates",
        "Northern Trust Corp",
        "Morgan Stanley",
        "JPMorgan Chase & Co",
        "Norges Bank",
        "Capital Research Global Investors",
        "Wellington Management Group",
    ];
    let mut rng = seeded(&[&company.ticker, "ownership"]);
    let quarter = quarter_end(today(), 0).map(iso);
    let mut stake = rng.gen_range(7.0..9.5);
    HOLDERS
        .iter()
        .take(limit as usize)
        .map(|name| {
            let holder = InstitutionHolder {
                name: (*name).to_string(),
                ownership: Some(round_to(stake, 3)),
                date: quarter.clone(),
                form_type: Some("13F-HR".to_string()),
            };
            stake *= rng.gen_range(0.55..0.9);
            holder
        })
        .collect()
}

fn candles_for(company: &MockCompany, resolution: Resolution, from: i64, to: i64) -> Candles {
    let step = resolution.seconds();
    if to <= from {
        return Vec::new();
    }
    let count = ((to - from) / step).clamp(1, MAX_CANDLES);
    let start = to - count * step;
    let start = start - start.rem_euclid(step);
    let mut rng = seeded(&[&company.ticker, "candles", resolution.as_str(), &day_key()]);
    let volatility = 0.004 * (step as f64 / 300.0).sqrt().min(6.0);
    // Walk backwards from the current price so the last bar meets the quote.
    let mut close = quote_for(company).current.unwrap_or(company.price);
    let mut candles: Candles = (0..count)
        .rev()
        .map(|i| {
            let open = close * (1.0 + rng.gen_range(-volatility..volatility));
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..volatility));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..volatility));
            let candle = Candle {
                timestamp: start + i * step,
                open: round_to(open, 2),
                high: round_to(high, 2),
                low: round_to(low, 2),
                close: round_to(close, 2),
                volume: (rng.gen_range(0.2..1.0) * company.shares * 1_000.0 / 20.0).round(),
            };
            close = open;
            candle
        })
        .collect();
    candles.reverse();
    candles
}

fn articles(
    rng: &mut StdRng,
    tickers: &[&MockCompany],
    category: &str,
    count: i64,
    span_days: i64,
) -> Vec<NewsArticle> {
    const TEMPLATES: &[&str] = &[
        "{name} shares move after quarterly results",
        "Analysts revisit price targets on {name}",
        "{name} announces new buyback programme",
        "What the latest guidance means for {name}",
        "{name} expands into new markets",
        "Options traders brace for volatility in {name}",
        "{name} names new chief financial officer",
        "Regulators open inquiry into {name}",
    ];
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let spacing = span_days * 86_400 / count.max(1);
    (0..count)
        .filter_map(|i| {
            let company = tickers.choose(rng)?;
            let template = TEMPLATES.choose(rng)?;
            let source = KNOWN_SOURCES.choose(rng)?;
            let mut related = vec![company.ticker.clone()];
            if rng.gen::<f64>() < 0.3 {
                if let Some(other) = tickers.choose(rng) {
                    if other.ticker != company.ticker {
                        related.push(other.ticker.clone());
                    }
                }
            }
            let datetime = now - i * spacing - rng.gen_range(0..3_600) as i64;
            let headline = template.replace("{name}", &company.name);
            Some(NewsArticle {
                category: category.to_string(),
                datetime,
                summary: format!("{headline}. {} coverage of {}.", source, company.ticker),
                headline,
                id: (seed(&[&company.ticker, &datetime.to_string()]) >> 20) as i64,
                image: None,
                related: Some(related.join(",")),
                source: (*source).to_string(),
                url: format!("https://news.example.com/{}/{}", company.ticker.to_lowercase(), datetime),
            })
        })
        .collect()
}

impl DataProvider for MockProvider {
    fn source(&self) -> DataSource {
        DataSource::Mock
    }

    fn screener(&self, query: ScreenerQuery) -> ProviderFuture<ScreenerResponse> {
        self.respond(move || {
            let selected: Vec<&MockCompany> = match &query.symbols {
                Some(symbols) => COMPANIES
                    .iter()
                    .filter(|c| symbols.iter().any(|s| s.eq_ignore_ascii_case(&c.ticker)))
                    .collect(),
                None => COMPANIES.iter().collect(),
            };
            let page_size = query.page_size.max(1);
            let total_available = selected.len() as u32;
            let total_pages = total_available.div_ceil(page_size).max(1);
            let page = query.page.clamp(1, total_pages);
            let stocks: Vec<ScreenerRow> = selected
                .iter()
                .skip(((page - 1) * page_size) as usize)
                .take(page_size as usize)
                .map(|company| ScreenerRow {
                    ticker: company.ticker.clone(),
                    quote: Some(quote_for(company)),
                    profile: Some(profile_for(company)),
                    metrics: Some(flat_metrics(company)),
                    fetched_at: Some(day_key()),
                })
                .collect();
            Ok(ScreenerResponse {
                total: stocks.len() as u32,
                cached_count: 0,
                fresh_count: stocks.len() as u32,
                stocks,
                total_available,
                page,
                page_size,
                total_pages,
                fetched_at: Some(day_key()),
                source: Some("mock".to_string()),
            })
        })
    }

    fn search_symbols(&self, query: String) -> ProviderFuture<Vec<SymbolMatch>> {
        self.respond(move || {
            let needle = query.trim().to_ascii_uppercase();
            if needle.is_empty() {
                return Ok(Vec::new());
            }
            Ok(COMPANIES
                .iter()
                .filter(|c| {
                    c.ticker.starts_with(&needle) || c.name.to_ascii_uppercase().contains(&needle)
                })
                .map(|c| SymbolMatch {
                    description: c.name.to_ascii_uppercase(),
                    display_symbol: c.ticker.clone(),
                    symbol: c.ticker.clone(),
                    kind: "Common Stock".to_string(),
                })
                .collect())
        })
    }

    fn profile(&self, symbol: Symbol, _freshness: Freshness) -> ProviderFuture<CompanyProfile> {
        self.respond(move || company(&symbol).map(profile_for))
    }

    fn quote(&self, symbol: Symbol) -> ProviderFuture<Quote> {
        self.respond(move || company(&symbol).map(quote_for))
    }

    fn peers(&self, symbol: Symbol) -> ProviderFuture<Vec<Symbol>> {
        self.respond(move || company(&symbol).map(peers_for))
    }

    fn basic_financials(
        &self,
        symbol: Symbol,
        _freshness: Freshness,
    ) -> ProviderFuture<BasicFinancials> {
        self.respond(move || company(&symbol).map(financials_for))
    }

    fn recommendations(
        &self,
        symbol: Symbol,
        _freshness: Freshness,
    ) -> ProviderFuture<Vec<RecommendationTrend>> {
        self.respond(move || company(&symbol).map(recommendations_for))
    }

    fn earnings(
        &self,
        symbol: Symbol,
        limit: u32,
        _freshness: Freshness,
    ) -> ProviderFuture<Vec<EarningsEntry>> {
        self.respond(move || company(&symbol).map(|c| earnings_for(c, limit)))
    }

    fn company_news(
        &self,
        symbol: Symbol,
        from: Date,
        to: Date,
        _freshness: Freshness,
    ) -> ProviderFuture<Vec<NewsArticle>> {
        self.respond(move || {
            let company = company(&symbol)?;
            let mut rng = seeded(&[&company.ticker, "company-news", &day_key()]);
            let span = (to - from).whole_days().max(1);
            let articles = articles(&mut rng, &[company], "company", 24, span);
            Ok(articles
                .into_iter()
                .filter(|a| {
                    OffsetDateTime::from_unix_timestamp(a.datetime)
                        .is_ok_and(|at| (from..=to).contains(&at.date()))
                })
                .collect())
        })
    }

    fn insider_transactions(
        &self,
        symbol: Symbol,
        limit: u32,
        _freshness: Freshness,
    ) -> ProviderFuture<Vec<InsiderTransaction>> {
        self.respond(move || {
            let mut transactions = insiders_for(company(&symbol)?);
            transactions.truncate(limit as usize);
            Ok(transactions)
        })
    }

    fn institution_ownership(
        &self,
        symbol: Symbol,
        limit: u32,
    ) -> ProviderFuture<Vec<InstitutionHolder>> {
        self.respond(move || company(&symbol).map(|c| holders_for(c, limit)))
    }

    fn candles(
        &self,
        symbol: Symbol,
        resolution: Resolution,
        from: i64,
        to: i64,
    ) -> ProviderFuture<Candles> {
        self.respond(move || company(&symbol).map(|c| candles_for(c, resolution, from, to)))
    }

    fn market_news(&self, category: NewsCategory) -> ProviderFuture<Vec<NewsArticle>> {
        self.respond(move || {
            let mut rng = seeded(&[category.as_str(), "market-news", &day_key()]);
            let tickers: Vec<&MockCompany> = COMPANIES.iter().collect();
            Ok(articles(&mut rng, &tickers, category.as_str(), 40, 120))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{EARNINGS_LIMIT, INSIDER_LIMIT};

    fn provider() -> MockProvider {
        MockProvider::new(Duration::ZERO)
    }

    #[test]
    fn bundled_companies_parse() {
        assert!(COMPANIES.len() >= 20);
        assert!(COMPANIES.iter().all(|c| c.price > 0.0 && c.shares > 0.0));
    }

    #[test]
    fn generator_is_deterministic_per_seed() {
        let a: Vec<_> = {
            let mut rng = seeded(&["AAPL", "x"]);
            (0..5).map(|_| rng.gen::<u64>()).collect()
        };
        let b: Vec<_> = {
            let mut rng = seeded(&["AAPL", "x"]);
            (0..5).map(|_| rng.gen::<u64>()).collect()
        };
        let c: Vec<_> = {
            let mut rng = seeded(&["MSFT", "x"]);
            (0..5).map(|_| rng.gen::<u64>()).collect()
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
        let mut rng = seeded(&["unit"]);
        assert!((0..1_000).map(|_| rng.gen::<f64>()).all(|v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn quarter_ends_walk_backwards() {
        let today = time::macros::date!(2024 - 05 - 15);
        assert_eq!(quarter_end(today, 0), Some(time::macros::date!(2024 - 03 - 31)));
        assert_eq!(quarter_end(today, 1), Some(time::macros::date!(2023 - 12 - 31)));
        assert_eq!(quarter_end(today, 4), Some(time::macros::date!(2023 - 03 - 31)));
    }

    #[tokio::test]
    async fn screener_pages_through_companies() {
        let provider = provider();
        let first = provider.screener(ScreenerQuery::page(1, 10)).await.unwrap();
        assert_eq!(first.stocks.len(), 10);
        assert_eq!(first.total_available as usize, COMPANIES.len());
        let last = provider
            .screener(ScreenerQuery::page(first.total_pages, 10))
            .await
            .unwrap();
        assert!(!last.stocks.is_empty());
        assert_ne!(first.stocks[0].ticker, last.stocks[0].ticker);
        assert!(first.stocks[0].pe().is_some());
    }

    #[tokio::test]
    async fn same_symbol_same_data() {
        let provider = provider();
        let a = provider
            .basic_financials(Symbol::new("AAPL"), Freshness::Cached)
            .await
            .unwrap();
        let b = provider
            .basic_financials(Symbol::new("AAPL"), Freshness::Live)
            .await
            .unwrap();
        assert_eq!(a, b);
        assert!(a.series.annual["ptbv"].is_empty());
        assert_eq!(a.series.quarterly["eps"].len(), 12);
    }

    #[tokio::test]
    async fn unknown_symbol_is_not_found() {
        let err = provider()
            .profile(Symbol::new("ZZZZ"), Freshness::Cached)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::NotFound);
    }

    #[tokio::test]
    async fn peers_share_the_industry_and_exclude_the_company() {
        let provider = provider();
        let own = company(&Symbol::new("AAPL")).unwrap();
        let peers = provider.peers(Symbol::new("AAPL")).await.unwrap();
        assert!(peers.len() <= MAX_PEERS);
        assert!(!peers.contains(&Symbol::new("AAPL")));
        for peer in &peers {
            assert_eq!(company(peer).unwrap().industry, own.industry);
        }

        let quote = provider.quote(Symbol::new("AAPL")).await.unwrap();
        assert!(quote.current.is_some_and(|c| c > 0.0));
        assert_eq!(
            provider.quote(Symbol::new("ZZZZ")).await.unwrap_err(),
            ApiError::NotFound
        );
    }

    #[tokio::test]
    async fn latest_earnings_quarter_is_unreported() {
        let earnings = provider()
            .earnings(Symbol::new("MSFT"), EARNINGS_LIMIT, Freshness::Cached)
            .await
            .unwrap();
        assert_eq!(earnings.len(), EARNINGS_LIMIT as usize);
        assert!(earnings[0].actual.is_none());
        assert_eq!(
            crate::eps::compute_eps_surprises(&earnings).len(),
            EARNINGS_LIMIT as usize - 1
        );
    }

    #[tokio::test]
    async fn candles_end_at_requested_bound() {
        let to = crate::helper::clock::unix_now();
        let from = to - 30 * 86_400;
        let candles = provider()
            .candles(Symbol::new("NVDA"), Resolution::Day, from, to)
            .await
            .unwrap();
        assert_eq!(candles.len(), 30);
        assert!(candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(candles.iter().all(|c| c.low <= c.open.min(c.close) && c.high >= c.open.max(c.close)));
    }

    #[tokio::test]
    async fn news_spans_the_last_120_days() {
        let articles = provider().market_news(NewsCategory::General).await.unwrap();
        assert_eq!(articles.len(), 40);
        let now = crate::helper::clock::unix_now();
        assert!(articles.iter().all(|a| a.datetime <= now));
        assert!(articles.iter().any(|a| now - a.datetime > 90 * 86_400));
    }

    #[tokio::test]
    async fn company_news_stays_inside_bounds() {
        let to = today();
        let from = to - Span::days(30);
        let articles = provider()
            .company_news(Symbol::new("AAPL"), from, to, Freshness::Cached)
            .await
            .unwrap();
        assert!(!articles.is_empty());
        assert!(articles
            .iter()
            .all(|a| a.related.as_deref().is_some_and(|r| r.contains("AAPL"))));
    }

    #[tokio::test]
    async fn insider_limit_is_respected() {
        let transactions = provider()
            .insider_transactions(Symbol::new("TSLA"), 5, Freshness::Cached)
            .await
            .unwrap();
        assert_eq!(transactions.len(), 5);
        let all = provider()
            .insider_transactions(Symbol::new("TSLA"), INSIDER_LIMIT, Freshness::Cached)
            .await
            .unwrap();
        assert_eq!(all.len(), 18);
    }

    #[tokio::test]
    async fn search_matches_ticker_prefix_and_name() {
        let provider = provider();
        let by_ticker = provider.search_symbols("ms".to_string()).await.unwrap();
        assert!(by_ticker.iter().any(|m| m.symbol == "MSFT"));
        let by_name = provider.search_symbols("disney".to_string()).await.unwrap();
        assert_eq!(by_name[0].symbol, "DIS");
        assert!(provider.search_symbols("  ".to_string()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn holders_are_ranked() {
        let holders = provider()
            .institution_ownership(Symbol::new("KO"), 5)
            .await
            .unwrap();
        assert_eq!(holders.len(), 5);
        assert!(holders
            .windows(2)
            .all(|w| w[0].ownership >= w[1].ownership));
    }
}

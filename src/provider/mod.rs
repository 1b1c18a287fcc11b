//! Where page data comes from.
//!
//! Pages talk to an `Arc<dyn DataProvider>` chosen once at start-up; whether it hits the
//! backend ([`LiveProvider`]) or synthesises data ([`MockProvider`]) is invisible to them.

use futures::future::BoxFuture;
use time::Date;

use crate::{
    api::ApiError,
    data::{
        BasicFinancials, Candles, CompanyProfile, DataSource, Freshness, InsiderTransaction,
        InstitutionHolder, NewsArticle, NewsCategory, Quote, RecommendationTrend, Resolution,
        ScreenerQuery, ScreenerResponse, Symbol, SymbolMatch,
    },
    eps::EarningsEntry,
};

mod live;
mod mock;

pub use live::LiveProvider;
pub use mock::MockProvider;

pub type ProviderFuture<T> = BoxFuture<'static, Result<T, ApiError>>;

/// Number of earnings quarters requested for the EPS chart.
pub const EARNINGS_LIMIT: u32 = 8;
/// Number of insider filings requested for the profile.
pub const INSIDER_LIMIT: u32 = 50;
/// Number of institutional holders requested for the profile.
pub const OWNERSHIP_LIMIT: u32 = 20;
/// Number of company articles requested from the cache.
pub const COMPANY_NEWS_LIMIT: u32 = 100;

pub trait DataProvider: Send + Sync {
    fn source(&self) -> DataSource;

    fn screener(&self, query: ScreenerQuery) -> ProviderFuture<ScreenerResponse>;

    fn search_symbols(&self, query: String) -> ProviderFuture<Vec<SymbolMatch>>;

    fn profile(&self, symbol: Symbol, freshness: Freshness) -> ProviderFuture<CompanyProfile>;

    /// Latest quote, always fetched live.
    fn quote(&self, symbol: Symbol) -> ProviderFuture<Quote>;

    /// Companies in the same sub-industry, excluding `symbol` itself.
    fn peers(&self, symbol: Symbol) -> ProviderFuture<Vec<Symbol>>;

    fn basic_financials(
        &self,
        symbol: Symbol,
        freshness: Freshness,
    ) -> ProviderFuture<BasicFinancials>;

    fn recommendations(
        &self,
        symbol: Symbol,
        freshness: Freshness,
    ) -> ProviderFuture<Vec<RecommendationTrend>>;

    fn earnings(
        &self,
        symbol: Symbol,
        limit: u32,
        freshness: Freshness,
    ) -> ProviderFuture<Vec<EarningsEntry>>;

    /// Articles about `symbol` published between `from` and `to`, both inclusive.
    fn company_news(
        &self,
        symbol: Symbol,
        from: Date,
        to: Date,
        freshness: Freshness,
    ) -> ProviderFuture<Vec<NewsArticle>>;

    fn insider_transactions(
        &self,
        symbol: Symbol,
        limit: u32,
        freshness: Freshness,
    ) -> ProviderFuture<Vec<InsiderTransaction>>;

    fn institution_ownership(
        &self,
        symbol: Symbol,
        limit: u32,
    ) -> ProviderFuture<Vec<InstitutionHolder>>;

    /// Bars between two UNIX-second bounds, oldest first.
    fn candles(
        &self,
        symbol: Symbol,
        resolution: Resolution,
        from: i64,
        to: i64,
    ) -> ProviderFuture<Candles>;

    fn market_news(&self, category: NewsCategory) -> ProviderFuture<Vec<NewsArticle>>;
}

use std::sync::Arc;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use time::{macros::format_description, Date};
use tracing::debug;

use super::{DataProvider, ProviderFuture, COMPANY_NEWS_LIMIT};
use crate::{
    api::{ApiClient, ApiError},
    data::{
        BasicFinancials, CandleColumns, Candles, CompanyProfile, DataSource, Freshness,
        InsiderTransaction, InstitutionHolder, NewsArticle, NewsCategory, PeersResponse, Quote,
        QuoteEnvelope, RecommendationTrend, Resolution, ScreenerQuery, ScreenerResponse, Symbol,
        SymbolMatch,
    },
    eps::EarningsEntry,
};

/// Finnhub's narrowest peer grouping.
const PEER_GROUPING: &str = "subIndustry";

/// Backend-backed provider.
#[derive(Clone)]
pub struct LiveProvider {
    client: Arc<ApiClient>,
}

struct Route {
    path: String,
    query: Vec<(&'static str, String)>,
}

impl Route {
    fn new(path: String) -> Self {
        Self {
            path,
            query: Vec::new(),
        }
    }

    fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }
}

impl LiveProvider {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    fn get<T: DeserializeOwned + Send + 'static>(&self, route: Route) -> ProviderFuture<T> {
        let client = Arc::clone(&self.client);
        async move { client.get(&route.path, &route.query).await }.boxed()
    }

    /// Reads the cached route unless `freshness` asks for live data; a cache miss
    /// falls through to the live route.
    fn cached_or_live<T: DeserializeOwned + Send + 'static>(
        &self,
        freshness: Freshness,
        cached: Route,
        live: Route,
    ) -> ProviderFuture<T> {
        let client = Arc::clone(&self.client);
        async move {
            if freshness == Freshness::Cached {
                match client.get(&cached.path, &cached.query).await {
                    Err(ApiError::NotFound) => {
                        debug!("cache miss for {}, fetching live", cached.path);
                    }
                    other => return other,
                }
            }
            client.get(&live.path, &live.query).await
        }
        .boxed()
    }
}

fn iso_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

impl DataProvider for LiveProvider {
    fn source(&self) -> DataSource {
        DataSource::Live
    }

    fn screener(&self, query: ScreenerQuery) -> ProviderFuture<ScreenerResponse> {
        let client = Arc::clone(&self.client);
        async move { client.post("screener/stocks", &query).await }.boxed()
    }

    fn search_symbols(&self, query: String) -> ProviderFuture<Vec<SymbolMatch>> {
        self.get(Route::new("finnhub/search".to_string()).param("q", query.trim()))
    }

    fn profile(&self, symbol: Symbol, freshness: Freshness) -> ProviderFuture<CompanyProfile> {
        self.cached_or_live(
            freshness,
            Route::new(format!("db/profile/{symbol}")),
            Route::new(format!("finnhub/profile/{symbol}")),
        )
    }

    fn quote(&self, symbol: Symbol) -> ProviderFuture<Quote> {
        let envelope: ProviderFuture<QuoteEnvelope> =
            self.get(Route::new(format!("finnhub/quote/{symbol}")));
        envelope.map(|result| result.map(QuoteEnvelope::into_quote)).boxed()
    }

    fn peers(&self, symbol: Symbol) -> ProviderFuture<Vec<Symbol>> {
        let response: ProviderFuture<PeersResponse> = self.get(
            Route::new(format!("finnhub/peers/{symbol}")).param("grouping", PEER_GROUPING),
        );
        response
            .map(move |result| result.map(|r| r.into_peers(&symbol)))
            .boxed()
    }

    fn basic_financials(
        &self,
        symbol: Symbol,
        freshness: Freshness,
    ) -> ProviderFuture<BasicFinancials> {
        self.cached_or_live(
            freshness,
            Route::new(format!("db/basic-financials/{symbol}")),
            Route::new(format!("finnhub/basic-financials/{symbol}")).param("metric", "all"),
        )
    }

    fn recommendations(
        &self,
        symbol: Symbol,
        freshness: Freshness,
    ) -> ProviderFuture<Vec<RecommendationTrend>> {
        self.cached_or_live(
            freshness,
            Route::new(format!("db/recommendation/{symbol}")),
            Route::new(format!("finnhub/recommendation/{symbol}")),
        )
    }

    fn earnings(
        &self,
        symbol: Symbol,
        limit: u32,
        freshness: Freshness,
    ) -> ProviderFuture<Vec<EarningsEntry>> {
        self.cached_or_live(
            freshness,
            Route::new(format!("db/earnings/{symbol}")),
            Route::new(format!("finnhub/earnings/{symbol}")).param("limit", limit),
        )
    }

    fn company_news(
        &self,
        symbol: Symbol,
        from: Date,
        to: Date,
        freshness: Freshness,
    ) -> ProviderFuture<Vec<NewsArticle>> {
        self.cached_or_live(
            freshness,
            Route::new(format!("db/company-news/{symbol}")).param("limit", COMPANY_NEWS_LIMIT),
            Route::new(format!("finnhub/company-news/{symbol}"))
                .param("from", iso_date(from))
                .param("to", iso_date(to)),
        )
    }

    fn insider_transactions(
        &self,
        symbol: Symbol,
        limit: u32,
        freshness: Freshness,
    ) -> ProviderFuture<Vec<InsiderTransaction>> {
        self.cached_or_live(
            freshness,
            Route::new(format!("db/insider-transactions/{symbol}")).param("limit", limit),
            Route::new(format!("finnhub/insider-transactions/{symbol}")).param("limit", limit),
        )
    }

    fn institution_ownership(
        &self,
        symbol: Symbol,
        limit: u32,
    ) -> ProviderFuture<Vec<InstitutionHolder>> {
        self.get(
            Route::new(format!("companies/ticker/{symbol}/institution-ownership"))
                .param("limit", limit),
        )
    }

    fn candles(
        &self,
        symbol: Symbol,
        resolution: Resolution,
        from: i64,
        to: i64,
    ) -> ProviderFuture<Candles> {
        let columns: ProviderFuture<CandleColumns> = self.get(
            Route::new(format!("finnhub/stock-candles/{symbol}"))
                .param("resolution", resolution.as_str())
                .param("from", from)
                .param("to", to),
        );
        columns.map(|result| result.map(CandleColumns::into_candles)).boxed()
    }

    fn market_news(&self, category: NewsCategory) -> ProviderFuture<Vec<NewsArticle>> {
        self.get(Route::new("finnhub/news".to_string()).param("category", category.as_str()))
    }
}

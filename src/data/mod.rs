pub mod candles;
pub mod financials;
pub mod insider;
pub mod news;
pub mod ownership;
pub mod peers;
pub mod profile;
pub mod recommendation;
pub mod screener;
pub mod slot;
pub mod stock;
pub mod stocks;
pub mod types;

pub use candles::{Candle, CandleColumns, Candles, ChartKind, Resolution, Timeframe};
pub use financials::{BasicFinancials, FinancialSeries};
pub use insider::InsiderTransaction;
pub use news::{NewsArticle, NewsCategory, NewsItem};
pub use ownership::InstitutionHolder;
pub use peers::PeersResponse;
pub use profile::CompanyProfile;
pub use recommendation::RecommendationTrend;
pub use screener::{Quote, QuoteEnvelope, ScreenerQuery, ScreenerResponse, ScreenerRow};
pub use slot::{HasData, Slot};
pub use stock::Stock;
pub use stocks::{StockStore, STOCKS};
pub use types::*;

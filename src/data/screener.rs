use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{CompanyProfile, HasData};

/// Finnhub quote (`c`, `d`, `dp`, ...), renamed for readability.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "c", default)]
    pub current: Option<f64>,
    #[serde(rename = "d", default)]
    pub change: Option<f64>,
    #[serde(rename = "dp", default)]
    pub percent_change: Option<f64>,
    #[serde(rename = "h", default)]
    pub high: Option<f64>,
    #[serde(rename = "l", default)]
    pub low: Option<f64>,
    #[serde(rename = "o", default)]
    pub open: Option<f64>,
    #[serde(rename = "pc", default)]
    pub previous_close: Option<f64>,
    #[serde(rename = "t", default)]
    pub timestamp: Option<i64>,
}

/// Finnhub answers unknown symbols with an all-zero quote.
impl HasData for Quote {
    fn has_data(&self) -> bool {
        self.current.is_some_and(|c| c != 0.0)
    }
}

/// Body of `GET /finnhub/quote/{symbol}`: the raw quote sits under `data.quote`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QuoteEnvelope {
    #[serde(default)]
    data: QuoteData,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    quote: Quote,
}

impl QuoteEnvelope {
    pub fn into_quote(self) -> Quote {
        self.data.quote
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenerRow {
    pub ticker: String,
    #[serde(default)]
    pub quote: Option<Quote>,
    #[serde(default)]
    pub profile: Option<CompanyProfile>,
    #[serde(default)]
    pub metrics: Option<IndexMap<String, serde_json::Value>>,
    #[serde(default)]
    pub fetched_at: Option<String>,
}

impl ScreenerRow {
    pub fn name(&self) -> &str {
        self.profile
            .as_ref()
            .map_or("", CompanyProfile::display_name)
    }

    /// Numeric flat metric, tolerating the odd string-typed value.
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.as_ref()?.get(key).and_then(metric_value)
    }

    pub fn pe(&self) -> Option<f64> {
        self.metric("peTTM")
            .or_else(|| self.metric("peBasicExclExtraTTM"))
            .or_else(|| self.metric("peNormalizedAnnual"))
    }
}

pub fn metric_value(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Body of `POST /screener/stocks`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenerQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<String>>,
    pub page: u32,
    pub page_size: u32,
    pub force_refresh: bool,
}

impl ScreenerQuery {
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            symbols: None,
            page: page.max(1),
            page_size: page_size.max(1),
            force_refresh: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenerResponse {
    #[serde(default)]
    pub stocks: Vec<ScreenerRow>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub total_available: u32,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default = "first_page")]
    pub total_pages: u32,
    #[serde(default)]
    pub cached_count: u32,
    #[serde(default)]
    pub fresh_count: u32,
    #[serde(default)]
    pub fetched_at: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

fn first_page() -> u32 {
    1
}

impl HasData for ScreenerResponse {
    fn has_data(&self) -> bool {
        !self.stocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_envelope_unwraps_and_zero_quotes_are_empty() {
        let envelope: QuoteEnvelope = serde_json::from_str(
            r#"{"ticker":"AAPL","data":{"quote":{"c":189.5,"d":1.2,"dp":0.64,"h":190.1,"l":187.0,"o":188.0,"pc":188.3,"t":1718000000},
                "_metadata":{"symbol":"AAPL","endpoint":"/quote"}},"saved_to_db":false,"record_id":null}"#,
        )
        .unwrap();
        let quote = envelope.into_quote();
        assert_eq!(quote.previous_close, Some(188.3));
        assert!(quote.has_data());

        let unknown: QuoteEnvelope =
            serde_json::from_str(r#"{"data":{"quote":{"c":0,"d":null,"dp":null,"h":0,"l":0,"o":0,"pc":0,"t":0}}}"#)
                .unwrap();
        assert!(!unknown.into_quote().has_data());
    }

    #[test]
    fn reads_screener_page() {
        let raw = r#"{
            "stocks": [{
                "ticker": "MSFT",
                "quote": {"c": 415.5, "d": -2.1, "dp": -0.5, "h": 420.0, "l": 410.2, "o": 418.0, "pc": 417.6, "t": 1718000000},
                "profile": {"name": "Microsoft Corp", "finnhubIndustry": "Technology"},
                "metrics": {"peTTM": 36.2, "52WeekHigh": "430.8"}
            }],
            "total": 1, "total_available": 503, "page": 2, "page_size": 20, "total_pages": 26,
            "cached_count": 1, "fresh_count": 0, "fetched_at": "2024-06-10T12:00:00", "source": "cache"
        }"#;
        let page: ScreenerResponse = serde_json::from_str(raw).unwrap();
        let row = &page.stocks[0];
        assert_eq!(row.name(), "Microsoft Corp");
        assert_eq!(row.pe(), Some(36.2));
        assert_eq!(row.metric("52WeekHigh"), Some(430.8));
        assert_eq!(row.quote.as_ref().and_then(|q| q.previous_close), Some(417.6));
        assert_eq!(page.total_pages, 26);
    }

    #[test]
    fn query_omits_symbols_when_paging() {
        let body = serde_json::to_value(ScreenerQuery::page(0, 20)).unwrap();
        assert_eq!(body["page"], 1);
        assert!(body.get("symbols").is_none());
    }
}

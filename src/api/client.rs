use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{rate_limiter::RateLimiter, ApiError};

/// HTTP client for the market-data backend. Every call goes through the shared
/// [`RateLimiter`].
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, rate_limit: u32) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::new(rate_limit, rate_limit.saturating_mul(2)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let url = url.as_str();
        let http = &self.http;
        self.limiter
            .execute(path, move || async move {
                let response = http.get(url).query(query).send().await?;
                read_body(response).await
            })
            .await
    }

    pub async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let url = url.as_str();
        let http = &self.http;
        self.limiter
            .execute(path, move || async move {
                let response = http.post(url).json(body).send().await?;
                read_body(response).await
            })
            .await
    }
}

async fn read_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let url = response.url().path().to_string();
    let body = response.text().await?;
    if !status.is_success() {
        let err = ApiError::from_status(status.as_u16(), &body);
        if matches!(err, ApiError::NotFound) {
            debug!("{} -> 404", url);
        } else {
            warn!("{} -> {}", url, err);
        }
        return Err(err);
    }
    decode_envelope(&body)
}

/// Accepts both bare payloads and the backend's wrappers: `{"symbol", "data": ...}` for
/// Finnhub proxies and `{"count", "result": [...]}` for symbol search.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let mut value: serde_json::Value = serde_json::from_str(body)?;
    if let Some(object) = value.as_object_mut() {
        if let Some(data) = object.remove("data") {
            return Ok(serde_json::from_value(data)?);
        }
        if object.contains_key("count") {
            if let Some(result) = object.remove("result") {
                return Ok(serde_json::from_value(result)?);
            }
        }
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CompanyProfile, ScreenerResponse, SymbolMatch};

    #[test]
    fn unwraps_data_envelope() {
        let profile: CompanyProfile = decode_envelope(
            r#"{"symbol":"AAPL","data":{"name":"Apple Inc","ticker":"AAPL"},"from_cache":true}"#,
        )
        .unwrap();
        assert_eq!(profile.name.as_deref(), Some("Apple Inc"));
    }

    #[test]
    fn accepts_bare_payloads() {
        let page: ScreenerResponse =
            decode_envelope(r#"{"stocks":[],"total":0,"page":1,"total_pages":1}"#).unwrap();
        assert!(page.stocks.is_empty());

        let list: Vec<u32> = decode_envelope("[1,2,3]").unwrap();
        assert_eq!(list, [1, 2, 3]);
    }

    #[test]
    fn unwraps_search_result() {
        let matches: Vec<SymbolMatch> = decode_envelope(
            r#"{"count":1,"result":[{"description":"APPLE INC","displaySymbol":"AAPL","symbol":"AAPL","type":"Common Stock"}]}"#,
        )
        .unwrap();
        assert_eq!(matches[0].kind, "Common Stock");
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        let err = decode_envelope::<CompanyProfile>("<html>").unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn joins_base_and_path() {
        let client = ApiClient::new("http://localhost:8000/api/v1/", Duration::from_secs(1), 10)
            .unwrap();
        assert_eq!(client.url("/db/profile/AAPL"), "http://localhost:8000/api/v1/db/profile/AAPL");
        assert_eq!(client.base_url(), "http://localhost:8000/api/v1");
    }
}

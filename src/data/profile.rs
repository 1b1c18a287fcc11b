use serde::{Deserialize, Serialize};

use super::HasData;

/// Finnhub `profile2` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub finnhub_industry: Option<String>,
    #[serde(default)]
    pub ipo: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    /// In millions of `currency`.
    #[serde(default)]
    pub market_capitalization: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// In millions of shares.
    #[serde(default)]
    pub share_outstanding: Option<f64>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub weburl: Option<String>,
}

impl HasData for CompanyProfile {
    fn has_data(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.is_empty())
            || self.ticker.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl CompanyProfile {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.ticker.as_deref())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_profile2_payload() {
        let raw = r#"{
            "country": "US", "currency": "USD", "exchange": "NASDAQ NMS - GLOBAL MARKET",
            "finnhubIndustry": "Technology", "ipo": "1980-12-12",
            "logo": "https://static.finnhub.io/logo/87cb30d8-80df-11ea-8951-00000000092a.png",
            "marketCapitalization": 2853416.5, "name": "Apple Inc", "phone": "14089961010",
            "shareOutstanding": 15441.88, "ticker": "AAPL", "weburl": "https://www.apple.com/"
        }"#;
        let profile: CompanyProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.finnhub_industry.as_deref(), Some("Technology"));
        assert!(profile.has_data());
        assert_eq!(profile.display_name(), "Apple Inc");
    }

    #[test]
    fn empty_object_has_no_data() {
        let profile: CompanyProfile = serde_json::from_str("{}").unwrap();
        assert!(!profile.has_data());
    }
}

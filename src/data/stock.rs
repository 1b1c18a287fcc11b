use serde::{Deserialize, Serialize};

use super::{CompanyProfile, Quote, ScreenerRow, Symbol};

/// What is known about a ticker across pages.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Stock {
    pub symbol: Symbol,
    pub name: String,
    pub quote: Option<Quote>,
    pub profile: Option<CompanyProfile>,
}

impl Stock {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            ..Default::default()
        }
    }

    /// Get display name, fallback to the ticker if name is empty
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.symbol.as_str()
        } else {
            &self.name
        }
    }

    pub fn last_price(&self) -> Option<f64> {
        self.quote.as_ref().and_then(|q| q.current)
    }

    pub fn percent_change(&self) -> Option<f64> {
        self.quote.as_ref().and_then(|q| q.percent_change)
    }

    /// Merges a screener row; fields the row lacks are kept.
    pub fn update_from_row(&mut self, row: &ScreenerRow) {
        if let Some(quote) = &row.quote {
            self.quote = Some(quote.clone());
        }
        if let Some(profile) = &row.profile {
            self.update_from_profile(profile);
        }
    }

    pub fn update_from_profile(&mut self, profile: &CompanyProfile) {
        let name = profile.display_name();
        if !name.is_empty() {
            self.name = name.to_string();
        }
        self.profile = Some(profile.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_symbol() {
        let mut stock = Stock::new(Symbol::new("aapl"));
        assert_eq!(stock.display_name(), "AAPL");

        stock.update_from_profile(&CompanyProfile {
            name: Some("Apple Inc".to_string()),
            ..Default::default()
        });
        assert_eq!(stock.display_name(), "Apple Inc");
    }

    #[test]
    fn row_without_quote_keeps_previous_quote() {
        let mut stock = Stock::new(Symbol::new("MSFT"));
        stock.quote = Some(Quote {
            current: Some(410.0),
            ..Default::default()
        });
        stock.update_from_row(&ScreenerRow {
            ticker: "MSFT".to_string(),
            ..Default::default()
        });
        assert_eq!(stock.last_price(), Some(410.0));
    }
}

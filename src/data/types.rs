use serde::{Deserialize, Serialize};

/// Ticker symbol, always upper-case (e.g. `AAPL`, `BRK.B`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol {
    inner: String,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("symbol is empty")]
    Empty,
    #[error("symbol `{0}` is longer than 10 characters")]
    TooLong(String),
    #[error("symbol `{0}` contains characters other than A-Z, 0-9, `.` and `-`")]
    InvalidChar(String),
}

impl Symbol {
    /// Normalises without validation; used for tickers coming back from the backend.
    pub fn new(symbol: &str) -> Self {
        Self {
            inner: symbol.trim().to_ascii_uppercase(),
        }
    }

    /// Validates user input.
    pub fn parse(input: &str) -> Result<Self, SymbolError> {
        let symbol = Self::new(input);
        if symbol.inner.is_empty() {
            return Err(SymbolError::Empty);
        }
        if symbol.inner.len() > 10 {
            return Err(SymbolError::TooLong(symbol.inner));
        }
        if !symbol
            .inner
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-')
        {
            return Err(SymbolError::InvalidChar(symbol.inner));
        }
        Ok(symbol)
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl std::str::FromStr for Symbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Where page data comes from. Chosen once at start-up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Live,
    Mock,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Mock => "mock",
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "mock" => Ok(Self::Mock),
            other => Err(format!("unknown data source `{other}` (expected `live` or `mock`)")),
        }
    }
}

/// Cached reads come from the backend's database, live reads go through to the upstream API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Freshness {
    #[default]
    Cached,
    Live,
}

/// Result of Finnhub's symbol lookup, used by the search popup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolMatch {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub display_symbol: String,
    pub symbol: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_input_is_normalised() {
        assert_eq!(Symbol::parse(" aapl ").unwrap().as_str(), "AAPL");
        assert_eq!(Symbol::parse("brk.b").unwrap().as_str(), "BRK.B");
    }

    #[test]
    fn symbol_input_is_validated() {
        assert_eq!(Symbol::parse("   "), Err(SymbolError::Empty));
        assert!(matches!(
            Symbol::parse("ABCDEFGHIJK"),
            Err(SymbolError::TooLong(_))
        ));
        assert!(matches!(
            Symbol::parse("AA PL"),
            Err(SymbolError::InvalidChar(_))
        ));
    }

    #[test]
    fn data_source_parses_case_insensitively() {
        assert_eq!("MOCK".parse::<DataSource>(), Ok(DataSource::Mock));
        assert_eq!(" live".parse::<DataSource>(), Ok(DataSource::Live));
        assert!("replay".parse::<DataSource>().is_err());
    }

    #[test]
    fn symbol_match_reads_finnhub_shape() {
        let raw = r#"{"description":"APPLE INC","displaySymbol":"AAPL","symbol":"AAPL","type":"Common Stock"}"#;
        let parsed: SymbolMatch = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.kind, "Common Stock");
        assert_eq!(parsed.display_symbol, "AAPL");
    }
}

use std::time::Duration;

use crate::{cli::Args, data::DataSource, data::Symbol};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_RATE_LIMIT: u32 = 10;

const API_URL_ENV: &str = "MARKETDESK_API_URL";
const DATA_SOURCE_ENV: &str = "MARKETDESK_DATA_SOURCE";
const LOCALE_ENV: &str = "MARKETDESK_LOCALE";
const TIMEOUT_ENV: &str = "MARKETDESK_TIMEOUT_SECS";
const RATE_LIMIT_ENV: &str = "MARKETDESK_RATE_LIMIT";

/// Locales with a translation file.
pub const LOCALES: [&str; 2] = ["en", "zh-CN"];

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}: {message}")]
    Invalid { key: &'static str, message: String },
    #[error("{key}={value} is outside {min}..={max}")]
    OutOfRange {
        key: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub source: DataSource,
    pub locale: String,
    pub timeout: Duration,
    /// Requests per second.
    pub rate_limit: u32,
    /// Ticker to open on start-up.
    pub symbol: Option<Symbol>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            source: DataSource::default(),
            locale: "en".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            rate_limit: DEFAULT_RATE_LIMIT,
            symbol: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`, which answers environment-variable queries.
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(url) = get(API_URL_ENV) {
            config.api_url = validate_url(API_URL_ENV, &url)?;
        }
        if let Some(source) = get(DATA_SOURCE_ENV) {
            config.source = source.parse().map_err(|message| ConfigError::Invalid {
                key: DATA_SOURCE_ENV,
                message,
            })?;
        }
        config.locale = get(LOCALE_ENV)
            .or_else(|| get("LC_ALL"))
            .or_else(|| get("LANG"))
            .map_or_else(|| "en".to_string(), |raw| normalize_locale(&raw));
        if let Some(raw) = get(TIMEOUT_ENV) {
            let secs = parse_in_range(TIMEOUT_ENV, &raw, 1, 120)?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get(RATE_LIMIT_ENV) {
            let rate = parse_in_range(RATE_LIMIT_ENV, &raw, 1, 100)?;
            config.rate_limit = u32::try_from(rate).unwrap_or(DEFAULT_RATE_LIMIT);
        }
        Ok(config)
    }

    /// Command-line flags win over the environment.
    #[must_use]
    pub fn with_args(mut self, args: &Args) -> Self {
        if let Some(source) = args.source {
            self.source = source;
        }
        if let Some(url) = &args.api_url {
            self.api_url.clone_from(url);
        }
        if args.symbol.is_some() {
            self.symbol.clone_from(&args.symbol);
        }
        self
    }
}

fn validate_url(key: &'static str, url: &str) -> Result<String, ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(ConfigError::Invalid {
            key,
            message: format!("`{url}` is not an http(s) URL"),
        })
    }
}

fn parse_in_range(key: &'static str, raw: &str, min: u64, max: u64) -> Result<u64, ConfigError> {
    let value: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
        key,
        message: format!("`{raw}` is not a whole number"),
    })?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            key,
            value,
            min,
            max,
        })
    }
}

/// `zh_CN.UTF-8` -> `zh-CN`; anything without a translation becomes `en`.
pub fn normalize_locale(raw: &str) -> String {
    let base = raw.split('.').next().unwrap_or(raw).replace('_', "-");
    if let Some(known) = LOCALES.iter().find(|l| l.eq_ignore_ascii_case(&base)) {
        return (*known).to_string();
    }
    if base.to_ascii_lowercase().starts_with("zh") {
        "zh-CN".to_string()
    } else {
        "en".to_string()
    }
}

pub fn print_config_guide() {
    eprintln!("MarketDesk configuration");
    eprintln!();
    eprintln!("Environment variables (a .env file in the working directory is read too):");
    eprintln!("  {API_URL_ENV}=<url>         backend base URL (default {DEFAULT_API_URL})");
    eprintln!("  {DATA_SOURCE_ENV}=live|mock");
    eprintln!("  {LOCALE_ENV}=en|zh-CN");
    eprintln!("  {TIMEOUT_ENV}=1..120        request timeout in seconds (default {DEFAULT_TIMEOUT_SECS})");
    eprintln!("  {RATE_LIMIT_ENV}=1..100       requests per second (default {DEFAULT_RATE_LIMIT})");
    eprintln!("  {}=<dir>            log directory", crate::logger::LOG_DIR_ENV);
    eprintln!("  {}=<filter>             log filter, e.g. error,marketdesk=info", crate::logger::LOG_FILTER_ENV);
    eprintln!();
    eprintln!("Run with --mock to try the dashboard without a backend.");
}

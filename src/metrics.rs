//! Financial metric time series, reshaped for charting.

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, Date, Month, OffsetDateTime};

/// Raw `{ "period": ..., "v": ... }` entry of a basic-financials series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSeriesEntry {
    pub period: String,
    #[serde(default)]
    pub v: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cadence {
    #[default]
    Annual,
    Quarterly,
}

impl Cadence {
    pub fn label(self) -> String {
        match self {
            Self::Annual => t!("Metrics.Annual"),
            Self::Quarterly => t!("Metrics.Quarterly"),
        }
    }

    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Annual => Self::Quarterly,
            Self::Quarterly => Self::Annual,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SeriesPoint {
    pub period: String,
    pub date: Option<Date>,
    pub value: f64,
}

/// A chart-ready metric: never empty, oldest point first.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedSeries {
    pub key: String,
    pub label: String,
    pub cadence: Cadence,
    pub points: Vec<SeriesPoint>,
    pub info: MetricInfo,
}

impl NamedSeries {
    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// `(index, value)` pairs for an evenly spaced line chart.
    pub fn xy(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.value))
            .collect()
    }

    /// Smallest and largest value.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.points.iter().map(|p| p.value).fold(None, |acc, v| {
            Some(acc.map_or((v, v), |(lo, hi): (f64, f64)| (lo.min(v), hi.max(v))))
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricInfo {
    pub acronym: String,
    pub description: String,
}

/// Turns raw series into renderable ones. Keys keep their input order; entries
/// without a value and series left empty are dropped.
pub fn normalize_series(
    raw: &IndexMap<String, Vec<MetricSeriesEntry>>,
    cadence: Cadence,
) -> Vec<NamedSeries> {
    raw.iter()
        .filter_map(|(key, entries)| {
            let mut points: Vec<SeriesPoint> = entries
                .iter()
                .filter_map(|entry| {
                    let value = entry.v.filter(|v| v.is_finite())?;
                    Some(SeriesPoint {
                        period: entry.period.clone(),
                        date: parse_period(&entry.period),
                        value,
                    })
                })
                .collect();
            if points.is_empty() {
                return None;
            }
            // Stable; unparseable periods sink to the end in input order.
            points.sort_by_key(|p| (p.date.is_none(), p.date));
            let label = format!("{} ({})", humanize_key(key), cadence_suffix(cadence));
            Some(NamedSeries {
                key: key.clone(),
                info: metric_info(key),
                label,
                cadence,
                points,
            })
        })
        .collect()
}

fn cadence_suffix(cadence: Cadence) -> &'static str {
    match cadence {
        Cadence::Annual => "Annual",
        Cadence::Quarterly => "Quarterly",
    }
}

/// `YYYY-MM-DD`, RFC 3339, `YYYY-MM`, `YYYY-Qn` or `YYYY`.
pub fn parse_period(period: &str) -> Option<Date> {
    let period = period.trim();
    if let Ok(at) = OffsetDateTime::parse(period, &Rfc3339) {
        return Some(at.date());
    }
    let mut parts = period.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let Some(second) = parts.next() else {
        return Date::from_calendar_date(year, Month::January, 1).ok();
    };
    if let Some(quarter) = second.strip_prefix(['Q', 'q']) {
        let quarter: u8 = quarter.parse().ok().filter(|q| (1..=4).contains(q))?;
        let month = Month::try_from(quarter * 3 - 2).ok()?;
        return Date::from_calendar_date(year, month, 1).ok();
    }
    let month = Month::try_from(second.parse::<u8>().ok()?).ok()?;
    let day = match parts.next() {
        Some(day) => day.get(..2).unwrap_or(day).parse().ok()?,
        None => 1,
    };
    Date::from_calendar_date(year, month, day).ok()
}

/// `longtermDebtTotalAsset` -> `Longterm Debt Total Asset`, `fcfPerShareTTM` ->
/// `Fcf Per Share TTM`.
pub fn humanize_key(key: &str) -> String {
    key.to_case(Case::Title)
        .split(' ')
        .map(|word| {
            if word.eq_ignore_ascii_case("ttm") {
                "TTM"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Acronym and explanation for a metric key.
pub fn metric_info(key: &str) -> MetricInfo {
    if let Some((_, acronym, description)) = METRIC_TABLE.iter().find(|(k, _, _)| *k == key) {
        return MetricInfo {
            acronym: (*acronym).to_string(),
            description: (*description).to_string(),
        };
    }
    MetricInfo {
        acronym: key.to_uppercase(),
        description: t!("Metrics.GenericDescription", label = humanize_key(key)),
    }
}

static METRIC_TABLE: &[(&str, &str, &str)] = &[
    ("assetTurnover", "AT", "Revenue divided by average total assets. Shows how much sales the company squeezes out of every dollar of assets."),
    ("bookValue", "BV", "Total assets minus total liabilities. What shareholders would own on paper if the company were wound up."),
    ("cashRatio", "CR", "Cash and equivalents divided by current liabilities. The strictest test of short-term liquidity."),
    ("currentRatio", "CUR", "Current assets divided by current liabilities. Above 1 means near-term obligations are covered by near-term assets."),
    ("ebitPerShare", "EBIT/S", "Earnings before interest and taxes per share. Operating profit attributable to each share before financing and tax effects."),
    ("eps", "EPS", "Net income divided by shares outstanding. The profit attributable to each share of common stock."),
    ("ev", "EV", "Enterprise value: market capitalisation plus debt minus cash. The theoretical price of buying the whole business."),
    ("fcfMargin", "FCFM", "Free cash flow as a share of revenue. How much of each sales dollar turns into cash the company can freely use."),
    ("fcfPerShareTTM", "FCF/S", "Free cash flow per share over the trailing twelve months."),
    ("grossMargin", "GM", "Gross profit as a share of revenue. What is left after the direct cost of producing goods or services."),
    ("inventoryTurnover", "IT", "Cost of goods sold divided by average inventory. How many times inventory is sold and replaced in a period."),
    ("longtermDebtTotalAsset", "LTD/A", "Long-term debt divided by total assets. The share of assets financed with debt due after more than a year."),
    ("longtermDebtTotalCapital", "LTD/C", "Long-term debt divided by total capital. Measures how much of the permanent financing comes from lenders."),
    ("longtermDebtTotalEquity", "LTD/E", "Long-term debt divided by shareholders' equity. A leverage gauge focused on long-dated borrowing."),
    ("netDebtToTotalCapital", "ND/C", "Debt minus cash, divided by total capital. Leverage after netting out the cash pile."),
    ("netDebtToTotalEquity", "ND/E", "Debt minus cash, divided by shareholders' equity."),
    ("netMargin", "NM", "Net income as a share of revenue. The fraction of each sales dollar that ends up as profit."),
    ("operatingMargin", "OM", "Operating income as a share of revenue. Profitability of the core business before interest and taxes."),
    ("payoutRatio", "PR", "Dividends divided by net income. The portion of earnings returned to shareholders as cash."),
    ("pb", "P/B", "Share price divided by book value per share. Below 1 means the market values the company under its accounting net worth."),
    ("pe", "P/E", "Share price divided by earnings per share. How many years of current earnings the market is paying for."),
    ("pfcf", "P/FCF", "Share price divided by free cash flow per share. A valuation multiple that is harder to flatter with accounting choices than P/E."),
    ("pretaxMargin", "PTM", "Pre-tax income as a share of revenue."),
    ("ps", "P/S", "Market capitalisation divided by revenue. Useful for companies that are not yet profitable."),
    ("ptbv", "P/TBV", "Share price divided by tangible book value per share, excluding goodwill and other intangibles."),
    ("quickRatio", "QR", "Liquid current assets excluding inventory, divided by current liabilities."),
    ("receivablesTurnover", "RT", "Revenue divided by average receivables. How quickly customers pay what they owe."),
    ("roa", "ROA", "Net income divided by total assets. How efficiently the asset base generates profit."),
    ("roe", "ROE", "Net income divided by shareholders' equity. The return earned on the owners' capital."),
    ("roic", "ROIC", "Operating profit after tax divided by invested capital. Return on all capital, from lenders and owners alike."),
    ("rotc", "ROTC", "Return on total capital: operating profit divided by debt plus equity."),
    ("salesPerShare", "S/S", "Revenue divided by shares outstanding."),
    ("sgaToSale", "SGA/S", "Selling, general and administrative expenses as a share of revenue. A gauge of overhead discipline."),
    ("tangibleBookValue", "TBV", "Book value excluding goodwill and intangible assets."),
    ("totalDebtToEquity", "D/E", "Total debt divided by shareholders' equity. The classic measure of financial leverage."),
    ("totalDebtToTotalAsset", "D/A", "Total debt divided by total assets."),
    ("totalDebtToTotalCapital", "D/C", "Total debt divided by debt plus equity."),
    ("totalRatio", "TR", "Total assets divided by total liabilities. Solvency from the balance sheet's point of view."),
    ("evEbitdaTTM", "EV/EBITDA", "Enterprise value divided by trailing EBITDA. A capital-structure neutral valuation multiple."),
    ("dividendYield", "DY", "Annual dividends per share divided by the share price."),
];

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn entry(period: &str, v: Option<f64>) -> MetricSeriesEntry {
        MetricSeriesEntry {
            period: period.to_string(),
            v,
        }
    }

    #[test]
    fn empty_series_are_dropped() {
        let raw: IndexMap<String, Vec<MetricSeriesEntry>> = [
            ("roe".to_string(), vec![]),
            ("pe".to_string(), vec![entry("2023-12-31", Some(30.0))]),
        ]
        .into_iter()
        .collect();
        let series = normalize_series(&raw, Cadence::Annual);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].key, "pe");
        assert_eq!(series[0].points.len(), 1);
        assert_eq!(series[0].label, "Pe (Annual)");
        assert_eq!(series[0].info.acronym, "P/E");
    }

    #[test]
    fn points_are_sorted_oldest_first() {
        let raw: IndexMap<String, Vec<MetricSeriesEntry>> = [(
            "grossMargin".to_string(),
            vec![
                entry("2023-09-30", Some(0.44)),
                entry("2021-09-25", Some(0.41)),
                entry("2022-09-24", Some(0.43)),
            ],
        )]
        .into_iter()
        .collect();
        let series = normalize_series(&raw, Cadence::Quarterly);
        let periods: Vec<_> = series[0].points.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, ["2021-09-25", "2022-09-24", "2023-09-30"]);
        assert_eq!(series[0].label, "Gross Margin (Quarterly)");
        assert_eq!(series[0].latest().map(|p| p.value), Some(0.44));
        assert_eq!(series[0].bounds(), Some((0.41, 0.44)));
    }

    #[test]
    fn null_values_are_skipped_and_all_null_series_dropped() {
        let raw: IndexMap<String, Vec<MetricSeriesEntry>> = [
            ("roa".to_string(), vec![entry("2023", None)]),
            (
                "roe".to_string(),
                vec![entry("2023", Some(1.5)), entry("2022", None)],
            ),
        ]
        .into_iter()
        .collect();
        let series = normalize_series(&raw, Cadence::Annual);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points.len(), 1);
    }

    #[test]
    fn unparseable_periods_sink_in_input_order() {
        let raw: IndexMap<String, Vec<MetricSeriesEntry>> = [(
            "eps".to_string(),
            vec![
                entry("later", Some(3.0)),
                entry("2020-01-01", Some(1.0)),
                entry("sometime", Some(4.0)),
            ],
        )]
        .into_iter()
        .collect();
        let series = normalize_series(&raw, Cadence::Annual);
        let periods: Vec<_> = series[0].points.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, ["2020-01-01", "later", "sometime"]);
    }

    #[test]
    fn parses_period_shapes() {
        assert_eq!(parse_period("2023-12-31"), Some(date!(2023 - 12 - 31)));
        assert_eq!(parse_period("2023-12"), Some(date!(2023 - 12 - 01)));
        assert_eq!(parse_period("2023"), Some(date!(2023 - 01 - 01)));
        assert_eq!(parse_period("2024-Q3"), Some(date!(2024 - 07 - 01)));
        assert_eq!(parse_period("2024-03-31T00:00:00Z"), Some(date!(2024 - 03 - 31)));
        assert_eq!(parse_period("2024-Q5"), None);
        assert_eq!(parse_period("n/a"), None);
    }

    #[test]
    fn humanizes_camel_case_keys() {
        assert_eq!(humanize_key("longtermDebtTotalAsset"), "Longterm Debt Total Asset");
        assert_eq!(humanize_key("fcfPerShareTTM"), "Fcf Per Share TTM");
        assert_eq!(humanize_key("evEbitdaTTM"), "Ev Ebitda TTM");
        assert_eq!(humanize_key("net_margin"), "Net Margin");
    }

    #[test]
    fn known_table_covers_common_metrics() {
        assert!(METRIC_TABLE.len() >= 40);
        for key in ["roe", "pe", "netMargin", "totalDebtToEquity"] {
            assert!(METRIC_TABLE.iter().any(|(k, _, _)| *k == key), "{key}");
        }
        assert_eq!(metric_info("roe").acronym, "ROE");
        assert_eq!(metric_info("totalDebtToEquity").acronym, "D/E");
    }

    #[test]
    fn unknown_keys_get_generated_info() {
        let _guard = crate::helper::TEST_LOCALE_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        rust_i18n::set_locale("en");
        let info = metric_info("cashFlowCoverage");
        assert_eq!(info.acronym, "CASHFLOWCOVERAGE");
        assert!(info.description.contains("Cash Flow Coverage"));
    }
}

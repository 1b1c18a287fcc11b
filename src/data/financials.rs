use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::HasData;
use crate::metrics::{Cadence, MetricSeriesEntry};

/// `basic-financials` payload: flat headline metrics plus per-cadence time series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicFinancials {
    #[serde(default)]
    pub metric: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub series: FinancialSeries,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSeries {
    #[serde(default)]
    pub annual: IndexMap<String, Vec<MetricSeriesEntry>>,
    #[serde(default)]
    pub quarterly: IndexMap<String, Vec<MetricSeriesEntry>>,
}

impl FinancialSeries {
    pub fn by_cadence(&self, cadence: Cadence) -> &IndexMap<String, Vec<MetricSeriesEntry>> {
        match cadence {
            Cadence::Annual => &self.annual,
            Cadence::Quarterly => &self.quarterly,
        }
    }
}

impl BasicFinancials {
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metric.get(key).and_then(super::screener::metric_value)
    }
}

impl HasData for BasicFinancials {
    fn has_data(&self) -> bool {
        !self.metric.is_empty() || !self.series.annual.is_empty() || !self.series.quarterly.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_metrics_and_series_with_nulls() {
        let financials: BasicFinancials = serde_json::from_str(
            r#"{"metric":{"peTTM":28.4,"52WeekHigh":"199.6","beta":null},
                "series":{"annual":{"eps":[{"period":"2023-09-30","v":6.13},{"period":"2022-09-24","v":null}]}}}"#,
        )
        .unwrap();
        assert!(financials.has_data());
        assert_eq!(financials.metric("peTTM"), Some(28.4));
        assert_eq!(financials.metric("52WeekHigh"), Some(199.6));
        assert_eq!(financials.metric("beta"), None);
        let eps = &financials.series.by_cadence(Cadence::Annual)["eps"];
        assert_eq!(eps[1].v, None);
        assert!(financials.series.by_cadence(Cadence::Quarterly).is_empty());
    }

    #[test]
    fn empty_payload_has_no_data() {
        let financials: BasicFinancials = serde_json::from_str("{}").unwrap();
        assert!(!financials.has_data());
    }
}

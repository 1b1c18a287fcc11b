//! Earnings surprise derivation for the EPS chart.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::metrics::parse_period;

/// One row of the earnings history endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsEntry {
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub actual: Option<f64>,
    #[serde(default)]
    pub estimate: Option<f64>,
    #[serde(default)]
    pub surprise: Option<f64>,
    #[serde(default)]
    pub surprise_percent: Option<f64>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub quarter: Option<u8>,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EarningsSurprisePoint {
    pub period: String,
    pub actual: f64,
    pub estimate: f64,
    /// `actual - estimate`.
    pub surprise: f64,
    pub label: String,
}

impl EarningsSurprisePoint {
    pub fn is_beat(&self) -> bool {
        self.surprise >= 0.0
    }
}

/// Y axis of the EPS chart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpsAxis {
    pub domain: [f64; 2],
    pub ticks: [f64; 5],
}

/// Entries with both figures, oldest first, with their surprise labels.
pub fn compute_eps_surprises(earnings: &[EarningsEntry]) -> Vec<EarningsSurprisePoint> {
    let mut points: Vec<_> = earnings
        .iter()
        .filter_map(|entry| {
            let actual = entry.actual.filter(|v| v.is_finite())?;
            let estimate = entry.estimate.filter(|v| v.is_finite())?;
            let surprise = actual - estimate;
            Some((
                parse_period(&entry.period),
                EarningsSurprisePoint {
                    period: entry.period.clone(),
                    actual,
                    estimate,
                    surprise,
                    label: surprise_label(surprise),
                },
            ))
        })
        .collect();
    points.sort_by_key(|(date, _)| (date.is_none(), *date));
    points.into_iter().map(|(_, point)| point).collect()
}

#[allow(clippy::float_cmp)]
pub fn surprise_label(surprise: f64) -> String {
    let diff = surprise.abs();
    if diff == 0.0 {
        "Beat: 0".to_string()
    } else if surprise > 0.0 {
        format!("Beat: {diff:.2}")
    } else {
        format!("Missed: {diff:.2}")
    }
}

/// Distinct periods in first-seen order.
pub fn x_ticks(points: &[EarningsSurprisePoint]) -> Vec<String> {
    points
        .iter()
        .map(|p| p.period.clone())
        .unique()
        .collect()
}

/// Padded domain over every actual and estimate, with five evenly spaced ticks.
#[allow(clippy::float_cmp)]
pub fn eps_axis(points: &[EarningsSurprisePoint]) -> Option<EpsAxis> {
    let (min, max) = points
        .iter()
        .flat_map(|p| [p.actual, p.estimate])
        .minmax_by(f64::total_cmp)
        .into_option()?;
    let range = if max == min { 0.2 } else { max - min };
    let padding = range * 0.2;
    let domain = [min - padding, max + padding];
    let step = (domain[1] - domain[0]) / 4.0;
    let ticks = std::array::from_fn(|i| round2(domain[0] + step * i as f64));
    Some(EpsAxis { domain, ticks })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(period: &str, actual: Option<f64>, estimate: Option<f64>) -> EarningsEntry {
        EarningsEntry {
            period: period.to_string(),
            actual,
            estimate,
            ..Default::default()
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn labels_follow_sign_and_zero_rule() {
        let points = compute_eps_surprises(&[
            entry("2024-03-31", Some(2.67), Some(2.50)),
            entry("2024-06-30", Some(1.00), Some(1.00)),
            entry("2024-09-30", Some(0.90), Some(1.00)),
        ]);
        let labels: Vec<_> = points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["Beat: 0.17", "Beat: 0", "Missed: 0.10"]);
        assert!(points[1].is_beat());
        assert!(!points[2].is_beat());
    }

    #[test]
    fn entries_missing_a_figure_are_excluded() {
        let points = compute_eps_surprises(&[
            entry("2024-Q1", Some(2.0), Some(2.2)),
            entry("2024-Q2", None, Some(2.1)),
        ]);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].period, "2024-Q1");
        assert_eq!(points[0].label, "Missed: 0.20");
    }

    #[test]
    fn sorted_chronologically() {
        let points = compute_eps_surprises(&[
            entry("2024-06-30", Some(1.4), Some(1.3)),
            entry("2023-12-31", Some(2.1), Some(2.0)),
            entry("2024-03-31", Some(1.5), Some(1.5)),
        ]);
        let periods: Vec<_> = points.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, ["2023-12-31", "2024-03-31", "2024-06-30"]);
    }

    #[test]
    fn parses_earnings_payload() {
        let entries: Vec<EarningsEntry> = serde_json::from_str(
            r#"[{"actual":2.18,"estimate":2.1,"period":"2024-03-31","quarter":1,
                 "surprise":0.08,"surprisePercent":3.8095,"symbol":"AAPL","year":2024},
                {"actual":null,"estimate":1.5,"period":"2024-06-30"}]"#,
        )
        .unwrap();
        assert_eq!(entries[0].surprise_percent, Some(3.8095));
        assert_eq!(compute_eps_surprises(&entries).len(), 1);
    }

    #[test]
    fn x_ticks_are_unique_in_first_seen_order() {
        let points = compute_eps_surprises(&[
            entry("2024-03-31", Some(1.0), Some(1.1)),
            entry("2024-03-31", Some(1.2), Some(1.1)),
            entry("2024-06-30", Some(1.3), Some(1.1)),
        ]);
        assert_eq!(x_ticks(&points), ["2024-03-31", "2024-06-30"]);
    }

    #[test]
    fn axis_pads_range_by_a_fifth() {
        let points = compute_eps_surprises(&[
            entry("2024-03-31", Some(1.0), Some(1.5)),
            entry("2024-06-30", Some(2.0), Some(1.8)),
        ]);
        let axis = eps_axis(&points).unwrap();
        assert!(close(axis.domain[0], 0.8));
        assert!(close(axis.domain[1], 2.2));
        let expected = [0.8, 1.15, 1.5, 1.85, 2.2];
        for (tick, want) in axis.ticks.iter().zip(expected) {
            assert!(close(*tick, want), "{tick} != {want}");
        }
    }

    #[test]
    fn flat_values_use_fallback_range() {
        let points = compute_eps_surprises(&[entry("2024-03-31", Some(1.0), Some(1.0))]);
        let axis = eps_axis(&points).unwrap();
        assert!(close(axis.domain[0], 0.96));
        assert!(close(axis.domain[1], 1.04));
        assert!(close(axis.ticks[2], 1.0));
    }

    #[test]
    fn no_points_no_axis() {
        assert_eq!(eps_axis(&[]), None);
    }
}

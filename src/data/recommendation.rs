use serde::{Deserialize, Serialize};

/// Analyst recommendation counts for one month.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationTrend {
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub strong_buy: u32,
    #[serde(default)]
    pub buy: u32,
    #[serde(default)]
    pub hold: u32,
    #[serde(default)]
    pub sell: u32,
    #[serde(default)]
    pub strong_sell: u32,
}

impl RecommendationTrend {
    pub fn total(&self) -> u32 {
        self.strong_buy + self.buy + self.hold + self.sell + self.strong_sell
    }

    /// Counts from most bullish to most bearish.
    pub fn buckets(&self) -> [u32; 5] {
        [
            self.strong_buy,
            self.buy,
            self.hold,
            self.sell,
            self.strong_sell,
        ]
    }
}

/// Trends oldest first, the order the chart reads them.
pub fn chronological(mut trends: Vec<RecommendationTrend>) -> Vec<RecommendationTrend> {
    trends.sort_by(|a, b| a.period.cmp(&b.period));
    trends
}

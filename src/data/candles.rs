use serde::{Deserialize, Serialize};

use super::HasData;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// UNIX seconds at bar open.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn is_rising(&self) -> bool {
        self.close >= self.open
    }
}

pub type Candles = Vec<Candle>;

/// Column-oriented candle response (`c`, `h`, `l`, `o`, `s`, `t`, `v`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleColumns {
    #[serde(default)]
    pub c: Vec<f64>,
    #[serde(default)]
    pub h: Vec<f64>,
    #[serde(default)]
    pub l: Vec<f64>,
    #[serde(default)]
    pub o: Vec<f64>,
    #[serde(default)]
    pub s: String,
    #[serde(default)]
    pub t: Vec<i64>,
    #[serde(default)]
    pub v: Vec<f64>,
}

impl CandleColumns {
    /// Zips the columns into bars, truncating to the shortest column. `s == "no_data"`
    /// yields nothing.
    pub fn into_candles(self) -> Candles {
        if self.s == "no_data" {
            return Vec::new();
        }
        let len = [
            self.c.len(),
            self.h.len(),
            self.l.len(),
            self.o.len(),
            self.t.len(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0);
        let mut candles: Candles = (0..len)
            .map(|i| Candle {
                timestamp: self.t[i],
                open: self.o[i],
                high: self.h[i],
                low: self.l[i],
                close: self.c[i],
                volume: self.v.get(i).copied().unwrap_or_default(),
            })
            .filter(|c| [c.open, c.high, c.low, c.close].iter().all(|v| v.is_finite()))
            .collect();
        candles.sort_by_key(|c| c.timestamp);
        candles
    }
}

impl HasData for CandleColumns {
    fn has_data(&self) -> bool {
        self.s != "no_data" && !self.t.is_empty()
    }
}

/// How the price chart is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChartKind {
    #[default]
    Candles,
    Line,
}

impl ChartKind {
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Candles => Self::Line,
            Self::Line => Self::Candles,
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::Candles => t!("Chart.Candles"),
            Self::Line => t!("Chart.Line"),
        }
    }
}

/// Look-back window of the price chart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, strum::EnumIter)]
pub enum Timeframe {
    Day,
    FiveDays,
    #[default]
    Month,
    SixMonths,
    Year,
    FiveYears,
}

impl Timeframe {
    pub fn label(self) -> &'static str {
        match self {
            Self::Day => "1D",
            Self::FiveDays => "5D",
            Self::Month => "1M",
            Self::SixMonths => "6M",
            Self::Year => "1Y",
            Self::FiveYears => "5Y",
        }
    }

    pub fn seconds(self) -> i64 {
        const DAY: i64 = 86_400;
        match self {
            Self::Day => DAY,
            Self::FiveDays => 5 * DAY,
            Self::Month => 30 * DAY,
            Self::SixMonths => 182 * DAY,
            Self::Year => 365 * DAY,
            Self::FiveYears => 5 * 365 * DAY,
        }
    }

    /// Resolution the backend is asked for at this window. Only 1D and 5D honour the
    /// user-selected intraday resolution.
    pub fn resolution(self, intraday: Resolution) -> Resolution {
        match self {
            Self::Day | Self::FiveDays => intraday,
            Self::Month | Self::SixMonths => Resolution::Day,
            Self::Year => Resolution::Week,
            Self::FiveYears => Resolution::Month,
        }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }

    /// The next window offered by the chart controls, wrapping after 5Y.
    #[must_use]
    pub fn next(self) -> Self {
        Self::iter()
            .skip_while(|t| *t != self)
            .nth(1)
            .unwrap_or(Self::Day)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resolution {
    Min1,
    Min5,
    Min15,
    Min30,
    Min60,
    #[default]
    Day,
    Week,
    Month,
}

impl Resolution {
    /// Query value understood by the candle endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min1 => "1",
            Self::Min5 => "5",
            Self::Min15 => "15",
            Self::Min30 => "30",
            Self::Min60 => "60",
            Self::Day => "D",
            Self::Week => "W",
            Self::Month => "M",
        }
    }

    pub fn seconds(self) -> i64 {
        match self {
            Self::Min1 => 60,
            Self::Min5 => 300,
            Self::Min15 => 900,
            Self::Min30 => 1_800,
            Self::Min60 => 3_600,
            Self::Day => 86_400,
            Self::Week => 7 * 86_400,
            Self::Month => 30 * 86_400,
        }
    }

    pub fn is_intraday(self) -> bool {
        self < Self::Day
    }

    /// Cycles through the intraday choices offered by the chart controls.
    #[must_use]
    pub fn next_intraday(self) -> Self {
        match self {
            Self::Min1 => Self::Min5,
            Self::Min5 => Self::Min15,
            Self::Min15 => Self::Min30,
            Self::Min30 => Self::Min60,
            _ => Self::Min1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Min1 => "1m",
            Self::Min5 => "5m",
            Self::Min15 => "15m",
            Self::Min30 => "30m",
            Self::Min60 => "60m",
            Self::Day => "1D",
            Self::Week => "1W",
            Self::Month => "1M",
        }
    }
}

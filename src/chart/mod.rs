//! One chart widget for every plot on the dashboard.
//!
//! Views describe what to draw with a [`ChartSpec`] (the series plus a title and color) and
//! hand it a [`ChartCache`] they own. The cache keeps the expensive candlestick rows between
//! frames and remembers which data generation already reported a failure, so a broken
//! dataset is logged once instead of thirty times a second.

mod candlestick;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph,
    },
    Frame,
};

pub use candlestick::CandlestickRenderer;

use crate::{
    data::Candle,
    eps::EarningsSurprisePoint,
    helper::Sign,
    ui::{styles, Content},
};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChartError {
    #[error("no data points")]
    Empty,
    #[error("series contains a non-finite value")]
    NonFinite,
    #[error("area {width}x{height} is too small")]
    TooSmall { width: u16, height: u16 },
}

/// One bar of a group, with its own color.
#[derive(Clone, Debug, PartialEq)]
pub struct BarValue {
    pub value: u64,
    pub color: Color,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BarGroupData {
    pub label: String,
    pub bars: Vec<BarValue>,
}

#[derive(Clone, Debug)]
pub enum Series<'a> {
    Candles {
        candles: &'a [Candle],
        intraday: bool,
    },
    /// `(x, y)` points; `x_labels` are spread evenly under the axis.
    Line {
        points: Vec<(f64, f64)>,
        x_labels: Vec<String>,
    },
    Bars(Vec<BarGroupData>),
    /// Actual and estimate markers per period, with surprise labels underneath.
    Eps(&'a [EarningsSurprisePoint]),
}

impl Series<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Candles { .. } => "candles",
            Self::Line { .. } => "line",
            Self::Bars(_) => "bars",
            Self::Eps(_) => "eps",
        }
    }

    fn validate(&self) -> Result<(), ChartError> {
        match self {
            Self::Candles { candles, .. } => {
                if candles.is_empty() {
                    return Err(ChartError::Empty);
                }
                if !all_finite(candles.iter().flat_map(|c| [c.open, c.high, c.low, c.close])) {
                    return Err(ChartError::NonFinite);
                }
            }
            Self::Line { points, .. } => {
                if points.is_empty() {
                    return Err(ChartError::Empty);
                }
                if !all_finite(points.iter().flat_map(|(x, y)| [*x, *y])) {
                    return Err(ChartError::NonFinite);
                }
            }
            Self::Bars(groups) => {
                if groups.iter().all(|g| g.bars.iter().all(|b| b.value == 0)) {
                    return Err(ChartError::Empty);
                }
            }
            Self::Eps(points) => {
                if points.is_empty() {
                    return Err(ChartError::Empty);
                }
                if !all_finite(points.iter().flat_map(|p| [p.actual, p.estimate])) {
                    return Err(ChartError::NonFinite);
                }
            }
        }
        Ok(())
    }
}

fn all_finite(values: impl IntoIterator<Item = f64>) -> bool {
    values.into_iter().all(f64::is_finite)
}

#[derive(Clone, Debug, Default)]
pub struct ChartStyle {
    pub title: String,
    pub color: Option<Color>,
}

/// Per-view chart state kept across frames.
#[derive(Debug, Default)]
pub struct ChartCache {
    key: Option<(u64, u16, u16)>,
    lines: Vec<Line<'static>>,
    reported: Option<u64>,
}

impl ChartCache {
    pub fn is_cached(&self, generation: u64, width: u16, height: u16) -> bool {
        self.key == Some((generation, width, height))
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.lines.clear();
        self.reported = None;
    }
}

const MIN_WIDTH: u16 = 10;
const MIN_HEIGHT: u16 = 4;

pub struct ChartSpec<'a> {
    pub series: Series<'a>,
    pub style: ChartStyle,
    /// Bumped by the owner whenever `series` changes.
    pub generation: u64,
}

impl<'a> ChartSpec<'a> {
    pub fn new(series: Series<'a>, generation: u64) -> Self {
        Self {
            series,
            style: ChartStyle::default(),
            generation,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.style.title = title.into();
        self
    }

    #[must_use]
    pub fn color(mut self, color: Color) -> Self {
        self.style.color = Some(color);
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect, cache: &mut ChartCache) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border())
            .title(Span::styled(self.style.title.clone(), styles::title()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let checked = if inner.width < MIN_WIDTH || inner.height < MIN_HEIGHT {
            Err(ChartError::TooSmall {
                width: inner.width,
                height: inner.height,
            })
        } else {
            self.series.validate()
        };
        if let Err(err) = checked {
            if cache.reported != Some(self.generation) {
                tracing::error!(kind = self.series.kind(), error = %err, "chart unavailable");
                cache.reported = Some(self.generation);
            }
            cache.key = None;
            let placeholder = if err == ChartError::Empty {
                Content::empty()
            } else {
                Content::new(
                    Span::styled(t!("Chart.Unavailable"), styles::error()),
                    Span::styled(err.to_string(), styles::dark_gray()),
                )
            };
            frame.render_widget(placeholder, inner);
            return;
        }

        let color = self.style.color.unwrap_or(Color::LightCyan);
        match self.series {
            Series::Candles { candles, intraday } => {
                if !cache.is_cached(self.generation, inner.width, inner.height) {
                    cache.lines =
                        CandlestickRenderer::new(candles, intraday, inner.width, inner.height)
                            .render_lines();
                    cache.key = Some((self.generation, inner.width, inner.height));
                }
                frame.render_widget(Paragraph::new(cache.lines.clone()), inner);
            }
            Series::Line { points, x_labels } => render_line(frame, inner, &points, &x_labels, color),
            Series::Bars(groups) => render_bars(frame, inner, &groups),
            Series::Eps(points) => render_eps(frame, inner, points),
        }
    }
}

fn padded_bounds(min: f64, max: f64) -> [f64; 2] {
    let range = max - min;
    let padding = if range.abs() < f64::EPSILON {
        (max.abs() * 0.05).max(0.1)
    } else {
        range * 0.1
    };
    [min - padding, max + padding]
}

fn value_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| Span::styled(format!("{v:.2}"), styles::gray()))
        .collect()
}

/// At most `max` labels, first and last always kept.
fn spread_labels(labels: &[String], max: usize) -> Vec<Span<'static>> {
    if labels.len() <= max || max < 2 {
        return labels
            .iter()
            .map(|l| Span::styled(l.clone(), styles::gray()))
            .collect();
    }
    let last = labels.len() - 1;
    (0..max)
        .map(|i| {
            let idx = i * last / (max - 1);
            Span::styled(labels[idx].clone(), styles::gray())
        })
        .collect()
}

fn render_line(frame: &mut Frame, area: Rect, points: &[(f64, f64)], x_labels: &[String], color: Color) {
    let (x_min, x_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (x, _)| {
            (lo.min(*x), hi.max(*x))
        });
    let (y_min, y_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, y)| {
            (lo.min(*y), hi.max(*y))
        });
    let y_bounds = padded_bounds(y_min, y_max);
    let x_bounds = if x_max > x_min {
        [x_min, x_max]
    } else {
        [x_min - 0.5, x_max + 0.5]
    };

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(points);

    let max_labels = usize::from(area.width / 12).max(2);
    let chart = Chart::new(vec![dataset])
        .x_axis(
            Axis::default()
                .style(styles::dark_gray())
                .bounds(x_bounds)
                .labels(spread_labels(x_labels, max_labels)),
        )
        .y_axis(
            Axis::default()
                .style(styles::dark_gray())
                .bounds(y_bounds)
                .labels(value_labels(y_bounds)),
        );
    frame.render_widget(chart, area);
}

fn render_bars(frame: &mut Frame, area: Rect, groups: &[BarGroupData]) {
    let bars_per_group = groups.iter().map(|g| g.bars.len()).max().unwrap_or(1).max(1);
    let group_count = groups.len().max(1);
    // fit every group: bars + one gap per group
    let slots = u16::try_from(group_count * (bars_per_group + 1)).unwrap_or(u16::MAX);
    let bar_width = (area.width / slots).clamp(1, 5);

    let mut chart = BarChart::default()
        .bar_width(bar_width)
        .bar_gap(0)
        .group_gap(bar_width)
        .value_style(styles::primary());
    for group in groups {
        let bars: Vec<Bar> = group
            .bars
            .iter()
            .map(|b| {
                Bar::default()
                    .value(b.value)
                    .style(Style::default().fg(b.color))
                    .value_style(Style::default().fg(Color::Black).bg(b.color))
            })
            .collect();
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(group.label.clone()))
                .bars(&bars),
        );
    }
    frame.render_widget(chart, area);
}

/// X of each point: the slot of its period among the distinct periods, so repeated
/// periods share a column under their one label.
fn period_positions(points: &[EarningsSurprisePoint], ticks: &[String]) -> Vec<f64> {
    points
        .iter()
        .map(|p| ticks.iter().position(|t| *t == p.period).unwrap_or_default() as f64)
        .collect()
}

fn render_eps(frame: &mut Frame, area: Rect, points: &[EarningsSurprisePoint]) {
    let Some(axis) = crate::eps::eps_axis(points) else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(2)])
        .split(area);

    let ticks = crate::eps::x_ticks(points);
    let xs = period_positions(points, &ticks);
    let actual: Vec<(f64, f64)> = xs.iter().zip(points).map(|(x, p)| (*x, p.actual)).collect();
    let estimate: Vec<(f64, f64)> = xs.iter().zip(points).map(|(x, p)| (*x, p.estimate)).collect();
    let (actual_color, estimate_color) = styles::eps_colors();

    let datasets = vec![
        Dataset::default()
            .name(t!("Eps.Estimate"))
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(estimate_color))
            .data(&estimate),
        Dataset::default()
            .name(t!("Eps.Actual"))
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(actual_color))
            .data(&actual),
    ];

    let x_max = ticks.len().saturating_sub(1) as f64;
    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .style(styles::dark_gray())
                .bounds([-0.5, x_max + 0.5])
                .labels(spread_labels(&ticks, usize::from(chunks[0].width / 10).max(2))),
        )
        .y_axis(
            Axis::default()
                .style(styles::dark_gray())
                .bounds(axis.domain)
                .labels(
                    axis.ticks
                        .iter()
                        .map(|v| Span::styled(format!("{v:.2}"), styles::gray()))
                        .collect(),
                ),
        );
    frame.render_widget(chart, chunks[0]);

    let labels: Vec<Span> = points
        .iter()
        .flat_map(|p| {
            let style = styles::up(p.surprise.sign());
            [
                Span::styled(format!("{} ", p.period), styles::gray()),
                Span::styled(p.label.clone(), style),
                Span::raw("   "),
            ]
        })
        .collect();
    frame.render_widget(
        Paragraph::new(Line::from(labels)).wrap(ratatui::widgets::Wrap { trim: true }),
        chunks[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol.as_str())
            .collect()
    }

    fn candles() -> Vec<Candle> {
        (0..30)
            .map(|i| {
                let base = 100.0 + f64::from(i);
                Candle {
                    timestamp: i64::from(i) * 86_400,
                    open: base,
                    high: base + 2.0,
                    low: base - 2.0,
                    close: base + 1.0,
                    volume: 0.0,
                }
            })
            .collect()
    }

    #[test]
    fn candle_rows_are_cached_until_resize_or_new_data() {
        let data = candles();
        let mut cache = ChartCache::default();
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();

        terminal
            .draw(|f| {
                let spec = ChartSpec::new(Series::Candles { candles: &data, intraday: false }, 1);
                spec.render(f, f.size(), &mut cache);
            })
            .unwrap();
        assert!(cache.is_cached(1, 78, 18));
        assert!(screen(&terminal).contains('┃'));

        terminal.backend_mut().resize(60, 20);
        terminal.resize(Rect::new(0, 0, 60, 20)).unwrap();
        terminal
            .draw(|f| {
                let spec = ChartSpec::new(Series::Candles { candles: &data, intraday: false }, 2);
                spec.render(f, f.size(), &mut cache);
            })
            .unwrap();
        assert!(!cache.is_cached(1, 78, 18));
        assert!(cache.is_cached(2, 58, 18));
    }

    #[test]
    fn empty_series_renders_placeholder_and_reports_once() {
        let _lock = crate::helper::TEST_LOCALE_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        rust_i18n::set_locale("en");
        let mut cache = ChartCache::default();
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        for _ in 0..2 {
            terminal
                .draw(|f| {
                    let spec = ChartSpec::new(
                        Series::Line {
                            points: vec![],
                            x_labels: vec![],
                        },
                        7,
                    );
                    spec.render(f, f.size(), &mut cache);
                })
                .unwrap();
        }
        assert_eq!(cache.reported, Some(7));
        assert!(screen(&terminal).contains(&t!("Slot.Empty")));
    }

    #[test]
    fn non_finite_points_are_rejected() {
        let series = Series::Line {
            points: vec![(0.0, 1.0), (1.0, f64::NAN)],
            x_labels: vec![],
        };
        assert_eq!(series.validate(), Err(ChartError::NonFinite));
        let bars = Series::Bars(vec![BarGroupData {
            label: "2024-01".into(),
            bars: vec![BarValue { value: 0, color: Color::Green }],
        }]);
        assert_eq!(bars.validate(), Err(ChartError::Empty));
    }

    #[test]
    fn repeated_eps_periods_share_their_label_column() {
        let point = |period: &str| EarningsSurprisePoint {
            period: period.to_string(),
            actual: 1.0,
            estimate: 0.9,
            surprise: 0.1,
            label: "Beat: 0.10".to_string(),
        };
        let points = [point("2023Q4"), point("2024Q1"), point("2024Q1"), point("2024Q2")];
        let ticks = crate::eps::x_ticks(&points);
        assert_eq!(ticks, ["2023Q4", "2024Q1", "2024Q2"]);
        assert_eq!(period_positions(&points, &ticks), [0.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn label_spread_keeps_ends() {
        let labels: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let spread: Vec<String> = spread_labels(&labels, 3)
            .into_iter()
            .map(|s| s.content.into_owned())
            .collect();
        assert_eq!(spread, vec!["0", "4", "9"]);
    }
}

//! Candlesticks drawn with box-drawing glyphs, one terminal column per bar.
//!
//! Each bar's high, low, open and close are projected onto the row grid; every row of the
//! plot then picks a glyph per bar depending on whether it crosses the upper wick, the body
//! or the lower wick. Fractions of a row (0.25 / 0.75 thresholds) select half glyphs so
//! short wicks and bodies still show.

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};
use time::OffsetDateTime;

use crate::{data::Candle, helper::clock, ui::styles};

const VOID: char = ' ';
const BODY: char = '┃';
const HALF_BODY_BOTTOM: char = '╻';
const HALF_BODY_TOP: char = '╹';
const WICK: char = '│';
const TOP: char = '╽';
const BOTTOM: char = '╿';
const UPPER_WICK: char = '╷';
const LOWER_WICK: char = '╵';

const Y_AXIS_WIDTH: u16 = 12;
const NARROW_Y_AXIS_WIDTH: u16 = 9;
/// Below this width the price axis uses the narrow layout.
const NARROW_THRESHOLD: u16 = 60;
/// Rows below the plot: ticks and time labels.
const X_AXIS_HEIGHT: u16 = 2;
/// A price label every this many rows.
const Y_LABEL_EVERY: u16 = 4;

pub struct CandlestickRenderer<'a> {
    candles: &'a [Candle],
    intraday: bool,
    min_price: f64,
    max_price: f64,
    height: u16,
    width: u16,
    y_axis_width: u16,
}

impl<'a> CandlestickRenderer<'a> {
    pub fn new(candles: &'a [Candle], intraday: bool, width: u16, height: u16) -> Self {
        let y_axis_width = if width < NARROW_THRESHOLD {
            NARROW_Y_AXIS_WIDTH
        } else {
            Y_AXIS_WIDTH
        };
        let plot_width = width.saturating_sub(y_axis_width);
        let visible = Self::visible(candles, usize::from(plot_width));
        let (min_price, max_price) = Self::price_bounds(visible);

        Self {
            candles: visible,
            intraday,
            min_price,
            max_price,
            height: height.saturating_sub(X_AXIS_HEIGHT),
            width: plot_width,
            y_axis_width,
        }
    }

    /// The newest bars that fit, one column each.
    fn visible(candles: &[Candle], columns: usize) -> &[Candle] {
        &candles[candles.len().saturating_sub(columns)..]
    }

    /// Low and high across all bars, widened by 2%.
    fn price_bounds(candles: &[Candle]) -> (f64, f64) {
        let max = candles
            .iter()
            .fold(f64::NEG_INFINITY, |max, c| max.max(c.high));
        let min = candles.iter().fold(f64::INFINITY, |min, c| min.min(c.low));
        let margin = (max - min) * 0.02;
        ((min - margin).max(0.0), max + margin)
    }

    fn price_to_height(&self, price: f64) -> f64 {
        if (self.max_price - self.min_price).abs() < f64::EPSILON {
            return f64::from(self.height) / 2.0;
        }
        (price - self.min_price) / (self.max_price - self.min_price) * f64::from(self.height)
    }

    fn color(candle: &Candle) -> Color {
        let (bull, bear) = styles::bull_bear_color();
        if candle.is_rising() {
            bull
        } else {
            bear
        }
    }

    /// Glyph of `candle` on plot row `y` (1 = bottom row).
    fn glyph(&self, candle: &Candle, y: u16) -> char {
        let row = f64::from(y);
        let high = self.price_to_height(candle.high);
        let low = self.price_to_height(candle.low);
        let body_top = self.price_to_height(candle.open.max(candle.close));
        let body_bottom = self.price_to_height(candle.open.min(candle.close));

        if high.ceil() >= row && row >= body_top.floor() {
            // upper wick
            if body_top - row > 0.75 {
                BODY
            } else if body_top - row > 0.25 {
                if high - row > 0.75 {
                    TOP
                } else {
                    HALF_BODY_BOTTOM
                }
            } else if high - row > 0.75 {
                WICK
            } else if high - row > 0.25 {
                UPPER_WICK
            } else {
                VOID
            }
        } else if body_top.floor() >= row && row >= body_bottom.ceil() {
            BODY
        } else if body_bottom.ceil() >= row && row >= low.floor() {
            // lower wick
            if body_bottom - row < 0.25 {
                BODY
            } else if body_bottom - row < 0.75 {
                if low - row < 0.25 {
                    BOTTOM
                } else {
                    HALF_BODY_TOP
                }
            } else if low - row < 0.25 {
                WICK
            } else if low - row < 0.75 {
                LOWER_WICK
            } else {
                VOID
            }
        } else {
            VOID
        }
    }

    fn y_axis(&self, y: u16) -> String {
        let width = usize::from(self.y_axis_width).saturating_sub(3);
        if y % Y_LABEL_EVERY == 0 {
            let price = self.min_price
                + f64::from(y) * (self.max_price - self.min_price) / f64::from(self.height);
            format!("{price:>width$.2} │ ")
        } else {
            format!("{:>width$} │ ", "")
        }
    }

    fn time_label(&self, timestamp: i64) -> String {
        let Ok(at) = OffsetDateTime::from_unix_timestamp(timestamp) else {
            return String::new();
        };
        let at = at.to_offset(clock::local_offset());
        if self.intraday {
            clock::hh_mm(at)
        } else {
            format!("{:02}-{:02}", u8::from(at.month()), at.day())
        }
    }

    /// Plot rows top to bottom followed by the time axis. Empty when nothing fits.
    pub fn render_lines(&self) -> Vec<Line<'static>> {
        if self.candles.is_empty() || self.height == 0 || self.width == 0 {
            return Vec::new();
        }

        // bars spread over the plot width, each followed by the same gap
        let step = (usize::from(self.width) / self.candles.len()).max(1);
        let gap = " ".repeat(step - 1);

        let mut lines = Vec::with_capacity(usize::from(self.height + X_AXIS_HEIGHT));
        for y in (1..=self.height).rev() {
            let mut spans = Vec::with_capacity(self.candles.len() * 2 + 1);
            spans.push(Span::styled(self.y_axis(y), styles::gray()));
            for (i, candle) in self.candles.iter().enumerate() {
                spans.push(Span::styled(
                    self.glyph(candle, y).to_string(),
                    Style::default().fg(Self::color(candle)),
                ));
                if i + 1 < self.candles.len() && !gap.is_empty() {
                    spans.push(Span::raw(gap.clone()));
                }
            }
            lines.push(Line::from(spans));
        }

        lines.extend(self.x_axis(step));
        lines
    }

    fn x_axis(&self, step: usize) -> [Line<'static>; 2] {
        // labels are 5 columns wide, keep 2 columns between them
        let every = 7usize.div_ceil(step).max(1);
        let pad = " ".repeat(usize::from(self.y_axis_width));

        let mut ticks = pad.clone();
        let mut labels = pad;
        let (mut tick_col, mut label_col) = (0usize, 0usize);
        for (i, candle) in self.candles.iter().enumerate().step_by(every) {
            let x = i * step;
            if x >= usize::from(self.width) {
                break;
            }
            ticks.push_str(&" ".repeat(x.saturating_sub(tick_col)));
            ticks.push('┬');
            tick_col = x + 1;

            if x >= label_col {
                let label = self.time_label(candle.timestamp);
                labels.push_str(&" ".repeat(x - label_col));
                label_col = x + label.chars().count();
                labels.push_str(&label);
            }
        }

        [
            Line::from(Span::styled(ticks, styles::dark_gray())),
            Line::from(Span::styled(labels, styles::gray())),
        ]
    }
}

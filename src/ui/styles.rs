use std::{borrow::Cow, cmp::Ordering};

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::ListItem,
};

use crate::data::NewsCategory;

#[inline]
pub fn header() -> Style {
    Style::default().fg(Color::Gray)
}

#[inline]
pub fn gray() -> Style {
    Style::default().fg(Color::Gray)
}

#[inline]
pub fn dark_gray() -> Style {
    Style::default().fg(Color::DarkGray)
}

#[inline]
pub fn label() -> Style {
    Style::default().fg(Color::Gray)
}

#[inline]
pub fn text() -> Style {
    Style::default().fg(Color::Reset)
}

#[inline]
pub fn primary() -> Style {
    Style::default().fg(Color::White)
}

#[inline]
pub fn text_selected() -> Style {
    text().add_modifier(Modifier::REVERSED)
}

#[inline]
pub fn popup() -> Style {
    text()
}

#[inline]
pub fn title() -> Style {
    text().add_modifier(Modifier::BOLD)
}

#[inline]
pub fn border() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Border of the panel that owns keyboard focus.
#[inline]
pub fn border_focused() -> Style {
    Style::default().fg(Color::Cyan)
}

#[inline]
pub fn error() -> Style {
    Style::default().fg(Color::LightRed)
}

#[inline]
pub fn link() -> Style {
    Style::default()
        .fg(Color::LightBlue)
        .add_modifier(Modifier::UNDERLINED)
}

#[inline]
pub fn category(category: NewsCategory) -> Style {
    let color = match category {
        NewsCategory::General => Color::Blue,
        NewsCategory::Forex => Color::Magenta,
        NewsCategory::Crypto => Color::Yellow,
        NewsCategory::Merger => Color::Cyan,
    };
    Style::default().fg(color)
}

#[inline]
pub fn online() -> Style {
    Style::default().fg(Color::Green)
}

/// Ticker badges in news rows and search results.
#[inline]
pub fn ticker() -> Style {
    Style::default().fg(Color::LightCyan)
}

#[inline]
pub fn up(val: Ordering) -> Style {
    Style::default().fg(up_color(val))
}

#[inline]
pub fn up_color(val: Ordering) -> Color {
    let (bull, bear) = bull_bear_color();
    match val {
        Ordering::Less => bear,
        Ordering::Equal => Color::Reset,
        Ordering::Greater => bull,
    }
}

/// US convention: green for gains, red for losses.
#[inline]
pub fn bull_bear_color() -> (Color, Color) {
    (Color::LightGreen, Color::LightRed)
}

/// Colors of the actual and estimate markers on the EPS chart.
#[inline]
pub fn eps_colors() -> (Color, Color) {
    (Color::LightYellow, Color::Gray)
}

/// Strong buy .. strong sell, in bucket order.
pub const RECOMMENDATION_COLORS: [Color; 5] = [
    Color::Green,
    Color::LightGreen,
    Color::Yellow,
    Color::LightRed,
    Color::Red,
];

#[allow(clippy::needless_pass_by_value)]
pub fn item<'a>(label: String, value: impl Into<Cow<'a, str>>) -> ListItem<'a> {
    let spans = Line::from(vec![
        Span::styled(format!("{label}: "), super::styles::label()),
        Span::styled(value, text()),
    ]);
    ListItem::new(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gains_and_losses_get_distinct_colors() {
        assert_eq!(up_color(Ordering::Greater), Color::LightGreen);
        assert_eq!(up_color(Ordering::Less), Color::LightRed);
        assert_eq!(up_color(Ordering::Equal), Color::Reset);
        assert_eq!(up(Ordering::Less).fg, Some(Color::LightRed));
    }
}

use ratatui::{
    prelude::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Tabs},
    Frame,
};

use crate::{app::AppState, ui::styles};

pub fn render(frame: &mut Frame, rect: Rect, state: AppState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rect);

    let tabs = vec![
        Line::from(format!(" {} [1] ", t!("Tabs.Screener"))),
        Line::from(format!(" {} [2] ", t!("Tabs.News"))),
        Line::from(format!(" {} [3] ", t!("Tabs.Profile"))),
    ];

    let tabs = Tabs::new(tabs)
        .style(styles::text())
        .highlight_style(styles::text_selected())
        .divider("|")
        .select(match state {
            AppState::News => 1,
            AppState::Profile => 2,
            _ => 0,
        });

    let dark_gray_style = styles::dark_gray();
    let hints = [
        t!("Keyboard.Help"),
        t!("Keyboard.Console"),
        t!("Keyboard.Search"),
        t!("Keyboard.Refresh"),
        t!("Keyboard.Quit"),
    ];
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (idx, hint) in hints.into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(" ", dark_gray_style));
        }
        spans.push(Span::styled(hint, dark_gray_style));
    }
    let hints = Paragraph::new(Line::from(spans)).alignment(Alignment::Right);

    frame.render_widget(tabs, chunks[0]);
    frame.render_widget(hints, chunks[1]);
}

use ratatui::{
    prelude::{Alignment, Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::Paragraph,
    Frame,
};

use crate::{data::DataSource, ui::styles};

/// Rotating tip on the left, data source and activity on the right.
pub fn render(frame: &mut Frame, rect: Rect, tip: Option<&str>, source: DataSource, busy: bool) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
        .split(rect);

    if let Some(tip) = tip {
        let tip = Paragraph::new(Span::styled(format!(" {tip}"), styles::dark_gray()));
        frame.render_widget(tip, chunks[0]);
    }

    let (status, status_style) = if busy {
        ("···", styles::text())
    } else {
        ("■■■", styles::online())
    };
    let source = match source {
        DataSource::Live => t!("Footer.Live"),
        DataSource::Mock => t!("Footer.Mock"),
    };
    let right = Paragraph::new(ratatui::text::Line::from(vec![
        Span::styled(format!("{source} "), styles::dark_gray()),
        Span::styled(status, status_style),
    ]))
    .alignment(Alignment::Right);
    frame.render_widget(right, chunks[1]);
}

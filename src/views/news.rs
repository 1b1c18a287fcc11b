use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::{
    data::{NewsCategory, NewsItem, Slot},
    system::NewsFeed,
    ui::{styles, text, Content},
};

/// Filter bar, article list and the selected article's details.
pub fn render_feed(frame: &mut Frame, rect: Rect, feed: &mut NewsFeed, title: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(rect);
    filter_bar(frame, chunks[0], feed);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_focused())
        .title(Span::styled(title.to_string(), styles::title()));

    if let Some(placeholder) = Content::for_slot(feed.items()) {
        let inner = block.inner(body[0]);
        frame.render_widget(block, body[0]);
        frame.render_widget(placeholder, inner);
    } else if feed.visible().is_empty() {
        let inner = block.inner(body[0]);
        frame.render_widget(block, body[0]);
        frame.render_widget(
            Content::new(
                Span::styled(t!("Filter.NoMatch"), styles::gray()),
                Span::styled(t!("Filter.ResetHint"), styles::dark_gray()),
            ),
            inner,
        );
    } else {
        let headline_width = usize::from(body[0].width.saturating_sub(26));
        let rows = feed
            .visible()
            .iter()
            .map(|item| {
                Row::new(vec![
                    Cell::from(Span::styled(
                        format!("{} {}", item.date, item.time),
                        styles::dark_gray(),
                    )),
                    Cell::from(Span::styled(
                        text::ellipsis(&item.source, 10),
                        styles::gray(),
                    )),
                    Cell::from(text::ellipsis(&item.headline, headline_width)),
                ])
            })
            .collect::<Vec<_>>();
        let table = Table::new(rows)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .widths(&[
                Constraint::Length(16),
                Constraint::Length(10),
                Constraint::Min(10),
            ])
            .column_spacing(1);
        frame.render_stateful_widget(table, body[0], &mut feed.table);
    }

    detail(frame, body[1], feed.selected());
}

fn filter_bar(frame: &mut Frame, rect: Rect, feed: &NewsFeed) {
    let criteria = feed.criteria();
    let ticker = if criteria.ticker.trim().is_empty() {
        t!("Filter.Any")
    } else {
        criteria.ticker.trim().to_ascii_uppercase()
    };
    let label = styles::label();
    let value = styles::primary();
    let hint = styles::dark_gray();
    let count = match feed.items() {
        Slot::Ready(_) => t!(
            "Filter.Count",
            shown = feed.visible().len(),
            total = feed.total()
        ),
        _ => String::new(),
    };
    let line = Line::from(vec![
        Span::styled(format!(" {}: ", t!("Filter.Date")), label),
        Span::styled(criteria.date_range.label(), value),
        Span::styled(" [d]  ", hint),
        Span::styled(format!("{}: ", t!("Filter.Source")), label),
        Span::styled(criteria.source.label(), value),
        Span::styled(" [s]  ", hint),
        Span::styled(format!("{}: ", t!("Filter.Ticker")), label),
        Span::styled(ticker, value),
        Span::styled(" [t]  ", hint),
        Span::styled(t!("Filter.Reset"), hint),
        Span::styled("  ", hint),
        Span::styled(count, styles::gray()),
    ]);
    frame.render_widget(Paragraph::new(line), rect);
}

fn detail(frame: &mut Frame, rect: Rect, item: Option<&NewsItem>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border())
        .title(Span::styled(t!("News.Detail"), styles::title()));
    let Some(item) = item else {
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        frame.render_widget(
            Content::new(
                Span::styled(t!("News.SelectHint"), styles::dark_gray()),
                Line::default(),
            ),
            inner,
        );
        return;
    };

    let category = NewsCategory::iter()
        .find(|c| c.as_str() == item.category)
        .map_or_else(styles::gray, styles::category);
    let mut lines = vec![
        Line::from(Span::styled(item.headline.clone(), styles::title())),
        Line::default(),
        Line::from(vec![
            Span::styled(format!("{} {}", item.date, item.time), styles::dark_gray()),
            Span::raw("  "),
            Span::styled(item.source.clone(), styles::gray()),
            Span::raw("  "),
            Span::styled(item.category.clone(), category),
        ]),
    ];
    if !item.tickers.is_empty() {
        let tickers = item.tickers.iter().map(String::as_str).collect::<Vec<_>>();
        lines.push(Line::from(Span::styled(tickers.join(" "), styles::ticker())));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        item.summary
            .clone()
            .unwrap_or_else(|| t!("News.NoSummary")),
        styles::text(),
    )));
    if let Some(url) = &item.url {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(url.clone(), styles::link())));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, rect);
}

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::{
    data::ScreenerRow,
    helper::{
        decimal_ext::{percent_or_placeholder, price_or_placeholder},
        Sign,
    },
    system::ScreenerPage,
    ui::{styles, text, Content},
};

const HEADERS: [&str; 10] = [
    "Screener.Symbol",
    "Screener.Name",
    "Screener.Price",
    "Screener.Change",
    "Screener.ChangePercent",
    "Screener.MarketCap",
    "Screener.PE",
    "Screener.High52",
    "Screener.Low52",
    "Screener.Industry",
];

const WIDTHS: [Constraint; 10] = [
    Constraint::Length(8),
    Constraint::Min(16),
    Constraint::Length(10),
    Constraint::Length(9),
    Constraint::Length(9),
    Constraint::Length(11),
    Constraint::Length(8),
    Constraint::Length(10),
    Constraint::Length(10),
    Constraint::Length(18),
];

fn row(item: &ScreenerRow) -> Row<'static> {
    let quote = item.quote.clone().unwrap_or_default();
    let style = styles::up(quote.change.unwrap_or_default().sign());
    let industry = item
        .profile
        .as_ref()
        .and_then(|p| p.finnhub_industry.clone())
        .unwrap_or_default();
    let market_cap = item
        .profile
        .as_ref()
        .and_then(|p| p.market_capitalization)
        .or_else(|| item.metric("marketCapitalization"));
    let cells = [
        Cell::from(Span::styled(item.ticker.clone(), styles::ticker())),
        Cell::from(text::ellipsis(item.name(), 28)),
        Cell::from(text::align_right(&price_or_placeholder(quote.current), 10)).style(style),
        Cell::from(text::align_right(&signed(quote.change), 9)).style(style),
        Cell::from(text::align_right(
            &percent_or_placeholder(quote.percent_change),
            9,
        ))
        .style(style),
        Cell::from(text::align_right(&text::market_cap(market_cap), 11)),
        Cell::from(text::align_right(&text::number(item.pe()), 8)),
        Cell::from(text::align_right(&text::number(item.metric("52WeekHigh")), 10)),
        Cell::from(text::align_right(&text::number(item.metric("52WeekLow")), 10)),
        Cell::from(Span::styled(text::ellipsis(&industry, 18), styles::gray())),
    ];
    Row::new(cells)
}

/// `+1.23`, `-0.50` or the placeholder.
fn signed(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) if v > 0.0 => format!("+{v:.2}"),
        other => text::number(other),
    }
}

pub fn render(frame: &mut Frame, rect: Rect, page: &mut ScreenerPage) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(rect);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_focused())
        .title(Span::styled(
            format!(" {} ", t!("Screener.Title")),
            styles::title(),
        ));

    if let Some(placeholder) = Content::for_slot(&page.rows) {
        let inner = block.inner(chunks[0]);
        frame.render_widget(block, chunks[0]);
        frame.render_widget(placeholder, inner);
    } else {
        let rows = page
            .rows
            .ready()
            .map(|rows| rows.iter().map(row).collect::<Vec<_>>())
            .unwrap_or_default();
        let header = Row::new(HEADERS.iter().map(|key| Cell::from(t!(key))))
            .style(styles::header())
            .bottom_margin(1);
        let table = Table::new(rows)
            .header(header)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .widths(&WIDTHS)
            .column_spacing(1);
        frame.render_stateful_widget(table, chunks[0], &mut page.table);
    }

    let status = Line::from(vec![
        Span::styled(
            format!(
                " {} ",
                t!(
                    "Screener.Page",
                    page = page.page,
                    total_pages = page.total_pages,
                    total = page.total
                )
            ),
            styles::gray(),
        ),
        Span::styled(t!("Screener.Keys"), styles::dark_gray()),
    ]);
    frame.render_widget(Paragraph::new(status), chunks[1]);
}

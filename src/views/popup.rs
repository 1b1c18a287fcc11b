use std::sync::atomic::Ordering;

use crate::{
    app::{AppState, POPUP, POPUP_FIND, POPUP_HELP, POPUP_SEARCH, POPUP_TICKER},
    data::{DataSource, ScreenerRow, SymbolMatch},
    ui::styles,
    widgets::{LocalSearch, Search},
};

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

pub fn render(
    frame: &mut Frame,
    rect: Rect,
    (state, source): (AppState, DataSource),
    search: &mut Search<SymbolMatch>,
    find: &mut LocalSearch<ScreenerRow>,
    ticker: Option<&tui_input::Input>,
) {
    let popup = POPUP.load(Ordering::Relaxed);
    if popup == POPUP_HELP {
        crate::views::help::render(frame, rect, state, source);
    } else if popup == POPUP_SEARCH {
        searching(frame, rect, search);
    } else if popup == POPUP_FIND {
        finding(frame, rect, find);
    } else if popup == POPUP_TICKER {
        if let Some(input) = ticker {
            ticker_filter(frame, rect, input);
        }
    }
}

fn safe_cursor_x(chunk_x: u16, visual_cursor: usize) -> u16 {
    let offset = u16::try_from(visual_cursor).unwrap_or(u16::MAX - 1);
    chunk_x.saturating_add(offset).saturating_add(1)
}

fn popup_column_constraints() -> [Constraint; 2] {
    [Constraint::Length(12), Constraint::Length(34)]
}

/// Input box on top, result table below. Returns the table area.
fn input_box(frame: &mut Frame, rect: Rect, input: &tui_input::Input, title: String) -> Rect {
    const MAX_SIZE: (u16, u16) = (50, 30);
    let rect = crate::ui::rect::centered(MAX_SIZE.0, MAX_SIZE.1, rect);
    frame.render_widget(Clear, rect);

    let chunks = Layout::default()
        .margin(1)
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Percentage(100)].as_ref())
        .split(rect);

    // one line, without scroll
    let paragraph = Paragraph::new(input.value()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_focused())
            .title(title),
    );
    frame.render_widget(paragraph, chunks[0]);
    frame.set_cursor(
        // Put cursor past the end of the input text
        safe_cursor_x(chunks[0].x, input.visual_cursor()),
        // Move one line down, from the border to the input line
        chunks[0].y + 1,
    );
    chunks[1]
}

fn results(frame: &mut Frame, rect: Rect, rows: Vec<Row<'_>>, state: &mut TableState) {
    let column_constraints = popup_column_constraints();

    let table = Table::new(rows)
        .block(
            Block::default()
                .borders(Borders::all())
                .border_style(styles::border()),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .widths(&column_constraints)
        .column_spacing(2);

    frame.render_stateful_widget(table, rect, state);
}

fn searching(frame: &mut Frame, rect: Rect, search: &mut Search<SymbolMatch>) {
    let table_rect = input_box(frame, rect, &search.input, t!("Popup.Search"));

    if let Some(err) = search.error() {
        let notice = Paragraph::new(vec![
            Line::from(Span::styled(t!("Popup.SearchFailed"), styles::error())),
            Line::from(Span::styled(err, styles::dark_gray())),
        ])
        .block(
            Block::default()
                .borders(Borders::all())
                .border_style(styles::border()),
        );
        frame.render_widget(notice, table_rect);
        return;
    }

    let rows = search
        .options()
        .into_iter()
        .map(|item| {
            Row::new(vec![
                Cell::from(Span::styled(item.display_symbol, styles::ticker())),
                Cell::from(item.description),
            ])
        })
        .collect::<Vec<_>>();
    results(frame, table_rect, rows, &mut search.table);
}

fn finding(frame: &mut Frame, rect: Rect, find: &mut LocalSearch<ScreenerRow>) {
    let table_rect = input_box(frame, rect, &find.input, t!("Popup.Find"));

    let rows = find
        .options()
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(Span::styled(row.ticker.clone(), styles::ticker())),
                Cell::from(row.name().to_string()),
            ])
        })
        .collect::<Vec<_>>();
    results(frame, table_rect, rows, &mut find.table);
}

fn ticker_filter(frame: &mut Frame, rect: Rect, input: &tui_input::Input) {
    let rect = crate::ui::rect::centered(40, 5, rect);
    frame.render_widget(Clear, rect);
    let inner = Rect {
        x: rect.x,
        y: rect.y + 1,
        width: rect.width,
        height: 3.min(rect.height.saturating_sub(1)),
    };
    let paragraph = Paragraph::new(input.value()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_focused())
            .title(t!("Popup.Ticker")),
    );
    frame.render_widget(paragraph, inner);
    frame.set_cursor(safe_cursor_x(inner.x, input.visual_cursor()), inner.y + 1);
}

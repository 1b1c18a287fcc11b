//! Key reference. Global keys first, then the keys of the page the help was opened on.

use ratatui::{
    layout::Constraint,
    prelude::Rect,
    text::Span,
    widgets::{Block, Borders, Cell, Clear, Padding, Row, Table},
    Frame,
};

use crate::{app::AppState, data::DataSource, ui::styles};

/// Keys as printed, and the locale key of what they do.
type Binding = (&'static str, &'static str);
type Section = (&'static str, &'static [Binding]);

const GLOBAL: &[Binding] = &[
    ("1 / 2 / 3", "HelpKeys.Pages"),
    ("R", "HelpKeys.Refresh"),
    ("/", "HelpKeys.Find"),
    ("?", "HelpKeys.Help"),
    ("`", "HelpKeys.Console"),
    ("Esc", "HelpKeys.Back"),
    ("q / Ctrl-C", "HelpKeys.Quit"),
];

const SCREENER: &[Binding] = &[
    ("↑ / ↓", "HelpKeys.Rows"),
    ("[ / ]  ← / →", "HelpKeys.ScreenerPages"),
    ("Enter", "HelpKeys.ScreenerOpen"),
];

const NEWS: &[Binding] = &[
    ("↑ / ↓", "HelpKeys.Rows"),
    ("Tab / Shift-Tab", "HelpKeys.NewsCategory"),
    ("d", "HelpKeys.NewsDate"),
    ("s", "HelpKeys.NewsSource"),
    ("t", "HelpKeys.NewsTicker"),
    ("x", "HelpKeys.NewsReset"),
];

const PROFILE: &[Binding] = &[
    ("Tab / Shift-Tab", "HelpKeys.ProfilePanel"),
    ("k", "HelpKeys.ProfileChart"),
    ("f", "HelpKeys.ProfileTimeframe"),
    ("i", "HelpKeys.ProfileIntraday"),
    ("← / →", "HelpKeys.ProfileMetric"),
    ("c", "HelpKeys.ProfileCadence"),
    ("↑ / ↓", "HelpKeys.Rows"),
    ("t", "HelpKeys.NewsTicker"),
];

fn sections(state: AppState) -> Vec<Section> {
    let screener = ("HelpSection.Screener", SCREENER);
    let news = ("HelpSection.News", NEWS);
    let profile = ("HelpSection.Profile", PROFILE);
    let mut out = vec![("HelpSection.Global", GLOBAL)];
    match state {
        AppState::Screener => out.push(screener),
        AppState::News => out.push(news),
        AppState::Profile => out.push(profile),
        AppState::Error | AppState::Loading => out.extend([screener, news, profile]),
    }
    out
}

fn rows(sections: &[Section]) -> Vec<Row<'static>> {
    let mut rows = Vec::new();
    for (i, (title, bindings)) in sections.iter().enumerate() {
        if i > 0 {
            rows.push(Row::new(vec![Cell::from("")]));
        }
        rows.push(Row::new(vec![Cell::from(Span::styled(t!(title), styles::header()))]));
        rows.extend(bindings.iter().map(|(keys, what)| {
            Row::new(vec![
                Cell::from(Span::styled(*keys, styles::ticker())),
                Cell::from(Span::styled(t!(what), styles::text())),
            ])
        }));
    }
    rows
}

pub fn render(frame: &mut Frame, rect: Rect, state: AppState, source: DataSource) {
    let sections = sections(state);
    let rows = rows(&sections);
    let height = u16::try_from(rows.len()).unwrap_or(u16::MAX).saturating_add(2);
    let rect = crate::ui::rect::centered(72, height, rect);

    let source = match source {
        DataSource::Live => t!("Footer.Live"),
        DataSource::Mock => t!("Footer.Mock"),
    };
    let title = format!(
        " {} · MarketDesk v{} · {source} ",
        t!("Help"),
        env!("CARGO_PKG_VERSION")
    );
    let table = Table::new(rows)
        .style(styles::popup())
        .widths(&[Constraint::Length(16), Constraint::Min(20)])
        .column_spacing(2)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(styles::border())
                .padding(Padding::horizontal(1))
                .title(Span::styled(title, styles::title())),
        );
    frame.render_widget(Clear, rect);
    frame.render_widget(table, rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(state: AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).expect("terminal");
        terminal
            .draw(|frame| {
                let area = frame.size();
                render(frame, area, state, DataSource::Mock);
            })
            .expect("draw");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol.as_str())
            .collect()
    }

    #[test]
    fn only_the_current_page_keys_are_listed() {
        let _lock = crate::helper::TEST_LOCALE_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        rust_i18n::set_locale("en");

        let news = screen(AppState::News);
        assert!(news.contains("Cycle date range"));
        assert!(news.contains("Back to the previous page"));
        assert!(!news.contains("Previous / next page"));
        assert!(news.contains("mock data"));
    }

    #[test]
    fn pages_without_keys_of_their_own_list_every_page() {
        let titles: Vec<_> = sections(AppState::Loading)
            .iter()
            .map(|(title, _)| *title)
            .collect();
        assert_eq!(
            titles,
            [
                "HelpSection.Global",
                "HelpSection.Screener",
                "HelpSection.News",
                "HelpSection.Profile"
            ]
        );
        assert_eq!(sections(AppState::Profile).len(), 2);
    }
}

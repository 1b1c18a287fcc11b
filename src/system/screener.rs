use bevy_ecs::prelude::*;
use ratatui::widgets::TableState;

use super::{
    tasks::{spawn_load, Delivery, Generation, TaskSet},
    ChromeRes, Command, Key, PageChrome, Popups, Provider,
};
use crate::{
    app::{AppState, LAST_STATE},
    data::{ScreenerQuery, ScreenerResponse, ScreenerRow, Slot, Symbol, STOCKS},
    helper::cycle::{SelectionExt, Step},
    widgets::{LocalSearch, LogPanel, Terminal},
};

pub const PAGE_SIZE: u32 = 20;

#[derive(Debug, Resource)]
pub struct ScreenerPage {
    /// 1-based.
    pub page: u32,
    pub total_pages: u32,
    /// Symbols available across all pages.
    pub total: u32,
    pub rows: Slot<Vec<ScreenerRow>>,
    pub table: TableState,
    tasks: TaskSet,
    generation: Generation,
}

impl Default for ScreenerPage {
    fn default() -> Self {
        Self {
            page: 1,
            total_pages: 1,
            total: 0,
            rows: Slot::Idle,
            table: TableState::default(),
            tasks: TaskSet::default(),
            generation: Generation::default(),
        }
    }
}

/// Filter used by the find popup: ticker prefix or a name fragment.
pub fn row_matches(keyword: &str, row: &ScreenerRow) -> bool {
    let keyword = keyword.to_ascii_lowercase();
    row.ticker.to_ascii_lowercase().starts_with(&keyword)
        || row.name().to_ascii_lowercase().contains(&keyword)
}

impl ScreenerPage {
    pub fn load(&mut self, provider: &Provider, command: &Command, force_refresh: bool) {
        self.tasks.abort_all();
        self.generation.bump();
        self.rows = Slot::Loading;

        let mut query = ScreenerQuery::page(self.page, PAGE_SIZE);
        query.force_refresh = force_refresh;
        tracing::debug!(page = query.page, force_refresh, "loading screener");
        spawn_load(
            &mut self.tasks,
            Delivery {
                tx: command.0.clone(),
                generation: self.generation.clone(),
                name: "screener",
                symbol: None,
            },
            provider.screener(query),
            |world, slot| {
                let rows = world.resource_mut::<ScreenerPage>().apply(slot);
                world
                    .resource_mut::<LocalSearch<ScreenerRow>>()
                    .set_items(rows);
            },
        );
    }

    /// Stores a screener response and returns the rows now on screen.
    pub fn apply(&mut self, response: Slot<ScreenerResponse>) -> Vec<ScreenerRow> {
        self.table.select(None);
        self.rows = match response {
            Slot::Ready(response) => {
                self.page = response.page.max(1);
                self.total_pages = response.total_pages.max(1);
                self.total = response.total_available.max(response.total);
                for row in &response.stocks {
                    STOCKS.modify(Symbol::new(&row.ticker), |stock| stock.update_from_row(row));
                }
                Slot::Ready(response.stocks)
            }
            Slot::Empty => Slot::Empty,
            Slot::Failed(message) => Slot::Failed(message),
            Slot::Idle | Slot::Loading => Slot::Idle,
        };
        self.rows.ready().cloned().unwrap_or_default()
    }

    pub fn cancel(&mut self) {
        self.tasks.abort_all();
        self.generation.bump();
        if self.rows.is_loading() {
            self.rows = Slot::Idle;
        }
    }

    pub fn is_busy(&self) -> bool {
        self.rows.is_loading()
    }

    pub fn selected_row(&self) -> Option<&ScreenerRow> {
        let idx = self.table.selected()?;
        self.rows.ready()?.get(idx)
    }

    /// Highlights `ticker` if it is on the current page.
    pub fn select_ticker(&mut self, ticker: &str) {
        let idx = self
            .rows
            .ready()
            .and_then(|rows| rows.iter().position(|r| r.ticker == ticker));
        if idx.is_some() {
            self.table.select(idx);
        }
    }

    /// Steps one page, clamped to the known range. Returns whether the page changed.
    pub fn turn_page(&mut self, forward: bool) -> bool {
        let page = if forward {
            (self.page + 1).min(self.total_pages)
        } else {
            self.page.saturating_sub(1).max(1)
        };
        let changed = page != self.page;
        self.page = page;
        changed
    }

    fn handle_key(&mut self, key: Key, provider: &Provider, command: &Command) {
        let len = self.rows.ready().map_or(0, Vec::len);
        match key {
            Key::Up => self.table.step(len, Step::Back),
            Key::Down => self.table.step(len, Step::Forward),
            Key::Char('[') | Key::Left => {
                if self.turn_page(false) {
                    self.load(provider, command, false);
                }
            }
            Key::Char(']') | Key::Right => {
                if self.turn_page(true) {
                    self.load(provider, command, false);
                }
            }
            Key::Refresh => self.load(provider, command, true),
            Key::Enter => {
                if let Some(row) = self.selected_row() {
                    super::open_profile(command, Symbol::new(&row.ticker));
                }
            }
            _ => (),
        }
    }
}

pub fn enter_screener(
    mut page: ResMut<ScreenerPage>,
    provider: Res<Provider>,
    command: Res<Command>,
) {
    if matches!(page.rows, Slot::Idle) {
        page.load(&provider, &command, false);
    }
}

pub fn exit_screener(mut page: ResMut<ScreenerPage>) {
    page.cancel();
    LAST_STATE.store(AppState::Screener, std::sync::atomic::Ordering::Relaxed);
}

pub fn render_screener(
    mut terminal: ResMut<Terminal>,
    mut events: EventReader<Key>,
    mut page: ResMut<ScreenerPage>,
    command: Res<Command>,
    (state, tips, provider): ChromeRes,
    (mut search, mut find): Popups,
    mut log_panel: Local<LogPanel>,
) {
    for key in &mut events {
        page.handle_key(*key, &provider, &command);
    }
    if matches!(page.rows, Slot::Idle) {
        page.load(&provider, &command, false);
    }

    let chrome = PageChrome {
        state: *state.get(),
        tip: tips.tick(),
        source: provider.source(),
        busy: page.is_busy(),
        ticker: None,
    };
    let page = &mut *page;
    terminal.render(|frame| {
        super::draw_page(
            frame,
            chrome,
            &mut search,
            &mut find,
            &mut log_panel,
            |frame, rect| crate::views::screener::render(frame, rect, page),
        );
    });
}

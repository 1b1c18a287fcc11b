//! ECS side of the dashboard: page resources, their loads, and the per-frame draw.
//!
//! Each page owns its state as a resource and renders in an `Update` system gated on its
//! [`AppState`]. Loads run on tokio and come back as [`CommandQueue`]s through
//! [`Command`]; see [`tasks`] for how stale ones are kept out.

use std::{ops::Deref, sync::Arc};

use bevy_ecs::{prelude::*, system::CommandQueue};
use ratatui::{layout::Rect, Frame};
use tokio::sync::mpsc;

use crate::{
    app::{AppState, LOG_PANEL_VISIBLE},
    data::{DataSource, ScreenerRow, SymbolMatch},
    provider::DataProvider,
    ui::Content,
    widgets::{Carousel, Loading, LoadingWidget, LocalSearch, LogPanel, Search, Terminal},
};

mod news;
mod profile;
mod screener;
pub mod tasks;

pub use news::{enter_news, exit_news, render_news, NewsFeed, NewsPage};
pub use profile::{enter_profile, exit_profile, open_profile, render_profile, Panel, ProfilePage};
pub use screener::{
    enter_screener, exit_screener, render_screener, row_matches, ScreenerPage, PAGE_SIZE,
};

/// Keys forwarded to the active page.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Tab,
    BackTab,
    Enter,
    /// Reload the page with live data.
    Refresh,
    Char(char),
}

#[derive(Clone, Resource)]
pub struct Command(pub mpsc::UnboundedSender<CommandQueue>);

impl Command {
    pub fn send(&self, queue: CommandQueue) {
        if self.0.send(queue).is_err() {
            tracing::debug!("event loop is gone, dropping command queue");
        }
    }
}

#[derive(Clone, Resource)]
pub struct Provider(pub Arc<dyn DataProvider>);

impl Deref for Provider {
    type Target = dyn DataProvider;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

/// What the error page shows.
#[derive(Clone, Resource)]
pub struct ErrorMessage(pub Content<'static>);

/// Rotating footer hints.
pub type Tips = Carousel<String>;

type ChromeRes<'w> = (
    Res<'w, State<AppState>>,
    Res<'w, Tips>,
    Res<'w, Provider>,
);
type Popups<'w> = (
    ResMut<'w, Search<SymbolMatch>>,
    ResMut<'w, LocalSearch<ScreenerRow>>,
);

pub fn error(mut terminal: ResMut<Terminal>, err: Res<ErrorMessage>) {
    terminal.render(|frame| {
        frame.render_widget(err.0.clone(), frame.size());
    });
}

pub fn loading(mut terminal: ResMut<Terminal>, loading: Res<Loading>) {
    terminal.render(|frame| {
        frame.render_widget(LoadingWidget::from(&*loading), frame.size());
    });
}

/// Everything around a page body.
struct PageChrome<'a> {
    state: AppState,
    tip: Option<&'a String>,
    source: DataSource,
    busy: bool,
    /// Input of the ticker filter popup, when the page has one.
    ticker: Option<tui_input::Input>,
}

/// Draws the navbar, the footer and the overlays around `body`.
fn draw_page(
    frame: &mut Frame,
    chrome: PageChrome<'_>,
    search: &mut Search<SymbolMatch>,
    find: &mut LocalSearch<ScreenerRow>,
    log_panel: &mut LogPanel,
    body: impl FnOnce(&mut Frame, Rect),
) {
    let rect = frame.size();
    if rect.height < 3 {
        return;
    }
    let top = Rect { height: 1, ..rect };
    crate::views::navbar::render(frame, top, chrome.state);

    let bottom = Rect {
        y: rect.y + rect.height - 1,
        height: 1,
        ..rect
    };
    crate::views::footer::render(
        frame,
        bottom,
        chrome.tip.map(String::as_str),
        chrome.source,
        chrome.busy,
    );

    let rect = Rect {
        y: rect.y + 1,
        height: rect.height - 2,
        ..rect
    };
    body(frame, rect);

    crate::views::popup::render(
        frame,
        rect,
        (chrome.state, chrome.source),
        search,
        find,
        chrome.ticker.as_ref(),
    );

    if LOG_PANEL_VISIBLE.load(std::sync::atomic::Ordering::Relaxed) {
        let log_rect = crate::ui::rect::bottom(15, rect);
        log_panel.render(frame, log_rect);
    }
}

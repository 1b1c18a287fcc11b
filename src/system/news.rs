use bevy_ecs::prelude::*;
use crossterm::event::KeyEvent;
use ratatui::widgets::TableState;
use time::OffsetDateTime;
use tui_input::backend::crossterm::EventHandler;

use super::{
    tasks::{spawn_load, Delivery, Generation, TaskSet},
    ChromeRes, Command, Key, PageChrome, Popups, Provider,
};
use crate::{
    api::ApiError,
    app::{AppState, LAST_STATE},
    data::{NewsCategory, NewsItem, Slot},
    filter::{filter_news, source_options, FilterCriteria},
    helper::{
        clock,
        cycle::{SelectionExt, Step},
    },
    widgets::{LogPanel, Terminal},
};

/// A news list with its filter bar. Shared by the market news page and the profile's
/// company news panel.
#[derive(Debug, Default)]
pub struct NewsFeed {
    items: Slot<Vec<NewsItem>>,
    criteria: FilterCriteria,
    sources: Vec<String>,
    visible: Vec<NewsItem>,
    pub table: TableState,
    pub ticker: tui_input::Input,
}

impl NewsFeed {
    pub fn items(&self) -> &Slot<Vec<NewsItem>> {
        &self.items
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Items passing the current criteria.
    pub fn visible(&self) -> &[NewsItem] {
        &self.visible
    }

    pub fn total(&self) -> usize {
        self.items.ready().map_or(0, Vec::len)
    }

    pub fn selected(&self) -> Option<&NewsItem> {
        self.table.selected().and_then(|idx| self.visible.get(idx))
    }

    pub fn set_loading(&mut self) {
        self.items = Slot::Loading;
        self.visible.clear();
        self.table.select(None);
    }

    /// Back to `Idle` if a load was cut short, so the next visit loads again.
    pub fn settle(&mut self) {
        if self.items.is_loading() {
            self.items = Slot::Idle;
        }
    }

    pub fn set_items(&mut self, items: Slot<Vec<NewsItem>>, now: OffsetDateTime) {
        self.sources = source_options(items.ready().map_or(&[][..], Vec::as_slice));
        self.items = items;
        self.table.select(None);
        self.refilter(now);
    }

    /// Recomputes the visible list from scratch.
    pub fn refilter(&mut self, now: OffsetDateTime) {
        self.visible = self
            .items
            .ready()
            .map(|items| filter_news(items, &self.criteria, now))
            .unwrap_or_default();
        let selected = self
            .table
            .selected()
            .filter(|idx| *idx < self.visible.len());
        self.table.select(selected);
    }

    pub fn reset_filters(&mut self, now: OffsetDateTime) {
        self.criteria = FilterCriteria::default();
        self.ticker.reset();
        self.refilter(now);
    }

    /// Filter and selection keys; returns whether the key was used.
    pub fn handle_key(&mut self, key: Key, now: OffsetDateTime) -> bool {
        match key {
            Key::Up => self.table.step(self.visible.len(), Step::Back),
            Key::Down => self.table.step(self.visible.len(), Step::Forward),
            Key::Char('d') => {
                self.criteria.date_range = self.criteria.date_range.next();
                self.refilter(now);
            }
            Key::Char('s') => {
                self.criteria.source = self.criteria.source.next(&self.sources);
                self.refilter(now);
            }
            Key::Char('x') => self.reset_filters(now),
            _ => return false,
        }
        true
    }

    /// Prepares the ticker popup with the current ticker filter.
    pub fn begin_ticker_edit(&mut self) {
        self.ticker = tui_input::Input::new(self.criteria.ticker.clone());
    }

    /// Feeds a key to the ticker popup, filtering as the user types. Returns `true` once
    /// the popup should close: Enter keeps the ticker, Esc clears it.
    pub fn edit_ticker(&mut self, event: KeyEvent, now: OffsetDateTime) -> bool {
        match event {
            key!(Enter) => return true,
            key!(Esc) => {
                self.ticker.reset();
                self.criteria.ticker.clear();
                self.refilter(now);
                return true;
            }
            _ => {
                let evt = crossterm::event::Event::Key(event);
                if self.ticker.handle_event(&evt).is_some() {
                    self.criteria.ticker = self.ticker.value().to_string();
                    self.refilter(now);
                }
            }
        }
        false
    }
}

/// Market news page.
#[derive(Debug, Default, Resource)]
pub struct NewsPage {
    pub category: NewsCategory,
    pub feed: NewsFeed,
    tasks: TaskSet,
    generation: Generation,
}

impl NewsPage {
    /// Fetches the current category, replacing whatever is in flight.
    pub fn load(&mut self, provider: &Provider, command: &Command) {
        self.tasks.abort_all();
        self.generation.bump();
        self.feed.set_loading();

        let category = self.category;
        let request = provider.market_news(category);
        spawn_load(
            &mut self.tasks,
            Delivery {
                tx: command.0.clone(),
                generation: self.generation.clone(),
                name: "market_news",
                symbol: None,
            },
            async move {
                let articles = request.await?;
                Ok::<_, ApiError>(NewsItem::from_articles(
                    articles,
                    clock::local_offset(),
                    None,
                ))
            },
            |world, slot| {
                world
                    .resource_mut::<NewsPage>()
                    .feed
                    .set_items(slot, clock::now());
            },
        );
        tracing::debug!(category = category.as_str(), "loading market news");
    }

    pub fn cancel(&mut self) {
        self.tasks.abort_all();
        self.generation.bump();
        self.feed.settle();
    }

    pub fn is_busy(&self) -> bool {
        self.feed.items().is_loading()
    }

    fn handle_key(&mut self, key: Key, provider: &Provider, command: &Command) {
        match key {
            Key::Tab => {
                self.category = self.category.next();
                self.load(provider, command);
            }
            Key::BackTab => {
                self.category = self.category.prev();
                self.load(provider, command);
            }
            Key::Refresh => self.load(provider, command),
            key => {
                self.feed.handle_key(key, clock::now());
            }
        }
    }
}

pub fn enter_news(mut page: ResMut<NewsPage>, provider: Res<Provider>, command: Res<Command>) {
    if matches!(page.feed.items(), Slot::Idle) {
        page.load(&provider, &command);
    }
}

pub fn exit_news(mut page: ResMut<NewsPage>) {
    page.cancel();
    LAST_STATE.store(AppState::News, std::sync::atomic::Ordering::Relaxed);
}

pub fn render_news(
    mut terminal: ResMut<Terminal>,
    mut events: EventReader<Key>,
    mut page: ResMut<NewsPage>,
    command: Res<Command>,
    (state, tips, provider): ChromeRes,
    (mut search, mut find): Popups,
    mut log_panel: Local<LogPanel>,
) {
    for key in &mut events {
        page.handle_key(*key, &provider, &command);
    }
    // left idle by a cancelled visit
    if matches!(page.feed.items(), Slot::Idle) {
        page.load(&provider, &command);
    }

    let chrome = PageChrome {
        state: *state.get(),
        tip: tips.tick(),
        source: provider.source(),
        busy: page.is_busy(),
        ticker: Some(page.feed.ticker.clone()),
    };
    let page = &mut *page;
    terminal.render(|frame| {
        super::draw_page(
            frame,
            chrome,
            &mut search,
            &mut find,
            &mut log_panel,
            |frame, rect| {
                let title = format!(
                    " {} · {} [Tab] ",
                    t!("News.Title"),
                    page.category.label()
                );
                crate::views::news::render_feed(frame, rect, &mut page.feed, &title);
            },
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DateRange;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::collections::BTreeSet;
    use time::macros::datetime;

    fn item(id: &str, at: OffsetDateTime, source: &str, tickers: &[&str]) -> NewsItem {
        NewsItem {
            id: id.to_string(),
            date: at.date(),
            time: clock::hh_mm(at),
            headline: format!("headline {id}"),
            source: source.to_string(),
            category: "general".to_string(),
            summary: None,
            url: None,
            tickers: tickers.iter().map(ToString::to_string).collect::<BTreeSet<_>>(),
        }
    }

    fn feed(now: OffsetDateTime) -> NewsFeed {
        let mut feed = NewsFeed::default();
        feed.set_items(
            Slot::Ready(vec![
                item("1", datetime!(2024-06-14 09:00 UTC), "Reuters", &["AAPL"]),
                item("2", datetime!(2024-06-01 09:00 UTC), "CNBC", &["MSFT"]),
                item("3", datetime!(2024-01-02 09:00 UTC), "Reuters", &["AAPL", "MSFT"]),
            ]),
            now,
        );
        feed
    }

    fn ids(feed: &NewsFeed) -> Vec<&str> {
        feed.visible().iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn filter_keys_recompute_the_visible_list() {
        let now = datetime!(2024-06-15 12:00 UTC);
        let mut feed = feed(now);
        assert_eq!(ids(&feed), ["1", "2", "3"]);

        // Any -> Today -> Last 7 days
        assert!(feed.handle_key(Key::Char('d'), now));
        assert_eq!(feed.criteria().date_range, DateRange::Today);
        assert!(ids(&feed).is_empty());
        feed.handle_key(Key::Char('d'), now);
        assert_eq!(ids(&feed), ["1"]);

        feed.handle_key(Key::Char('x'), now);
        assert_eq!(ids(&feed), ["1", "2", "3"]);

        // outlets are sorted: Benzinga, Bloomberg, CNBC, ...
        for _ in 0..3 {
            feed.handle_key(Key::Char('s'), now);
        }
        assert_eq!(feed.criteria().source.label(), "CNBC");
        assert_eq!(ids(&feed), ["2"]);
        assert!(!feed.handle_key(Key::Char('z'), now));
    }

    #[test]
    fn ticker_popup_filters_while_typing() {
        let now = datetime!(2024-06-15 12:00 UTC);
        let mut feed = feed(now);
        feed.begin_ticker_edit();
        for c in "msft".chars() {
            let done = feed.edit_ticker(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), now);
            assert!(!done);
        }
        assert_eq!(ids(&feed), ["2", "3"]);
        assert!(feed.edit_ticker(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), now));
        assert_eq!(feed.criteria().ticker, "msft");

        feed.begin_ticker_edit();
        assert!(feed.edit_ticker(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), now));
        assert_eq!(ids(&feed), ["1", "2", "3"]);
    }

    #[test]
    fn selection_survives_refilter_only_when_in_range() {
        let now = datetime!(2024-06-15 12:00 UTC);
        let mut feed = feed(now);
        feed.handle_key(Key::Up, now);
        assert_eq!(feed.selected().map(|i| i.id.as_str()), Some("3"));
        feed.criteria.date_range = DateRange::Last7Days;
        feed.refilter(now);
        assert!(feed.selected().is_none());
    }

    #[test]
    fn cut_short_loads_become_idle() {
        let mut feed = NewsFeed::default();
        feed.set_loading();
        feed.settle();
        assert_eq!(feed.items(), &Slot::Idle);
        assert_eq!(feed.total(), 0);
    }
}

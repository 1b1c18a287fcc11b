use std::future::Future;

use bevy_ecs::{prelude::*, system::CommandQueue};
use ratatui::widgets::TableState;

use super::{
    news::NewsFeed,
    tasks::{spawn_load, Delivery, Generation, TaskSet},
    ChromeRes, Command, Key, PageChrome, Popups, Provider,
};
use crate::{
    api::ApiError,
    app::{AppState, LAST_STATE},
    candles::{window, CANDLES},
    chart::ChartCache,
    data::{
        ownership::rank_holders, recommendation::chronological, BasicFinancials, Candles,
        ChartKind, CompanyProfile, Freshness, HasData, InsiderTransaction, InstitutionHolder,
        NewsItem, Quote, RecommendationTrend, Resolution, Slot, Symbol, Timeframe, STOCKS,
    },
    eps::{compute_eps_surprises, EarningsEntry, EarningsSurprisePoint},
    helper::{
        clock,
        cycle::{self, SelectionExt, Step},
    },
    metrics::{normalize_series, Cadence, NamedSeries},
    provider::{COMPANY_NEWS_LIMIT, EARNINGS_LIMIT, INSIDER_LIMIT, OWNERSHIP_LIMIT},
    widgets::{LogPanel, Terminal},
};

/// Days of company news shown on the profile.
const COMPANY_NEWS_DAYS: i64 = 30;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum Panel {
    #[default]
    Overview,
    Financials,
    Earnings,
    Analysts,
    Insiders,
    Ownership,
    News,
}

impl Panel {
    pub fn label(self) -> String {
        match self {
            Self::Overview => t!("Profile.Panel.Overview"),
            Self::Financials => t!("Profile.Panel.Financials"),
            Self::Earnings => t!("Profile.Panel.Earnings"),
            Self::Analysts => t!("Profile.Panel.Analysts"),
            Self::Insiders => t!("Profile.Panel.Insiders"),
            Self::Ownership => t!("Profile.Panel.Ownership"),
            Self::News => t!("Profile.Panel.News"),
        }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::iter()
            .skip_while(|p| *p != self)
            .nth(1)
            .unwrap_or(Self::Overview)
    }

    #[must_use]
    pub fn prev(self) -> Self {
        Self::iter()
            .take_while(|p| *p != self)
            .last()
            .unwrap_or(Self::News)
    }
}

/// Chart state that lives across frames.
#[derive(Debug, Default)]
pub struct ProfileCharts {
    pub price: ChartCache,
    pub metric: ChartCache,
    pub eps: ChartCache,
    pub analysts: ChartCache,
}

impl ProfileCharts {
    fn invalidate(&mut self) {
        self.price.invalidate();
        self.metric.invalidate();
        self.eps.invalidate();
        self.analysts.invalidate();
    }
}

/// Company profile page for one symbol. Each section loads into its own slot so a slow or
/// failing endpoint only blanks its own panel.
#[derive(Debug, Resource)]
pub struct ProfilePage {
    pub symbol: Option<Symbol>,
    pub panel: Panel,
    pub profile: Slot<CompanyProfile>,
    pub quote: Slot<Quote>,
    pub peers: Slot<Vec<Symbol>>,
    pub financials: Slot<BasicFinancials>,
    pub recommendations: Slot<Vec<RecommendationTrend>>,
    pub earnings: Slot<Vec<EarningsEntry>>,
    pub insiders: Slot<Vec<InsiderTransaction>>,
    pub ownership: Slot<Vec<InstitutionHolder>>,
    pub candles: Slot<Candles>,
    pub news: NewsFeed,
    series: Vec<NamedSeries>,
    eps: Vec<EarningsSurprisePoint>,
    pub cadence: Cadence,
    /// Index into the normalized series of the current cadence.
    pub metric: usize,
    pub chart_kind: ChartKind,
    pub timeframe: Timeframe,
    /// Used by the 1D and 5D windows only.
    pub intraday: Resolution,
    pub charts: ProfileCharts,
    /// Bumped whenever charted data changes; keys the chart caches.
    revision: u64,
    pub insider_table: TableState,
    pub ownership_table: TableState,
    tasks: TaskSet,
    generation: Generation,
    chart_tasks: TaskSet,
    chart_generation: Generation,
}

impl Default for ProfilePage {
    fn default() -> Self {
        Self {
            symbol: None,
            panel: Panel::default(),
            profile: Slot::Idle,
            quote: Slot::Idle,
            peers: Slot::Idle,
            financials: Slot::Idle,
            recommendations: Slot::Idle,
            earnings: Slot::Idle,
            insiders: Slot::Idle,
            ownership: Slot::Idle,
            candles: Slot::Idle,
            news: NewsFeed::default(),
            series: Vec::new(),
            eps: Vec::new(),
            cadence: Cadence::default(),
            metric: 0,
            chart_kind: ChartKind::default(),
            timeframe: Timeframe::default(),
            intraday: Resolution::Min5,
            charts: ProfileCharts::default(),
            revision: 0,
            insider_table: TableState::default(),
            ownership_table: TableState::default(),
            tasks: TaskSet::default(),
            generation: Generation::default(),
            chart_tasks: TaskSet::default(),
            chart_generation: Generation::default(),
        }
    }
}

fn reset_if_loading<T>(slot: &mut Slot<T>) {
    if slot.is_loading() {
        *slot = Slot::Idle;
    }
}

impl ProfilePage {
    /// Switches to `symbol`. Returns `false` if it was already selected, in which case the
    /// loaded data is kept.
    pub fn select(&mut self, symbol: Symbol) -> bool {
        if self.symbol.as_ref() == Some(&symbol) {
            return false;
        }
        tracing::info!(symbol = %symbol, "profile symbol selected");
        self.cancel();
        let cadence = self.cadence;
        let chart_kind = self.chart_kind;
        let timeframe = self.timeframe;
        let intraday = self.intraday;
        let revision = self.revision;
        *self = Self {
            symbol: Some(symbol),
            cadence,
            chart_kind,
            timeframe,
            intraday,
            revision: revision + 1,
            ..Self::default()
        };
        true
    }

    /// Aborts every load in flight; their slots go back to `Idle`.
    pub fn cancel(&mut self) {
        self.tasks.abort_all();
        self.generation.bump();
        self.chart_tasks.abort_all();
        self.chart_generation.bump();
        reset_if_loading(&mut self.profile);
        reset_if_loading(&mut self.quote);
        reset_if_loading(&mut self.peers);
        reset_if_loading(&mut self.financials);
        reset_if_loading(&mut self.recommendations);
        reset_if_loading(&mut self.earnings);
        reset_if_loading(&mut self.insiders);
        reset_if_loading(&mut self.ownership);
        reset_if_loading(&mut self.candles);
        self.news.settle();
    }

    pub fn is_busy(&self) -> bool {
        self.profile.is_loading()
            || self.quote.is_loading()
            || self.peers.is_loading()
            || self.financials.is_loading()
            || self.recommendations.is_loading()
            || self.earnings.is_loading()
            || self.insiders.is_loading()
            || self.ownership.is_loading()
            || self.candles.is_loading()
            || self.news.items().is_loading()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Metric series of the current cadence, oldest point first.
    pub fn series(&self) -> &[NamedSeries] {
        &self.series
    }

    pub fn selected_series(&self) -> Option<&NamedSeries> {
        self.series.get(self.metric)
    }

    pub fn eps(&self) -> &[EarningsSurprisePoint] {
        &self.eps
    }

    /// The selected series together with the cache of the chart drawing it.
    pub fn metric_chart(&mut self) -> (Option<&NamedSeries>, &mut ChartCache) {
        (self.series.get(self.metric), &mut self.charts.metric)
    }

    pub fn eps_chart(&mut self) -> (&[EarningsSurprisePoint], &mut ChartCache) {
        (&self.eps, &mut self.charts.eps)
    }

    fn delivery(&self, command: &Command, name: &'static str, chart: bool) -> Delivery {
        Delivery {
            tx: command.0.clone(),
            generation: if chart {
                self.chart_generation.clone()
            } else {
                self.generation.clone()
            },
            name,
            symbol: self.symbol.as_ref().map(ToString::to_string),
        }
    }

    fn fetch<T, F>(
        &mut self,
        command: &Command,
        name: &'static str,
        request: impl Future<Output = Result<T, ApiError>> + Send + 'static,
        apply: F,
    ) where
        T: HasData + Send + 'static,
        F: FnOnce(&mut ProfilePage, Slot<T>) + Send + 'static,
    {
        let delivery = self.delivery(command, name, false);
        spawn_load(&mut self.tasks, delivery, request, move |world, slot| {
            apply(world.resource_mut::<ProfilePage>().into_inner(), slot);
        });
    }

    /// Starts a load for every slot still `Idle`.
    pub fn load_idle(&mut self, provider: &Provider, command: &Command, freshness: Freshness) {
        let Some(symbol) = self.symbol.clone() else {
            return;
        };

        if matches!(self.profile, Slot::Idle) {
            self.profile = Slot::Loading;
            let request = provider.profile(symbol.clone(), freshness);
            self.fetch(command, "profile", request, ProfilePage::set_profile);
        }
        if matches!(self.quote, Slot::Idle) {
            self.quote = Slot::Loading;
            let request = provider.quote(symbol.clone());
            self.fetch(command, "quote", request, |page, slot| page.quote = slot);
        }
        if matches!(self.peers, Slot::Idle) {
            self.peers = Slot::Loading;
            let request = provider.peers(symbol.clone());
            self.fetch(command, "peers", request, |page, slot| page.peers = slot);
        }
        if matches!(self.financials, Slot::Idle) {
            self.financials = Slot::Loading;
            let request = provider.basic_financials(symbol.clone(), freshness);
            self.fetch(command, "basic_financials", request, ProfilePage::set_financials);
        }
        if matches!(self.recommendations, Slot::Idle) {
            self.recommendations = Slot::Loading;
            let request = provider.recommendations(symbol.clone(), freshness);
            self.fetch(command, "recommendations", request, |page, slot| {
                page.recommendations = map_ready(slot, chronological);
                page.revision += 1;
            });
        }
        if matches!(self.earnings, Slot::Idle) {
            self.earnings = Slot::Loading;
            let request = provider.earnings(symbol.clone(), EARNINGS_LIMIT, freshness);
            self.fetch(command, "earnings", request, ProfilePage::set_earnings);
        }
        if matches!(self.insiders, Slot::Idle) {
            self.insiders = Slot::Loading;
            let request = provider.insider_transactions(symbol.clone(), INSIDER_LIMIT, freshness);
            self.fetch(command, "insider_transactions", request, |page, slot| {
                page.insider_table.select(None);
                page.insiders = slot;
            });
        }
        if matches!(self.ownership, Slot::Idle) {
            self.ownership = Slot::Loading;
            let request = provider.institution_ownership(symbol.clone(), OWNERSHIP_LIMIT);
            self.fetch(command, "institution_ownership", request, |page, slot| {
                page.ownership_table.select(None);
                page.ownership = map_ready(slot, rank_holders);
            });
        }
        if matches!(self.news.items(), Slot::Idle) {
            self.news.set_loading();
            let to = clock::now().date();
            let from = to - time::Duration::days(COMPANY_NEWS_DAYS);
            let request = provider.company_news(symbol.clone(), from, to, freshness);
            let owner = symbol.to_string();
            self.fetch(
                command,
                "company_news",
                async move {
                    let mut articles = request.await?;
                    articles.truncate(COMPANY_NEWS_LIMIT as usize);
                    Ok::<_, ApiError>(NewsItem::from_articles(
                        articles,
                        clock::local_offset(),
                        Some(&owner),
                    ))
                },
                |page, slot| page.news.set_items(slot, clock::now()),
            );
        }
        if matches!(self.candles, Slot::Idle) {
            self.load_chart(provider, command, freshness);
        }
    }

    /// Drops everything loaded for the symbol and loads it again.
    pub fn refresh(&mut self, provider: &Provider, command: &Command, freshness: Freshness) {
        self.cancel();
        self.profile = Slot::Idle;
        self.quote = Slot::Idle;
        self.peers = Slot::Idle;
        self.financials = Slot::Idle;
        self.recommendations = Slot::Idle;
        self.earnings = Slot::Idle;
        self.insiders = Slot::Idle;
        self.ownership = Slot::Idle;
        self.candles = Slot::Idle;
        self.news.set_items(Slot::Idle, clock::now());
        self.recompute_series();
        self.eps.clear();
        self.charts.invalidate();
        self.revision += 1;
        self.load_idle(provider, command, freshness);
    }

    /// Loads the price chart for the current timeframe, from the session cache when allowed.
    pub fn load_chart(&mut self, provider: &Provider, command: &Command, freshness: Freshness) {
        let Some(symbol) = self.symbol.clone() else {
            return;
        };
        self.chart_tasks.abort_all();
        self.chart_generation.bump();

        let timeframe = self.timeframe;
        let resolution = timeframe.resolution(self.intraday);
        if freshness == Freshness::Cached {
            if let Some(candles) = CANDLES.get(&symbol, timeframe, resolution) {
                tracing::debug!(symbol = %symbol, timeframe = timeframe.label(), "candles from cache");
                self.set_candles(if candles.is_empty() {
                    Slot::Empty
                } else {
                    Slot::Ready(candles)
                });
                return;
            }
        }

        self.candles = Slot::Loading;
        let (from, to) = window(timeframe, clock::unix_now());
        let delivery = self.delivery(command, "candles", true);
        let request = provider.candles(symbol.clone(), resolution, from, to);
        spawn_load(&mut self.chart_tasks, delivery, request, move |world, slot| {
            if let Slot::Ready(candles) = &slot {
                CANDLES.update(symbol, timeframe, resolution, candles.clone());
            }
            world.resource_mut::<ProfilePage>().set_candles(slot);
        });
    }

    pub fn set_profile(&mut self, slot: Slot<CompanyProfile>) {
        if let (Some(symbol), Some(profile)) = (&self.symbol, slot.ready()) {
            STOCKS.modify(symbol.clone(), |stock| stock.update_from_profile(profile));
        }
        self.profile = slot;
    }

    pub fn set_financials(&mut self, slot: Slot<BasicFinancials>) {
        self.financials = slot;
        self.metric = 0;
        self.recompute_series();
    }

    pub fn set_earnings(&mut self, slot: Slot<Vec<EarningsEntry>>) {
        self.eps = slot
            .ready()
            .map(|entries| compute_eps_surprises(entries))
            .unwrap_or_default();
        self.earnings = slot;
        self.revision += 1;
    }

    pub fn set_candles(&mut self, slot: Slot<Candles>) {
        self.candles = slot;
        self.charts.price.invalidate();
        self.revision += 1;
    }

    fn recompute_series(&mut self) {
        self.series = self
            .financials
            .ready()
            .map(|f| normalize_series(f.series.by_cadence(self.cadence), self.cadence))
            .unwrap_or_default();
        if self.metric >= self.series.len() {
            self.metric = 0;
        }
        self.revision += 1;
    }

    pub fn toggle_cadence(&mut self) {
        let key = self.selected_series().map(|s| s.key.clone());
        self.cadence = self.cadence.toggle();
        self.recompute_series();
        // stay on the same metric when the other cadence has it
        if let Some(idx) = key.and_then(|key| self.series.iter().position(|s| s.key == key)) {
            self.metric = idx;
        }
    }

    fn handle_key(&mut self, key: Key, provider: &Provider, command: &Command) {
        match key {
            Key::Tab => self.panel = self.panel.next(),
            Key::BackTab => self.panel = self.panel.prev(),
            Key::Refresh => {
                if let Some(symbol) = &self.symbol {
                    CANDLES.clear_symbol(symbol);
                }
                self.refresh(provider, command, Freshness::Live);
            }
            Key::Char('k') => {
                self.chart_kind = self.chart_kind.toggle();
                self.revision += 1;
            }
            Key::Char('f') => {
                self.timeframe = self.timeframe.next();
                self.load_chart(provider, command, Freshness::Cached);
            }
            Key::Char('i') => {
                self.intraday = self.intraday.next_intraday();
                if self.timeframe.resolution(self.intraday).is_intraday() {
                    self.load_chart(provider, command, Freshness::Cached);
                }
            }
            key => self.handle_panel_key(key),
        }
    }

    fn handle_panel_key(&mut self, key: Key) {
        match (self.panel, key) {
            (Panel::Financials, Key::Left) => {
                self.metric =
                    cycle::wrapping(Some(self.metric), self.series.len(), Step::Back).unwrap_or(0);
                self.revision += 1;
            }
            (Panel::Financials, Key::Right) => {
                self.metric = cycle::wrapping(Some(self.metric), self.series.len(), Step::Forward)
                    .unwrap_or(0);
                self.revision += 1;
            }
            (Panel::Financials, Key::Char('c')) => self.toggle_cadence(),
            (Panel::Insiders, Key::Up | Key::Down) => {
                let len = self.insiders.ready().map_or(0, Vec::len);
                move_selection(&mut self.insider_table, key, len);
            }
            (Panel::Ownership, Key::Up | Key::Down) => {
                let len = self.ownership.ready().map_or(0, Vec::len);
                move_selection(&mut self.ownership_table, key, len);
            }
            (Panel::News, key) => {
                self.news.handle_key(key, clock::now());
            }
            _ => (),
        }
    }
}

fn map_ready<T>(slot: Slot<T>, f: impl FnOnce(T) -> T) -> Slot<T> {
    match slot {
        Slot::Ready(value) => Slot::Ready(f(value)),
        other => other,
    }
}

fn move_selection(table: &mut TableState, key: Key, len: usize) {
    let step = if key == Key::Up { Step::Back } else { Step::Forward };
    table.step(len, step);
}

/// Selects `symbol` on the profile page and switches to it.
pub fn open_profile(command: &Command, symbol: Symbol) {
    let mut queue = CommandQueue::default();
    queue.push(move |world: &mut World| {
        world.resource_mut::<ProfilePage>().select(symbol);
        world
            .resource_mut::<NextState<AppState>>()
            .set(AppState::Profile);
    });
    command.send(queue);
}

pub fn enter_profile(
    mut page: ResMut<ProfilePage>,
    provider: Res<Provider>,
    command: Res<Command>,
) {
    page.load_idle(&provider, &command, Freshness::Cached);
}

pub fn exit_profile(mut page: ResMut<ProfilePage>) {
    page.cancel();
    LAST_STATE.store(AppState::Profile, std::sync::atomic::Ordering::Relaxed);
}

pub fn render_profile(
    mut terminal: ResMut<Terminal>,
    mut events: EventReader<Key>,
    mut page: ResMut<ProfilePage>,
    command: Res<Command>,
    (state, tips, provider): ChromeRes,
    (mut search, mut find): Popups,
    mut log_panel: Local<LogPanel>,
) {
    for key in &mut events {
        page.handle_key(*key, &provider, &command);
    }
    // slots left idle by a new symbol or a cancelled visit
    page.load_idle(&provider, &command, Freshness::Cached);

    let chrome = PageChrome {
        state: *state.get(),
        tip: tips.tick(),
        source: provider.source(),
        busy: page.is_busy(),
        ticker: (page.panel == Panel::News).then(|| page.news.ticker.clone()),
    };
    let page = &mut *page;
    terminal.render(|frame| {
        super::draw_page(
            frame,
            chrome,
            &mut search,
            &mut find,
            &mut log_panel,
            |frame, rect| crate::views::profile::render(frame, rect, page),
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metrics::MetricSeriesEntry, provider::MockProvider};
    use indexmap::IndexMap;
    use std::{sync::Arc, time::Duration};
    use tokio::sync::mpsc;

    fn entries(values: &[(&str, f64)]) -> Vec<MetricSeriesEntry> {
        values
            .iter()
            .map(|(period, v)| MetricSeriesEntry {
                period: (*period).to_string(),
                v: Some(*v),
            })
            .collect()
    }

    fn financials() -> BasicFinancials {
        let mut annual = IndexMap::new();
        annual.insert("eps".to_string(), entries(&[("2023-09-30", 6.1), ("2022-09-30", 6.0)]));
        annual.insert("roe".to_string(), entries(&[("2023-09-30", 1.5)]));
        let mut quarterly = IndexMap::new();
        quarterly.insert("roe".to_string(), entries(&[("2024-03-30", 1.4)]));
        let mut data = BasicFinancials::default();
        data.series.annual = annual;
        data.series.quarterly = quarterly;
        data
    }

    #[test]
    fn panels_cycle_both_ways() {
        assert_eq!(Panel::Overview.next(), Panel::Financials);
        assert_eq!(Panel::News.next(), Panel::Overview);
        assert_eq!(Panel::Overview.prev(), Panel::News);
        assert_eq!(Panel::Ownership.prev(), Panel::Insiders);
        assert_eq!(Panel::iter().count(), 7);
    }

    #[test]
    fn selecting_a_new_symbol_resets_data_but_keeps_chart_controls() {
        let mut page = ProfilePage::default();
        assert!(page.select(Symbol::new("AAPL")));
        page.timeframe = Timeframe::Year;
        page.panel = Panel::Earnings;
        page.set_financials(Slot::Ready(financials()));
        assert!(!page.series().is_empty());

        assert!(!page.select(Symbol::new("aapl")));
        assert_eq!(page.panel, Panel::Earnings);

        assert!(page.select(Symbol::new("MSFT")));
        assert_eq!(page.panel, Panel::Overview);
        assert_eq!(page.timeframe, Timeframe::Year);
        assert_eq!(page.financials, Slot::Idle);
        assert!(page.series().is_empty());
    }

    #[test]
    fn financials_feed_the_metric_selector() {
        let mut page = ProfilePage {
            panel: Panel::Financials,
            ..ProfilePage::default()
        };
        page.set_financials(Slot::Ready(financials()));
        let keys: Vec<_> = page.series().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["eps", "roe"]);
        assert_eq!(page.selected_series().map(|s| s.points.len()), Some(2));

        page.handle_panel_key(Key::Right);
        assert_eq!(page.selected_series().map(|s| s.key.as_str()), Some("roe"));
        page.handle_panel_key(Key::Right);
        assert_eq!(page.metric, 0);
        page.handle_panel_key(Key::Left);
        assert_eq!(page.metric, 1);

        // quarterly only has roe, which stays selected
        page.handle_panel_key(Key::Char('c'));
        assert_eq!(page.cadence, Cadence::Quarterly);
        assert_eq!(page.selected_series().map(|s| s.key.as_str()), Some("roe"));
        assert_eq!(page.metric, 0);
    }

    #[test]
    fn earnings_are_turned_into_surprises() {
        let mut page = ProfilePage::default();
        let before = page.revision();
        page.set_earnings(Slot::Ready(vec![
            EarningsEntry {
                period: "2024-03-31".to_string(),
                actual: Some(1.53),
                estimate: Some(1.5),
                ..EarningsEntry::default()
            },
            EarningsEntry {
                period: "2023-12-31".to_string(),
                actual: Some(2.18),
                estimate: None,
                ..EarningsEntry::default()
            },
        ]));
        assert_eq!(page.eps().len(), 1);
        assert!(page.eps()[0].is_beat());
        assert!(page.revision() > before);

        page.set_earnings(Slot::Failed("HTTP 500: boom".to_string()));
        assert!(page.eps().is_empty());
    }

    #[test]
    fn cancel_returns_loading_slots_to_idle() {
        let mut page = ProfilePage::default();
        page.select(Symbol::new("AAPL"));
        page.profile = Slot::Loading;
        page.insiders = Slot::Empty;
        page.news.set_loading();
        page.cancel();
        assert_eq!(page.profile, Slot::Idle);
        assert_eq!(page.insiders, Slot::Empty);
        assert_eq!(page.news.items(), &Slot::Idle);
        assert!(!page.is_busy());
    }

    #[tokio::test]
    async fn mock_provider_fills_every_panel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let command = Command(tx);
        let provider = Provider(Arc::new(MockProvider::new(Duration::ZERO)));
        let mut world = World::new();
        world.insert_resource(ProfilePage::default());
        {
            let mut page = world.resource_mut::<ProfilePage>();
            page.select(Symbol::new("AAPL"));
            page.load_idle(&provider, &command, Freshness::Cached);
            assert!(page.is_busy());
        }
        while world.resource::<ProfilePage>().is_busy() {
            let mut queue = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("load finished")
                .expect("queue");
            queue.apply(&mut world);
        }

        let page = world.resource::<ProfilePage>();
        assert!(page.profile.ready().is_some());
        assert!(page.quote.ready().is_some());
        assert!(page.peers.ready().is_some_and(|peers| !peers.is_empty()));
        assert!(!page.series().is_empty());
        assert!(!page.eps().is_empty());
        assert!(page.candles.ready().is_some());
        assert!(page.news.total() > 0);
        assert!(CANDLES
            .get(&Symbol::new("AAPL"), page.timeframe, page.timeframe.resolution(page.intraday))
            .is_some());
    }

    #[tokio::test]
    async fn results_for_a_previous_symbol_are_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let command = Command(tx);
        let provider = Provider(Arc::new(MockProvider::new(Duration::ZERO)));
        let mut world = World::new();
        world.insert_resource(ProfilePage::default());
        {
            let mut page = world.resource_mut::<ProfilePage>();
            page.select(Symbol::new("AAPL"));
            page.load_idle(&provider, &command, Freshness::Cached);
        }
        let mut queue = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("load finished")
            .expect("queue");
        world.resource_mut::<ProfilePage>().select(Symbol::new("MSFT"));
        queue.apply(&mut world);

        let page = world.resource::<ProfilePage>();
        assert_eq!(page.symbol, Some(Symbol::new("MSFT")));
        assert!([
            page.profile.is_loading(),
            page.financials.ready().is_some(),
            page.earnings.ready().is_some(),
            page.candles.ready().is_some(),
        ]
        .iter()
        .all(|x| !x));
    }
}

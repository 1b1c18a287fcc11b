use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::Context;
use atomic::Atomic;
use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_ecs::system::{CommandQueue, InsertResource, SystemState};
use futures::FutureExt;
use ratatui::text::{Line, Span};
use tokio::sync::mpsc;

use crate::api::ApiClient;
use crate::config::Config;
use crate::data::{DataSource, ScreenerQuery, ScreenerRow, Slot, Symbol, SymbolMatch};
use crate::provider::{DataProvider, LiveProvider, MockProvider};
use crate::render::{DirtyFlags, RenderState};
use crate::system::{self, NewsPage, Panel, ProfilePage, ScreenerPage};
use crate::ui::{styles, Content};
use crate::widgets::{
    latest_log_file_in, Carousel, Loading, LocalSearch, Search, SearchOutcome, Terminal,
};

pub static RT: OnceLock<tokio::runtime::Handle> = OnceLock::new();
pub static POPUP: AtomicU8 = AtomicU8::new(0);
pub static LAST_STATE: Atomic<AppState> = Atomic::new(AppState::Screener);
pub static LOG_PANEL_VISIBLE: Atomic<bool> = Atomic::new(false);

pub const POPUP_HELP: u8 = 0b1;
pub const POPUP_SEARCH: u8 = 0b10;
pub const POPUP_FIND: u8 = 0b100;
pub const POPUP_TICKER: u8 = 0b1000;

const TIPS: [&str; 5] = [
    "Tips.Search",
    "Tips.Refresh",
    "Tips.Filter",
    "Tips.Chart",
    "Tips.Console",
];

#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, Default, States, strum::EnumIter, bytemuck::NoUninit,
)]
#[repr(u8)]
pub enum AppState {
    Error,
    #[default]
    Loading,
    Screener,
    News,
    Profile,
}

fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn DataProvider>> {

    Ok(match config.source {
        DataSource::Live => {
            let client = ApiClient::new(&config.api_url, config.timeout, config.rate_limit)
                .with_context(|| format!("cannot build a client for {}", config.api_url))?;
            Arc::new(LiveProvider::new(client))
        }
        DataSource::Mock => Arc::new(MockProvider::default()),
    })
}

/// Fetches the first screener page. Success opens the dashboard (or the profile of
/// `symbol`), failure shows the error page.
fn check_backend(
    provider: Arc<dyn DataProvider>,
    tx: mpsc::UnboundedSender<CommandQueue>,
    symbol: Option<Symbol>,
    api_url: String,
) {
    tokio::spawn(async move {
        let result = provider
            .screener(ScreenerQuery::page(1, system::PAGE_SIZE))
            .await;
        let mut queue = CommandQueue::default();
        match Slot::from_result(result) {
            Slot::Failed(message) => {
                tracing::error!(error = %message, api_url = %api_url, "backend check failed");
                queue.push(InsertResource {
                    resource: system::ErrorMessage(Content::new(
                        Span::styled(t!("Error.Heading"), styles::error()),
                        vec![
                            Line::from(t!("Error.Backend", url = api_url)),
                            Line::from(Span::styled(message, styles::dark_gray())),
                            Line::default(),
                            Line::from(Span::styled(t!("Error.Hint"), styles::gray())),
                        ],
                    )),
                });
                queue.push(InsertResource {
                    resource: NextState(Some(AppState::Error)),
                });
            }
            slot => {
                tracing::info!("backend check succeeded");
                queue.push(move |world: &mut World| {
                    let rows = world.resource_mut::<ScreenerPage>().apply(slot);
                    world
                        .resource_mut::<LocalSearch<ScreenerRow>>()
                        .set_items(rows);
                    let next = match symbol {
                        Some(symbol) => {
                            world.resource_mut::<ProfilePage>().select(symbol);
                            AppState::Profile
                        }
                        None => AppState::Screener,
                    };
                    world.resource_mut::<NextState<AppState>>().set(next);
                });
            }
        }
        _ = tx.send(queue);
    });
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let (update_tx, mut update_rx) = mpsc::unbounded_channel::<CommandQueue>();
    let provider = build_provider(&config)?;
    tracing::info!(source = config.source.as_str(), api_url = %config.api_url, "provider ready");

    let search_symbol = Search::new(update_tx.clone(), {
        let provider = provider.clone();
        move |keyword| {
            let request = provider.search_symbols(keyword);
            async move { request.await.map_err(|err| err.to_string()) }.boxed()
        }
    });
    let find_row = LocalSearch::new(Vec::<ScreenerRow>::new(), system::row_matches);
    let tips = TIPS.iter().map(|key| t!(key)).collect::<Vec<_>>();
    let terminal = Terminal::new().context("failed to initialize the terminal")?;

    _ = RT.set(tokio::runtime::Handle::current());
    let mut app = bevy_app::App::new();
    app.add_state::<AppState>()
        .add_event::<system::Key>()
        .insert_resource(terminal)
        .init_resource::<Loading>()
        .init_resource::<ScreenerPage>()
        .init_resource::<NewsPage>()
        .init_resource::<ProfilePage>()
        .insert_resource(search_symbol)
        .insert_resource(find_row)
        .insert_resource(system::Command(update_tx.clone()))
        .insert_resource(system::Provider(provider.clone()))
        .insert_resource(Carousel::new(tips, Duration::from_secs(8)))
        .add_systems(Update, system::loading.run_if(in_state(AppState::Loading)))
        .add_systems(Update, system::error.run_if(in_state(AppState::Error)))
        .add_systems(OnEnter(AppState::Screener), system::enter_screener)
        .add_systems(OnExit(AppState::Screener), system::exit_screener)
        .add_systems(
            Update,
            system::render_screener.run_if(in_state(AppState::Screener)),
        )
        .add_systems(OnEnter(AppState::News), system::enter_news)
        .add_systems(OnExit(AppState::News), system::exit_news)
        .add_systems(Update, system::render_news.run_if(in_state(AppState::News)))
        .add_systems(OnEnter(AppState::Profile), system::enter_profile)
        .add_systems(OnExit(AppState::Profile), system::exit_profile)
        .add_systems(
            Update,
            system::render_profile.run_if(in_state(AppState::Profile)),
        );

    check_backend(
        provider.clone(),
        update_tx.clone(),
        config.symbol.clone(),
        config.api_url.clone(),
    );

    // Wake the loop while the log panel is open and the log file grows
    tokio::spawn({
        let tx = update_tx.clone();
        async move {
            use std::fs;
            use std::time::SystemTime;

            let mut last_modified: Option<SystemTime> = None;
            let mut last_size: u64 = 0;
            let log_dir = crate::logger::active_log_dir();

            tracing::debug!(log_dir = %log_dir.display(), "log watcher started");

            loop {
                tokio::time::sleep(Duration::from_millis(500)).await;

                if !LOG_PANEL_VISIBLE.load(Ordering::Relaxed) {
                    continue;
                }

                let Some(metadata) = latest_log_file_in(&log_dir)
                    .and_then(|log_file| fs::metadata(log_file).ok())
                else {
                    continue;
                };
                let modified = metadata.modified().ok();
                let size = metadata.len();
                if modified != last_modified || size != last_size {
                    last_modified = modified;
                    last_size = size;
                    if tx.send(CommandQueue::default()).is_err() {
                        tracing::debug!("event loop is gone, stopping log watcher");
                        break;
                    }
                }
            }
        }
    });

    // ~30 fps
    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // footer tips rotate on their own
    let mut footer_tick = tokio::time::interval(Duration::from_secs(1));
    footer_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // let the terminal settle after entering the alternate screen
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut events = crossterm::event::EventStream::new();
    let mut render_state = RenderState::new();
    render_state.mark_all_dirty();

    loop {
        tokio::select! {
            _ = render_tick.tick() => {
                if *app.world.resource::<State<AppState>>().get() == AppState::Loading {
                    // spinner
                    render_state.mark_dirty(DirtyFlags::LOADING);
                }
                if render_state.needs_render() {
                    app.update();
                    render_state.clear();
                } else {
                    render_state.skip();
                }
            }
            _ = footer_tick.tick() => {
                render_state.mark_dirty(DirtyFlags::FOOTER);
            }
            Some(mut cmd) = update_rx.recv() => {
                cmd.apply(&mut app.world);
                render_state.mark_dirty(DirtyFlags::ALL);
            }
            Some(event) = tokio_stream::StreamExt::next(&mut events) => {
                let event = match event {
                    Ok(crossterm::event::Event::Key(event)) => event,
                    Ok(crossterm::event::Event::Resize(..)) => {
                        render_state.mark_dirty(DirtyFlags::ALL);
                        continue;
                    }
                    Ok(_) => continue,
                    Err(err) => {
                        tracing::error!(error = %err, "terminal event stream failed");
                        return Err(err.into());
                    }
                };

                let popup = POPUP.load(Ordering::Relaxed);
                let state = *app.world.resource::<State<AppState>>().get();

                if event.code == crossterm::event::KeyCode::Char('`')
                    && event.modifiers == crossterm::event::KeyModifiers::NONE
                {
                    let was_visible = LOG_PANEL_VISIBLE.load(Ordering::Relaxed);
                    LOG_PANEL_VISIBLE.store(!was_visible, Ordering::Relaxed);
                    render_state.mark_dirty(DirtyFlags::ALL);
                    continue;
                }

                if popup != 0 {
                    handle_popup_input(&mut app, popup, event, state);
                    render_state.mark_dirty(
                        DirtyFlags::NONE
                            .mark_popup_change(popup)
                            .mark_page_update(state),
                    );
                    continue;
                }

                match state {
                    AppState::Error => {
                        if matches!(event, typed!('R')) {
                            tracing::info!("retrying backend check");
                            app.world.insert_resource(NextState(Some(AppState::Loading)));
                            check_backend(
                                provider.clone(),
                                update_tx.clone(),
                                config.symbol.clone(),
                                config.api_url.clone(),
                            );
                            render_state.mark_dirty(DirtyFlags::ALL);
                            continue;
                        }
                        break;
                    }
                    AppState::Loading => {
                        if matches!(event, ctrl!('c') | key!('q') | key!(Esc)) {
                            break;
                        }
                        continue;
                    }
                    AppState::Screener | AppState::News | AppState::Profile => (),
                }

                if handle_global_keys(&mut app, event, state, &mut render_state) {
                    break;
                }
            }
        }
    }
    tracing::debug!(stats = %render_state.stats(), "event loop stopped");
    Ok(())
}

fn handle_popup_input(
    app: &mut bevy_app::App,
    popup: u8,
    event: crossterm::event::KeyEvent,
    state: AppState,
) {
    if popup == POPUP_SEARCH {
        let outcome = app
            .world
            .resource_mut::<Search<SymbolMatch>>()
            .handle_key(event);
        match outcome {
            SearchOutcome::Pending => {}
            SearchOutcome::Closed => POPUP.store(0, Ordering::Relaxed),
            SearchOutcome::Selected(found) => {
                POPUP.store(0, Ordering::Relaxed);
                tracing::debug!(symbol = %found.symbol, "search picked a symbol");
                let command = app.world.resource::<system::Command>().clone();
                system::open_profile(&command, Symbol::new(&found.symbol));
            }
        }
    } else if popup == POPUP_FIND {
        let outcome = app
            .world
            .resource_mut::<LocalSearch<ScreenerRow>>()
            .handle_key(event);
        match outcome {
            SearchOutcome::Pending => {}
            SearchOutcome::Closed => POPUP.store(0, Ordering::Relaxed),
            SearchOutcome::Selected(row) => {
                POPUP.store(0, Ordering::Relaxed);
                app.world
                    .resource_mut::<ScreenerPage>()
                    .select_ticker(&row.ticker);
            }
        }
    } else if popup == POPUP_TICKER {
        let now = crate::helper::clock::now();
        let done = match state {
            AppState::News => app
                .world
                .resource_mut::<NewsPage>()
                .feed
                .edit_ticker(event, now),
            AppState::Profile => app
                .world
                .resource_mut::<ProfilePage>()
                .news
                .edit_ticker(event, now),
            _ => true,
        };
        if done {
            POPUP.store(0, Ordering::Relaxed);
        }
    } else if popup == POPUP_HELP {
        POPUP.store(0, Ordering::Relaxed);
    }
}

/// Keys outside any popup. Returns `true` when the app should quit.
fn handle_global_keys(
    app: &mut bevy_app::App,
    event: crossterm::event::KeyEvent,
    state: AppState,
    render_state: &mut RenderState,
) -> bool {
    let page = DirtyFlags::NONE.mark_page_update(state);
    match event {
        ctrl!('c') => crate::widgets::Terminal::graceful_exit(0),
        key!('1') if state != AppState::Screener => switch_to(app, AppState::Screener, render_state),
        key!('2') if state != AppState::News => switch_to(app, AppState::News, render_state),
        key!('3') if state != AppState::Profile => switch_to(app, AppState::Profile, render_state),
        typed!('R') => {
            send_evt(system::Key::Refresh, &mut app.world);
            render_state.mark_dirty(page);
        }
        typed!('?') => {
            POPUP.store(POPUP_HELP, Ordering::Relaxed);
            render_state.mark_dirty(DirtyFlags::POPUP_HELP);
        }
        key!('/') if state == AppState::Screener => {
            app.world.resource_mut::<LocalSearch<ScreenerRow>>().reset();
            POPUP.store(POPUP_FIND, Ordering::Relaxed);
            render_state.mark_dirty(DirtyFlags::POPUP_FIND);
        }
        key!('/') => {
            app.world.resource_mut::<Search<SymbolMatch>>().reset();
            POPUP.store(POPUP_SEARCH, Ordering::Relaxed);
            render_state.mark_dirty(DirtyFlags::POPUP_SEARCH);
        }
        key!('t') if state == AppState::News => {
            app.world
                .resource_mut::<NewsPage>()
                .feed
                .begin_ticker_edit();
            POPUP.store(POPUP_TICKER, Ordering::Relaxed);
            render_state.mark_dirty(DirtyFlags::POPUP_TICKER);
        }
        key!('t') if state == AppState::Profile => {
            let mut page = app.world.resource_mut::<ProfilePage>();
            if page.panel == Panel::News {
                page.news.begin_ticker_edit();
                POPUP.store(POPUP_TICKER, Ordering::Relaxed);
                render_state.mark_dirty(DirtyFlags::POPUP_TICKER);
            }
        }
        key!('q') => return true,
        key!(Esc) => {
            let last_state = LAST_STATE.load(Ordering::Relaxed);
            if last_state != state {
                switch_to(app, last_state, render_state);
            }
        }
        key!(Up) => {
            send_evt(system::Key::Up, &mut app.world);
            render_state.mark_dirty(page);
        }
        key!(Down) => {
            send_evt(system::Key::Down, &mut app.world);
            render_state.mark_dirty(page);
        }
        key!(Left) => {
            send_evt(system::Key::Left, &mut app.world);
            render_state.mark_dirty(page);
        }
        key!(Right) => {
            send_evt(system::Key::Right, &mut app.world);
            render_state.mark_dirty(page);
        }
        key!(Tab) => {
            send_evt(system::Key::Tab, &mut app.world);
            render_state.mark_dirty(page);
        }
        shift!(BackTab) => {
            send_evt(system::Key::BackTab, &mut app.world);
            render_state.mark_dirty(page);
        }
        key!(Enter) => {
            send_evt(system::Key::Enter, &mut app.world);
            render_state.mark_dirty(DirtyFlags::ALL);
        }
        typed!(c) => {
            send_evt(system::Key::Char(c), &mut app.world);
            render_state.mark_dirty(page);
        }
        _ => (),
    }
    false
}

fn switch_to(app: &mut bevy_app::App, state: AppState, render_state: &mut RenderState) {
    app.world.insert_resource(NextState(Some(state)));
    render_state.mark_dirty(DirtyFlags::NONE.mark_state_change());
}

fn send_evt<T: Event>(evt: T, world: &mut World) {
    let mut state = SystemState::<EventWriter<T>>::new(world);
    state.get_mut(world).send(evt);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> bevy_app::App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = bevy_app::App::new();
        app.add_state::<AppState>()
            .add_event::<system::Key>()
            .init_resource::<ScreenerPage>()
            .init_resource::<NewsPage>()
            .init_resource::<ProfilePage>()
            .insert_resource(LocalSearch::new(Vec::<ScreenerRow>::new(), system::row_matches))
            .insert_resource(system::Command(tx));
        app
    }

    fn press(code: crossterm::event::KeyCode) -> crossterm::event::KeyEvent {
        crossterm::event::KeyEvent::new(code, crossterm::event::KeyModifiers::NONE)
    }

    #[test]
    fn mock_source_needs_no_client() {
        let config = Config {
            source: DataSource::Mock,
            api_url: "not a url".to_string(),
            ..Config::default()
        };
        let provider = build_provider(&config).expect("mock provider");
        assert_eq!(provider.source(), DataSource::Mock);
    }

    #[test]
    fn number_keys_switch_pages() {
        let mut app = app();
        let mut render_state = RenderState::new();
        let quit = handle_global_keys(
            &mut app,
            press(crossterm::event::KeyCode::Char('2')),
            AppState::Screener,
            &mut render_state,
        );
        assert!(!quit);
        assert!(render_state.needs_render());
        assert_eq!(
            app.world.resource::<NextState<AppState>>().0,
            Some(AppState::News)
        );
    }

    #[test]
    fn q_quits_from_every_page_and_esc_goes_back() {
        let mut app = app();
        let mut render_state = RenderState::new();
        for state in [AppState::Screener, AppState::News, AppState::Profile] {
            assert!(handle_global_keys(
                &mut app,
                press(crossterm::event::KeyCode::Char('q')),
                state,
                &mut render_state,
            ));
        }

        // Leaving the screener for the news page.
        LAST_STATE.store(AppState::Screener, Ordering::Relaxed);
        let quit = handle_global_keys(
            &mut app,
            press(crossterm::event::KeyCode::Esc),
            AppState::News,
            &mut render_state,
        );
        assert!(!quit);
        assert_eq!(
            app.world.resource::<NextState<AppState>>().0,
            Some(AppState::Screener)
        );

        app.world.insert_resource(NextState::<AppState>(None));
        let quit = handle_global_keys(
            &mut app,
            press(crossterm::event::KeyCode::Esc),
            AppState::Screener,
            &mut render_state,
        );
        assert!(!quit);
        assert_eq!(app.world.resource::<NextState<AppState>>().0, None);
    }

    #[test]
    fn typed_characters_reach_the_page() {
        let mut app = app();
        let mut render_state = RenderState::new();
        handle_global_keys(
            &mut app,
            press(crossterm::event::KeyCode::Char(']')),
            AppState::Screener,
            &mut render_state,
        );
        let events = app.world.resource::<Events<system::Key>>();
        let mut reader = events.get_reader();
        let keys = reader.iter(events).copied().collect::<Vec<_>>();
        assert_eq!(keys, vec![system::Key::Char(']')]);
    }

    #[test]
    fn ticker_popup_edits_the_news_filter() {
        let mut app = app();
        POPUP.store(POPUP_TICKER, Ordering::Relaxed);
        handle_popup_input(
            &mut app,
            POPUP_TICKER,
            press(crossterm::event::KeyCode::Char('a')),
            AppState::News,
        );
        assert_eq!(POPUP.load(Ordering::Relaxed), POPUP_TICKER);
        assert_eq!(
            app.world.resource::<NewsPage>().feed.criteria().ticker,
            "a"
        );
        handle_popup_input(
            &mut app,
            POPUP_TICKER,
            press(crossterm::event::KeyCode::Enter),
            AppState::News,
        );
        assert_eq!(POPUP.load(Ordering::Relaxed), 0);
    }
}

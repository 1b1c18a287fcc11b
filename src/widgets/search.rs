use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use bevy_ecs::{prelude::*, system::CommandQueue};
use crossterm::event::KeyEvent;
use futures::future::BoxFuture;
use ratatui::widgets::TableState;
use tokio::sync::{mpsc, watch};
use tui_input::backend::crossterm::EventHandler;

use crate::helper::cycle::{SelectionExt, Step};

/// Keystrokes arriving closer together than this are folded into one remote query.
const DEBOUNCE: Duration = Duration::from_millis(250);
const HISTORY_LEN: usize = 20;

/// What a key press did to a search popup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome<T> {
    /// Still open.
    Pending,
    /// Dismissed without a choice.
    Closed,
    Selected(T),
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Filters an in-memory list as the user types.
#[derive(Resource, Component)]
pub struct LocalSearch<T> {
    pub(crate) input: tui_input::Input,
    pub(crate) table: TableState,
    items: Vec<T>,
    options: Vec<T>,
    func: fn(&str, &T) -> bool,
}

impl<T> std::fmt::Debug for LocalSearch<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSearch")
            .field("input", &self.input.value())
            .field("items", &self.items.len())
            .field("options", &self.options.len())
            .finish_non_exhaustive()
    }
}

impl<T> LocalSearch<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(items: Vec<T>, func: fn(&str, &T) -> bool) -> Self {
        Self {
            input: tui_input::Input::default(),
            table: TableState::default(),
            options: items.clone(),
            items,
            func,
        }
    }

    /// Replaces the searchable list, keeping the current query applied.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.apply_filter();
        self.table.select(None);
    }

    pub fn reset(&mut self) {
        self.input.reset();
        self.options = self.items.clone();
        self.table.select(None);
    }

    pub fn query(&self) -> &str {
        self.input.value()
    }

    fn apply_filter(&mut self) {
        let keyword = self.input.value().trim();
        self.options = self
            .items
            .iter()
            .filter(|v| keyword.is_empty() || (self.func)(keyword, v))
            .cloned()
            .collect();
    }

    pub fn handle_key(&mut self, event: KeyEvent) -> SearchOutcome<T> {
        match event {
            key!(Esc) => {
                self.reset();
                return SearchOutcome::Closed;
            }
            key!(Enter) => {
                // Enter without a highlighted row takes the first match
                let idx = self.table.selected().unwrap_or(0);
                if let Some(selected) = self.options.get(idx).cloned() {
                    self.reset();
                    return SearchOutcome::Selected(selected);
                }
            }
            key!(Up) => self.table.step_outside(self.options.len(), Step::Back),
            key!(Down) => self.table.step_outside(self.options.len(), Step::Forward),
            _ => {
                let evt = crossterm::event::Event::Key(event);
                if self.input.handle_event(&evt).is_some() {
                    self.apply_filter();
                    self.table.select(None);
                }
            }
        }
        SearchOutcome::Pending
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn options(&self) -> &[T] {
        &self.options
    }
}

// ------------

type RemoteResult<T> = Result<Vec<T>, String>;

/// Queries a remote source as the user types; results arrive through the command channel.
#[derive(Resource, Component)]
pub struct Search<T> {
    pub(crate) input: tui_input::Input,
    pub(crate) table: TableState,
    options: Arc<Mutex<Vec<T>>>,
    error: Arc<Mutex<Option<String>>>,
    history: Vec<T>,
    tx: watch::Sender<String>,
}

impl<T> std::fmt::Debug for Search<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Search")
            .field("input", &self.input.value())
            .field("options", &self.options)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> Search<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub fn new(
        update: mpsc::UnboundedSender<CommandQueue>,
        task: impl Fn(String) -> BoxFuture<'static, RemoteResult<T>> + Send + Sync + 'static,
    ) -> Self {
        let (tx, mut rx) = watch::channel(String::new());
        let options = Arc::new(Mutex::new(vec![]));
        let error = Arc::new(Mutex::new(None));
        tokio::spawn({
            let options = options.clone();
            let error = error.clone();
            async move {
                loop {
                    if rx.changed().await.is_err() {
                        return;
                    }
                    // debounce input
                    loop {
                        match tokio::time::timeout(DEBOUNCE, rx.changed()).await {
                            Ok(Ok(())) => {}
                            Ok(Err(_)) => return,
                            Err(_) => break,
                        }
                    }
                    let input = rx.borrow_and_update().trim().to_string();
                    let (found, failure) = if input.is_empty() {
                        (vec![], None)
                    } else {
                        match (task)(input.clone()).await {
                            Ok(found) => (found, None),
                            Err(err) => {
                                tracing::warn!(query = %input, error = %err, "symbol search failed");
                                (vec![], Some(err))
                            }
                        }
                    };
                    // a newer query supersedes this answer
                    if rx.has_changed().unwrap_or(false) {
                        continue;
                    }
                    *lock(&options) = found;
                    *lock(&error) = failure;
                    if update.send(CommandQueue::default()).is_err() {
                        return;
                    }
                }
            }
        });
        Self {
            input: tui_input::Input::default(),
            table: TableState::default(),
            options,
            error,
            history: vec![],
            tx,
        }
    }

    pub fn query(&self) -> &str {
        self.input.value()
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.error).clone()
    }

    pub fn reset(&mut self) {
        self.input.reset();
        self.table.select(None);
        lock(&self.options).clear();
        *lock(&self.error) = None;
        let _ = self.tx.send(String::new());
    }

    pub fn handle_key(&mut self, event: KeyEvent) -> SearchOutcome<T> {
        match event {
            key!(Esc) => {
                self.reset();
                return SearchOutcome::Closed;
            }
            key!(Enter) => {
                let idx = self.table.selected().unwrap_or(0);
                if let Some(selected) = self.option(idx) {
                    self.remember(selected.clone());
                    self.reset();
                    return SearchOutcome::Selected(selected);
                }
            }
            key!(Up) => {
                let len = self.options().len();
                self.table.step_outside(len, Step::Back);
            }
            key!(Down) => {
                let len = self.options().len();
                self.table.step_outside(len, Step::Forward);
            }
            _ => {
                let evt = crossterm::event::Event::Key(event);
                if self.input.handle_event(&evt).is_some() {
                    self.table.select(None);
                    let _ = self.tx.send(self.input.to_string());
                }
            }
        }
        SearchOutcome::Pending
    }

    fn remember(&mut self, selected: T) {
        self.history.retain(|v| v != &selected);
        self.history.insert(0, selected);
        self.history.truncate(HISTORY_LEN);
    }

    /// Remote matches, or the recent picks while the query is empty.
    pub fn options(&self) -> Vec<T> {
        let opts = lock(&self.options);
        if !opts.is_empty() {
            return opts.clone();
        }
        if self.input.value().is_empty() {
            self.history.clone()
        } else {
            vec![]
        }
    }

    fn option(&self, index: usize) -> Option<T> {
        self.options().get(index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text<T: Clone + Send + 'static>(search: &mut LocalSearch<T>, text: &str) {
        for c in text.chars() {
            search.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn local_search_filters_and_selects() {
        let mut search = LocalSearch::new(
            vec!["AAPL".to_string(), "AMZN".to_string(), "MSFT".to_string()],
            |keyword, item: &String| item.contains(&keyword.to_ascii_uppercase()),
        );
        type_text(&mut search, "a");
        assert_eq!(search.options().len(), 2);

        assert_eq!(search.handle_key(press(KeyCode::Down)), SearchOutcome::Pending);
        assert_eq!(search.handle_key(press(KeyCode::Down)), SearchOutcome::Pending);
        assert_eq!(
            search.handle_key(press(KeyCode::Enter)),
            SearchOutcome::Selected("AMZN".to_string())
        );
        // selecting resets the query
        assert_eq!(search.query(), "");
        assert_eq!(search.options().len(), 3);
    }

    #[test]
    fn local_search_keeps_query_when_items_change() {
        let mut search = LocalSearch::new(vec![1, 2, 3], |keyword, item: &i32| {
            item.to_string().contains(keyword)
        });
        type_text(&mut search, "2");
        search.set_items(vec![12, 22, 30]);
        assert_eq!(search.options(), &[12, 22]);
        assert_eq!(search.handle_key(press(KeyCode::Esc)), SearchOutcome::Closed);
        assert_eq!(search.options(), &[12, 22, 30]);
    }

    #[tokio::test]
    async fn remote_search_debounces_and_reports_errors() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut search = Search::new(tx, {
            let calls = calls.clone();
            move |query: String| {
                calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Box::pin(async move {
                    if query == "ERR" {
                        Err("backend down".to_string())
                    } else {
                        Ok(vec![format!("{query}!")])
                    }
                })
            }
        });

        for c in "AAP".chars() {
            search.handle_key(press(KeyCode::Char(c)));
        }
        rx.recv().await.expect("update");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(search.options(), vec!["AAP!".to_string()]);

        assert_eq!(
            search.handle_key(press(KeyCode::Enter)),
            SearchOutcome::Selected("AAP!".to_string())
        );
        // history is offered while the query is empty
        rx.recv().await.expect("update");
        assert_eq!(search.options(), vec!["AAP!".to_string()]);

        for c in "ERR".chars() {
            search.handle_key(press(KeyCode::Char(c)));
        }
        rx.recv().await.expect("update");
        assert_eq!(search.error().as_deref(), Some("backend down"));
        assert!(search.options().is_empty());
    }
}

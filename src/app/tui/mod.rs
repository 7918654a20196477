mod actions;
mod render;
mod session;

use std::io;
use std::sync::mpsc;
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;
use tracing::info;

use crate::catalog::{ApiClient, CatalogItem, EpisodePage, FetchError, ItemId};
use crate::config::Config;

use super::debounce::SearchDebouncer;
use super::player::{play_episode, playback_message};
use super::query::{QueryKey, QueryStore, Ticket};
use super::selection::EpisodeSelection;

use self::actions::{
    apply_fetch_results, clamp_table, ensure_query, event_wait, refresh_query, retry_query,
    status_error, status_info,
};
use self::render::draw_tui;
use self::session::TuiSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BrowseFocus {
    SearchResults,
    Trending,
}

/// Catalog screen state. Rebuilt from scratch whenever the screen is entered,
/// so leaving it tears down any pending search commit.
#[derive(Debug)]
pub(crate) struct BrowseView {
    pub(crate) search: SearchDebouncer,
    pub(crate) editing: bool,
    pub(crate) focus: BrowseFocus,
    pub(crate) trending_table: TableState,
    pub(crate) search_table: TableState,
}

impl BrowseView {
    pub(crate) fn new() -> Self {
        Self {
            search: SearchDebouncer::default(),
            editing: false,
            focus: BrowseFocus::Trending,
            trending_table: TableState::default(),
            search_table: TableState::default(),
        }
    }

    pub(crate) fn search_key(&self) -> Option<QueryKey> {
        self.search
            .search_enabled()
            .then(|| QueryKey::Search(self.search.committed().to_string()))
    }

    /// Focus the search list only while its section is on screen.
    pub(crate) fn effective_focus(&self) -> BrowseFocus {
        if self.search.shows_search_section() {
            self.focus
        } else {
            BrowseFocus::Trending
        }
    }

    fn teardown(&mut self) {
        self.search.cancel();
    }
}

/// Watch screen for one drama, addressed by its resolved id.
#[derive(Debug)]
pub(crate) struct WatchView {
    pub(crate) book_id: ItemId,
    pub(crate) fallback_title: String,
    pub(crate) selection: EpisodeSelection,
}

impl WatchView {
    pub(crate) fn new(book_id: ItemId, fallback_title: String) -> Self {
        Self {
            book_id,
            fallback_title,
            selection: EpisodeSelection::default(),
        }
    }

    pub(crate) fn key(&self) -> QueryKey {
        QueryKey::Episodes(self.book_id.as_param())
    }
}

#[derive(Debug)]
pub(crate) enum Screen {
    Browse(BrowseView),
    Watch(WatchView),
}

#[derive(Debug, Default)]
pub(crate) struct Queries {
    pub(crate) catalog: QueryStore<Vec<CatalogItem>>,
    pub(crate) episodes: QueryStore<EpisodePage>,
}

#[derive(Debug)]
pub(crate) enum FetchPayload {
    Catalog(Vec<CatalogItem>),
    Episodes(EpisodePage),
}

#[derive(Debug)]
pub(crate) struct FetchResult {
    pub(crate) key: QueryKey,
    pub(crate) ticket: Ticket,
    pub(crate) outcome: Result<FetchPayload, FetchError>,
}

pub(crate) fn run_tui(client: &ApiClient, config: &Config) -> Result<()> {
    let mut session = TuiSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let (fetch_tx, fetch_rx) = mpsc::channel::<FetchResult>();
    let mut queries = Queries::default();
    let mut screen = Screen::Browse(BrowseView::new());
    let mut status = status_info("Loading trending dramas...");
    ensure_query(&mut queries, client, &QueryKey::Trending, &fetch_tx, Instant::now());

    loop {
        let now = Instant::now();
        apply_fetch_results(&fetch_rx, &mut queries, now);

        match &mut screen {
            Screen::Browse(browse) => {
                if let Some(committed) = browse.search.poll(now) {
                    let committed = committed.to_string();
                    browse.search_table.select(None);
                    if !committed.is_empty() {
                        info!(query = %committed, "search committed");
                        let key = QueryKey::Search(committed);
                        refresh_query(&mut queries, client, &key, &fetch_tx, now);
                    }
                }
                let trending_len = queries
                    .catalog
                    .data(&QueryKey::Trending)
                    .map_or(0, Vec::len);
                clamp_table(&mut browse.trending_table, trending_len);
                let search_len = browse
                    .search_key()
                    .and_then(|key| queries.catalog.data(&key).map(Vec::len))
                    .unwrap_or(0);
                clamp_table(&mut browse.search_table, search_len);
            }
            Screen::Watch(watch) => {
                if let Some(page) = queries.episodes.data(&watch.key()) {
                    watch.selection.on_episodes_loaded(&page.episodes);
                }
            }
        }

        terminal.draw(|frame| draw_tui(frame, &mut screen, &queries, &status))?;

        let deadline = match &screen {
            Screen::Browse(browse) => browse.search.next_deadline(),
            Screen::Watch(_) => None,
        };
        if !event::poll(event_wait(Instant::now(), deadline))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let now = Instant::now();
        let next_screen = match &mut screen {
            Screen::Browse(browse) => {
                match handle_browse_key(browse, &queries, key, now) {
                    BrowseOutcome::Stay => None,
                    BrowseOutcome::Quit => break,
                    BrowseOutcome::Retry(key) => {
                        refresh_query(&mut queries, client, &key, &fetch_tx, now);
                        status = status_info("Retrying...");
                        None
                    }
                    BrowseOutcome::Open(item) => {
                        browse.teardown();
                        info!(id = %item.id, title = %item.title, "opening watch screen");
                        Some(Screen::Watch(WatchView::new(item.id, item.title)))
                    }
                }
            }
            Screen::Watch(watch) => {
                let key_code = key.code;
                match key_code {
                    KeyCode::Char('q') => break,
                    KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
                        status = status_info("Back to catalog.");
                        Some(Screen::Browse(BrowseView::new()))
                    }
                    KeyCode::Char('r') => {
                        retry_query(&mut queries, client, &watch.key(), &fetch_tx);
                        status = status_info("Retrying...");
                        None
                    }
                    KeyCode::Up => {
                        if let Some(page) = queries.episodes.data(&watch.key()) {
                            watch.selection.select_previous(&page.episodes);
                        }
                        None
                    }
                    KeyCode::Down => {
                        if let Some(page) = queries.episodes.data(&watch.key()) {
                            watch.selection.select_next(&page.episodes);
                        }
                        None
                    }
                    KeyCode::Enter | KeyCode::Char('p') | KeyCode::Char('n') => {
                        let Some(page) = queries.episodes.data(&watch.key()) else {
                            continue;
                        };
                        if key_code == KeyCode::Char('n') {
                            if !watch.selection.has_next(&page.episodes) {
                                status = status_info("No next episode available.");
                                continue;
                            }
                            watch.selection.select_next(&page.episodes);
                        }
                        let Some(episode) = watch.selection.current(&page.episodes) else {
                            continue;
                        };

                        session.suspend()?;
                        let result = play_episode(&config.player, &page.meta.title, episode);
                        session.resume()?;
                        terminal.clear()?;

                        status = match result {
                            Ok(outcome) => {
                                status_info(&playback_message(&page.meta.title, episode, &outcome))
                            }
                            Err(err) => status_error(&format!("Playback failed: {err:#}")),
                        };
                        None
                    }
                    _ => None,
                }
            }
        };

        if let Some(next) = next_screen {
            if let Screen::Watch(watch) = &next {
                refresh_query(&mut queries, client, &watch.key(), &fetch_tx, now);
                status = status_info(&format!("Loading episodes for {}...", watch.fallback_title));
            } else {
                refresh_query(&mut queries, client, &QueryKey::Trending, &fetch_tx, now);
            }
            screen = next;
        }
    }

    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}

enum BrowseOutcome {
    Stay,
    Quit,
    Retry(QueryKey),
    Open(CatalogItem),
}

fn handle_browse_key(
    browse: &mut BrowseView,
    queries: &Queries,
    key: KeyEvent,
    now: Instant,
) -> BrowseOutcome {
    if browse.editing {
        match key.code {
            KeyCode::Esc => browse.editing = false,
            KeyCode::Enter => {
                browse.editing = false;
                browse.focus = BrowseFocus::SearchResults;
            }
            KeyCode::Backspace => browse.search.pop_char(now),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                browse.search.input(String::new(), now);
            }
            KeyCode::Char(ch) => browse.search.push_char(ch, now),
            _ => {}
        }
        return BrowseOutcome::Stay;
    }

    match key.code {
        KeyCode::Char('q') => return BrowseOutcome::Quit,
        KeyCode::Char('r') => {
            let key = match browse.effective_focus() {
                BrowseFocus::SearchResults => browse.search_key(),
                BrowseFocus::Trending => Some(QueryKey::Trending),
            };
            if let Some(key) = key {
                return BrowseOutcome::Retry(key);
            }
        }
        KeyCode::Char('/') | KeyCode::Char('s') => {
            browse.editing = true;
            browse.focus = BrowseFocus::SearchResults;
        }
        KeyCode::Esc if browse.search.shows_search_section() => {
            browse.search.input(String::new(), now);
            browse.focus = BrowseFocus::Trending;
        }
        KeyCode::Tab => {
            browse.focus = match browse.effective_focus() {
                BrowseFocus::Trending if browse.search.shows_search_section() => {
                    BrowseFocus::SearchResults
                }
                _ => BrowseFocus::Trending,
            };
        }
        KeyCode::Up => {
            let table = focused_table(browse);
            if let Some(selected) = table.selected() {
                table.select(Some(selected.saturating_sub(1)));
            }
        }
        KeyCode::Down => {
            let len = focused_items(browse, queries).map_or(0, <[CatalogItem]>::len);
            let table = focused_table(browse);
            if len > 0 {
                let next = table.selected().map_or(0, |selected| (selected + 1).min(len - 1));
                table.select(Some(next));
            }
        }
        KeyCode::Enter => {
            let selected = match browse.effective_focus() {
                BrowseFocus::SearchResults => browse.search_table.selected(),
                BrowseFocus::Trending => browse.trending_table.selected(),
            };
            if let Some(item) = selected
                .and_then(|idx| focused_items(browse, queries)?.get(idx))
                .cloned()
            {
                return BrowseOutcome::Open(item);
            }
        }
        _ => {}
    }
    BrowseOutcome::Stay
}

fn focused_table(browse: &mut BrowseView) -> &mut TableState {
    match browse.effective_focus() {
        BrowseFocus::SearchResults => &mut browse.search_table,
        BrowseFocus::Trending => &mut browse.trending_table,
    }
}

pub(crate) fn focused_items<'a>(
    browse: &BrowseView,
    queries: &'a Queries,
) -> Option<&'a [CatalogItem]> {
    let key = match browse.effective_focus() {
        BrowseFocus::SearchResults => browse.search_key()?,
        BrowseFocus::Trending => QueryKey::Trending,
    };
    queries.catalog.data(&key).map(Vec::as_slice)
}

use std::sync::mpsc;
use std::time::{Duration, Instant};

use ratatui::widgets::TableState;
use tracing::debug;

use crate::catalog::ApiClient;

use super::super::query::{QueryKey, Ticket};
use super::{FetchPayload, FetchResult, Queries};

const MAX_EVENT_WAIT: Duration = Duration::from_millis(200);

pub(crate) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(crate) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

/// Starts a background fetch for `key` unless the store already has it
/// fresh or in flight.
pub(crate) fn ensure_query(
    queries: &mut Queries,
    client: &ApiClient,
    key: &QueryKey,
    tx: &mpsc::Sender<FetchResult>,
    now: Instant,
) {
    let needed = match key {
        QueryKey::Trending | QueryKey::Search(_) => {
            queries.catalog.needs_fetch(key, now, key.fresh_for())
        }
        QueryKey::Episodes(_) => queries.episodes.needs_fetch(key, now, key.fresh_for()),
    };
    if !needed {
        debug!(?key, "query is fresh or in flight");
        return;
    }

    let ticket = match key {
        QueryKey::Trending | QueryKey::Search(_) => queries.catalog.begin(key),
        QueryKey::Episodes(_) => queries.episodes.begin(key),
    };
    spawn_fetch(client, key.clone(), ticket, tx);
}

/// Entry point for user-triggered transitions (navigation, a search commit,
/// the retry key). A failed key starts over; anything else behaves like
/// `ensure_query`.
pub(crate) fn refresh_query(
    queries: &mut Queries,
    client: &ApiClient,
    key: &QueryKey,
    tx: &mpsc::Sender<FetchResult>,
    now: Instant,
) {
    let failed = match key {
        QueryKey::Trending | QueryKey::Search(_) => queries.catalog.has_failed(key),
        QueryKey::Episodes(_) => queries.episodes.has_failed(key),
    };
    if failed {
        retry_query(queries, client, key, tx);
    } else {
        ensure_query(queries, client, key, tx, now);
    }
}

pub(crate) fn retry_query(
    queries: &mut Queries,
    client: &ApiClient,
    key: &QueryKey,
    tx: &mpsc::Sender<FetchResult>,
) {
    let ticket = match key {
        QueryKey::Trending | QueryKey::Search(_) => queries.catalog.retry(key),
        QueryKey::Episodes(_) => queries.episodes.retry(key),
    };
    spawn_fetch(client, key.clone(), ticket, tx);
}

fn spawn_fetch(
    client: &ApiClient,
    key: QueryKey,
    ticket: Ticket,
    tx: &mpsc::Sender<FetchResult>,
) {
    let client = client.clone();
    let tx = tx.clone();
    std::thread::spawn(move || {
        let outcome = match &key {
            QueryKey::Trending => client.trending().map(FetchPayload::Catalog),
            QueryKey::Search(query) => client.search(query).map(FetchPayload::Catalog),
            QueryKey::Episodes(book_id) => client.episodes(book_id).map(FetchPayload::Episodes),
        };
        let _ = tx.send(FetchResult {
            key,
            ticket,
            outcome,
        });
    });
}

pub(crate) fn apply_fetch_results(
    rx: &mpsc::Receiver<FetchResult>,
    queries: &mut Queries,
    now: Instant,
) {
    while let Ok(result) = rx.try_recv() {
        apply_fetch_result(queries, result, now);
    }
}

pub(crate) fn apply_fetch_result(
    queries: &mut Queries,
    result: FetchResult,
    now: Instant,
) -> bool {
    let FetchResult {
        key,
        ticket,
        outcome,
    } = result;
    match outcome {
        Ok(FetchPayload::Catalog(items)) => {
            queries.catalog.complete(&key, ticket, Ok(items), now)
        }
        Ok(FetchPayload::Episodes(page)) => {
            queries.episodes.complete(&key, ticket, Ok(page), now)
        }
        Err(err) => match key {
            QueryKey::Trending | QueryKey::Search(_) => {
                queries.catalog.complete(&key, ticket, Err(err), now)
            }
            QueryKey::Episodes(_) => queries.episodes.complete(&key, ticket, Err(err), now),
        },
    }
}

/// Keeps a table selection inside `len` rows, selecting the first row once
/// rows exist.
pub(crate) fn clamp_table(table: &mut TableState, len: usize) {
    if len == 0 {
        table.select(None);
        return;
    }
    match table.selected() {
        Some(selected) => table.select(Some(selected.min(len - 1))),
        None => table.select(Some(0)),
    }
}

/// How long the event loop may block on input without missing a debounce
/// deadline.
pub(crate) fn event_wait(now: Instant, deadline: Option<Instant>) -> Duration {
    deadline
        .map(|deadline| deadline.saturating_duration_since(now))
        .map_or(MAX_EVENT_WAIT, |remaining| remaining.min(MAX_EVENT_WAIT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::query::QueryState;
    use crate::catalog::{CatalogItem, FetchError, ItemId};
    use crate::http::Timeouts;
    use crate::http::test_server::{Behavior, TestServer};

    fn client_for(server: &TestServer) -> ApiClient {
        ApiClient::new(
            &server.base_url,
            Timeouts {
                connect: Duration::from_millis(500),
                read: Duration::from_millis(500),
            },
        )
    }

    fn fail_catalog_query(queries: &mut Queries, key: &QueryKey, now: Instant) {
        let ticket = queries.catalog.begin(key);
        let applied = apply_fetch_result(
            queries,
            FetchResult {
                key: key.clone(),
                ticket,
                outcome: Err(FetchError::Transport("down".to_string())),
            },
            now,
        );
        assert!(applied);
        assert!(matches!(queries.catalog.state(key), QueryState::Error(_)));
    }

    fn item(id: i64) -> CatalogItem {
        CatalogItem {
            id: ItemId::Number(id),
            title: format!("Drama {id}"),
            cover_url: String::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn event_wait_is_bounded_by_debounce_deadline() {
        let now = Instant::now();
        assert_eq!(event_wait(now, None), MAX_EVENT_WAIT);
        assert_eq!(
            event_wait(now, Some(now + Duration::from_millis(40))),
            Duration::from_millis(40)
        );
        assert_eq!(
            event_wait(now, Some(now + Duration::from_secs(1))),
            MAX_EVENT_WAIT
        );
        assert_eq!(event_wait(now + Duration::from_secs(2), Some(now)), Duration::ZERO);
    }

    #[test]
    fn clamp_table_tracks_list_length() {
        let mut table = TableState::default();
        clamp_table(&mut table, 3);
        assert_eq!(table.selected(), Some(0));

        table.select(Some(2));
        clamp_table(&mut table, 2);
        assert_eq!(table.selected(), Some(1));

        clamp_table(&mut table, 0);
        assert_eq!(table.selected(), None);
    }

    #[test]
    fn fetch_results_route_to_matching_store() {
        let mut queries = Queries::default();
        let now = Instant::now();
        let trending_ticket = queries.catalog.begin(&QueryKey::Trending);
        let episodes_key = QueryKey::Episodes("7".to_string());
        let episodes_ticket = queries.episodes.begin(&episodes_key);

        assert!(apply_fetch_result(
            &mut queries,
            FetchResult {
                key: QueryKey::Trending,
                ticket: trending_ticket,
                outcome: Ok(FetchPayload::Catalog(vec![item(1)])),
            },
            now,
        ));
        assert!(apply_fetch_result(
            &mut queries,
            FetchResult {
                key: episodes_key.clone(),
                ticket: episodes_ticket,
                outcome: Err(FetchError::Status {
                    status: 500,
                    body: String::new(),
                }),
            },
            now,
        ));

        assert_eq!(
            queries.catalog.data(&QueryKey::Trending).map(Vec::len),
            Some(1)
        );
        assert_eq!(
            queries.episodes.state(&episodes_key),
            QueryState::Error("HTTP status 500")
        );
    }

    #[test]
    fn payload_for_wrong_store_is_ignored() {
        let mut queries = Queries::default();
        let key = QueryKey::Episodes("7".to_string());
        let ticket = queries.episodes.begin(&key);

        let applied = apply_fetch_result(
            &mut queries,
            FetchResult {
                key: key.clone(),
                ticket,
                outcome: Ok(FetchPayload::Catalog(vec![item(1)])),
            },
            Instant::now(),
        );

        assert!(!applied);
        assert_eq!(queries.episodes.state(&key), QueryState::Loading);
    }

    #[test]
    fn failed_trending_reloads_when_browse_is_entered_again() {
        let server = TestServer::spawn(vec![Behavior::Respond(
            200,
            r#"[{"bookId": "41000", "bookName": "Hidden Heir"}]"#.to_string(),
        )]);
        let client = client_for(&server);
        let (tx, rx) = mpsc::channel();
        let mut queries = Queries::default();
        let t0 = Instant::now();
        let later = t0 + Duration::from_secs(3600);
        fail_catalog_query(&mut queries, &QueryKey::Trending, t0);

        ensure_query(&mut queries, &client, &QueryKey::Trending, &tx, later);
        assert!(
            matches!(queries.catalog.state(&QueryKey::Trending), QueryState::Error(_)),
            "the loop itself never retries a failure"
        );

        refresh_query(&mut queries, &client, &QueryKey::Trending, &tx, later);
        assert_eq!(queries.catalog.state(&QueryKey::Trending), QueryState::Loading);

        let result = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("refetch should report back");
        assert!(apply_fetch_result(&mut queries, result, later));
        assert_eq!(
            queries.catalog.data(&QueryKey::Trending).map(Vec::len),
            Some(1)
        );
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn recommitting_failed_search_loads_again() {
        let server = TestServer::spawn(vec![Behavior::Respond(200, "[]".to_string())]);
        let client = client_for(&server);
        let (tx, rx) = mpsc::channel();
        let mut queries = Queries::default();
        let key = QueryKey::Search("love".to_string());
        let now = Instant::now();
        fail_catalog_query(&mut queries, &key, now);

        refresh_query(&mut queries, &client, &key, &tx, now);
        assert_eq!(queries.catalog.state(&key), QueryState::Loading);

        let result = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("search should report back");
        assert!(apply_fetch_result(&mut queries, result, now));
        assert_eq!(queries.catalog.state(&key), QueryState::Success(&Vec::new()));
        assert_eq!(
            server.last_request_path().as_deref(),
            Some("/dramabox/search?query=love")
        );
    }

    #[test]
    fn refresh_of_fresh_query_does_not_refetch() {
        let server = TestServer::spawn(Vec::new());
        let client = client_for(&server);
        let (tx, _rx) = mpsc::channel();
        let mut queries = Queries::default();
        let now = Instant::now();
        let ticket = queries.catalog.begin(&QueryKey::Trending);
        queries
            .catalog
            .complete(&QueryKey::Trending, ticket, Ok(vec![item(1)]), now);

        refresh_query(&mut queries, &client, &QueryKey::Trending, &tx, now);
        assert!(!queries.catalog.is_refreshing(&QueryKey::Trending));
        assert_eq!(server.request_count(), 0);
    }
}

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::catalog::FetchError;

pub(crate) const TRENDING_FRESH_FOR: Duration = Duration::from_secs(10 * 60);
pub(crate) const SEARCH_FRESH_FOR: Duration = Duration::from_secs(5 * 60);
pub(crate) const EPISODES_FRESH_FOR: Duration = Duration::ZERO;

/// Operation kind plus parameters; identical keys share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum QueryKey {
    Trending,
    Search(String),
    Episodes(String),
}

impl QueryKey {
    pub(crate) fn fresh_for(&self) -> Duration {
        match self {
            Self::Trending => TRENDING_FRESH_FOR,
            Self::Search(_) => SEARCH_FRESH_FOR,
            Self::Episodes(_) => EPISODES_FRESH_FOR,
        }
    }
}

pub(crate) type Ticket = u64;

#[derive(Debug)]
enum Status<T> {
    Pending,
    Failed(String),
    Ready(T),
}

#[derive(Debug)]
struct Entry<T> {
    status: Status<T>,
    in_flight: Option<Ticket>,
    succeeded_at: Option<Instant>,
    fetched_at: Option<DateTime<Local>>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum QueryState<'a, T> {
    Idle,
    Loading,
    Error(&'a str),
    Success(&'a T),
}

impl<T> Clone for QueryState<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for QueryState<'_, T> {}

#[derive(Debug)]
pub(crate) struct QueryStore<T> {
    entries: HashMap<QueryKey, Entry<T>>,
    next_ticket: Ticket,
}

impl<T> Default for QueryStore<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            next_ticket: 1,
        }
    }
}

impl<T> QueryStore<T> {
    /// Whether a caller should start a request for `key`. In-flight keys are
    /// coalesced and failed keys stay failed until an explicit retry.
    pub(crate) fn needs_fetch(&self, key: &QueryKey, now: Instant, fresh_for: Duration) -> bool {
        let Some(entry) = self.entries.get(key) else {
            return true;
        };
        if entry.in_flight.is_some() {
            return false;
        }
        match entry.status {
            Status::Pending | Status::Failed(_) => false,
            Status::Ready(_) => entry
                .succeeded_at
                .is_none_or(|at| now.saturating_duration_since(at) >= fresh_for),
        }
    }

    /// Marks `key` in flight. Stale data stays visible while it refreshes.
    pub(crate) fn begin(&mut self, key: &QueryKey) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let entry = self.entries.entry(key.clone()).or_insert_with(|| Entry {
            status: Status::Pending,
            in_flight: None,
            succeeded_at: None,
            fetched_at: None,
        });
        if !matches!(entry.status, Status::Ready(_)) {
            entry.status = Status::Pending;
        }
        entry.in_flight = Some(ticket);
        debug!(?key, ticket, "query started");
        ticket
    }

    /// User-triggered restart. A failed key goes back to loading; ready data
    /// stays visible exactly as with `begin`.
    pub(crate) fn retry(&mut self, key: &QueryKey) -> Ticket {
        debug!(?key, "query retried");
        self.begin(key)
    }

    pub(crate) fn has_failed(&self, key: &QueryKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| matches!(entry.status, Status::Failed(_)))
    }

    /// Applies a finished request. Results carrying anything but the latest
    /// ticket for `key` are dropped.
    pub(crate) fn complete(
        &mut self,
        key: &QueryKey,
        ticket: Ticket,
        outcome: Result<T, FetchError>,
        now: Instant,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        if entry.in_flight != Some(ticket) {
            debug!(?key, ticket, "ignoring superseded query result");
            return false;
        }

        entry.in_flight = None;
        match outcome {
            Ok(data) => {
                entry.status = Status::Ready(data);
                entry.succeeded_at = Some(now);
                entry.fetched_at = Some(Local::now());
            }
            Err(err) => {
                debug!(?key, ticket, error = %err, "query failed");
                entry.status = Status::Failed(err.to_string());
            }
        }
        true
    }

    pub(crate) fn state(&self, key: &QueryKey) -> QueryState<'_, T> {
        match self.entries.get(key).map(|entry| &entry.status) {
            None => QueryState::Idle,
            Some(Status::Pending) => QueryState::Loading,
            Some(Status::Failed(message)) => QueryState::Error(message),
            Some(Status::Ready(data)) => QueryState::Success(data),
        }
    }

    pub(crate) fn data(&self, key: &QueryKey) -> Option<&T> {
        match self.state(key) {
            QueryState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn is_refreshing(&self, key: &QueryKey) -> bool {
        self.entries.get(key).is_some_and(|entry| {
            entry.in_flight.is_some() && matches!(entry.status, Status::Ready(_))
        })
    }

    pub(crate) fn fetched_at(&self, key: &QueryKey) -> Option<DateTime<Local>> {
        self.entries.get(key).and_then(|entry| entry.fetched_at)
    }
}

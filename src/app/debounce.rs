use std::time::{Duration, Instant};

pub(crate) const SEARCH_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Raw search input plus the committed query it settles into once typing
/// pauses for the debounce delay.
#[derive(Debug, Clone)]
pub(crate) struct SearchDebouncer {
    raw: String,
    committed: String,
    deadline: Option<Instant>,
    delay: Duration,
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl SearchDebouncer {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            raw: String::new(),
            committed: String::new(),
            deadline: None,
            delay,
        }
    }

    /// Replaces the raw text and re-arms the deadline, superseding any
    /// pending commit.
    pub(crate) fn input(&mut self, text: impl Into<String>, now: Instant) {
        self.raw = text.into();
        self.deadline = Some(now + self.delay);
    }

    pub(crate) fn push_char(&mut self, ch: char, now: Instant) {
        let mut text = std::mem::take(&mut self.raw);
        text.push(ch);
        self.input(text, now);
    }

    pub(crate) fn pop_char(&mut self, now: Instant) {
        let mut text = std::mem::take(&mut self.raw);
        text.pop();
        self.input(text, now);
    }

    /// Commits once the deadline has passed; returns the committed query on
    /// the poll that fires.
    pub(crate) fn poll(&mut self, now: Instant) -> Option<&str> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        self.committed = self.raw.trim().to_string();
        Some(&self.committed)
    }

    pub(crate) fn cancel(&mut self) {
        self.deadline = None;
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub(crate) fn raw(&self) -> &str {
        &self.raw
    }

    pub(crate) fn committed(&self) -> &str {
        &self.committed
    }

    pub(crate) fn shows_search_section(&self) -> bool {
        !self.raw.is_empty()
    }

    pub(crate) fn search_enabled(&self) -> bool {
        !self.committed.is_empty()
    }
}

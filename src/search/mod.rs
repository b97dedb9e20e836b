//! Debounced search engine
//!
//! State machine behind the process/service search views. Keystrokes only
//! arm a deadline; a remote call is issued when the input settles, and
//! every issued call carries a monotonically increasing generation tag.
//! A response is applied only if its generation is still the latest —
//! anything the user typed in the meantime supersedes it, so a late
//! response for an old query can never overwrite a newer one. Correctness
//! never depends on cancelling the underlying transport.


use crate::api::types::{ProcessRow, ServiceRow};
use std::time::{Duration, Instant};

/// What the search box is searching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Process,
    Service,
}

/// Lifecycle of the current query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// No query text; nothing fetched, nothing to show.
    Idle,
    /// Query typed, debounce window still open.
    Pending,
    /// Remote call in flight for the settled query.
    Loading,
    /// Results rendered (possibly an empty list, distinct from Idle).
    Settled,
    /// The call failed; a displayable message is set.
    Errored,
}

/// Descriptor of the one remote call to issue for a settled window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub generation: u64,
    pub mode: SearchMode,
    pub query: String,
}

/// Result rows for a completed call, per mode.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResponse {
    Processes(Vec<ProcessRow>),
    Services(Vec<ServiceRow>),
}

/// The engine itself. Pure state: the caller drives it with the clock
/// (`due`) and with completed responses (`apply_*`).
#[derive(Debug)]
pub struct SearchEngine {
    mode: SearchMode,
    query: String,
    phase: SearchPhase,
    debounce: Duration,
    deadline: Option<Instant>,
    /// Bumped by every superseding event: keystroke, clear, mode switch,
    /// and each issued call. A response is stale unless its tag matches.
    generation: u64,
    processes: Vec<ProcessRow>,
    services: Vec<ServiceRow>,
    error: Option<String>,
}

impl SearchEngine {
    pub fn new(debounce: Duration) -> Self {
        Self {
            mode: SearchMode::Process,
            query: String::new(),
            phase: SearchPhase::Idle,
            debounce,
            deadline: None,
            generation: 0,
            processes: Vec::new(),
            services: Vec::new(),
            error: None,
        }
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn processes(&self) -> &[ProcessRow] {
        &self.processes
    }

    pub fn services(&self) -> &[ServiceRow] {
        &self.services
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of rows for the active mode.
    pub fn result_len(&self) -> usize {
        match self.mode {
            SearchMode::Process => self.processes.len(),
            SearchMode::Service => self.services.len(),
        }
    }

    /// Record the query text as of `now`. An empty (or whitespace) query
    /// returns to Idle with no network call; anything else re-arms the
    /// debounce deadline. Either way, any in-flight response is
    /// superseded.
    pub fn set_query(&mut self, text: impl Into<String>, now: Instant) {
        self.query = text.into();
        self.generation += 1;
        if self.query.trim().is_empty() {
            self.phase = SearchPhase::Idle;
            self.deadline = None;
            self.processes.clear();
            self.services.clear();
            self.error = None;
        } else {
            self.phase = SearchPhase::Pending;
            self.deadline = Some(now + self.debounce);
        }
    }

    /// Append a typed character at `now`.
    pub fn push_char(&mut self, c: char, now: Instant) {
        let mut text = self.query.clone();
        text.push(c);
        self.set_query(text, now);
    }

    /// Delete the last character at `now`.
    pub fn pop_char(&mut self, now: Instant) {
        let mut text = self.query.clone();
        text.pop();
        self.set_query(text, now);
    }

    /// Switch between process and service search. Clears both result
    /// lists and the query text; no stale query carries across modes.
    pub fn set_mode(&mut self, mode: SearchMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.query.clear();
        self.phase = SearchPhase::Idle;
        self.deadline = None;
        self.generation += 1;
        self.processes.clear();
        self.services.clear();
        self.error = None;
    }

    /// If the debounce window closed, issue exactly one call for the
    /// current (mode, text) pair and hand back its descriptor.
    pub fn due(&mut self, now: Instant) -> Option<SearchRequest> {
        if self.phase != SearchPhase::Pending {
            return None;
        }
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.phase = SearchPhase::Loading;
        self.deadline = None;
        self.generation += 1;
        Some(SearchRequest {
            generation: self.generation,
            mode: self.mode,
            query: self.query.trim().to_string(),
        })
    }

    /// Apply a completed call. A stale generation is dropped silently —
    /// no state transition, nothing rendered.
    pub fn apply_success(&mut self, generation: u64, response: SearchResponse) {
        if generation != self.generation {
            tracing::debug!(generation, latest = self.generation, "dropping superseded search response");
            return;
        }
        match response {
            SearchResponse::Processes(rows) => {
                self.processes = rows;
                self.services.clear();
            }
            SearchResponse::Services(rows) => {
                self.services = rows;
                self.processes.clear();
            }
        }
        self.error = None;
        self.phase = SearchPhase::Settled;
    }

    /// Apply a failed call. Stale failures are dropped like stale
    /// successes; a current one clears previous results.
    pub fn apply_error(&mut self, generation: u64, message: impl Into<String>) {
        if generation != self.generation {
            tracing::debug!(generation, latest = self.generation, "dropping superseded search failure");
            return;
        }
        self.processes.clear();
        self.services.clear();
        self.error = Some(message.into());
        self.phase = SearchPhase::Errored;
    }
}

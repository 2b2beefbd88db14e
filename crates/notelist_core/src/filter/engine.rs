//! Text filter engine.
//!
//! # Responsibility
//! - Turn free query text into a store predicate.
//! - Re-run the query against the store on every text change or refresh.
//! - Drop results of superseded requests.
//!
//! # Invariants
//! - Empty text means "no filter"; any other text means
//!   "title contains text, case-insensitive".
//! - No results are cached; every run is a fresh read.
//! - Only the most recently requested ticket is accepted.

use crate::model::note::Note;
use crate::repo::note_repo::{NoteFilter, NoteQuery, NoteStore, RepoResult};
use log::debug;

/// Mutable filter state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub query_text: String,
}

/// One requested filter run.
///
/// Tickets are ordered by generation; a ticket is stale once a newer one
/// has been requested from the same engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTicket {
    generation: u64,
    query: NoteQuery,
}

impl FilterTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &NoteQuery {
        &self.query
    }
}

/// Filter engine owning the current query text.
#[derive(Debug, Default)]
pub struct FilterEngine {
    state: FilterState,
    latest_generation: u64,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Sets the query text and returns the freshly filtered list.
    pub fn set_query(&mut self, store: &impl NoteStore, text: &str) -> RepoResult<Vec<Note>> {
        let ticket = self.request(text);
        self.run(store, &ticket)
    }

    /// Re-runs the current query text (explicit pull after mutations).
    pub fn refresh(&mut self, store: &impl NoteStore) -> RepoResult<Vec<Note>> {
        let text = self.state.query_text.clone();
        self.set_query(store, &text)
    }

    /// Records `text` as the latest query and returns its ticket.
    ///
    /// Any ticket handed out earlier becomes stale.
    pub fn request(&mut self, text: &str) -> FilterTicket {
        self.state.query_text = text.to_string();
        self.latest_generation += 1;
        FilterTicket {
            generation: self.latest_generation,
            query: NoteQuery::filtered(predicate_for(text)),
        }
    }

    /// Executes a ticket against the store.
    pub fn run(&self, store: &impl NoteStore, ticket: &FilterTicket) -> RepoResult<Vec<Note>> {
        let notes = store.query(&ticket.query)?;
        debug!(
            "event=filter_run module=filter status=ok generation={} filtered={} rows={}",
            ticket.generation,
            !ticket.query.filter.is_unfiltered(),
            notes.len()
        );
        Ok(notes)
    }

    /// Whether `ticket` is still the latest request.
    pub fn is_current(&self, ticket: &FilterTicket) -> bool {
        ticket.generation == self.latest_generation
    }

    /// Hands back `notes` only when `ticket` has not been superseded.
    pub fn accept(&self, ticket: &FilterTicket, notes: Vec<Note>) -> Option<Vec<Note>> {
        if self.is_current(ticket) {
            Some(notes)
        } else {
            debug!(
                "event=filter_result_dropped module=filter status=stale generation={} latest={}",
                ticket.generation, self.latest_generation
            );
            None
        }
    }
}

/// Derives the store predicate for a query text.
pub fn predicate_for(text: &str) -> NoteFilter {
    if text.is_empty() {
        NoteFilter::default()
    } else {
        NoteFilter {
            title_contains: Some(text.to_string()),
            ..NoteFilter::default()
        }
    }
}

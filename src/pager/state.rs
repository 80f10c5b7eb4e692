use std::collections::HashSet;

use tracing::{debug, trace, warn};

use crate::error::PagerError;
use crate::gateway::AssetQuery;
use crate::models::{AssetRecord, Page};

/// Permission to run exactly one fetch, handed out by [`PagerState::begin_fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    /// Query to send, with the cursor filled in.
    pub query: AssetQuery,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Appended { added: usize, duplicates: usize },
    Failed(PagerError),
    /// The pager was reset or closed while the fetch was in flight.
    Stale,
}

/// Accumulated paging state owned by one pager.
///
/// All transitions are synchronous; the owner only has to serialize access
/// (e.g. with a mutex) and never hold it across an await.
#[derive(Debug, Clone)]
pub struct PagerState {
    query: AssetQuery,
    items: Vec<AssetRecord>,
    seen: HashSet<String>,
    cursor: Option<String>,
    /// Cursor used by the most recent successful fetch.
    /// `None` until a fetch has completed.
    last_completed_cursor: Option<Option<String>>,
    in_flight: bool,
    exhausted: bool,
    last_error: Option<PagerError>,
    generation: u64,
    closed: bool,
}

impl PagerState {
    pub fn new(query: AssetQuery) -> Self {
        Self {
            query: query.with_cursor(None),
            items: Vec::new(),
            seen: HashSet::new(),
            cursor: None,
            last_completed_cursor: None,
            in_flight: false,
            exhausted: false,
            last_error: None,
            generation: 0,
            closed: false,
        }
    }

    pub fn query(&self) -> &AssetQuery {
        &self.query
    }

    pub fn items(&self) -> &[AssetRecord] {
        &self.items
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&PagerError> {
        self.last_error.as_ref()
    }

    /// True while the last page carried a cursor and nothing has failed.
    pub fn has_more(&self) -> bool {
        !self.closed && !self.exhausted && self.last_error.is_none()
    }

    /// Drops everything accumulated and starts over with `query`.
    ///
    /// Any fetch still in flight belongs to the previous generation and its
    /// result will be discarded.
    pub fn reset(&mut self, query: AssetQuery) {
        let generation = self.generation.wrapping_add(1);
        let closed = self.closed;
        *self = Self::new(query);
        self.generation = generation;
        self.closed = closed;
        debug!(generation, "Pager reset");
    }

    /// Replaces the query, resetting only when it actually changed.
    pub fn set_query(&mut self, query: AssetQuery) -> bool {
        let query = query.with_cursor(None);
        if query == self.query {
            return false;
        }
        self.reset(query);
        true
    }

    /// Clears a stored error so the next `begin_fetch` resumes from the
    /// cursor that failed. Accumulated items are kept.
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Marks the pager as torn down. Later completions are ignored.
    pub fn close(&mut self) {
        self.closed = true;
        self.in_flight = false;
    }

    /// Checks and claims the single fetch slot.
    ///
    /// Returns `None` when a fetch is already in flight, nothing more is
    /// available, or the cursor equals the one of the last completed fetch.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if self.in_flight || !self.has_more() {
            return None;
        }
        if self.last_completed_cursor.as_ref() == Some(&self.cursor) {
            trace!(cursor = ?self.cursor, "Cursor already fetched, skipping");
            return None;
        }
        self.in_flight = true;
        Some(FetchTicket {
            generation: self.generation,
            query: self.query.clone().with_cursor(self.cursor.clone()),
        })
    }

    /// Releases the fetch slot of a fetch that will never complete, e.g.
    /// because its future was dropped. A no-op for older generations.
    pub fn abandon(&mut self, generation: u64) {
        if generation == self.generation && self.in_flight {
            debug!(generation, "Fetch abandoned before completion");
            self.in_flight = false;
        }
    }

    /// Applies the result of the fetch `ticket` was issued for.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<Page, PagerError>) -> Completion {
        if self.closed || ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Discarding response for a stale pager"
            );
            return Completion::Stale;
        }
        self.in_flight = false;

        match result {
            Ok(page) => {
                let mut added = 0;
                let mut duplicates = 0;
                for item in page.items {
                    if self.seen.insert(item.identity.clone()) {
                        self.items.push(item);
                        added += 1;
                    } else {
                        duplicates += 1;
                    }
                }
                if duplicates > 0 {
                    debug!(duplicates, "Dropped assets already seen on earlier pages");
                }
                self.last_completed_cursor = Some(ticket.query.cursor);
                self.cursor = page.next_cursor.filter(|c| !c.is_empty());
                self.exhausted = self.cursor.is_none();
                self.last_error = None;
                Completion::Appended { added, duplicates }
            }
            Err(err) => {
                warn!(error = %err, "Page fetch failed, pagination halted");
                self.last_error = Some(err.clone());
                Completion::Failed(err)
            }
        }
    }
}

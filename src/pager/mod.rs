//! Asset Pager: incremental loading of gateway pages.
//!
//! - `PagerState` - explicit accumulation state and its transitions
//! - `PageFetcher` - where pages come from (HTTP or in-process gateway)
//! - `AssetPager` - async driver enforcing one fetch in flight at a time

pub mod fetcher;
pub mod state;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::gateway::AssetQuery;
use crate::models::AssetRecord;

pub use fetcher::{HttpPageFetcher, PageFetcher};
pub use state::{Completion, PagerState};

/// Outcome of one `load_more` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was requested: already loading, exhausted, failed or closed.
    Skipped,
    Completed(Completion),
}

/// Point-in-time view of a pager, as a gallery renders it.
#[derive(Debug, Clone, PartialEq)]
pub struct PagerSnapshot {
    pub items: Vec<AssetRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub has_more: bool,
}

/// Held across the fetch await; abandons the fetch if dropped while armed.
struct InFlightSlot<'a> {
    state: &'a Mutex<PagerState>,
    generation: u64,
    armed: bool,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().abandon(self.generation);
        }
    }
}

/// Accumulates pages for one query.
///
/// The state lock is only held for synchronous transitions, never across the
/// network call, so `load_more` claims the fetch slot before its first await.
pub struct AssetPager {
    fetcher: Arc<dyn PageFetcher>,
    state: Mutex<PagerState>,
}

impl AssetPager {
    pub fn new(fetcher: Arc<dyn PageFetcher>, query: AssetQuery) -> Self {
        Self {
            fetcher,
            state: Mutex::new(PagerState::new(query)),
        }
    }

    /// Requests the next page if one may be requested right now.
    ///
    /// Dropping the returned future mid-fetch releases the fetch slot, so a
    /// later call can try the same cursor again.
    pub async fn load_more(&self) -> LoadOutcome {
        let ticket = self.state.lock().begin_fetch();
        let Some(ticket) = ticket else {
            return LoadOutcome::Skipped;
        };
        debug!(
            folder = %ticket.query.folder,
            cursor = ?ticket.query.cursor,
            "Fetching page"
        );
        let mut slot = InFlightSlot {
            state: &self.state,
            generation: ticket.generation(),
            armed: true,
        };
        let result = self.fetcher.fetch_page(&ticket.query).await;
        slot.armed = false;
        LoadOutcome::Completed(self.state.lock().complete(ticket, result))
    }

    /// Switches to `query`; accumulated state is dropped only if it changed.
    pub fn set_query(&self, query: AssetQuery) -> bool {
        self.state.lock().set_query(query)
    }

    /// User-triggered retry after a failure: resumes from the failed cursor
    /// and keeps what was already loaded.
    pub fn retry(&self) {
        self.state.lock().clear_error();
    }

    /// Tears the pager down. Responses still in flight are ignored.
    pub fn close(&self) {
        self.state.lock().close();
    }

    pub fn items(&self) -> Vec<AssetRecord> {
        self.state.lock().items().to_vec()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn loading(&self) -> bool {
        self.state.lock().in_flight()
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().last_error().map(|e| e.to_string())
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().has_more()
    }

    pub fn query(&self) -> AssetQuery {
        self.state.lock().query().clone()
    }

    pub fn snapshot(&self) -> PagerSnapshot {
        let state = self.state.lock();
        PagerSnapshot {
            items: state.items().to_vec(),
            loading: state.in_flight(),
            error: state.last_error().map(|e| e.to_string()),
            has_more: state.has_more(),
        }
    }
}

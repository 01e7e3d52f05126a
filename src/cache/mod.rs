//! Page cache for on-demand generation and revalidation
//!
//! Rendered pages are kept in memory together with the instant they were
//! generated. A page older than the revalidation window is still served,
//! but marks itself stale so the caller can regenerate it in the
//! background. At most one regeneration per uid runs at a time.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant, SystemTime};

use tokio::sync::{Mutex, RwLock};

/// What the cache knows about a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    /// Rendered HTML
    Rendered(String),
    /// The repository has no such post
    NotFound,
    /// The last generation failed and nothing was rendered before
    Failed(String),
}

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Fresh(PageState),
    /// Usable, but due for regeneration
    Stale(PageState),
    Missing,
}

struct CacheEntry {
    state: PageState,
    generated_at: Instant,
}

/// In-memory page cache with a fixed revalidation window
pub struct PageCache {
    revalidate: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
    in_flight: Mutex<HashSet<String>>,
}

impl PageCache {
    pub fn new(revalidate: Duration) -> Self {
        Self {
            revalidate,
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn revalidate_after(&self) -> Duration {
        self.revalidate
    }

    /// Look a page up
    pub async fn lookup(&self, uid: &str) -> Lookup {
        let entries = self.entries.read().await;
        let Some(entry) = entries.get(uid) else {
            return Lookup::Missing;
        };

        let fresh = entry.generated_at.elapsed() < self.revalidate;
        match &entry.state {
            PageState::Failed(_) => Lookup::Stale(entry.state.clone()),
            state if fresh => Lookup::Fresh(state.clone()),
            state => Lookup::Stale(state.clone()),
        }
    }

    /// Record a page generated just now
    pub async fn store(&self, uid: &str, state: PageState) {
        self.store_at(uid, state, Instant::now()).await;
    }

    /// Record a page generated at some earlier point
    ///
    /// Used for pages found on disk from a previous build; a modification
    /// time too far back to represent counts as stale.
    pub async fn store_since(&self, uid: &str, state: PageState, modified: SystemTime) {
        let age = modified.elapsed().unwrap_or_default();
        let generated_at = Instant::now()
            .checked_sub(age)
            .or_else(|| Instant::now().checked_sub(self.revalidate))
            .unwrap_or_else(Instant::now);
        self.store_at(uid, state, generated_at).await;
    }

    async fn store_at(&self, uid: &str, state: PageState, generated_at: Instant) {
        let mut entries = self.entries.write().await;
        entries.insert(
            uid.to_string(),
            CacheEntry {
                state,
                generated_at,
            },
        );
    }

    /// Whether a rendered page is held for `uid`, fresh or not
    pub async fn has_rendered(&self, uid: &str) -> bool {
        let entries = self.entries.read().await;
        matches!(
            entries.get(uid).map(|e| &e.state),
            Some(PageState::Rendered(_))
        )
    }

    /// Claim the regeneration of `uid`; false if one is already running
    pub async fn begin_refresh(&self, uid: &str) -> bool {
        self.in_flight.lock().await.insert(uid.to_string())
    }

    pub async fn end_refresh(&self, uid: &str) {
        self.in_flight.lock().await.remove(uid);
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

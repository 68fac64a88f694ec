//! Incremental ("infinite scroll") page accumulation

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::task::JoinHandle;

use super::{Identified, Paginated};

/// A page fetch that did not produce a page
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("failed to load page {page}: {message}")]
    Source { page: usize, message: String },

    #[error("page fetch aborted: {0}")]
    Aborted(String),
}

/// Where pages come from
pub trait PageSource<T>: Send + Sync + 'static {
    fn fetch_page(
        &self,
        page: usize,
        page_size: usize,
    ) -> impl Future<Output = Result<Paginated<T>, FetchError>> + Send;
}

/// Result of a [`InfiniteScroll::load_more`] call
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A page was appended; `added` counts records that were not already loaded
    Loaded { page: usize, added: usize },
    /// Another load is in flight; this trigger was ignored
    Busy,
    /// Nothing left to load
    Exhausted,
    /// The fetch failed; loaded data is unchanged and the load can be retried
    Failed(FetchError),
}

struct ScrollState<T> {
    items: Vec<T>,
    seen: HashSet<String>,
    page: usize,
    total: usize,
    has_more: bool,
    error: Option<FetchError>,
}

impl<T: Identified> ScrollState<T> {
    /// Append records whose id is new, keeping order
    fn append(&mut self, incoming: Vec<T>) -> usize {
        let before = self.items.len();
        for item in incoming {
            if self.seen.insert(item.id().to_string()) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }
}

struct Prefetch<T> {
    page: usize,
    handle: JoinHandle<Result<Paginated<T>, FetchError>>,
}

/// Client-held list that grows one page at a time.
///
/// At most one load runs at a time: triggers arriving while a load is in
/// flight return [`LoadOutcome::Busy`]. After each successful load the
/// following page is fetched speculatively in the background and used by
/// the next load.
pub struct InfiniteScroll<T, S> {
    source: Arc<S>,
    page_size: usize,
    loading: AtomicBool,
    state: Mutex<ScrollState<T>>,
    prefetch: Mutex<Option<Prefetch<T>>>,
}

/// Clears the in-flight flag when a load finishes
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T, S> InfiniteScroll<T, S>
where
    T: Identified + Clone + Send + 'static,
    S: PageSource<T>,
{
    /// Start empty; the first load fetches page 1
    pub fn new(source: Arc<S>, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            loading: AtomicBool::new(false),
            state: Mutex::new(ScrollState {
                items: Vec::new(),
                seen: HashSet::new(),
                page: 0,
                total: 0,
                has_more: true,
                error: None,
            }),
            prefetch: Mutex::new(None),
        }
    }

    /// Start from an already delivered page (e.g. rendered with the page)
    pub fn with_initial(source: Arc<S>, initial: Paginated<T>) -> Self {
        let scroll = Self::new(source, initial.page_size);
        {
            let mut state = scroll.lock_state();
            state.page = initial.page;
            state.total = initial.total;
            state.has_more = initial.page < initial.total_pages;
            state.append(initial.items);
        }
        scroll
    }

    /// Load and append the next page.
    pub async fn load_more(&self) -> LoadOutcome {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::trace!("Load already in flight, ignoring trigger");
            return LoadOutcome::Busy;
        }
        let _guard = LoadingGuard(&self.loading);

        let next = {
            let state = self.lock_state();
            if !state.has_more {
                return LoadOutcome::Exhausted;
            }
            state.page + 1
        };

        let result = match self.take_prefetch(next) {
            Some(handle) => match handle.await {
                Ok(Ok(page)) => Ok(page),
                Ok(Err(e)) => {
                    tracing::debug!("Prefetch of page {} failed ({}), fetching again", next, e);
                    self.source.fetch_page(next, self.page_size).await
                }
                Err(e) => Err(FetchError::Aborted(e.to_string())),
            },
            None => self.source.fetch_page(next, self.page_size).await,
        };

        match result {
            Ok(page) => {
                let (added, has_more) = {
                    let mut state = self.lock_state();
                    let added = state.append(page.items);
                    state.page = next;
                    state.total = page.total;
                    state.has_more = next < page.total_pages;
                    state.error = None;
                    (added, state.has_more)
                };
                tracing::debug!("Loaded page {} ({} new records)", next, added);
                if has_more {
                    self.start_prefetch(next + 1);
                }
                LoadOutcome::Loaded { page: next, added }
            }
            Err(e) => {
                tracing::warn!("Loading page {} failed: {}", next, e);
                self.lock_state().error = Some(e.clone());
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Clear the last error and try the failed load again
    pub async fn retry(&self) -> LoadOutcome {
        self.lock_state().error = None;
        self.load_more().await
    }

    /// Snapshot of the accumulated records
    pub fn items(&self) -> Vec<T> {
        self.lock_state().items.clone()
    }

    pub fn len(&self) -> usize {
        self.lock_state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last page successfully loaded (0 before the first load)
    pub fn page(&self) -> usize {
        self.lock_state().page
    }

    /// Collection size reported by the last loaded page
    pub fn total(&self) -> usize {
        self.lock_state().total
    }

    pub fn has_more(&self) -> bool {
        self.lock_state().has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// The error left by the last failed load, if it has not been retried
    pub fn error(&self) -> Option<FetchError> {
        self.lock_state().error.clone()
    }

    fn start_prefetch(&self, page: usize) {
        let source = Arc::clone(&self.source);
        let page_size = self.page_size;
        let handle = tokio::spawn(async move { source.fetch_page(page, page_size).await });

        let mut slot = self.prefetch.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(stale) = slot.replace(Prefetch { page, handle }) {
            stale.handle.abort();
        }
    }

    fn take_prefetch(&self, page: usize) -> Option<JoinHandle<Result<Paginated<T>, FetchError>>> {
        let mut slot = self.prefetch.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.take() {
            Some(p) if p.page == page => Some(p.handle),
            Some(stale) => {
                stale.handle.abort();
                None
            }
            None => None,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ScrollState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, S> Drop for InfiniteScroll<T, S> {
    fn drop(&mut self) {
        let slot = self.prefetch.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(p) = slot.take() {
            p.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::paginate;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(String);

    impl Identified for Item {
        fn id(&self) -> &str {
            &self.0
        }
    }

    fn items(prefix: &str, n: usize) -> Vec<Item> {
        (1..=n).map(|i| Item(format!("{}{}", prefix, i))).collect()
    }

    /// In-memory source whose contents can change between requests
    #[derive(Default)]
    struct MemorySource {
        items: Mutex<Vec<Item>>,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl MemorySource {
        fn with(items: Vec<Item>) -> Arc<Self> {
            Arc::new(Self {
                items: Mutex::new(items),
                ..Default::default()
            })
        }
    }

    impl PageSource<Item> for MemorySource {
        fn fetch_page(
            &self,
            page: usize,
            page_size: usize,
        ) -> impl Future<Output = Result<Paginated<Item>, FetchError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = if self.fail.load(Ordering::SeqCst) {
                Err(FetchError::Source {
                    page,
                    message: "network down".to_string(),
                })
            } else {
                Ok(paginate(&self.items.lock().unwrap(), page, page_size))
            };
            async move { result }
        }
    }

    /// Source that blocks page 1 until released
    #[derive(Default)]
    struct GatedSource {
        started: Notify,
        release: Notify,
    }

    impl PageSource<Item> for GatedSource {
        fn fetch_page(
            &self,
            page: usize,
            page_size: usize,
        ) -> impl Future<Output = Result<Paginated<Item>, FetchError>> + Send {
            async move {
                if page == 1 {
                    self.started.notify_one();
                    self.release.notified().await;
                }
                Ok(paginate(&items("g", 20), page, page_size))
            }
        }
    }

    fn ids(scroll: &InfiniteScroll<Item, impl PageSource<Item>>) -> Vec<String> {
        scroll.items().into_iter().map(|i| i.0).collect()
    }

    #[tokio::test]
    async fn test_loads_until_exhausted() {
        let source = MemorySource::with(items("n", 7));
        let scroll = InfiniteScroll::new(source, 5);

        assert_eq!(scroll.load_more().await, LoadOutcome::Loaded { page: 1, added: 5 });
        assert!(scroll.has_more());
        assert_eq!(scroll.load_more().await, LoadOutcome::Loaded { page: 2, added: 2 });
        assert!(!scroll.has_more());
        assert_eq!(scroll.load_more().await, LoadOutcome::Exhausted);
        assert_eq!(scroll.len(), 7);
        assert_eq!(scroll.total(), 7);
    }

    #[tokio::test]
    async fn test_continues_from_initial_page() {
        let source = MemorySource::with(items("n", 12));
        let initial = paginate(&items("n", 12), 1, 5);
        let scroll = InfiniteScroll::with_initial(source, initial);
        assert_eq!(scroll.page(), 1);
        assert_eq!(scroll.len(), 5);

        assert_eq!(scroll.load_more().await, LoadOutcome::Loaded { page: 2, added: 5 });
        assert_eq!(scroll.items()[5], Item("n6".to_string()));
    }

    #[tokio::test]
    async fn test_no_duplicates_when_source_shifts() {
        let source = MemorySource::with(items("n", 10));
        let scroll = InfiniteScroll::new(Arc::clone(&source), 5);
        scroll.load_more().await;

        // A new record lands at the front, pushing n5 onto page 2
        source.items.lock().unwrap().insert(0, Item("new".to_string()));
        while let LoadOutcome::Loaded { .. } = scroll.load_more().await {}

        let loaded = ids(&scroll);
        let unique: HashSet<_> = loaded.iter().collect();
        assert_eq!(unique.len(), loaded.len());
        assert_eq!(loaded.iter().filter(|id| *id == "n5").count(), 1);
        assert!(loaded.contains(&"n10".to_string()));
    }

    #[tokio::test]
    async fn test_failure_keeps_data_and_can_retry() {
        let source = MemorySource::with(items("n", 12));
        let scroll = InfiniteScroll::new(Arc::clone(&source), 5);
        scroll.load_more().await;
        let before = ids(&scroll);

        source.fail.store(true, Ordering::SeqCst);
        let outcome = scroll.load_more().await;
        assert!(matches!(outcome, LoadOutcome::Failed(FetchError::Source { page: 2, .. })));
        assert_eq!(ids(&scroll), before);
        assert_eq!(scroll.page(), 1);
        assert!(scroll.error().is_some());
        assert!(!scroll.is_loading());

        source.fail.store(false, Ordering::SeqCst);
        assert_eq!(scroll.retry().await, LoadOutcome::Loaded { page: 2, added: 5 });
        assert!(scroll.error().is_none());
    }

    #[tokio::test]
    async fn test_overlapping_triggers_are_ignored() {
        let source = Arc::new(GatedSource::default());
        let scroll = Arc::new(InfiniteScroll::new(Arc::clone(&source), 5));

        let first = {
            let scroll = Arc::clone(&scroll);
            tokio::spawn(async move { scroll.load_more().await })
        };
        source.started.notified().await;

        assert!(scroll.is_loading());
        assert_eq!(scroll.load_more().await, LoadOutcome::Busy);

        source.release.notify_one();
        assert_eq!(first.await.unwrap(), LoadOutcome::Loaded { page: 1, added: 5 });
        assert!(!scroll.is_loading());
        assert_eq!(scroll.len(), 5);
    }

    #[tokio::test]
    async fn test_uses_prefetched_page() {
        let source = MemorySource::with(items("n", 10));
        let scroll = InfiniteScroll::new(Arc::clone(&source), 5);
        scroll.load_more().await;
        assert_eq!(scroll.load_more().await, LoadOutcome::Loaded { page: 2, added: 5 });
        // page 1 fetched directly, page 2 taken from the prefetch
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(scroll.len(), 10);
    }
}

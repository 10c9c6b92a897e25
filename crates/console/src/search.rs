//! Debounced search-as-you-type.
//!
//! Each call to [`SearchController::query`] cancels whatever the previous
//! keystroke started (the debounce timer or the in-flight request), so the
//! published [`SearchState`] always belongs to the latest query.
//!
//! The same controller drives generic lookups (a list of records) and the
//! name box of the list panels (one page of rows).

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crewboard_client::api::ApiError;
use crewboard_core::filter::{normalize_search, LookupQuery, Paged, Pagination, FIRST_PAGE};
use crewboard_core::team::{LookupRecord, Page};

use crate::context::AppContext;
use crate::error::ConsoleError;
use crate::listing::ListFilter;
use crate::toast::ToastBus;

/// Fetches results for one query text.
pub type SearchFn<R> = Arc<dyn Fn(String) -> BoxFuture<'static, Result<R, ApiError>> + Send + Sync>;

/// Published search state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchState<R> {
    /// Incremented on every query; results are only applied for the latest.
    pub generation: u64,
    pub query: String,
    pub searching: bool,
    pub results: R,
}

pub struct SearchController<R> {
    debounce: Duration,
    fetch: SearchFn<R>,
    toasts: Arc<ToastBus>,
    state: Arc<watch::Sender<SearchState<R>>>,
    generation: u64,
    pending: Option<CancellationToken>,
}

impl<R> SearchController<R>
where
    R: Clone + Default + Send + Sync + 'static,
{
    pub fn new(debounce: Duration, toasts: Arc<ToastBus>, fetch: SearchFn<R>) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            debounce,
            fetch,
            toasts,
            state: Arc::new(state),
            generation: 0,
            pending: None,
        }
    }

    /// Handle a keystroke: restart the debounce window for `text`.
    pub fn query(&mut self, text: &str) {
        self.cancel();

        self.generation += 1;
        let generation = self.generation;
        let text = text.trim().to_string();
        self.state.send_modify(|s| {
            s.generation = generation;
            s.query = text.clone();
            s.searching = true;
        });

        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        let debounce = self.debounce;
        let fetch = Arc::clone(&self.fetch);
        let state = Arc::clone(&self.state);
        let toasts = Arc::clone(&self.toasts);

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(debounce) => {}
            }

            tracing::debug!(query = %text, generation, "Search dispatched");
            let outcome = tokio::select! {
                _ = token.cancelled() => return,
                outcome = fetch(text.clone()) => outcome,
            };

            let (results, failure) = match outcome {
                Ok(results) => (results, None),
                Err(e) => {
                    tracing::warn!(query = %text, error = %e, "Search failed");
                    (R::default(), Some(e))
                }
            };

            let applied = state.send_if_modified(|s| {
                if s.generation != generation {
                    return false;
                }
                s.results = results;
                s.searching = false;
                true
            });

            if applied {
                if let Some(e) = failure {
                    toasts.error(ConsoleError::from(e).user_message());
                }
            }
        });
    }

    /// Abort the pending debounce or request, if any. Results of the
    /// aborted query are never published.
    pub fn cancel(&mut self) {
        let Some(token) = self.pending.take() else {
            return;
        };
        token.cancel();
        self.generation += 1;
        let generation = self.generation;
        self.state.send_modify(|s| {
            s.generation = generation;
            s.searching = false;
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState<R>> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SearchState<R> {
        self.state.borrow().clone()
    }

    /// Wait until no query is pending and return the published state.
    pub async fn settled(&self) -> SearchState<R> {
        let mut rx = self.state.subscribe();
        let state = rx.wait_for(|s| !s.searching).await.map(|s| (*s).clone());
        state.unwrap_or_else(|_| self.current())
    }
}

impl SearchController<Vec<LookupRecord>> {
    /// Autocomplete over `GET /genericQuery` for one object type.
    pub fn lookup(ctx: &AppContext, object_type: &str) -> Self {
        let backend = Arc::clone(&ctx.backend);
        let object_type = object_type.to_string();
        let fetch: SearchFn<Vec<LookupRecord>> = Arc::new(move |text: String| {
            let backend = Arc::clone(&backend);
            let query = LookupQuery::new(object_type.clone(), &text);
            async move { backend.generic_query(&query).await }.boxed()
        });
        Self::new(ctx.config.search_debounce, Arc::clone(&ctx.toasts), fetch)
    }
}

impl<I> SearchController<Page<I>>
where
    I: Clone + Send + Sync + 'static,
{
    /// Name box of a list panel: page 1 of `base` narrowed to the typed name.
    pub fn list_name<F>(ctx: &AppContext, base: F) -> Self
    where
        F: ListFilter<Item = I>,
    {
        let backend = Arc::clone(&ctx.backend);
        let loading = Arc::clone(&ctx.loading);
        let page_size = base.pagination().page_size;
        let fetch: SearchFn<Page<I>> = Arc::new(move |text: String| {
            let backend = Arc::clone(&backend);
            let loading = Arc::clone(&loading);
            let mut filter = base.clone();
            filter.set_name(normalize_search(&text));
            filter.set_pagination(Pagination::new(FIRST_PAGE, page_size));
            async move { loading.track(filter.fetch(backend.as_ref())).await }.boxed()
        });
        Self::new(ctx.config.search_debounce, Arc::clone(&ctx.toasts), fetch)
    }
}

impl<R> Drop for SearchController<R> {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(30);
    const WAIT: Duration = Duration::from_secs(2);

    /// Fetcher that records every dispatched query and echoes it back,
    /// sleeping `delay_for(text)` first.
    fn recording(
        calls: Arc<Mutex<Vec<String>>>,
        delay_for: fn(&str) -> Duration,
    ) -> SearchFn<Vec<String>> {
        Arc::new(move |text: String| {
            let calls = Arc::clone(&calls);
            async move {
                calls.lock().unwrap().push(text.clone());
                tokio::time::sleep(delay_for(&text)).await;
                Ok::<_, ApiError>(vec![format!("result for {text}")])
            }
            .boxed()
        })
    }

    async fn settled(
        rx: &mut watch::Receiver<SearchState<Vec<String>>>,
        query: &str,
    ) -> SearchState<Vec<String>> {
        tokio::time::timeout(WAIT, rx.wait_for(|s| !s.searching && s.query == query))
            .await
            .expect("search settled")
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn rapid_keystrokes_dispatch_only_last_query() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut search = SearchController::new(
            DEBOUNCE,
            Arc::new(ToastBus::default()),
            recording(Arc::clone(&calls), |_| Duration::ZERO),
        );
        let mut rx = search.subscribe();

        search.query("n");
        search.query("no");
        search.query("nor ");

        let state = settled(&mut rx, "nor").await;
        assert_eq!(state.results, vec!["result for nor".to_string()]);
        assert_eq!(*calls.lock().unwrap(), vec!["nor".to_string()]);
    }

    #[tokio::test]
    async fn in_flight_request_is_superseded() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut search = SearchController::new(
            DEBOUNCE,
            Arc::new(ToastBus::default()),
            recording(Arc::clone(&calls), |text| {
                if text == "slow" {
                    Duration::from_millis(300)
                } else {
                    Duration::ZERO
                }
            }),
        );
        let mut rx = search.subscribe();

        search.query("slow");
        // Let the debounce elapse so the slow request is in flight.
        tokio::time::timeout(WAIT, async {
            while calls.lock().unwrap().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        search.query("fast");
        let state = settled(&mut rx, "fast").await;
        assert_eq!(state.results, vec!["result for fast".to_string()]);

        // The cancelled request never overwrites the newer results.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(search.current().results, vec!["result for fast".to_string()]);
    }

    #[tokio::test]
    async fn failure_publishes_empty_results_and_toast() {
        let toasts = Arc::new(ToastBus::default());
        let mut toast_rx = toasts.subscribe();
        let fetch: SearchFn<Vec<String>> = Arc::new(|_text: String| {
            async { Err::<Vec<String>, _>(ApiError::Rejected("Search unavailable".into())) }.boxed()
        });
        let mut search = SearchController::new(DEBOUNCE, toasts, fetch);
        let mut rx = search.subscribe();

        search.query("crew");

        let state = settled(&mut rx, "crew").await;
        assert!(state.results.is_empty());
        let toast = tokio::time::timeout(WAIT, toast_rx.recv()).await.unwrap().unwrap();
        assert_eq!(toast.message, "Search unavailable");
    }

    #[tokio::test]
    async fn cancel_stops_pending_search() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut search = SearchController::new(
            DEBOUNCE,
            Arc::new(ToastBus::default()),
            recording(Arc::clone(&calls), |_| Duration::ZERO),
        );

        search.query("abc");
        search.cancel();
        tokio::time::sleep(DEBOUNCE * 4).await;

        assert!(calls.lock().unwrap().is_empty());
        assert!(!search.current().searching);
    }
}

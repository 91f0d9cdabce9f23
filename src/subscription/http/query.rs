//! Cached HTTP queries as subscriptions.
//!
//! A [`Query`] is a subscription that keeps one cache entry in sync with the
//! server. When it starts:
//!
//! 1. Fresh cached data is emitted and the query waits for cache events.
//! 2. Stale cached data is emitted marked stale, then refetched.
//! 3. Without cached data, `Loading` is emitted and the data is fetched.
//!
//! While waiting, an invalidation whose prefix covers the query's key
//! triggers a refetch (the old data stays visible, marked stale). A removal
//! only clears what is shown: the query reports [`QueryState::Idle`] and
//! keeps waiting, so nothing is fetched until the next invalidation or the
//! next subscription. Fetches are single attempts: a failure becomes
//! [`QueryState::Error`] until the next invalidation.
//!
//! # Example
//!
//! ```rust,ignore
//! fn subscriptions(&self) -> Vec<Subscription<Message>> {
//!     vec![
//!         Subscription::new(Query::new(
//!             keys::list(&self.filter),
//!             move || Box::pin(fetch_books()),
//!             self.client.clone(),
//!         ))
//!         .map(Message::BooksLoaded),
//!     ]
//! }
//! ```

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::subscription::{SubscriptionId, SubscriptionSource};

use super::cache::CacheEntry;
use super::client::{CacheEvent, QueryClient};
use super::key::QueryKey;

/// Error type for query and mutation fetchers.
///
/// Fetchers built on [`crate::api`] convert with `QueryError::from`, which
/// keeps the HTTP status when there is one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The request could not be made or its payload could not be read.
    #[error("Fetch failed: {0}")]
    FetchError(String),

    /// The server could not be reached.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// What went wrong, including the URL.
        message: String,
    },
}

impl QueryError {
    /// The HTTP status behind the error, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The state of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    /// Nothing to show: the query is disabled with nothing cached, or its
    /// entry was removed.
    Idle,
    /// Fetching with nothing to show yet.
    Loading,
    /// Data is available.
    Success {
        /// The fetched or cached value.
        data: T,
        /// The data is outdated; a refetch may be in flight.
        is_stale: bool,
    },
    /// The last fetch failed. Holds the error message.
    Error(String),
}

// Written by hand: a derive would require `T: Default`.
impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

/// A query result as delivered to the application.
///
/// # Example
///
/// ```rust,ignore
/// Message::Books { result, .. } => {
///     if let Some(books) = result.data() {
///         self.rows = books.len();
///     }
///     self.books = result;
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    /// The current state of the query.
    pub state: QueryState<T>,
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self::from_state(QueryState::Idle)
    }
}

impl<T> QueryResult<T> {
    /// The data, stale or not, if the query has any.
    pub const fn data(&self) -> Option<&T> {
        match &self.state {
            QueryState::Success { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Returns `true` if the query has nothing to show.
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, QueryState::Idle)
    }

    /// Returns `true` while the first fetch is in flight.
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, QueryState::Loading)
    }

    /// Returns `true` if data is available, including stale data.
    pub const fn is_success(&self) -> bool {
        matches!(self.state, QueryState::Success { .. })
    }

    /// Returns `true` if the last fetch failed.
    pub const fn is_error(&self) -> bool {
        matches!(self.state, QueryState::Error(_))
    }

    /// Returns `true` if the data is outdated and may be refetching.
    pub const fn is_stale(&self) -> bool {
        matches!(self.state, QueryState::Success { is_stale: true, .. })
    }

    const fn from_state(state: QueryState<T>) -> Self {
        Self { state }
    }
}

type Fetcher<V> = Arc<dyn Fn() -> BoxFuture<'static, Result<V, QueryError>> + Send + Sync>;

/// A subscription that fetches, caches and refreshes one query key.
///
/// Two queries with the same key, enabled flag and value type are the same
/// subscription, so rebuilding one in `subscriptions()` keeps it running.
/// Changing the key starts a new one.
pub struct Query<V> {
    key: QueryKey,
    fetcher: Fetcher<V>,
    client: Arc<QueryClient>,
    stale_time: Option<Duration>,
    enabled: bool,
}

impl<V> Query<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// An enabled query using the client's default staleness window.
    ///
    /// `fetcher` is called for every fetch. Its result is written to the
    /// cache under `key` on success.
    pub fn new<F>(key: impl Into<QueryKey>, fetcher: F, client: Arc<QueryClient>) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<V, QueryError>> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            fetcher: Arc::new(fetcher),
            client,
            stale_time: None,
            enabled: true,
        }
    }

    /// Override how long fetched data counts as fresh.
    #[must_use]
    pub const fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }

    /// A disabled query never fetches. It reports cached data if there is
    /// some, otherwise [`QueryState::Idle`].
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The cache key this query reads and writes.
    pub const fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Returns `true` if the query may fetch.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn effective_stale_time(&self) -> Duration {
        self.stale_time
            .unwrap_or(self.client.config().stale_time)
    }
}

/// Internal state machine for the query stream.
enum State {
    Initial,
    Fetching,
    Watching(broadcast::Receiver<CacheEvent>),
    Done,
}

impl<V> SubscriptionSource for Query<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Output = QueryResult<V>;

    fn stream(&self) -> BoxStream<'static, Self::Output> {
        let key = self.key.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let client = Arc::clone(&self.client);
        let stale_time = self.effective_stale_time();
        let enabled = self.enabled;

        stream::unfold(State::Initial, move |state| {
            let key = key.clone();
            let fetcher = Arc::clone(&fetcher);
            let client = Arc::clone(&client);

            async move {
                match state {
                    State::Done => None,

                    State::Initial => {
                        if !enabled {
                            let cached = client.get_cache::<V>(&key);
                            let state = cached.map_or(QueryState::Idle, |entry| {
                                QueryState::Success {
                                    is_stale: entry.is_stale_after(stale_time),
                                    data: entry.data,
                                }
                            });
                            return Some((QueryResult::from_state(state), State::Done));
                        }

                        // Subscribe before reading so an invalidation landing
                        // in between is still seen.
                        let rx = client.subscribe_events();

                        match client.get_cache::<V>(&key) {
                            Some(entry) if !entry.is_stale_after(stale_time) => {
                                let result = QueryResult::from_state(QueryState::Success {
                                    data: entry.data,
                                    is_stale: false,
                                });
                                Some((result, State::Watching(rx)))
                            }
                            Some(entry) => {
                                let result = QueryResult::from_state(QueryState::Success {
                                    data: entry.data,
                                    is_stale: true,
                                });
                                Some((result, State::Fetching))
                            }
                            None => Some((QueryResult::from_state(QueryState::Loading), State::Fetching)),
                        }
                    }

                    State::Fetching => {
                        // Subscribe first so an invalidation racing the fetch
                        // still triggers a refetch afterwards.
                        let rx = client.subscribe_events();

                        let state = match fetcher().await {
                            Ok(data) => {
                                client.set_cache(key, CacheEntry::new(data.clone()));
                                QueryState::Success {
                                    data,
                                    is_stale: false,
                                }
                            }
                            Err(e) => QueryState::Error(e.to_string()),
                        };

                        Some((QueryResult::from_state(state), State::Watching(rx)))
                    }

                    State::Watching(mut rx) => loop {
                        let event = match rx.recv().await {
                            Ok(event) if event.affects(&key) => event,
                            Ok(_) => continue,
                            // Missed events may have covered our key.
                            Err(RecvError::Lagged(_)) => CacheEvent::Invalidated(key.clone()),
                            Err(RecvError::Closed) => return None,
                        };

                        return match event {
                            CacheEvent::Invalidated(_) => {
                                let state = client
                                    .get_cache::<V>(&key)
                                    .map_or(QueryState::Loading, |entry| QueryState::Success {
                                        data: entry.data,
                                        is_stale: true,
                                    });
                                Some((QueryResult::from_state(state), State::Fetching))
                            }
                            // The entry is gone; the next read fetches it.
                            CacheEvent::Removed(_) => {
                                Some((QueryResult::from_state(QueryState::Idle), State::Watching(rx)))
                            }
                        };
                    },
                }
            }
        })
        .boxed()
    }

    fn id(&self) -> SubscriptionId {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        SubscriptionId::of::<Self>(hasher.finish())
    }
}

impl<V> Hash for Query<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.enabled.hash(state);
    }
}

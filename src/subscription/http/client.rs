//! The shared query cache.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::StreamExt;
use futures::stream;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::Command;

use super::cache::{CacheEntry, ErasedEntry};
use super::config::QueryConfig;
use super::key::QueryKey;
use super::query::QueryError;

const EVENT_CAPACITY: usize = 100;

/// A change applied to every cache entry under `prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// Entries were marked stale and should be refetched on next use.
    Invalidated(QueryKey),
    /// Entries were dropped from the cache.
    Removed(QueryKey),
}

impl CacheEvent {
    #[must_use]
    pub const fn prefix(&self) -> &QueryKey {
        match self {
            Self::Invalidated(prefix) | Self::Removed(prefix) => prefix,
        }
    }

    /// Whether the event reaches the entry stored at `key`.
    #[must_use]
    pub fn affects(&self, key: &QueryKey) -> bool {
        key.starts_with(self.prefix())
    }
}

/// Cache of query results, shared by queries, mutations and the application.
///
/// Cloning is cheap and every clone sees the same entries. The client is
/// passed around explicitly (usually as `Arc<QueryClient>`); there is no
/// process-wide instance.
///
/// ```
/// use bookcase::subscription::http::{QueryClient, QueryConfig, QueryKey};
/// use std::time::Duration;
///
/// let client = QueryClient::with_config(QueryConfig::new(Duration::from_secs(300)));
/// client.set_query_data(QueryKey::from("books").with("list"), vec!["Dune".to_string()]);
///
/// assert_eq!(client.invalidate_queries(&QueryKey::from("books")), 1);
/// ```
#[derive(Debug, Clone)]
pub struct QueryClient {
    cache: Arc<DashMap<QueryKey, ErasedEntry>>,
    events: broadcast::Sender<CacheEvent>,
    config: QueryConfig,
}

impl QueryClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(QueryConfig::default())
    }

    #[must_use]
    pub fn with_config(config: QueryConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            cache: Arc::new(DashMap::new()),
            events,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// The cached value at `key`, fresh or stale.
    pub fn get_query_data<T: Clone + Send + Sync + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.get_cache::<T>(key).map(|entry| entry.data)
    }

    /// Store `data` at `key` as freshly fetched.
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: impl Into<QueryKey>, data: T) {
        self.set_cache(key.into(), CacheEntry::new(data));
    }

    #[must_use]
    pub fn contains(&self, key: &QueryKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Whether the entry at `key` exists and has been invalidated.
    #[must_use]
    pub fn is_invalidated(&self, key: &QueryKey) -> bool {
        self.cache.get(key).is_some_and(|entry| entry.is_stale)
    }

    /// Whether a query at `key` would need to fetch. Missing entries are stale.
    #[must_use]
    pub fn is_stale(&self, key: &QueryKey, stale_time: Duration) -> bool {
        self.cache
            .get(key)
            .is_none_or(|entry| entry.is_stale_after(stale_time))
    }

    /// All cached keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<QueryKey> = self.cache.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Mark every entry under `prefix` stale and notify running queries.
    ///
    /// Subscribed queries under the prefix refetch right away; the others
    /// refetch the next time they are read. Returns the number of entries
    /// marked.
    pub fn invalidate_queries(&self, prefix: &QueryKey) -> usize {
        let mut marked = 0;
        for mut entry in self.cache.iter_mut() {
            if entry.key().starts_with(prefix) {
                entry.value_mut().mark_stale();
                marked += 1;
            }
        }

        debug!(key = %prefix, entries = marked, "invalidated queries");
        // No receivers just means no query is subscribed right now.
        let _ = self.events.send(CacheEvent::Invalidated(prefix.clone()));
        marked
    }

    /// Drop every entry under `prefix` and notify running queries.
    ///
    /// Unlike invalidation, nothing stale is left behind: the next read goes
    /// to the network. Returns the number of entries removed.
    pub fn remove_queries(&self, prefix: &QueryKey) -> usize {
        let mut removed = 0;
        self.cache.retain(|key, _| {
            let keep = !key.starts_with(prefix);
            if !keep {
                removed += 1;
            }
            keep
        });

        debug!(key = %prefix, entries = removed, "removed queries");
        let _ = self.events.send(CacheEvent::Removed(prefix.clone()));
        removed
    }

    /// [`invalidate_queries`](Self::invalidate_queries) as a command that
    /// produces no message.
    ///
    /// ```rust,ignore
    /// Message::Refresh => self.client.invalidate(&keys::all()),
    /// ```
    pub fn invalidate<Msg: Send + 'static>(&self, prefix: &QueryKey) -> Command<Msg> {
        let client = self.clone();
        let prefix = prefix.clone();
        silent(async move {
            client.invalidate_queries(&prefix);
        })
    }

    /// [`remove_queries`](Self::remove_queries) as a command that produces
    /// no message.
    pub fn remove<Msg: Send + 'static>(&self, prefix: &QueryKey) -> Command<Msg> {
        let client = self.clone();
        let prefix = prefix.clone();
        silent(async move {
            client.remove_queries(&prefix);
        })
    }

    /// Return the cached value while it is fresh, otherwise fetch it once and
    /// cache the result. Errors are returned as they come; nothing is retried.
    pub async fn fetch_query<T, F, Fut>(
        &self,
        key: impl Into<QueryKey>,
        stale_time: Duration,
        fetcher: F,
    ) -> Result<T, QueryError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, QueryError>>,
    {
        let key = key.into();
        if let Some(entry) = self.get_cache::<T>(&key) {
            if !entry.is_stale_after(stale_time) {
                trace!(key = %key, "serving fresh cache entry");
                return Ok(entry.data);
            }
        }

        debug!(key = %key, "fetching query");
        let data = fetcher().await?;
        self.set_cache(key, CacheEntry::new(data.clone()));
        Ok(data)
    }

    /// Fill `key` in the background ahead of use.
    ///
    /// The returned command produces no message. A fresh entry is left alone,
    /// and failures are only logged; a later query will surface them.
    pub fn prefetch_query<T, F, Fut, Msg>(
        &self,
        key: impl Into<QueryKey>,
        stale_time: Duration,
        fetcher: F,
    ) -> Command<Msg>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
        Msg: Send + 'static,
    {
        let client = self.clone();
        let key = key.into();
        silent(async move {
            if let Err(error) = client.fetch_query(key.clone(), stale_time, fetcher).await {
                debug!(key = %key, %error, "prefetch failed");
            }
        })
    }

    pub(crate) fn subscribe_events(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    pub(crate) fn get_cache<T: Clone + Send + Sync + 'static>(
        &self,
        key: &QueryKey,
    ) -> Option<CacheEntry<T>> {
        self.cache.get(key).and_then(|entry| entry.downcast::<T>())
    }

    pub(crate) fn set_cache<T: Send + Sync + 'static>(&self, key: QueryKey, entry: CacheEntry<T>) {
        self.cache.insert(key, entry.erase());
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A command that runs `effect` and yields no message.
fn silent<Msg: Send + 'static>(effect: impl Future<Output = ()> + Send + 'static) -> Command<Msg> {
    Command {
        stream: Some(
            stream::once(effect)
                .filter_map(|()| async { None })
                .boxed(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn books() -> QueryKey {
        QueryKey::from("books")
    }

    async fn drain<Msg: Send + 'static>(cmd: Command<Msg>) -> usize {
        match cmd.stream {
            Some(stream) => stream.count().await,
            None => 0,
        }
    }

    #[test]
    fn test_new_client_is_empty() {
        let client = QueryClient::new();
        assert!(client.is_empty());
        assert_eq!(client.config().stale_time, Duration::ZERO);
    }

    #[test]
    fn test_typed_access() {
        let client = QueryClient::new();
        let key = books().with("list");

        assert!(client.get_query_data::<Vec<u32>>(&key).is_none());
        client.set_query_data(key.clone(), vec![1_u32, 2]);

        assert_eq!(client.get_query_data::<Vec<u32>>(&key), Some(vec![1, 2]));
        assert!(client.get_query_data::<String>(&key).is_none());
        assert!(client.contains(&key));
    }

    #[test]
    fn test_invalidate_marks_prefix_only() {
        let client = QueryClient::new();
        let list = books().with("list").with("all");
        let detail = books().with("detail").with(1_u64);
        client.set_query_data(list.clone(), 1_u8);
        client.set_query_data(detail.clone(), 2_u8);

        assert_eq!(client.invalidate_queries(&books().with("list")), 1);
        assert!(client.is_invalidated(&list));
        assert!(!client.is_invalidated(&detail));
        assert!(client.contains(&list), "invalidation keeps the data");
    }

    #[test]
    fn test_remove_evicts_prefix_only() {
        let client = QueryClient::new();
        let detail_1 = books().with("detail").with(1_u64);
        let detail_2 = books().with("detail").with(2_u64);
        client.set_query_data(detail_1.clone(), 1_u8);
        client.set_query_data(detail_2.clone(), 2_u8);

        assert_eq!(client.remove_queries(&detail_1), 1);
        assert!(!client.contains(&detail_1));
        assert!(client.contains(&detail_2));
        assert_eq!(client.keys(), vec![detail_2]);
    }

    #[test]
    fn test_missing_entries_count_as_stale() {
        let client = QueryClient::new();
        let key = books().with("list");
        assert!(client.is_stale(&key, Duration::from_secs(60)));

        client.set_query_data(key.clone(), 1_u8);
        assert!(!client.is_stale(&key, Duration::from_secs(60)));
        assert!(client.is_stale(&key, Duration::ZERO));
    }

    #[tokio::test]
    async fn test_invalidate_command_is_silent_and_broadcasts() {
        let client = QueryClient::new();
        let mut rx = client.subscribe_events();

        let cmd: Command<()> = client.invalidate(&books());
        assert_eq!(drain(cmd).await, 0, "invalidate should not produce messages");

        let event = tokio::time::timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("event within timeout")
            .expect("channel open");
        assert_eq!(event, CacheEvent::Invalidated(books()));
    }

    #[tokio::test]
    async fn test_remove_command_broadcasts() {
        let client = QueryClient::new();
        let key = books().with("detail").with(7_u64);
        client.set_query_data(key.clone(), 7_u8);
        let mut rx = client.subscribe_events();

        drain::<()>(client.remove(&key)).await;

        assert!(!client.contains(&key));
        assert_eq!(rx.recv().await.expect("event"), CacheEvent::Removed(key));
    }

    #[test]
    fn test_event_affects_by_prefix() {
        let event = CacheEvent::Invalidated(books().with("list"));
        assert!(event.affects(&books().with("list").with("x")));
        assert!(!event.affects(&books().with("detail").with(1_u64)));
        assert!(!event.affects(&books()));
    }

    #[tokio::test]
    async fn test_fetch_query_uses_fresh_cache() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = books().with("detail").with(3_u64);

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value = client
                .fetch_query(&key, Duration::from_secs(60), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, QueryError>("Dune".to_string())
                })
                .await
                .expect("fetch should succeed");
            assert_eq!(value, "Dune");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_query_refetches_after_invalidation() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = books().with("detail").with(3_u64);

        let fetch = |client: QueryClient, calls: Arc<AtomicUsize>, key: QueryKey| async move {
            client
                .fetch_query(key, Duration::from_secs(60), || async move {
                    Ok::<_, QueryError>(calls.fetch_add(1, Ordering::SeqCst))
                })
                .await
        };

        assert_eq!(fetch(client.clone(), calls.clone(), key.clone()).await, Ok(0));
        client.invalidate_queries(&books());
        assert_eq!(fetch(client.clone(), calls.clone(), key.clone()).await, Ok(1));
        assert!(!client.is_invalidated(&key));
    }

    #[tokio::test]
    async fn test_fetch_query_error_is_not_cached() {
        let client = QueryClient::new();
        let key = books().with("detail").with(9_u64);

        let result = client
            .fetch_query(&key, Duration::from_secs(60), || async {
                Err::<u8, _>(QueryError::NetworkError("offline".into()))
            })
            .await;

        assert!(result.is_err());
        assert!(!client.contains(&key));
    }

    #[tokio::test]
    async fn test_prefetch_fills_cache_without_messages() {
        let client = QueryClient::new();
        let key = books().with("detail").with(4_u64);

        let cmd: Command<()> = client.prefetch_query(&key, Duration::from_secs(60), || async {
            Ok::<_, QueryError>(4_u64)
        });
        assert_eq!(drain(cmd).await, 0);
        assert_eq!(client.get_query_data::<u64>(&key), Some(4));
    }

    #[tokio::test]
    async fn test_prefetch_failure_is_swallowed() {
        let client = QueryClient::new();
        let key = books().with("detail").with(5_u64);

        let cmd: Command<()> = client.prefetch_query(&key, Duration::from_secs(60), || async {
            Err::<u64, _>(QueryError::FetchError("boom".into()))
        });
        assert_eq!(drain(cmd).await, 0);
        assert!(!client.contains(&key));
    }
}

//! Queries and mutations for book data.
//!
//! [`BookQueries`] ties the `/books` API to a [`QueryClient`]. Queries are
//! keyed with [`keys`], and every mutation keeps the cache honest
//! afterwards:
//!
//! | mutation | on success |
//! |---|---|
//! | create | invalidate `lists()` |
//! | update `id` | invalidate `detail(id)` and `lists()` |
//! | delete `id` | remove `detail(id)`, invalidate `lists()` |

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};
use url::form_urlencoded;

use crate::api::{Book, BookApi, BookId, BookInfo, BookPatch};
use crate::command::Command;
use crate::subscription::http::{Mutation, Query, QueryClient, QueryError};

use super::keys;

/// How long book data counts as fresh.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Input of the update mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct BookUpdate {
    pub id: BookId,
    pub patch: BookPatch,
}

/// Book queries and mutations over one API and one cache.
#[derive(Debug, Clone)]
pub struct BookQueries {
    api: BookApi,
    client: Arc<QueryClient>,
    stale_time: Duration,
}

impl BookQueries {
    #[must_use]
    pub const fn new(api: BookApi, client: Arc<QueryClient>) -> Self {
        Self {
            api,
            client,
            stale_time: DEFAULT_STALE_TIME,
        }
    }

    #[must_use]
    pub const fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    #[must_use]
    pub const fn api(&self) -> &BookApi {
        &self.api
    }

    #[must_use]
    pub const fn client(&self) -> &Arc<QueryClient> {
        &self.client
    }

    #[must_use]
    pub const fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// The book list, filtered by title when `filter` is non-empty.
    #[must_use]
    pub fn books(&self, filter: &str) -> Query<Vec<Book>> {
        let api = self.api.clone();
        let query = title_query(filter);

        Query::new(
            keys::list(filter),
            move || {
                let api = api.clone();
                let query = query.clone();
                Box::pin(async move { api.list(query.as_deref()).await.map_err(QueryError::from) })
            },
            Arc::clone(&self.client),
        )
        .stale_time(self.stale_time)
    }

    /// One book. Disabled until there is an id.
    #[must_use]
    pub fn book(&self, id: Option<BookId>) -> Query<Book> {
        let api = self.api.clone();

        Query::new(
            keys::detail(id),
            move || {
                let api = api.clone();
                Box::pin(async move {
                    match id {
                        Some(id) => api.get(id).await.map_err(QueryError::from),
                        None => Err(QueryError::FetchError("no book selected".into())),
                    }
                })
            },
            Arc::clone(&self.client),
        )
        .stale_time(self.stale_time)
        .enabled(id.is_some())
    }

    #[must_use]
    pub fn create_book(&self) -> Mutation<BookInfo, Book> {
        let api = self.api.clone();
        let client = Arc::clone(&self.client);

        Mutation::new(move |info: BookInfo| {
            let api = api.clone();
            Box::pin(async move { api.create(&info).await.map_err(QueryError::from) })
        })
        .on_success(move |book, _| {
            debug!(id = book.id, "book created");
            client.invalidate_queries(&keys::lists());
        })
        .on_error(|e, info| error!(title = %info.title, error = %e, "failed to create book"))
    }

    #[must_use]
    pub fn update_book(&self) -> Mutation<BookUpdate, Book> {
        let api = self.api.clone();
        let client = Arc::clone(&self.client);

        Mutation::new(move |update: BookUpdate| {
            let api = api.clone();
            Box::pin(async move {
                api.update(update.id, &update.patch)
                    .await
                    .map_err(QueryError::from)
            })
        })
        .on_success(move |_, update| {
            debug!(id = update.id, "book updated");
            client.invalidate_queries(&keys::detail(update.id));
            client.invalidate_queries(&keys::lists());
        })
        .on_error(|e, update| error!(id = update.id, error = %e, "failed to update book"))
    }

    #[must_use]
    pub fn delete_book(&self) -> Mutation<BookId, ()> {
        let api = self.api.clone();
        let client = Arc::clone(&self.client);

        Mutation::new(move |id: BookId| {
            let api = api.clone();
            Box::pin(async move { api.delete(id).await.map_err(QueryError::from) })
        })
        .on_success(move |_, id| {
            debug!(id, "book deleted");
            client.remove_queries(&keys::detail(*id));
            client.invalidate_queries(&keys::lists());
        })
        .on_error(|e, id| error!(id, error = %e, "failed to delete book"))
    }

    /// Load `id` into the cache in the background. Produces no message.
    pub fn prefetch_book<Msg: Send + 'static>(&self, id: BookId) -> Command<Msg> {
        let api = self.api.clone();
        self.client
            .prefetch_query(keys::detail(id), self.stale_time, move || async move {
                api.get(id).await.map_err(QueryError::from)
            })
    }

    /// The book list, from the cache while it is fresh.
    pub async fn fetch_books(&self, filter: &str) -> Result<Vec<Book>, QueryError> {
        let query = title_query(filter);
        self.client
            .fetch_query(keys::list(filter), self.stale_time, || async {
                self.api.list(query.as_deref()).await.map_err(QueryError::from)
            })
            .await
    }

    /// One book, from the cache while it is fresh.
    pub async fn fetch_book(&self, id: BookId) -> Result<Book, QueryError> {
        self.client
            .fetch_query(keys::detail(id), self.stale_time, || async {
                self.api.get(id).await.map_err(QueryError::from)
            })
            .await
    }
}

/// `title_like=<filter>`, or nothing for the empty filter.
fn title_query(filter: &str) -> Option<String> {
    if filter.is_empty() {
        return None;
    }
    Some(
        form_urlencoded::Serializer::new(String::new())
            .append_pair("title_like", filter)
            .finish(),
    )
}

//! Cached HTTP queries and mutations.
//!
//! Queries are subscriptions that keep a cache entry in sync with the server;
//! mutations are commands that write to the server and then adjust the
//! cache. Both share a [`QueryClient`], which the application owns and passes
//! around as `Arc<QueryClient>`.
//!
//! Cache entries are addressed by hierarchical [`QueryKey`]s, and every cache
//! operation works on a key prefix: invalidating `["books"]` reaches
//! `["books", "list", ...]` and `["books", "detail", ...]` alike.
//!
//! # Example
//!
//! ```rust,ignore
//! use bookcase::prelude::*;
//! use bookcase::subscription::http::{Query, QueryClient, QueryResult};
//!
//! struct App {
//!     client: Arc<QueryClient>,
//!     books: QueryResult<Vec<Book>>,
//! }
//!
//! impl Application for App {
//!     fn subscriptions(&self) -> Vec<Subscription<Message>> {
//!         vec![
//!             Subscription::new(Query::new(
//!                 keys::lists(),
//!                 || Box::pin(fetch_books()),
//!                 self.client.clone(),
//!             ))
//!             .map(Message::Books),
//!         ]
//!     }
//!
//!     fn update(&mut self, msg: Message) -> Command<Message> {
//!         match msg {
//!             Message::Books(result) => {
//!                 self.books = result;
//!                 Command::none()
//!             }
//!             Message::Refresh => self.client.invalidate(&keys::all()),
//!         }
//!     }
//! }
//! ```

mod cache;
mod client;
mod config;
pub mod key;
pub mod mutation;
pub mod query;

pub use cache::CacheEntry;
pub use client::{CacheEvent, QueryClient};
pub use config::QueryConfig;
pub use key::{KeySegment, QueryKey};
pub use mutation::{Mutation, MutationResult, MutationState};
pub use query::{Query, QueryError, QueryResult, QueryState};

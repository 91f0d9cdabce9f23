//! The book catalog: cache keys, queries and mutations for `/books`, and the
//! terminal screen built on them.

pub mod app;
pub mod hooks;
pub mod keys;

pub use app::{CatalogApp, CatalogFlags, Message};
pub use hooks::{BookQueries, BookUpdate, DEFAULT_STALE_TIME};

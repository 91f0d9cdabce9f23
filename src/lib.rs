//! # Bookcase - a terminal book catalog
//!
//! Bookcase lists, filters, creates, updates and deletes book records held by
//! a REST-style HTTP service. The terminal front-end is built on a small Elm
//! Architecture (TEA) runtime on top of [ratatui](https://ratatui.rs/), and
//! server state lives in a query cache with hierarchical keys.
//!
//! ## Layers
//!
//! 1. [`api`]: the HTTP adapter and the `/books` resource bindings
//! 2. [`subscription::http`]: the query cache, queries and mutations
//! 3. [`catalog`]: book query keys, the book hooks and the catalog screen
//! 4. [`runtime`]: the event loop driving an [`Application`](application::Application)
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bookcase::api::{BookApi, HttpClient};
//! use bookcase::catalog::{BookQueries, CatalogApp, CatalogFlags};
//! use bookcase::runtime::Runtime;
//! use bookcase::subscription::http::QueryClient;
//!
//! # async fn run() -> color_eyre::Result<()> {
//! let api = BookApi::new(HttpClient::new("http://localhost:3004")?);
//! let queries = BookQueries::new(api, Arc::new(QueryClient::new()));
//!
//! let mut terminal = ratatui::init();
//! let result = Runtime::<CatalogApp>::new(CatalogFlags::new(queries))
//!     .run(&mut terminal, 30)
//!     .await;
//! ratatui::restore();
//! result
//! # }
//! ```

pub mod api;
pub mod application;
pub mod catalog;
pub mod command;
pub mod config;
pub mod prelude;
pub mod runtime;
pub mod subscription;
pub mod telemetry;

pub use command::Command;

//! Prelude module for convenient imports.
//!
//! ```
//! use bookcase::prelude::*;
//! ```
//!
//! # What's included
//!
//! - [`Application`] - The main application trait
//! - [`Command`] and [`Action`] - Side effects and what they ask of the runtime
//! - [`Subscription`] - Long-lived event sources
//! - [`Runtime`] - The event loop
//! - [`QueryClient`], [`Query`], [`Mutation`] - The query cache

pub use crate::application::Application;
pub use crate::command::{Action, Command};
pub use crate::runtime::Runtime;
pub use crate::subscription::Subscription;
pub use crate::subscription::http::{
    Mutation, Query, QueryClient, QueryError, QueryKey, QueryResult, QueryState,
};

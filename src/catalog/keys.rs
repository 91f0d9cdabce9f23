//! Cache keys for book data.
//!
//! ```text
//! ["books"]                                  all()
//! ["books", "list"]                          lists()
//! ["books", "list", {"filters": "dune"}]     list("dune")
//! ["books", "detail"]                        details()
//! ["books", "detail", 7]                     detail(7)
//! ```
//!
//! Invalidating a key reaches everything below it, so `all()` refreshes
//! every list and detail while `lists()` and `details()` stay independent.

use crate::api::BookId;
use crate::subscription::http::{KeySegment, QueryKey};

#[must_use]
pub fn all() -> QueryKey {
    QueryKey::from("books")
}

#[must_use]
pub fn lists() -> QueryKey {
    all().with("list")
}

/// The list filtered by title. The empty filter is the unfiltered list.
#[must_use]
pub fn list(filter: &str) -> QueryKey {
    lists().with(KeySegment::object([("filters", filter)]))
}

#[must_use]
pub fn details() -> QueryKey {
    all().with("detail")
}

/// One book. `None` addresses the placeholder entry of a disabled query.
#[must_use]
pub fn detail(id: impl Into<Option<BookId>>) -> QueryKey {
    details().with(id.into())
}

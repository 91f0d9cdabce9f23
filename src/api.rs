//! REST bindings for the book service.
//!
//! [`HttpClient`] talks to the service at a fixed base URL and unwraps
//! payloads; [`BookApi`] maps the five `/books` operations onto it.

pub mod books;
pub mod error;
pub mod http;
pub mod model;

pub use books::{BookApi, book_route, books_route};
pub use error::{ApiError, ApiResult};
pub use http::{DEFAULT_BASE_URL, HttpClient};
pub use model::{Book, BookId, BookInfo, BookPatch};

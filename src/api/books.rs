//! The `/books` resource.

use serde::de::IgnoredAny;

use super::error::ApiResult;
use super::http::HttpClient;
use super::model::{Book, BookId, BookInfo, BookPatch};

/// `/books`, with `query` appended when it is non-empty.
#[must_use]
pub fn books_route(query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("/books?{query}"),
        _ => "/books".to_string(),
    }
}

#[must_use]
pub fn book_route(id: BookId) -> String {
    format!("/books/{id}")
}

/// CRUD bindings for book records. Payloads pass through unchanged.
#[derive(Debug, Clone)]
pub struct BookApi {
    http: HttpClient,
}

impl BookApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    #[must_use]
    pub const fn http(&self) -> &HttpClient {
        &self.http
    }

    /// `GET /books[?query]`. An empty or `null` payload is an empty list.
    pub async fn list(&self, query: Option<&str>) -> ApiResult<Vec<Book>> {
        let books: Option<Vec<Book>> = self.http.get(&books_route(query)).await?;
        Ok(books.unwrap_or_default())
    }

    pub async fn get(&self, id: BookId) -> ApiResult<Book> {
        self.http.get(&book_route(id)).await
    }

    pub async fn create(&self, book: &BookInfo) -> ApiResult<Book> {
        self.http.post(&books_route(None), book).await
    }

    pub async fn update(&self, id: BookId, patch: &BookPatch) -> ApiResult<Book> {
        self.http.put(&book_route(id), patch).await
    }

    /// `DELETE /books/{id}`. Whatever the server answers with is discarded.
    pub async fn delete(&self, id: BookId) -> ApiResult<()> {
        let _: IgnoredAny = self.http.delete(&book_route(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        assert_eq!(books_route(None), "/books");
        assert_eq!(books_route(Some("")), "/books");
        assert_eq!(books_route(Some("title_like=dune")), "/books?title_like=dune");
        assert_eq!(book_route(42), "/books/42");
    }
}

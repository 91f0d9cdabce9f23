//! How book mutations and refreshes reshape the query cache.

use std::sync::Arc;

use bookcase::api::{BookApi, BookInfo, BookPatch, HttpClient};
use bookcase::catalog::{BookQueries, BookUpdate, keys};
use bookcase::subscription::SubscriptionSource;
use bookcase::subscription::http::{QueryClient, QueryError, QueryResult, QueryState};
use futures::StreamExt;
use futures::stream::BoxStream;
use serde_json::{Value, json};
use tokio::time::{Duration, timeout};
use tracing_test::traced_test;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn record(id: u64, title: &str) -> Value {
    json!({
        "id": id, "title": title, "author": "Frank Herbert", "authorId": 3,
        "categoryId": 1, "price": 9.99, "originalPrice": 14.99, "isbn": "978",
        "publisher": "Ace", "publishDate": "1965-08-01", "pages": 412,
        "language": "en", "description": "Arrakis.", "coverImage": "",
        "stock": 4, "rating": 4.6, "reviews": 1200, "isRecommended": false
    })
}

fn info(title: &str) -> BookInfo {
    let mut value = record(0, title);
    value.as_object_mut().expect("object").remove("id");
    serde_json::from_value(value).expect("valid info")
}

async fn mount(server: &MockServer, verb: &str, route: &str, status: u16, body: Value) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

fn queries(server: &MockServer) -> BookQueries {
    let http = HttpClient::new(&server.uri()).expect("valid url");
    BookQueries::new(BookApi::new(http), Arc::new(QueryClient::new()))
}

/// Cache the unfiltered list and books 7 and 9 through the API.
async fn warm(server: &MockServer, queries: &BookQueries) {
    mount(server, "GET", "/books", 200, json!([record(7, "Dune"), record(9, "Emma")])).await;
    mount(server, "GET", "/books/7", 200, record(7, "Dune")).await;
    mount(server, "GET", "/books/9", 200, record(9, "Emma")).await;

    queries.fetch_books("").await.expect("list");
    queries.fetch_book(7).await.expect("book 7");
    queries.fetch_book(9).await.expect("book 9");
}

async fn gets(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == "GET" && request.url.path() == route)
        .count()
}

async fn next<T>(stream: &mut BoxStream<'static, QueryResult<T>>) -> QueryState<T> {
    timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("query should emit")
        .expect("stream open")
        .state
}

#[tokio::test]
async fn test_fresh_data_is_served_from_cache() {
    let server = MockServer::start().await;
    let queries = queries(&server);
    warm(&server, &queries).await;

    queries.fetch_books("").await.expect("list");
    queries.fetch_book(7).await.expect("book 7");

    assert_eq!(gets(&server, "/books").await, 1);
    assert_eq!(gets(&server, "/books/7").await, 1);
}

#[tokio::test]
async fn test_create_invalidates_every_list() {
    let server = MockServer::start().await;
    let queries = queries(&server);
    warm(&server, &queries).await;
    queries.client().set_query_data(keys::list("dune"), Vec::<Value>::new());
    mount(&server, "POST", "/books", 201, record(21, "Dune Messiah")).await;

    let created = queries
        .create_book()
        .run(info("Dune Messiah"))
        .await
        .expect("create should succeed");
    assert_eq!(created.id, 21);

    let client = queries.client();
    assert!(client.is_invalidated(&keys::list("")));
    assert!(client.is_invalidated(&keys::list("dune")));
    assert!(!client.is_invalidated(&keys::detail(7)));
    assert!(!client.is_invalidated(&keys::detail(9)));
}

#[tokio::test]
async fn test_update_invalidates_its_detail_and_lists() {
    let server = MockServer::start().await;
    let queries = queries(&server);
    warm(&server, &queries).await;
    mount(&server, "PUT", "/books/7", 200, record(7, "Dune")).await;

    queries
        .update_book()
        .run(BookUpdate {
            id: 7,
            patch: BookPatch::stock(1),
        })
        .await
        .expect("update should succeed");

    let client = queries.client();
    assert!(client.is_invalidated(&keys::detail(7)));
    assert!(client.is_invalidated(&keys::list("")));
    assert!(!client.is_invalidated(&keys::detail(9)));
}

#[tokio::test]
async fn test_delete_evicts_detail_and_next_read_hits_network() {
    let server = MockServer::start().await;
    let queries = queries(&server);
    warm(&server, &queries).await;
    mount(&server, "DELETE", "/books/7", 200, json!({})).await;

    queries.delete_book().run(7).await.expect("delete should succeed");

    let client = queries.client();
    assert!(!client.contains(&keys::detail(7)));
    assert!(client.contains(&keys::detail(9)));
    assert!(client.is_invalidated(&keys::list("")));

    queries.fetch_book(7).await.expect("refetch");
    assert_eq!(gets(&server, "/books/7").await, 2);
}

#[tokio::test]
#[traced_test]
async fn test_failed_mutation_leaves_cache_alone() {
    let server = MockServer::start().await;
    let queries = queries(&server);
    warm(&server, &queries).await;
    mount(&server, "POST", "/books", 500, json!({})).await;

    let error = queries
        .create_book()
        .run(info("Dune Messiah"))
        .await
        .expect_err("500 should fail");

    assert_eq!(error.status(), Some(500));
    assert!(!queries.client().is_invalidated(&keys::list("")));
    assert!(logs_contain("server error"));
    assert!(logs_contain("failed to create book"));
}

#[tokio::test]
#[traced_test]
async fn test_missing_book_is_logged_and_rejected() {
    let server = MockServer::start().await;
    let queries = queries(&server);
    mount(&server, "GET", "/books/999", 404, json!({})).await;

    let error = queries.fetch_book(999).await.expect_err("404 should fail");

    assert!(matches!(error, QueryError::Status { status: 404, .. }));
    assert!(!queries.client().contains(&keys::detail(999)));
    assert!(logs_contain("resource not found"));
}

#[tokio::test]
async fn test_refresh_all_reaches_lists_and_details() {
    let server = MockServer::start().await;
    let queries = queries(&server);
    warm(&server, &queries).await;

    assert_eq!(queries.client().invalidate_queries(&keys::all()), 3);
    for key in [keys::list(""), keys::detail(7), keys::detail(9)] {
        assert!(queries.client().is_invalidated(&key));
    }
}

#[tokio::test]
async fn test_list_subscription_refetches_after_create() {
    let server = MockServer::start().await;
    let queries = queries(&server);
    mount(&server, "GET", "/books", 200, json!([record(7, "Dune")])).await;
    mount(&server, "POST", "/books", 201, record(21, "Dune Messiah")).await;

    let mut stream = queries.books("").stream();

    assert_eq!(next(&mut stream).await, QueryState::Loading);
    assert!(matches!(next(&mut stream).await, QueryState::Success { is_stale: false, .. }));

    queries
        .create_book()
        .run(info("Dune Messiah"))
        .await
        .expect("create should succeed");

    assert!(matches!(next(&mut stream).await, QueryState::Success { is_stale: true, .. }));
    assert!(matches!(next(&mut stream).await, QueryState::Success { is_stale: false, .. }));
    assert_eq!(gets(&server, "/books").await, 2);
}

#[tokio::test]
#[traced_test]
async fn test_deleting_the_viewed_book_does_not_refetch_it() {
    let server = MockServer::start().await;
    let queries = queries(&server);
    mount(&server, "GET", "/books/7", 200, record(7, "Dune")).await;
    mount(&server, "DELETE", "/books/7", 200, json!({})).await;

    let mut stream = queries.book(Some(7)).stream();
    assert_eq!(next(&mut stream).await, QueryState::Loading);
    assert!(matches!(next(&mut stream).await, QueryState::Success { is_stale: false, .. }));

    queries.delete_book().run(7).await.expect("delete should succeed");

    assert_eq!(next(&mut stream).await, QueryState::Idle);
    let quiet = timeout(Duration::from_millis(100), stream.next()).await;
    assert!(quiet.is_err(), "a removed book must not be fetched again");
    assert_eq!(gets(&server, "/books/7").await, 1);
    assert!(!logs_contain("resource not found"));
}

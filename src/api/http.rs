//! The HTTP adapter.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use super::error::{ApiError, ApiResult};

/// Where the book service listens unless configured otherwise.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3004";

/// A JSON client bound to one base URL.
///
/// Every verb returns the decoded payload directly. Failures are classified
/// into [`ApiError`] and logged once here, so callers only decide what to do
/// with them. Requests are tried once.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// A client for the service at `base_url`.
    ///
    /// A trailing `/` is dropped so routes can always start with one.
    ///
    /// # Example
    ///
    /// ```
    /// use bookcase::api::HttpClient;
    ///
    /// let http = HttpClient::new("http://localhost:3004/").unwrap();
    /// assert_eq!(http.url("/books"), "http://localhost:3004/books");
    /// ```
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidBaseUrl`] when `base_url` does not parse.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Use a preconfigured `reqwest` client.
    pub fn with_client(base_url: &str, client: reqwest::Client) -> ApiResult<Self> {
        Url::parse(base_url)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL without a trailing `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `path` appended to the base URL as given.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET path`, decoding the response body into `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request::<(), T>(Method::GET, path, None).await
    }

    /// `POST path` with `body` as JSON, decoding the response into `T`.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    /// `PUT path` with `body` as JSON, decoding the response into `T`.
    ///
    /// json-server replaces the whole record on `PUT`.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// `DELETE path`. Use [`serde::de::IgnoredAny`] for `T` when the body
    /// does not matter.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request::<(), T>(Method::DELETE, path, None).await
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%method, url = %url, "sending request");

        let result = self.request_once(method.clone(), &url, body).await;
        if let Err(e) = &result {
            log_failure(&method, &url, e);
        }
        result
    }

    async fn request_once<B, T>(&self, method: Method, url: &str, body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut builder = self.client.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|source| ApiError::Network {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        let response = response
            .error_for_status()
            .map_err(|source| ApiError::from_status(status.as_u16(), url.to_string(), source))?;

        let bytes = response.bytes().await.map_err(|source| ApiError::Network {
            url: url.to_string(),
            source,
        })?;

        decode(&bytes).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// An empty body decodes as `null`.
fn decode<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_slice(b"null")
    } else {
        serde_json::from_slice(bytes)
    }
}

fn log_failure(method: &Method, url: &str, e: &ApiError) {
    let status = e.status();
    match e {
        ApiError::NotFound { .. } => {
            error!(%method, url, status = StatusCode::NOT_FOUND.as_u16(), error = %e, "resource not found");
        }
        ApiError::Server { .. } => {
            error!(%method, url, ?status, error = %e, "server error");
        }
        ApiError::Unexpected { .. } => {
            error!(%method, url, ?status, error = %e, "unexpected error");
        }
        ApiError::Network { source, .. } => {
            error!(%method, url, error = %source, "network error");
        }
        ApiError::Decode { source, .. } => {
            error!(%method, url, error = %source, "invalid response payload");
        }
        ApiError::InvalidBaseUrl(_) => {
            error!(%method, url, error = %e, "invalid request url");
        }
    }
}

use std::time::Duration;

/// Client-wide defaults for queries.
///
/// Individual queries may override the staleness window, as the book
/// queries do with their five-minute window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// How long fetched data counts as fresh.
    ///
    /// Fresh data is served from the cache. Stale data is still shown, but a
    /// subscribed query refetches it in the background.
    pub stale_time: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
        }
    }
}

impl QueryConfig {
    #[must_use]
    pub const fn new(stale_time: Duration) -> Self {
        Self { stale_time }
    }
}

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cached value with the time it was fetched and its invalidation flag.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: Instant,
    /// Set by invalidation; cleared only by storing fresh data.
    pub is_stale: bool,
}

/// The form entries take inside the client. Metadata stays typed so that
/// invalidation can mark entries stale without knowing the value type.
pub(crate) type ErasedEntry = CacheEntry<Arc<dyn Any + Send + Sync>>;

impl<T> CacheEntry<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            timestamp: Instant::now(),
            is_stale: false,
        }
    }

    /// Whether the entry was invalidated or is older than `stale_time`.
    #[must_use]
    pub fn is_stale_after(&self, stale_time: Duration) -> bool {
        self.is_stale || self.timestamp.elapsed() >= stale_time
    }

    pub const fn mark_stale(&mut self) {
        self.is_stale = true;
    }
}

impl<T: Send + Sync + 'static> CacheEntry<T> {
    pub(crate) fn erase(self) -> ErasedEntry {
        let data: Arc<dyn Any + Send + Sync> = Arc::new(self.data);
        CacheEntry {
            data,
            timestamp: self.timestamp,
            is_stale: self.is_stale,
        }
    }
}

impl ErasedEntry {
    /// Recover a typed copy, or `None` if the entry holds another type.
    pub(crate) fn downcast<T: Clone + 'static>(&self) -> Option<CacheEntry<T>> {
        self.data.downcast_ref::<T>().map(|data| CacheEntry {
            data: data.clone(),
            timestamp: self.timestamp,
            is_stale: self.is_stale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_new_entry_is_fresh() {
        let entry = CacheEntry::new(42);
        assert_eq!(entry.data, 42);
        assert!(!entry.is_stale);
        assert!(!entry.is_stale_after(Duration::from_secs(60)));
    }

    #[test]
    fn test_zero_stale_time_is_immediately_stale() {
        let entry = CacheEntry::new(42);
        assert!(entry.is_stale_after(Duration::ZERO));
    }

    #[test]
    fn test_ages_into_staleness() {
        let entry = CacheEntry::new(42);
        sleep(Duration::from_millis(10));
        assert!(entry.is_stale_after(Duration::from_millis(5)));
    }

    #[test]
    fn test_mark_stale_overrides_age() {
        let mut entry = CacheEntry::new(42);
        entry.mark_stale();
        assert!(entry.is_stale_after(Duration::from_secs(3600)));
    }

    #[test]
    fn test_erase_and_downcast() {
        let mut erased = CacheEntry::new(vec!["Dune".to_string()]).erase();
        erased.mark_stale();

        let typed = erased
            .downcast::<Vec<String>>()
            .expect("same type should downcast");
        assert_eq!(typed.data, vec!["Dune".to_string()]);
        assert!(typed.is_stale);

        assert!(erased.downcast::<u32>().is_none());
    }
}

//! Periodic ticks.
//!
//! The catalog uses [`Every`] to poll the book list: each tick invalidates the
//! list queries, and the active list subscription refetches.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Duration;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::time::{MissedTickBehavior, interval_at};
use tokio_stream::wrappers::IntervalStream;

use super::{SubscriptionId, SubscriptionSource};

/// Output of the [`Every`] subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

/// Emits a [`Tick`] once per period, starting one period from now.
///
/// Missed ticks are skipped rather than replayed; a slow terminal should not
/// cause a burst of refetches.
///
/// ```
/// use bookcase::subscription::{Subscription, time::Every};
///
/// enum Message {
///     Poll,
/// }
///
/// let poll = Subscription::new(Every::secs(30)).map(|_| Message::Poll);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Every {
    period: Duration,
}

impl Every {
    /// A tick every `period`. A zero period is clamped to one millisecond.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
        }
    }

    #[must_use]
    pub fn secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }
}

impl SubscriptionSource for Every {
    type Output = Tick;

    fn stream(&self) -> BoxStream<'static, Tick> {
        let start = tokio::time::Instant::now() + self.period;
        let mut ticks = interval_at(start, self.period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        IntervalStream::new(ticks).map(|_| Tick).boxed()
    }

    fn id(&self) -> SubscriptionId {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        SubscriptionId::of::<Self>(hasher.finish())
    }
}

//! Long-lived event sources.
//!
//! A [`Subscription`] wraps a [`SubscriptionSource`]: anything that can open a
//! stream and name itself with a [`SubscriptionId`]. After every update the
//! runtime asks the application for its subscriptions and diffs them by id:
//! new ids are started, vanished ids are cancelled, unchanged ids keep
//! running. Book queries use this to follow the current filter and selection.

pub mod http;
pub mod terminal;
pub mod time;

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::command::Action;

/// Identity of a running subscription.
///
/// Two subscriptions with the same id are considered the same event source,
/// so the runtime keeps the running one instead of restarting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    type_id: TypeId,
    hash: u64,
}

impl SubscriptionId {
    /// Build an id from the source type and a hash of its parameters.
    #[must_use]
    pub fn of<T: 'static>(hash: u64) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            hash,
        }
    }
}

/// Something that can be turned into a stream of outputs.
pub trait SubscriptionSource: Send {
    /// Items produced by the stream.
    type Output;

    /// Open a new stream. Called each time the subscription (re)starts.
    fn stream(&self) -> BoxStream<'static, Self::Output>;

    /// Identity used for diffing.
    fn id(&self) -> SubscriptionId;
}

/// A type-erased subscription producing application messages.
pub struct Subscription<Msg> {
    pub(crate) id: SubscriptionId,
    pub(crate) spawn: Box<dyn Fn() -> BoxStream<'static, Msg> + Send>,
}

impl<Msg: Send + 'static> Subscription<Msg> {
    /// Wrap a source.
    pub fn new<S>(source: S) -> Self
    where
        S: SubscriptionSource<Output = Msg> + 'static,
    {
        Self {
            id: source.id(),
            spawn: Box::new(move || source.stream()),
        }
    }

    /// Convert every produced item with `f`. The id is unchanged.
    pub fn map<T, F>(self, f: F) -> Subscription<T>
    where
        T: Send + 'static,
        F: Fn(Msg) -> T + Send + Sync + 'static,
    {
        let spawn = self.spawn;
        let f = Arc::new(f);
        Subscription {
            id: self.id,
            spawn: Box::new(move || {
                let f = Arc::clone(&f);
                spawn().map(move |msg| f(msg)).boxed()
            }),
        }
    }

    /// The identity of this subscription.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }
}

/// Handle for a running subscription task.
pub(crate) struct Handle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl Handle {
    const fn new(token: CancellationToken, join: JoinHandle<()>) -> Self {
        Self { token, join }
    }

    /// Cancel the subscription and wait for its task to finish.
    async fn cancel(self) {
        self.token.cancel();
        let _ = self.join.await;
    }
}

/// Starts, keeps and stops subscription tasks.
pub(crate) struct SubscriptionManager<Msg> {
    running: HashMap<SubscriptionId, Handle>,
    tx: mpsc::UnboundedSender<Action<Msg>>,
}

impl<Msg: Send + 'static> SubscriptionManager<Msg> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Action<Msg>>) -> Self {
        Self {
            running: HashMap::new(),
            tx,
        }
    }

    /// Reconcile the running tasks with `subscriptions`.
    pub(crate) fn update(&mut self, subscriptions: Vec<Subscription<Msg>>) {
        let wanted: HashSet<SubscriptionId> = subscriptions.iter().map(|sub| sub.id).collect();

        self.running.retain(|id, handle| {
            let keep = wanted.contains(id);
            if !keep {
                handle.token.cancel();
            }
            keep
        });

        for sub in subscriptions {
            if self.running.contains_key(&sub.id) {
                continue;
            }

            let token = CancellationToken::new();
            let child = token.clone();
            let tx = self.tx.clone();
            let mut stream = (sub.spawn)();

            let join = tokio::spawn(async move {
                loop {
                    tokio::select! {
                        () = child.cancelled() => break,
                        next = stream.next() => match next {
                            Some(msg) => {
                                if tx.send(Action::Message(msg)).is_err() {
                                    break;
                                }
                            }
                            None => break,
                        },
                    }
                }
            });

            self.running.insert(sub.id, Handle::new(token, join));
        }
    }

    /// Number of running subscriptions.
    pub(crate) fn len(&self) -> usize {
        self.running.len()
    }

    /// Cancel everything and wait for the tasks to stop.
    pub(crate) async fn shutdown(&mut self) {
        for (_, handle) in self.running.drain() {
            handle.cancel().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::hash::{DefaultHasher, Hash, Hasher};
    use tokio::time::{Duration, timeout};

    struct Numbers(Vec<u32>);

    impl SubscriptionSource for Numbers {
        type Output = u32;

        fn stream(&self) -> BoxStream<'static, u32> {
            stream::iter(self.0.clone()).boxed()
        }

        fn id(&self) -> SubscriptionId {
            let mut hasher = DefaultHasher::new();
            self.0.hash(&mut hasher);
            SubscriptionId::of::<Self>(hasher.finish())
        }
    }

    struct Forever(u64);

    impl SubscriptionSource for Forever {
        type Output = ();

        fn stream(&self) -> BoxStream<'static, ()> {
            stream::pending().boxed()
        }

        fn id(&self) -> SubscriptionId {
            SubscriptionId::of::<Self>(self.0)
        }
    }

    #[test]
    fn test_id_depends_on_type() {
        assert_eq!(SubscriptionId::of::<u8>(1), SubscriptionId::of::<u8>(1));
        assert_ne!(SubscriptionId::of::<u8>(1), SubscriptionId::of::<u16>(1));
        assert_ne!(SubscriptionId::of::<u8>(1), SubscriptionId::of::<u8>(2));
    }

    #[tokio::test]
    async fn test_map_converts_items_and_keeps_id() {
        let source = Numbers(vec![1, 2]);
        let id = source.id();
        let sub = Subscription::new(source).map(|n| format!("book-{n}"));
        assert_eq!(sub.id(), id);

        let items: Vec<String> = (sub.spawn)().collect().await;
        assert_eq!(items, vec!["book-1", "book-2"]);
    }

    #[tokio::test]
    async fn test_manager_forwards_messages() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut manager = SubscriptionManager::new(tx);
        manager.update(vec![Subscription::new(Numbers(vec![5, 6]))]);

        let mut received = Vec::new();
        for _ in 0..2 {
            let action = timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("message within timeout")
                .expect("channel open");
            if let Action::Message(n) = action {
                received.push(n);
            }
        }
        assert_eq!(received, vec![5, 6]);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_manager_diffs_by_id() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action<()>>();
        let mut manager = SubscriptionManager::new(tx);

        manager.update(vec![
            Subscription::new(Forever(1)),
            Subscription::new(Forever(2)),
        ]);
        assert_eq!(manager.len(), 2);

        // Same ids again: nothing restarts.
        manager.update(vec![
            Subscription::new(Forever(1)),
            Subscription::new(Forever(2)),
        ]);
        assert_eq!(manager.len(), 2);

        manager.update(vec![Subscription::new(Forever(2)), Subscription::new(Forever(3))]);
        assert_eq!(manager.len(), 2);
        assert!(!manager.running.contains_key(&Forever(1).id()));
        assert!(manager.running.contains_key(&Forever(3).id()));

        manager.update(vec![]);
        assert_eq!(manager.len(), 0);
        manager.shutdown().await;
    }
}

//! Side effects requested by an application.
//!
//! A [`Command`] is a lazily evaluated stream of [`Action`]s. The runtime
//! spawns it and feeds every produced message back into
//! [`Application::update`](crate::application::Application::update).
//! HTTP calls, cache invalidations and mutations are all expressed as
//! commands so that `update` itself stays synchronous.

use futures::{
    FutureExt, Stream, StreamExt,
    stream::{self, BoxStream, select_all},
};

/// What a running command asks the runtime to do.
pub enum Action<Msg> {
    /// Hand a message to the application's `update`.
    Message(Msg),

    /// Leave the event loop and restore the terminal.
    Quit,
}

/// An asynchronous side effect that eventually yields messages.
///
/// # Examples
///
/// ```
/// use bookcase::command::Command;
///
/// enum Message {
///     BooksCounted(usize),
/// }
///
/// let cmd = Command::perform(async { 42 }, Message::BooksCounted);
/// ```
pub struct Command<Msg: Send + 'static> {
    pub(crate) stream: Option<BoxStream<'static, Action<Msg>>>,
}

impl<Msg: Send + 'static> Command<Msg> {
    /// A command with no effect.
    pub fn none() -> Self {
        Self { stream: None }
    }

    /// Deliver `msg` to `update` on the next turn of the event loop.
    pub fn message(msg: Msg) -> Self {
        Self::effect(Action::Message(msg))
    }

    /// Run `future` and turn its output into a message with `f`.
    pub fn perform<A>(
        future: impl Future<Output = A> + Send + 'static,
        f: impl FnOnce(A) -> Msg + Send + 'static,
    ) -> Self {
        Self::future(future.map(f))
    }

    /// Run a future whose output already is a message.
    pub fn future(future: impl Future<Output = Msg> + Send + 'static) -> Self {
        Self {
            stream: Some(future.into_stream().map(Action::Message).boxed()),
        }
    }

    /// Emit a single action immediately.
    ///
    /// ```
    /// use bookcase::command::{Action, Command};
    ///
    /// let quit: Command<()> = Command::effect(Action::Quit);
    /// ```
    pub fn effect(action: Action<Msg>) -> Self {
        Self {
            stream: Some(stream::once(async move { action }).boxed()),
        }
    }

    /// Run several commands concurrently.
    ///
    /// Message order across the batched commands is unspecified, and empty
    /// commands are dropped. A mutation that also has to refresh the cache is
    /// usually a batch of the mutation and an invalidation.
    pub fn batch(commands: impl IntoIterator<Item = Command<Msg>>) -> Self {
        let streams: Vec<_> = commands.into_iter().filter_map(|cmd| cmd.stream).collect();

        if streams.is_empty() {
            Self::none()
        } else {
            Self {
                stream: Some(select_all(streams).boxed()),
            }
        }
    }

    /// Forward every item of `stream` as a message.
    pub fn stream(stream: impl Stream<Item = Msg> + Send + 'static) -> Self {
        Self {
            stream: Some(stream.map(Action::Message).boxed()),
        }
    }

    /// Forward every item of `stream`, converted with `f`.
    pub fn run<A>(
        stream: impl Stream<Item = A> + Send + 'static,
        f: impl Fn(A) -> Msg + Send + 'static,
    ) -> Self {
        Self::stream(stream.map(f))
    }

    /// Convert the messages this command produces. `Action::Quit` is kept.
    ///
    /// Mutations and cache operations yield their own result types; `map`
    /// lifts them into the application's message type.
    ///
    /// ```
    /// use bookcase::command::Command;
    ///
    /// enum Message {
    ///     Saved(Result<u64, String>),
    /// }
    ///
    /// let cmd = Command::future(async { Ok::<_, String>(7) }).map(Message::Saved);
    /// ```
    pub fn map<T: Send + 'static>(self, f: impl Fn(Msg) -> T + Send + 'static) -> Command<T> {
        Command {
            stream: self.stream.map(|stream| {
                stream
                    .map(move |action| match action {
                        Action::Message(msg) => Action::Message(f(msg)),
                        Action::Quit => Action::Quit,
                    })
                    .boxed()
            }),
        }
    }

    /// Whether running this command can have any effect.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.stream.is_none()
    }
}

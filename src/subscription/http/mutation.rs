//! HTTP mutations: creating, updating and deleting resources.
//!
//! Mutations are commands, not subscriptions. Each run is a discrete side
//! effect with one result. The cache work that follows a successful write
//! (invalidating lists, evicting a deleted detail) lives in the success hook,
//! so it has happened by the time the result message reaches `update`.
//!
//! # Example
//!
//! ```rust,ignore
//! let create = Mutation::new(move |book: BookInfo| {
//!     let api = api.clone();
//!     Box::pin(async move { api.create(&book).await.map_err(QueryError::from) })
//! })
//! .on_success(move |_, _| {
//!     client.invalidate_queries(&keys::lists());
//! });
//!
//! self.creating = MutationResult::loading();
//! create.execute(book).map(Message::BookCreated)
//! ```
//!
//! The application keeps a [`MutationResult`] per mutation it shows, set to
//! loading when the command goes out and to the outcome when the message
//! comes back.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::Command;

use super::query::QueryError;

/// The state of a mutation as tracked by the application.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationState<T> {
    /// Not started.
    Idle,
    /// Sent, waiting for the server.
    Loading,
    /// Finished with the server's answer.
    Success(T),
    /// Failed. Holds the error message.
    Error(String),
}

// Written by hand: a derive would require `T: Default`.
impl<T> Default for MutationState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

/// A mutation outcome with its current state.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult<T> {
    /// The current state of the mutation.
    pub state: MutationState<T>,
}

impl<T> Default for MutationResult<T> {
    fn default() -> Self {
        Self {
            state: MutationState::Idle,
        }
    }
}

impl<T> MutationResult<T> {
    /// A mutation that has been sent.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            state: MutationState::Loading,
        }
    }

    /// The server's answer, if the mutation succeeded.
    pub const fn data(&self) -> Option<&T> {
        match &self.state {
            MutationState::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Returns `true` if the mutation has not started.
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, MutationState::Idle)
    }

    /// Returns `true` while the mutation is in flight.
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, MutationState::Loading)
    }

    /// Returns `true` if the mutation succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self.state, MutationState::Success(_))
    }

    /// Returns `true` if the mutation failed.
    pub const fn is_error(&self) -> bool {
        matches!(self.state, MutationState::Error(_))
    }
}

impl<T> From<Result<T, QueryError>> for MutationResult<T> {
    fn from(result: Result<T, QueryError>) -> Self {
        let state = match result {
            Ok(data) => MutationState::Success(data),
            Err(e) => MutationState::Error(e.to_string()),
        };
        Self { state }
    }
}

type Mutator<I, O> = Arc<dyn Fn(I) -> BoxFuture<'static, Result<O, QueryError>> + Send + Sync>;
type SuccessHook<I, O> = Arc<dyn Fn(&O, &I) + Send + Sync>;
type ErrorHook<I> = Arc<dyn Fn(&QueryError, &I) + Send + Sync>;

/// A reusable write operation with optional success and error hooks.
///
/// Hooks run before the result is handed back, in the task performing the
/// mutation. Cloning shares the mutator and the hooks.
pub struct Mutation<I, O> {
    mutator: Mutator<I, O>,
    on_success: Option<SuccessHook<I, O>>,
    on_error: Option<ErrorHook<I>>,
}

impl<I, O> Clone for Mutation<I, O> {
    fn clone(&self) -> Self {
        Self {
            mutator: Arc::clone(&self.mutator),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<I, O> fmt::Debug for Mutation<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

impl<I, O> Mutation<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    /// A mutation performing `mutator` for each input, without hooks.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let delete = Mutation::new(move |id: BookId| {
    ///     let api = api.clone();
    ///     Box::pin(async move { api.delete(id).await.map_err(QueryError::from) })
    /// });
    /// ```
    pub fn new<F>(mutator: F) -> Self
    where
        F: Fn(I) -> BoxFuture<'static, Result<O, QueryError>> + Send + Sync + 'static,
    {
        Self {
            mutator: Arc::new(mutator),
            on_success: None,
            on_error: None,
        }
    }

    /// Run `hook` with the result and the input after every success.
    #[must_use]
    pub fn on_success(mut self, hook: impl Fn(&O, &I) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(hook));
        self
    }

    /// Run `hook` with the error and the input after every failure.
    #[must_use]
    pub fn on_error(mut self, hook: impl Fn(&QueryError, &I) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Perform the mutation once and run the matching hook.
    /// The result is returned unchanged.
    pub async fn run(&self, input: I) -> Result<O, QueryError> {
        let result = (self.mutator)(input.clone()).await;

        match &result {
            Ok(output) => {
                if let Some(hook) = &self.on_success {
                    hook(output, &input);
                }
            }
            Err(error) => {
                if let Some(hook) = &self.on_error {
                    hook(error, &input);
                }
            }
        }

        result
    }

    /// [`run`](Self::run) as a command producing the result.
    pub fn execute(&self, input: I) -> Command<Result<O, QueryError>> {
        let mutation = self.clone();
        Command::future(async move { mutation.run(input).await })
    }
}

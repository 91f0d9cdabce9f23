use ratatui::Frame;

use crate::{command::Command, subscription::Subscription};

/// A terminal application following the Elm Architecture.
///
/// State changes only in [`update`](Application::update). Side effects
/// (HTTP calls, cache invalidation) are returned as commands, and long-lived
/// inputs (key presses, timers, cached queries) are declared as
/// subscriptions.
///
/// # Example
///
/// ```
/// use ratatui::Frame;
/// use bookcase::{application::Application, command::Command, subscription::Subscription};
///
/// #[derive(Debug, Clone)]
/// enum Message {
///     Select(usize),
/// }
///
/// struct Shelf {
///     titles: Vec<String>,
///     selected: usize,
/// }
///
/// impl Application for Shelf {
///     type Message = Message;
///     type Flags = Vec<String>;
///
///     fn new(titles: Vec<String>) -> (Self, Command<Message>) {
///         (Shelf { titles, selected: 0 }, Command::none())
///     }
///
///     fn update(&mut self, msg: Message) -> Command<Message> {
///         match msg {
///             Message::Select(index) => self.selected = index.min(self.titles.len()),
///         }
///         Command::none()
///     }
///
///     fn view(&self, _frame: &mut Frame<'_>) {}
///
///     fn subscriptions(&self) -> Vec<Subscription<Message>> {
///         vec![]
///     }
/// }
/// ```
pub trait Application: Sized {
    /// Everything that can happen to the application: input events, query
    /// results, mutation outcomes.
    type Message: Send + 'static;

    /// Data needed to build the initial state. Use `()` if none.
    type Flags: Clone + Send;

    /// Build the initial state and a command to run at startup.
    fn new(flags: Self::Flags) -> (Self, Command<Self::Message>);

    /// Process a message and update the application state.
    ///
    /// ```
    /// # use bookcase::{application::Application, command::{Command, Action}};
    /// # use ratatui::Frame;
    /// # use bookcase::subscription::Subscription;
    /// # struct Catalog;
    /// # enum Message { Deleted, Quit }
    /// # impl Application for Catalog {
    /// #     type Message = Message;
    /// #     type Flags = ();
    /// #     fn new(_: ()) -> (Self, Command<Message>) { (Catalog, Command::none()) }
    /// fn update(&mut self, msg: Message) -> Command<Message> {
    ///     match msg {
    ///         Message::Deleted => Command::none(),
    ///         Message::Quit => Command::effect(Action::Quit),
    ///     }
    /// }
    /// #     fn view(&self, frame: &mut Frame<'_>) {}
    /// #     fn subscriptions(&self) -> Vec<Subscription<Message>> { vec![] }
    /// # }
    /// ```
    fn update(&mut self, msg: Self::Message) -> Command<Self::Message>;

    /// Render the current state. Called once per frame; must not change state.
    fn view(&self, frame: &mut Frame<'_>);

    /// The event sources the application currently wants.
    ///
    /// Called after every update. The runtime compares the result with the
    /// running subscriptions by id, so a query whose key depends on state
    /// (the list filter, the selected book) follows that state.
    ///
    /// ```
    /// # use bookcase::{application::Application, command::Command, subscription::Subscription};
    /// # use ratatui::Frame;
    /// # struct Catalog;
    /// # enum Message { Poll, Input }
    /// # impl Application for Catalog {
    /// #     type Message = Message;
    /// #     type Flags = ();
    /// #     fn new(_: ()) -> (Self, Command<Message>) { (Catalog, Command::none()) }
    /// #     fn update(&mut self, msg: Message) -> Command<Message> { Command::none() }
    /// #     fn view(&self, frame: &mut Frame<'_>) {}
    /// fn subscriptions(&self) -> Vec<Subscription<Message>> {
    ///     use bookcase::subscription::terminal::TerminalEvents;
    ///     use bookcase::subscription::time::Every;
    ///
    ///     vec![
    ///         Subscription::new(Every::secs(30)).map(|_| Message::Poll),
    ///         Subscription::new(TerminalEvents::new()).map(|_| Message::Input),
    ///     ]
    /// }
    /// # }
    /// ```
    fn subscriptions(&self) -> Vec<Subscription<Self::Message>>;
}

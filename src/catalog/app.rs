//! The catalog screen.
//!
//! A filterable book list next to the selected book's details. Both panes
//! are query subscriptions, so changing the filter or the selection simply
//! swaps the subscription and the runtime does the rest.

use std::io;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::api::{Book, BookId, BookInfo, BookPatch};
use crate::application::Application;
use crate::command::{Action, Command};
use crate::subscription::Subscription;
use crate::subscription::http::{
    Mutation, MutationResult, MutationState, QueryError, QueryResult, QueryState,
};
use crate::subscription::terminal::TerminalEvents;
use crate::subscription::time::Every;

use super::hooks::{BookQueries, BookUpdate};
use super::keys;

/// Startup configuration for [`CatalogApp`].
#[derive(Debug, Clone)]
pub struct CatalogFlags {
    pub queries: BookQueries,
    /// Refresh the list on this period, if set.
    pub poll_interval: Option<Duration>,
}

impl CatalogFlags {
    #[must_use]
    pub const fn new(queries: BookQueries) -> Self {
        Self {
            queries,
            poll_interval: None,
        }
    }

    #[must_use]
    pub const fn poll_every(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }
}

#[derive(Debug)]
pub enum Message {
    Input(Event),
    InputError(String),
    /// A list result for the filter it was fetched with.
    Books {
        filter: String,
        result: QueryResult<Vec<Book>>,
    },
    Detail {
        id: Option<BookId>,
        result: QueryResult<Book>,
    },
    Poll,
    Created(Result<Book, QueryError>),
    Updated(Result<Book, QueryError>),
    Deleted(BookId, Result<(), QueryError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Filter,
}

/// Which write the status line reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Write {
    Create,
    Update,
    Delete,
}

pub struct CatalogApp {
    queries: BookQueries,
    poll_interval: Option<Duration>,
    create: Mutation<BookInfo, Book>,
    update: Mutation<BookUpdate, Book>,
    delete: Mutation<BookId, ()>,
    mode: Mode,
    filter: String,
    selected: usize,
    books: QueryResult<Vec<Book>>,
    detail: QueryResult<Book>,
    created: MutationResult<Book>,
    updated: MutationResult<Book>,
    deleted: MutationResult<BookId>,
    last_write: Option<Write>,
    notice: String,
}

impl CatalogApp {
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    #[must_use]
    pub const fn books(&self) -> &QueryResult<Vec<Book>> {
        &self.books
    }

    /// The status line: the latest write, or the latest notice after it.
    #[must_use]
    pub fn status(&self) -> String {
        match self.last_write {
            Some(Write::Create) => describe(&self.created, "Creating...", "Create failed", |book| {
                format!("Created #{} {}", book.id, book.info.title)
            }),
            Some(Write::Update) => {
                describe(&self.updated, "Saving...", "Update failed", |book| format!("Saved #{}", book.id))
            }
            Some(Write::Delete) => {
                describe(&self.deleted, "Deleting...", "Delete failed", |id| format!("Deleted #{id}"))
            }
            None => self.notice.clone(),
        }
    }

    fn notify(&mut self, notice: String) {
        self.notice = notice;
        self.last_write = None;
    }

    #[must_use]
    pub fn selected_book(&self) -> Option<&Book> {
        self.books.data().and_then(|books| books.get(self.selected))
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<BookId> {
        self.selected_book().map(|book| book.id)
    }

    fn book_count(&self) -> usize {
        self.books.data().map_or(0, Vec::len)
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.book_count().saturating_sub(1));
    }

    fn on_key(&mut self, key: KeyEvent) -> Command<Message> {
        if key.kind != KeyEventKind::Press {
            return Command::none();
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Command::effect(Action::Quit);
        }

        match self.mode {
            Mode::Filter => self.on_filter_key(key.code),
            Mode::Browse => self.on_browse_key(key.code),
        }
    }

    fn on_filter_key(&mut self, code: KeyCode) -> Command<Message> {
        match code {
            KeyCode::Char(c) => {
                self.filter.push(c);
                self.selected = 0;
            }
            KeyCode::Backspace => {
                self.filter.pop();
                self.selected = 0;
            }
            KeyCode::Enter | KeyCode::Esc => self.mode = Mode::Browse,
            _ => {}
        }
        Command::none()
    }

    fn on_browse_key(&mut self, code: KeyCode) -> Command<Message> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => Command::effect(Action::Quit),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Char('/') => {
                self.mode = Mode::Filter;
                Command::none()
            }
            KeyCode::Char('r') => {
                self.notify("Refreshing".into());
                self.queries.client().invalidate(&keys::all())
            }
            KeyCode::Char('s') => self.edit_selected(|info| {
                info.is_recommended = !info.is_recommended;
            }),
            KeyCode::Char('+') => self.edit_selected(|info| {
                info.stock = info.stock.saturating_add(1);
            }),
            KeyCode::Char('-') => self.edit_selected(|info| {
                info.stock = info.stock.saturating_sub(1);
            }),
            KeyCode::Char('c') => self.copy_selected(),
            KeyCode::Char('d') => self.delete_selected(),
            _ => Command::none(),
        }
    }

    /// Move by `step` and prefetch the books around the new selection.
    fn move_selection(&mut self, step: isize) -> Command<Message> {
        let Some(books) = self.books.data() else {
            return Command::none();
        };
        if books.is_empty() {
            return Command::none();
        }

        let last = books.len() - 1;
        self.selected = self.selected.saturating_add_signed(step).min(last);

        let neighbours = [self.selected.checked_sub(1), Some(self.selected + 1)];
        let prefetches: Vec<Command<Message>> = neighbours
            .into_iter()
            .flatten()
            .filter_map(|index| books.get(index))
            .map(|book| self.queries.prefetch_book(book.id))
            .collect();
        Command::batch(prefetches)
    }

    fn edit_selected(&mut self, edit: impl FnOnce(&mut BookInfo)) -> Command<Message> {
        let Some(book) = self.selected_book() else {
            return Command::none();
        };

        let id = book.id;
        let mut info = book.info.clone();
        edit(&mut info);
        self.updated = MutationResult::loading();
        self.last_write = Some(Write::Update);

        let update = BookUpdate {
            id,
            patch: BookPatch::from(info),
        };
        self.update.execute(update).map(Message::Updated)
    }

    fn copy_selected(&mut self) -> Command<Message> {
        let Some(book) = self.selected_book() else {
            return Command::none();
        };

        let mut info = book.info.clone();
        info.title = format!("{} (copy)", info.title);
        self.created = MutationResult::loading();
        self.last_write = Some(Write::Create);
        self.create.execute(info).map(Message::Created)
    }

    fn delete_selected(&mut self) -> Command<Message> {
        let Some(id) = self.selected_id() else {
            return Command::none();
        };

        self.deleted = MutationResult::loading();
        self.last_write = Some(Write::Delete);
        self.delete
            .execute(id)
            .map(move |result| Message::Deleted(id, result))
    }

    fn render_books(&self, frame: &mut Frame<'_>, area: Rect) {
        let title = if self.books.is_stale() {
            " Books (refreshing) "
        } else {
            " Books "
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        match &self.books.state {
            QueryState::Success { data, .. } if !data.is_empty() => {
                let items: Vec<ListItem<'_>> = data
                    .iter()
                    .map(|book| {
                        let marker = if book.info.is_recommended { "*" } else { " " };
                        ListItem::new(format!("{marker} {}", book.info.title))
                    })
                    .collect();
                let list = List::new(items)
                    .block(block)
                    .highlight_style(Style::new().add_modifier(Modifier::REVERSED));
                let mut state = ListState::default().with_selected(Some(self.selected));
                frame.render_stateful_widget(list, area, &mut state);
            }
            state => {
                let text = match state {
                    QueryState::Loading => "Loading...".to_string(),
                    QueryState::Error(e) => format!("Error: {e}"),
                    _ => "No books".to_string(),
                };
                frame.render_widget(Paragraph::new(text).block(block), area);
            }
        }
    }

    fn render_detail(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(" Details ");

        let lines: Vec<Line<'_>> = match &self.detail.state {
            QueryState::Idle => vec![Line::from("No book selected")],
            QueryState::Loading => vec![Line::from("Loading...")],
            QueryState::Error(e) => vec![Line::from(format!("Error: {e}"))],
            QueryState::Success { data: book, is_stale } => {
                let info = &book.info;
                let mut lines = vec![
                    Line::from(info.title.clone()).bold(),
                    Line::from(format!("by {}", info.author)),
                    Line::from(""),
                    Line::from(format!("Price:     {:.2} (was {:.2})", info.price, info.original_price)),
                    Line::from(format!("Stock:     {}", info.stock)),
                    Line::from(format!("Rating:    {:.1} ({} reviews)", info.rating, info.reviews)),
                    Line::from(format!("Pages:     {}", info.pages)),
                    Line::from(format!("Publisher: {} ({})", info.publisher, info.publish_date)),
                    Line::from(format!("ISBN:      {}", info.isbn)),
                ];
                if !info.tags.is_empty() {
                    lines.push(Line::from(format!("Tags:      {}", info.tags.join(", "))));
                }
                if info.is_recommended {
                    lines.push(Line::from("Recommended").italic());
                }
                lines.push(Line::from(""));
                lines.push(Line::from(info.description.clone()));
                if *is_stale {
                    lines.push(Line::from("(refreshing)").dim());
                }
                lines
            }
        };

        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            area,
        );
    }
}

fn describe<T>(
    result: &MutationResult<T>,
    pending: &str,
    failed: &str,
    done: impl FnOnce(&T) -> String,
) -> String {
    match &result.state {
        MutationState::Idle => String::new(),
        MutationState::Loading => pending.to_string(),
        MutationState::Success(data) => done(data),
        MutationState::Error(e) => format!("{failed}: {e}"),
    }
}

fn input_message(event: io::Result<Event>) -> Message {
    match event {
        Ok(event) => Message::Input(event),
        Err(e) => Message::InputError(e.to_string()),
    }
}

impl Application for CatalogApp {
    type Message = Message;
    type Flags = CatalogFlags;

    fn new(flags: CatalogFlags) -> (Self, Command<Message>) {
        let queries = flags.queries;
        let app = Self {
            create: queries.create_book(),
            update: queries.update_book(),
            delete: queries.delete_book(),
            queries,
            poll_interval: flags.poll_interval,
            mode: Mode::Browse,
            filter: String::new(),
            selected: 0,
            books: QueryResult::default(),
            detail: QueryResult::default(),
            created: MutationResult::default(),
            updated: MutationResult::default(),
            deleted: MutationResult::default(),
            last_write: None,
            notice: String::new(),
        };
        (app, Command::none())
    }

    fn update(&mut self, msg: Message) -> Command<Message> {
        match msg {
            Message::Input(Event::Key(key)) => self.on_key(key),
            Message::Input(_) => Command::none(),
            Message::InputError(e) => {
                self.notify(format!("Input error: {e}"));
                Command::none()
            }
            Message::Books { filter, result } => {
                if filter == self.filter {
                    self.books = result;
                    self.clamp_selection();
                }
                Command::none()
            }
            Message::Detail { id, result } => {
                if id == self.selected_id() {
                    self.detail = result;
                }
                Command::none()
            }
            Message::Poll => self.queries.client().invalidate(&keys::lists()),
            Message::Created(result) => {
                self.created = result.into();
                self.last_write = Some(Write::Create);
                Command::none()
            }
            Message::Updated(result) => {
                self.updated = result.into();
                self.last_write = Some(Write::Update);
                Command::none()
            }
            Message::Deleted(id, result) => {
                self.deleted = result.map(|()| id).into();
                self.last_write = Some(Write::Delete);
                Command::none()
            }
        }
    }

    fn view(&self, frame: &mut Frame<'_>) {
        let [header, filter, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(
            Paragraph::new("Bookcase  (j/k move, / filter, r refresh, s recommend, +/- stock, c copy, d delete, q quit)")
                .bold(),
            header,
        );

        let filter_line = match self.mode {
            Mode::Filter => format!("Filter: {}_", self.filter),
            Mode::Browse if self.filter.is_empty() => "Filter: (none, press /)".to_string(),
            Mode::Browse => format!("Filter: {}", self.filter),
        };
        frame.render_widget(Paragraph::new(filter_line), filter);

        let [list, detail] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(body);
        self.render_books(frame, list);
        self.render_detail(frame, detail);

        frame.render_widget(Paragraph::new(self.status()).dim(), status);
    }

    fn subscriptions(&self) -> Vec<Subscription<Message>> {
        let filter = self.filter.clone();
        let id = self.selected_id();

        let mut subscriptions = vec![
            Subscription::new(TerminalEvents::new()).map(input_message),
            Subscription::new(self.queries.books(&self.filter)).map(move |result| Message::Books {
                filter: filter.clone(),
                result,
            }),
            Subscription::new(self.queries.book(id)).map(move |result| Message::Detail { id, result }),
        ];

        if let Some(period) = self.poll_interval {
            subscriptions.push(Subscription::new(Every::new(period)).map(|_| Message::Poll));
        }

        subscriptions
    }
}

//! The event loop.

use std::time::Duration;

use color_eyre::eyre::Result;
use futures::StreamExt;
use ratatui::{Terminal, prelude::Backend};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::{
    application::Application,
    command::{Action, Command},
    subscription::SubscriptionManager,
};

/// Drives an [`Application`]: draws frames, runs commands, keeps its
/// subscriptions in line with its state, and stops on [`Action::Quit`].
pub struct Runtime<A: Application> {
    app: A,
    init: Command<A::Message>,
    tx: mpsc::UnboundedSender<Action<A::Message>>,
    rx: mpsc::UnboundedReceiver<Action<A::Message>>,
    subscriptions: SubscriptionManager<A::Message>,
}

impl<A: Application> Runtime<A> {
    /// Build the application from `flags`. Its startup command runs once
    /// [`run`](Self::run) is called.
    pub fn new(flags: A::Flags) -> Self {
        let (app, init) = A::new(flags);
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriptions = SubscriptionManager::new(tx.clone());

        Self {
            app,
            init,
            tx,
            rx,
            subscriptions,
        }
    }

    pub const fn app(&self) -> &A {
        &self.app
    }

    fn spawn(&self, cmd: Command<A::Message>) {
        let Some(mut stream) = cmd.stream else {
            return;
        };

        let tx = self.tx.clone();
        tokio::spawn(async move {
            while let Some(action) = stream.next().await {
                if tx.send(action).is_err() {
                    break;
                }
            }
        });
    }

    fn process(&mut self, msg: A::Message) {
        let cmd = self.app.update(msg);
        self.spawn(cmd);
        self.subscriptions.update(self.app.subscriptions());
    }

    /// Run until the application quits. Frames are drawn at most
    /// `frame_rate` times per second (a rate of 0 is treated as 1).
    pub async fn run<B: Backend>(mut self, terminal: &mut Terminal<B>, frame_rate: u32) -> Result<()> {
        let mut frames = interval(Duration::from_secs(1) / frame_rate.max(1));
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let init = std::mem::replace(&mut self.init, Command::none());
        self.spawn(init);
        self.subscriptions.update(self.app.subscriptions());
        info!(frame_rate, "runtime started");

        loop {
            tokio::select! {
                _ = frames.tick() => {
                    terminal.draw(|frame| self.app.view(frame))?;
                }
                action = self.rx.recv() => match action {
                    Some(Action::Message(msg)) => self.process(msg),
                    Some(Action::Quit) | None => break,
                },
            }
        }

        debug!(subscriptions = self.subscriptions.len(), "shutting down");
        self.subscriptions.shutdown().await;
        info!("runtime stopped");
        Ok(())
    }
}

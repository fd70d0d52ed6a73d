//! Single-writer event loop for a chat session.
//!
//! Transport events and user commands arrive on separate channels; the driver applies
//! them to the [`Session`] one at a time, so the timeline has exactly one writer.
//! After each step the presenter is told about new entries and state changes.

use tokio::sync::mpsc;

use crate::session::{ConnectionState, Session};
use crate::timeline::TimelineEntry;
use crate::transport::{Outbound, TransportEvent};

/// User actions queued to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A typed line. While quick options are on offer, a bare option number selects it.
    Input(String),
    /// Send text verbatim.
    Send(String),
    /// Select quick option `n` (1-based).
    Choose(usize),
    Close,
}

/// Presentation side: shown everything the timeline gains, in order.
pub trait Presenter {
    fn entry_appended(&mut self, entry: &TimelineEntry);
    fn state_changed(&mut self, state: ConnectionState);
    /// Called right after the welcome entry when quick options are configured.
    fn options_offered(&mut self, _options: &[String]) {}
}

pub struct Driver<O: Outbound, P: Presenter> {
    session: Session<O>,
    presenter: P,
    presented: usize,
    last_state: ConnectionState,
}

impl<O: Outbound, P: Presenter> Driver<O, P> {
    pub fn new(session: Session<O>, presenter: P) -> Self {
        let last_state = session.state();
        Self {
            session,
            presenter,
            presented: 0,
            last_state,
        }
    }

    pub fn session(&self) -> &Session<O> {
        &self.session
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => self.session.on_open(),
            TransportEvent::Message(raw) => {
                self.session.on_message(&raw);
            }
            TransportEvent::Error(err) => self.session.on_error(&err),
            TransportEvent::Closed => self.session.on_close(),
        }
        self.flush();
    }

    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::Input(line) => {
                let offered = if self.session.options_visible() {
                    self.session.quick_options().len()
                } else {
                    0
                };
                let choice = line
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|n| (1..=offered).contains(n));
                match choice {
                    Some(n) => {
                        self.session.choose_option(n);
                    }
                    None => {
                        self.session.send_user_text(&line);
                    }
                }
            }
            Command::Send(text) => {
                self.session.send_user_text(&text);
            }
            Command::Choose(n) => {
                self.session.choose_option(n);
            }
            Command::Close => self.session.close(),
        }
        self.flush();
    }

    fn flush(&mut self) {
        let all = self.session.timeline().all();
        for entry in &all[self.presented..] {
            self.presenter.entry_appended(entry);
            if entry.is_welcome && !self.session.quick_options().is_empty() {
                self.presenter.options_offered(self.session.quick_options());
            }
        }
        self.presented = all.len();

        let state = self.session.state();
        if state != self.last_state {
            self.last_state = state;
            self.presenter.state_changed(state);
        }
    }

    /// Run until the session is closed, by the transport or by a command. A dropped command
    /// channel closes the session; a dropped event channel counts as the transport closing.
    /// Pending transport events are drained before the next command.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
        mut commands: mpsc::Receiver<Command>,
    ) -> (Session<O>, P) {
        let mut commands_open = true;
        while self.session.state() != ConnectionState::Closed {
            tokio::select! {
                biased;
                event = events.recv() => {
                    self.handle_event(event.unwrap_or(TransportEvent::Closed));
                }
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        commands_open = false;
                        self.handle_command(Command::Close);
                    }
                },
            }
        }
        (self.session, self.presenter)
    }
}

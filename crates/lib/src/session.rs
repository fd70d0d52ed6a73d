//! Chat session controller: connection state, local echo, and the inbound pipeline.
//!
//! A session owns the timeline. Inbound frames go through normalize → classify →
//! timeline; user text is transmitted and echoed onto the timeline in the same call,
//! so the echo always precedes any reply to it.

use crate::classify::classify;
use crate::config::ChatConfig;
use crate::payload::normalize;
use crate::timeline::{Timeline, TimelineEntry};
use crate::transport::Outbound;

/// Unique session identifier (opaque string, used in logs).
pub type SessionId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

pub struct Session<O: Outbound> {
    id: SessionId,
    state: ConnectionState,
    timeline: Timeline,
    outbound: O,
    welcome_text: String,
    quick_options: Vec<String>,
    /// Cleared by the first successful send.
    options_visible: bool,
}

impl<O: Outbound> Session<O> {
    /// New session in `Connecting` with an empty timeline.
    pub fn new(outbound: O, chat: &ChatConfig) -> Self {
        let id = format!("sess-{}", uuid::Uuid::new_v4());
        log::debug!("{}: created, connecting", id);
        Self {
            id,
            state: ConnectionState::Connecting,
            timeline: Timeline::new(),
            outbound,
            welcome_text: chat.welcome_text.clone(),
            quick_options: chat.quick_options.clone(),
            options_visible: true,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn quick_options(&self) -> &[String] {
        &self.quick_options
    }

    /// Quick options stay on offer until the user sends something.
    pub fn options_visible(&self) -> bool {
        self.options_visible && self.state == ConnectionState::Open
    }

    /// Connection established: `Connecting → Open` and append the welcome entry.
    /// Any later open signal is ignored so there is exactly one welcome per session.
    pub fn on_open(&mut self) {
        if self.state != ConnectionState::Connecting {
            log::debug!("{}: ignoring open signal in state {:?}", self.id, self.state);
            return;
        }
        self.state = ConnectionState::Open;
        self.timeline.append(TimelineEntry::welcome(self.welcome_text.clone()));
        log::info!("{}: connection open", self.id);
    }

    /// Classify one raw inbound frame onto the timeline. Returns the number of entries appended.
    pub fn on_message(&mut self, raw: &str) -> usize {
        if self.state != ConnectionState::Open {
            log::debug!("{}: dropping inbound frame in state {:?}", self.id, self.state);
            return 0;
        }
        let payload = normalize(raw);
        if payload.is_empty() {
            log::debug!("{}: inbound frame had no recognized fields", self.id);
            return 0;
        }
        let appended = self.timeline.apply(classify(&payload));
        log::debug!("{}: inbound frame appended {} entries", self.id, appended);
        appended
    }

    /// Transport reported an error; the session is over. Not a timeline entry.
    pub fn on_error(&mut self, err: &str) {
        log::warn!("{}: connection error: {}", self.id, err);
        self.state = ConnectionState::Closed;
    }

    pub fn on_close(&mut self) {
        if self.state != ConnectionState::Closed {
            log::info!("{}: connection closed", self.id);
        }
        self.state = ConnectionState::Closed;
    }

    /// Transmit `text` verbatim and echo it as a user entry. No-op (false) when the text is
    /// blank or the connection is not open.
    pub fn send_user_text(&mut self, text: &str) -> bool {
        if text.trim().is_empty() || self.state != ConnectionState::Open {
            return false;
        }
        if let Err(e) = self.outbound.send(text) {
            log::warn!("{}: send failed: {}", self.id, e);
            self.state = ConnectionState::Closed;
            return false;
        }
        self.timeline.append(TimelineEntry::user(text));
        self.options_visible = false;
        true
    }

    /// Send quick option `n` (1-based) while options are on offer.
    pub fn choose_option(&mut self, n: usize) -> bool {
        if !self.options_visible() {
            return false;
        }
        let Some(option) = n.checked_sub(1).and_then(|i| self.quick_options.get(i)).cloned() else {
            return false;
        };
        self.send_user_text(&option)
    }

    /// Tear down the connection. Idempotent.
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state = ConnectionState::Closed;
        self.outbound.close();
        log::info!("{}: closed by client", self.id);
    }
}

/// Test double for the outbound side: records what was sent.
#[cfg(test)]
pub(crate) mod testing {
    use crate::transport::{Outbound, TransportError};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Clone, Default)]
    pub struct RecordingOutbound {
        pub sent: Rc<RefCell<Vec<String>>>,
        pub closes: Rc<Cell<usize>>,
        pub fail: Rc<Cell<bool>>,
    }

    impl Outbound for RecordingOutbound {
        fn send(&self, text: &str) -> Result<(), TransportError> {
            if self.fail.get() {
                return Err(TransportError::Closed);
            }
            self.sent.borrow_mut().push(text.to_string());
            Ok(())
        }

        fn close(&self) {
            self.closes.set(self.closes.get() + 1);
        }
    }
}

//! Conversation timeline: the ordered, append-only record of everything displayed.
//!
//! Entries are never edited or removed. Deduplication is by exact `text` and only
//! happens through [`Timeline::append_if_absent`] (or an `IfAbsent` emission, which
//! is checked against the entries present before its batch).

use serde::Serialize;
use std::borrow::Cow;

use crate::sanitize::sanitize;

/// Who an entry is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One unit of displayed conversation content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub sender: Sender,
    pub text: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_welcome: bool,
}

impl TimelineEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            is_welcome: false,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            is_welcome: false,
        }
    }

    pub fn welcome(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            is_welcome: true,
        }
    }

    /// Text as it should be shown: stored text with escape artifacts removed.
    pub fn display_text(&self) -> Cow<'_, str> {
        sanitize(&self.text)
    }
}

/// How a classified entry is placed on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Appended unconditionally.
    Always,
    /// Appended only when no entry present before the batch has identical text.
    IfAbsent,
}

/// A classified entry waiting to be applied to the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub entry: TimelineEntry,
    pub placement: Placement,
}

impl Emission {
    pub fn always(entry: TimelineEntry) -> Self {
        Self {
            entry,
            placement: Placement::Always,
        }
    }

    pub fn if_absent(entry: TimelineEntry) -> Self {
        Self {
            entry,
            placement: Placement::IfAbsent,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: TimelineEntry) {
        self.entries.push(entry);
    }

    /// Append unless an entry with the same text is already present. Returns true if appended.
    pub fn append_if_absent(&mut self, entry: TimelineEntry) -> bool {
        if self.contains_text(&entry.text) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Apply one classified batch in order. `IfAbsent` emissions are checked against the
    /// entries that existed before the batch, so identical emissions within the batch all
    /// land. Returns the number of entries appended.
    pub fn apply(&mut self, emissions: impl IntoIterator<Item = Emission>) -> usize {
        let before = self.entries.len();
        let mut appended = 0;
        for emission in emissions {
            if emission.placement == Placement::IfAbsent
                && self.entries[..before].iter().any(|e| e.text == emission.entry.text)
            {
                continue;
            }
            self.entries.push(emission.entry);
            appended += 1;
        }
        appended
    }

    pub fn contains_text(&self, text: &str) -> bool {
        self.entries.iter().any(|e| e.text == text)
    }

    pub fn all(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TimelineEntry> {
        self.entries.last()
    }
}

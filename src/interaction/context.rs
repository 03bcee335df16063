//! Per-message dispatch context.
//!
//! Every envelope gets a fresh [`Context`]: a `tracing` span for the message, a
//! tag map the classifier fills with what it learned about the event, and an
//! optional deadline for handlers to honor.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{Span, field};

/// Outer type of the envelope.
pub const TAG_OUTER_TYPE: &str = "event.outer_type";
/// Inner type of the envelope.
pub const TAG_INNER_TYPE: &str = "event.inner_type";
/// One-line, human readable summary of the event.
pub const TAG_DESCRIPTION: &str = "event.description";
pub const TAG_USER: &str = "event.user";
pub const TAG_CHANNEL: &str = "event.channel";
pub const TAG_TEXT: &str = "event.text";
pub const TAG_REACTION: &str = "event.reaction";
pub const TAG_ITEM_USER: &str = "event.item_user";

/// Context handed through a single dispatch and into the handler it selects.
///
/// Cloning is cheap; clones share the same tag map.
#[derive(Debug, Clone)]
pub struct Context {
    span: Span,
    tags: Arc<Mutex<BTreeMap<&'static str, String>>>,
    deadline: Option<Instant>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Span::none())
    }
}

impl Context {
    /// Creates a context recording its tags into `span` (where the span declares the field).
    pub fn new(span: Span) -> Self {
        Self {
            span,
            tags: Arc::default(),
            deadline: None,
        }
    }

    /// Creates a context with its own `event` span, declaring the standard tag fields.
    pub fn for_event() -> Self {
        let span = tracing::info_span!(
            "event",
            event.outer_type = field::Empty,
            event.inner_type = field::Empty,
            event.description = field::Empty,
        );

        Self::new(span)
    }

    /// Attaches a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Attaches an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when no deadline is attached.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Sets a tag, overwriting any previous value for `key`.
    pub fn set_tag(&self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        self.span.record(key, value.as_str());
        self.tags.lock().insert(key, value);
    }

    pub fn tag(&self, key: &str) -> Option<String> {
        self.tags.lock().get(key).cloned()
    }

    /// A copy of all tags, ordered by key.
    pub fn tags(&self) -> BTreeMap<&'static str, String> {
        self.tags.lock().clone()
    }
}

//! Error types for classification and dispatch.

use thiserror::Error;

/// Why an envelope could not be turned into a typed event.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The inner type is not one the router knows how to handle.
    #[error("unsupported event received: {outer_type}/{inner_type}")]
    Unsupported { outer_type: String, inner_type: String },

    /// The payload does not have the shape its inner type promises.
    ///
    /// This points at an integration bug upstream, not at anything the user did.
    #[error("unexpected payload for `{inner_type}` event: {source}")]
    MalformedPayload {
        inner_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// A mention whose text carries no command verb.
    #[error("invalid command")]
    InvalidCommand { channel: String },
}

/// What went wrong during a dispatch.
#[derive(Debug, Error)]
pub enum DispatchErrorKind {
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// A registered handler failed.
    #[error(transparent)]
    Handler(anyhow::Error),

    /// The help fallback could not be sent.
    #[error(transparent)]
    Help(anyhow::Error),
}

/// Error returned by [`Router::dispatch`](super::router::Router::dispatch).
///
/// `channel` is set only when the failure happened after the originating channel
/// was known (an invalid command, or a failing command handler). Callers use it
/// to post the help text back in place; errors without a channel must not.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct DispatchError {
    #[source]
    kind: DispatchErrorKind,
    channel: Option<String>,
}

impl DispatchError {
    pub fn new(kind: DispatchErrorKind) -> Self {
        Self { kind, channel: None }
    }

    pub fn handler(err: anyhow::Error) -> Self {
        Self::new(DispatchErrorKind::Handler(err))
    }

    pub fn help(err: anyhow::Error) -> Self {
        Self::new(DispatchErrorKind::Help(err))
    }

    /// Annotates the error with the channel the event originated from.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn kind(&self) -> &DispatchErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> DispatchErrorKind {
        self.kind
    }

    /// The originating channel, if it was known when the error occurred.
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind, DispatchErrorKind::Classify(ClassifyError::Unsupported { .. }))
    }

    pub fn is_malformed_payload(&self) -> bool {
        matches!(self.kind, DispatchErrorKind::Classify(ClassifyError::MalformedPayload { .. }))
    }

    pub fn is_invalid_command(&self) -> bool {
        matches!(self.kind, DispatchErrorKind::Classify(ClassifyError::InvalidCommand { .. }))
    }
}

impl From<ClassifyError> for DispatchError {
    fn from(err: ClassifyError) -> Self {
        let channel = match &err {
            ClassifyError::InvalidCommand { channel } => Some(channel.clone()),
            _ => None,
        };

        Self {
            kind: DispatchErrorKind::Classify(err),
            channel,
        }
    }
}

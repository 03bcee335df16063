//! Chat service integration for slack-router.
//!
//! This module provides the platform side of the router:
//! - Receiving events and forwarding them as [`Envelope`]s
//! - Sending plain text messages to a channel
//!
//! It defines the `GenericChatClient` trait that can be implemented for different
//! chat services, with a default implementation for Slack.

pub mod slack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{base::types::Void, interaction::envelope::Envelope};

/// Where a chat client delivers the envelopes it receives.
pub type EnvelopeSink = mpsc::UnboundedSender<Envelope>;

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the core functionality for interacting with chat platforms
/// like Slack. Implementing this trait allows different chat services to be used
/// with the router.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Start the chat client listener.
    ///
    /// Connects to the platform and forwards every received event to `sink`
    /// until the connection is closed. Handshake, reconnection and
    /// acknowledgement are the client's business.
    async fn start(&self, sink: EnvelopeSink) -> Void;

    /// Send a plain text message to a channel.
    async fn send_message(&self, channel_id: &str, text: &str) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}

//! Runtime services and shared state for the slack-router.

use tokio::sync::mpsc;
use tracing::instrument;

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::{
        listener::{self, ListenOptions},
        router::Router,
    },
    service::chat::ChatClient,
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the configuration, the chat client, and the router.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The chat client instance.
    pub chat: ChatClient,
    /// The router handlers are registered on.
    pub router: Router,
}

impl Runtime {
    /// Create a new runtime instance connected to Slack.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the slack client.
        let chat = ChatClient::slack(&config).await?;

        Ok(Self::with_chat(config, chat))
    }

    /// Create a runtime around an existing chat client.
    pub fn with_chat(config: Config, chat: ChatClient) -> Self {
        let router = Router::new(chat.clone(), config.help_message.clone());

        Self { config, chat, router }
    }

    /// Runs the chat client and the listener until the chat client stops.
    pub async fn start(&self) -> Void {
        let (sink, envelopes) = mpsc::unbounded_channel();

        let listener = listener::listen(self.router.clone(), envelopes, ListenOptions::from(&self.config));

        // The sink is moved into the chat client; once it returns, the listener drains and exits.
        let (started, ()) = tokio::join!(self.chat.start(sink), listener);

        started
    }
}

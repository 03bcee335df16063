//! Dispatch of classified events to registered handlers.
//!
//! The [`Router`] owns one optional reaction handler and a map from command verb
//! to mention handler. A mention whose verb has no handler falls back to posting
//! the configured help text in the originating channel.

use std::{collections::HashMap, sync::Arc};

use futures::{FutureExt, future::BoxFuture};
use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use super::{
    classifier::{self, ClassifiedEvent, MentionCommand, ReactionEvent},
    context::Context,
    envelope::Envelope,
    error::DispatchError,
};
use crate::{base::types::Void, service::chat::ChatClient};

/// Handler invoked for `reaction_added` events.
pub type ReactionHandler = Arc<dyn Fn(Context, ReactionEvent) -> BoxFuture<'static, Void> + Send + Sync>;

/// Handler invoked for a mention naming its command verb.
///
/// Receives the context, the parsed command, a chat client to reply with, and the arguments.
pub type MentionCommandHandler = Arc<dyn Fn(Context, MentionCommand, ChatClient, Vec<String>) -> BoxFuture<'static, Void> + Send + Sync>;

/// Routes envelopes to handlers.
///
/// It is designed to be trivially cloneable; clones share the same registry, so
/// handlers registered on one clone are visible to all.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    chat: ChatClient,
    help_message: String,
    reaction_handler: RwLock<Option<ReactionHandler>>,
    commands: RwLock<HashMap<String, MentionCommandHandler>>,
}

impl Router {
    /// Creates a router replying through `chat`, with `help_message` as the fallback text.
    pub fn new(chat: ChatClient, help_message: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                chat,
                help_message: help_message.into(),
                reaction_handler: RwLock::new(None),
                commands: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn help_message(&self) -> &str {
        &self.inner.help_message
    }

    pub fn chat(&self) -> &ChatClient {
        &self.inner.chat
    }

    /// Sets the reaction handler, replacing any previous one.
    pub fn on_reaction_added<F, Fut>(&self, handler: F)
    where
        F: Fn(Context, ReactionEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Void> + Send + 'static,
    {
        let handler: ReactionHandler = Arc::new(move |ctx, event| handler(ctx, event).boxed());
        *self.inner.reaction_handler.write() = Some(handler);
    }

    /// Registers a handler for `command`; matching is case-insensitive and the last registration wins.
    pub fn on_app_mention_command<F, Fut>(&self, command: &str, handler: F)
    where
        F: Fn(Context, MentionCommand, ChatClient, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Void> + Send + 'static,
    {
        let handler: MentionCommandHandler = Arc::new(move |ctx, mention, chat, args| handler(ctx, mention, chat, args).boxed());
        let command = command.to_lowercase();

        debug!("Registered mention command `{}`.", command);

        self.inner.commands.write().insert(command, handler);
    }

    /// Whether a handler is registered for `command` (case-insensitive).
    pub fn has_command(&self, command: &str) -> bool {
        self.inner.commands.read().contains_key(&command.to_lowercase())
    }

    /// The registered command verbs, sorted.
    pub fn commands(&self) -> Vec<String> {
        let mut commands: Vec<String> = self.inner.commands.read().keys().cloned().collect();
        commands.sort();
        commands
    }

    /// Classifies `envelope` and invokes at most one handler for it.
    #[instrument(name = "Router::dispatch", skip_all)]
    pub async fn dispatch(&self, ctx: &Context, envelope: &Envelope) -> Result<(), DispatchError> {
        match classifier::classify(ctx, envelope)? {
            ClassifiedEvent::Reaction(event) => {
                let handler = self.inner.reaction_handler.read().clone();

                match handler {
                    Some(handler) => handler(ctx.clone(), event).await.map_err(DispatchError::handler),
                    None => {
                        debug!("No reaction handler registered, ignoring.");
                        Ok(())
                    }
                }
            }
            ClassifiedEvent::Mention(command) => {
                let handler = self.inner.commands.read().get(&command.command).cloned();

                let Some(handler) = handler else {
                    info!("No handler for command `{}`, sending help.", command.command);
                    return self.send_help(&command.channel).await.map_err(DispatchError::help);
                };

                let channel = command.channel.clone();
                let args = command.args.clone();

                handler(ctx.clone(), command, self.inner.chat.clone(), args)
                    .await
                    .map_err(|e| DispatchError::handler(e).with_channel(channel))
            }
        }
    }

    /// Posts the help text to `channel`.
    #[instrument(skip(self))]
    pub async fn send_help(&self, channel: &str) -> Void {
        self.inner.chat.send_message(channel, &self.inner.help_message).await
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("commands", &self.commands())
            .field("has_reaction_handler", &self.inner.reaction_handler.read().is_some())
            .finish()
    }
}

//! Demo commands registered by the `slack-router` binary.
//!
//! Applications embedding the router register their own; these exist so the
//! shipped binary does something useful out of the box.

use tracing::info;

use crate::{
    base::types::Void,
    interaction::{
        classifier::{MentionCommand, ReactionEvent},
        context::Context,
        router::Router,
    },
    service::chat::ChatClient,
};

/// Registers `ping`, `echo`, and a logging reaction handler.
pub fn register_builtin(router: &Router) {
    router.on_app_mention_command("ping", ping);

    let help_message = router.help_message().to_string();
    router.on_app_mention_command("echo", move |ctx, command, chat, args| echo(ctx, command, chat, args, help_message.clone()));

    router.on_reaction_added(log_reaction);
}

/// Replies `pong`.
async fn ping(_ctx: Context, command: MentionCommand, chat: ChatClient, _args: Vec<String>) -> Void {
    chat.send_message(&command.channel, "pong").await
}

/// Replies with its arguments, or with the help text when there are none.
async fn echo(_ctx: Context, command: MentionCommand, chat: ChatClient, args: Vec<String>, help_message: String) -> Void {
    let text = if args.is_empty() { help_message } else { args.join(" ") };

    chat.send_message(&command.channel, &text).await
}

async fn log_reaction(_ctx: Context, event: ReactionEvent) -> Void {
    info!("{} reacted with :{}: to a message by {}", event.user, event.reaction, event.item_user);
    Ok(())
}

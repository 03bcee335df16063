//! Inner-event classification.
//!
//! Turns an [`Envelope`] into a typed [`ClassifiedEvent`], or a [`ClassifyError`]
//! saying why it could not. Mentions are additionally split into a command verb
//! and its arguments.

use serde::Deserialize;
use tracing::instrument;

use super::{
    context::{self, Context},
    envelope::{APP_MENTION, Envelope, REACTION_ADDED},
    error::ClassifyError,
};

/// Payload of an `app_mention` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MentionPayload {
    pub user: String,
    pub channel: String,
    #[serde(default)]
    pub text: String,
}

/// Payload of a `reaction_added` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReactionPayload {
    pub user: String,
    pub reaction: String,
    #[serde(default)]
    pub item_user: String,
}

/// The typed form of a supported inner event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InnerPayload {
    Mention(MentionPayload),
    Reaction(ReactionPayload),
}

impl TryFrom<&Envelope> for InnerPayload {
    type Error = ClassifyError;

    fn try_from(envelope: &Envelope) -> Result<Self, Self::Error> {
        let kind = envelope.inner.kind.as_str();
        let malformed = |source| ClassifyError::MalformedPayload {
            inner_type: kind.to_string(),
            source,
        };

        match kind {
            APP_MENTION => MentionPayload::deserialize(&envelope.inner.data).map(Self::Mention).map_err(malformed),
            REACTION_ADDED => ReactionPayload::deserialize(&envelope.inner.data).map(Self::Reaction).map_err(malformed),
            _ => Err(ClassifyError::Unsupported {
                outer_type: envelope.outer_type.clone(),
                inner_type: kind.to_string(),
            }),
        }
    }
}

/// A mention that names a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionCommand {
    pub channel: String,
    pub user: String,
    /// The full mention text, as received.
    pub text: String,
    /// The command verb, lowercased.
    pub command: String,
    /// Everything after the verb.
    pub args: Vec<String>,
}

/// A reaction added to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub user: String,
    pub reaction: String,
    /// Author of the message that was reacted to.
    pub item_user: String,
}

/// Output of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedEvent {
    Mention(MentionCommand),
    Reaction(ReactionEvent),
}

/// Classifies `envelope`, recording what is known about it as tags on `ctx`.
///
/// Tags are written whatever the outcome; they never influence the result.
#[instrument(level = "debug", skip_all, fields(kind = %envelope.inner.kind))]
pub fn classify(ctx: &Context, envelope: &Envelope) -> Result<ClassifiedEvent, ClassifyError> {
    ctx.set_tag(context::TAG_OUTER_TYPE, envelope.outer_type.as_str());
    ctx.set_tag(context::TAG_INNER_TYPE, envelope.inner.kind.as_str());

    match InnerPayload::try_from(envelope)? {
        InnerPayload::Mention(payload) => {
            ctx.set_tag(context::TAG_USER, payload.user.as_str());
            ctx.set_tag(context::TAG_CHANNEL, payload.channel.as_str());
            ctx.set_tag(context::TAG_TEXT, payload.text.as_str());
            ctx.set_tag(
                context::TAG_DESCRIPTION,
                format!("{} mentioned the bot in {} with text {}", payload.user, payload.channel, payload.text),
            );

            parse_command(payload).map(ClassifiedEvent::Mention)
        }
        InnerPayload::Reaction(payload) => {
            ctx.set_tag(context::TAG_USER, payload.user.as_str());
            ctx.set_tag(context::TAG_REACTION, payload.reaction.as_str());
            ctx.set_tag(context::TAG_ITEM_USER, payload.item_user.as_str());
            ctx.set_tag(
                context::TAG_DESCRIPTION,
                format!("{} reacted with {} on {}'s message", payload.user, payload.reaction, payload.item_user),
            );

            Ok(ClassifiedEvent::Reaction(ReactionEvent {
                user: payload.user,
                reaction: payload.reaction,
                item_user: payload.item_user,
            }))
        }
    }
}

/// Splits the trimmed mention text on single spaces into `<marker> <verb> <args...>`.
///
/// Consecutive spaces yield empty tokens, which are kept as-is.
fn parse_command(payload: MentionPayload) -> Result<MentionCommand, ClassifyError> {
    let mut tokens = payload.text.trim().split(' ');

    let (Some(_marker), Some(verb)) = (tokens.next(), tokens.next()) else {
        return Err(ClassifyError::InvalidCommand { channel: payload.channel });
    };

    let command = verb.to_lowercase();
    let args = tokens.map(str::to_string).collect();

    Ok(MentionCommand {
        channel: payload.channel,
        user: payload.user,
        text: payload.text,
        command,
        args,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn mention(text: &str) -> Envelope {
        Envelope::event_callback(APP_MENTION, json!({ "user": "kanziw", "channel": "channel", "text": text }))
    }

    fn classify_mention(text: &str) -> Result<MentionCommand, ClassifyError> {
        match classify(&Context::default(), &mention(text))? {
            ClassifiedEvent::Mention(command) => Ok(command),
            other => panic!("expected a mention, got {other:?}"),
        }
    }

    #[test]
    fn single_token_is_invalid_command() {
        let err = classify_mention("kanziw").unwrap_err();

        assert!(matches!(err, ClassifyError::InvalidCommand { channel } if channel == "channel"));
    }

    #[test]
    fn blank_text_is_invalid_command() {
        for text in ["", "   ", "\t<@U0>  "] {
            assert!(matches!(classify_mention(text), Err(ClassifyError::InvalidCommand { .. })), "text: {text:?}");
        }
    }

    #[test]
    fn extracts_lowercased_verb_and_args() {
        let command = classify_mention("  <@U0> FOO bar Baz ").unwrap();

        assert_eq!(command.command, "foo");
        assert_eq!(command.args, vec!["bar", "Baz"]);
        assert_eq!(command.channel, "channel");
        assert_eq!(command.user, "kanziw");
        assert_eq!(command.text, "  <@U0> FOO bar Baz ");
    }

    #[test]
    fn verb_without_args() {
        let command = classify_mention("<@U0> Help").unwrap();

        assert_eq!(command.command, "help");
        assert!(command.args.is_empty());
    }

    #[test]
    fn tab_does_not_separate_tokens() {
        let err = classify_mention("<@U0>\tping").unwrap_err();

        assert!(matches!(err, ClassifyError::InvalidCommand { channel } if channel == "channel"));
    }

    #[test]
    fn double_space_yields_empty_verb() {
        let command = classify_mention("<@U0>  ping a").unwrap();

        assert_eq!(command.command, "");
        assert_eq!(command.args, vec!["ping", "a"]);
    }

    #[test]
    fn inner_space_runs_are_kept_in_args() {
        let command = classify_mention("<@U0> deploy api  now").unwrap();

        assert_eq!(command.command, "deploy");
        assert_eq!(command.args, vec!["api", "", "now"]);
    }

    #[test]
    fn classifies_reaction() {
        let envelope = Envelope::event_callback(REACTION_ADDED, json!({ "user": "U1", "reaction": "eyes", "item_user": "U2", "event_ts": "1.0" }));

        let event = classify(&Context::default(), &envelope).unwrap();

        assert_eq!(
            event,
            ClassifiedEvent::Reaction(ReactionEvent {
                user: "U1".to_string(),
                reaction: "eyes".to_string(),
                item_user: "U2".to_string(),
            })
        );
    }

    #[test]
    fn mismatched_payload_is_malformed() {
        let envelope = Envelope::event_callback(APP_MENTION, json!({ "reaction": "eyes" }));
        let err = classify(&Context::default(), &envelope).unwrap_err();
        assert!(matches!(err, ClassifyError::MalformedPayload { inner_type, .. } if inner_type == APP_MENTION));

        let envelope = Envelope::event_callback(REACTION_ADDED, json!("not an object"));
        let err = classify(&Context::default(), &envelope).unwrap_err();
        assert!(matches!(err, ClassifyError::MalformedPayload { inner_type, .. } if inner_type == REACTION_ADDED));
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        let envelope = Envelope::event_callback("pin_added", json!({}));

        let err = classify(&Context::default(), &envelope).unwrap_err();

        assert!(matches!(err, ClassifyError::Unsupported { inner_type, .. } if inner_type == "pin_added"));
    }

    #[test]
    fn records_tags_even_on_failure() {
        let ctx = Context::default();

        let _ = classify(&ctx, &mention("kanziw"));

        assert_eq!(ctx.tag(context::TAG_OUTER_TYPE).as_deref(), Some("event_callback"));
        assert_eq!(ctx.tag(context::TAG_INNER_TYPE).as_deref(), Some(APP_MENTION));
        assert_eq!(ctx.tag(context::TAG_CHANNEL).as_deref(), Some("channel"));
        assert_eq!(
            ctx.tag(context::TAG_DESCRIPTION).as_deref(),
            Some("kanziw mentioned the bot in channel with text kanziw")
        );

        let ctx = Context::default();
        let _ = classify(&ctx, &Envelope::event_callback("pin_added", json!({})));
        assert_eq!(ctx.tag(context::TAG_INNER_TYPE).as_deref(), Some("pin_added"));
        assert!(ctx.tag(context::TAG_DESCRIPTION).is_none());
    }

    #[test]
    fn describes_reaction() {
        let ctx = Context::default();
        let envelope = Envelope::event_callback(REACTION_ADDED, json!({ "user": "U1", "reaction": "eyes", "item_user": "U2" }));

        classify(&ctx, &envelope).unwrap();

        assert_eq!(ctx.tag(context::TAG_DESCRIPTION).as_deref(), Some("U1 reacted with eyes on U2's message"));
    }
}

//! Event envelopes as they come off the transport.
//!
//! An [`Envelope`] is the untyped, tagged wrapper the router consumes: an outer
//! type (e.g. `event_callback`) and an [`InnerEvent`] whose payload is still raw
//! JSON. Turning the payload into a typed value is the classifier's job.

use serde::Serialize;
use serde_json::Value;

use crate::base::types::Res;

/// Outer type Slack uses for Events API callbacks.
pub const EVENT_CALLBACK: &str = "event_callback";

/// Inner type tag of an app mention event.
pub const APP_MENTION: &str = "app_mention";

/// Inner type tag of a reaction added event.
pub const REACTION_ADDED: &str = "reaction_added";

/// Kind reported for bodies that carry no `type` tag.
pub const UNKNOWN: &str = "unknown";

/// One inbound event, as produced by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// The outer type tag.
    pub outer_type: String,
    /// The tagged inner event.
    pub inner: InnerEvent,
}

/// The inner event of an [`Envelope`].
#[derive(Debug, Clone, PartialEq)]
pub struct InnerEvent {
    /// The inner type tag (e.g. `app_mention`).
    pub kind: String,
    /// The raw payload, shaped according to `kind` (if the platform keeps its contract).
    pub data: Value,
}

impl Envelope {
    /// Creates an envelope from already separated parts.
    pub fn new(outer_type: impl Into<String>, kind: impl Into<String>, data: Value) -> Self {
        Self {
            outer_type: outer_type.into(),
            inner: InnerEvent { kind: kind.into(), data },
        }
    }

    /// Creates an Events API envelope (`event_callback`) with the given inner kind.
    pub fn event_callback(kind: impl Into<String>, data: Value) -> Self {
        Self::new(EVENT_CALLBACK, kind, data)
    }

    /// Builds an envelope from a platform event body whose JSON form carries a `type` tag.
    ///
    /// Slack's event callback bodies serialize this way, so this is the boundary
    /// conversion used by the Socket Mode client.
    pub fn from_event_body<E>(outer_type: impl Into<String>, body: &E) -> Res<Self>
    where
        E: Serialize + ?Sized,
    {
        let data = serde_json::to_value(body)?;
        let kind = data.get("type").and_then(Value::as_str).unwrap_or(UNKNOWN).to_string();

        Ok(Self::new(outer_type, kind, data))
    }

    /// Builds an envelope from a raw Events API callback object (`{"type": ..., "event": {...}}`).
    pub fn from_events_api_json(mut value: Value) -> Res<Self> {
        let outer_type = value.get("type").and_then(Value::as_str).unwrap_or(UNKNOWN).to_string();
        let event = value
            .get_mut("event")
            .map(Value::take)
            .ok_or_else(|| anyhow::anyhow!("Events API payload of type `{outer_type}` has no `event` field"))?;

        Self::from_event_body(outer_type, &event)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use slack_morphism::events::SlackEventCallbackBody;

    use super::*;
    use crate::interaction::{
        classifier::{ClassifiedEvent, ReactionEvent, classify},
        context::Context,
        error::ClassifyError,
    };

    #[derive(Serialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    enum Body {
        AppMention { user: String, channel: String, text: String },
    }

    #[test]
    fn lifts_type_tag_from_serialized_body() {
        let body = Body::AppMention {
            user: "U1".to_string(),
            channel: "C1".to_string(),
            text: "<@U0> ping".to_string(),
        };

        let envelope = Envelope::from_event_body(EVENT_CALLBACK, &body).unwrap();

        assert_eq!(envelope.outer_type, EVENT_CALLBACK);
        assert_eq!(envelope.inner.kind, APP_MENTION);
        assert_eq!(envelope.inner.data["channel"], "C1");
    }

    #[test]
    fn untagged_body_is_unknown() {
        let envelope = Envelope::from_event_body(EVENT_CALLBACK, &json!({ "user": "U1" })).unwrap();

        assert_eq!(envelope.inner.kind, UNKNOWN);
    }

    #[test]
    fn parses_events_api_callback() {
        let envelope = Envelope::from_events_api_json(json!({
            "type": "event_callback",
            "team_id": "T1",
            "event": {
                "type": "reaction_added",
                "user": "U1",
                "reaction": "thumbsup",
                "item_user": "U2",
            },
        }))
        .unwrap();

        assert_eq!(envelope.outer_type, EVENT_CALLBACK);
        assert_eq!(envelope.inner.kind, REACTION_ADDED);
        assert_eq!(envelope.inner.data["reaction"], "thumbsup");
    }

    fn slack_body(value: Value) -> SlackEventCallbackBody {
        serde_json::from_value(value).unwrap()
    }

    fn classify_slack_body(body: &SlackEventCallbackBody) -> Result<ClassifiedEvent, ClassifyError> {
        let envelope = Envelope::from_event_body(EVENT_CALLBACK, body).unwrap();
        classify(&Context::default(), &envelope)
    }

    #[test]
    fn classifies_slack_app_mention_body() {
        let body = slack_body(json!({
            "type": "app_mention",
            "user": "U1",
            "channel": "C1",
            "text": "<@U0> PING x",
            "ts": "1700000000.000100",
            "event_ts": "1700000000.000100",
        }));
        assert!(matches!(body, SlackEventCallbackBody::AppMention(_)));

        let Ok(ClassifiedEvent::Mention(command)) = classify_slack_body(&body) else {
            panic!("expected a mention command");
        };

        assert_eq!(command.command, "ping");
        assert_eq!(command.args, vec!["x"]);
        assert_eq!(command.channel, "C1");
        assert_eq!(command.user, "U1");
    }

    #[test]
    fn classifies_slack_reaction_added_body() {
        let body = slack_body(json!({
            "type": "reaction_added",
            "user": "U1",
            "reaction": "eyes",
            "item_user": "U2",
            "item": { "type": "message", "channel": "C1", "ts": "1700000000.000100" },
            "event_ts": "1700000000.000200",
        }));
        assert!(matches!(body, SlackEventCallbackBody::ReactionAdded(_)));

        let event = classify_slack_body(&body).unwrap();

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
    fn slack_app_mention_without_text_is_invalid_command() {
        let body = slack_body(json!({
            "type": "app_mention",
            "user": "U1",
            "channel": "C1",
            "ts": "1700000000.000100",
        }));
        assert!(matches!(body, SlackEventCallbackBody::AppMention(_)));

        let err = classify_slack_body(&body).unwrap_err();

        assert!(matches!(err, ClassifyError::InvalidCommand { channel } if channel == "C1"));
    }

    #[test]
    fn events_api_callback_without_event_fails() {
        assert!(Envelope::from_events_api_json(json!({ "type": "url_verification" })).is_err());
    }
}

//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc, time::Duration};

use anyhow::anyhow;
use serde::Deserialize;

use super::types::{Res, Void};

/// Default help text sent back when a mention carries no usable command.
fn default_help_message() -> String {
    "override help message required".to_string()
}

/// Configuration for the slack-router application.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared, immutable settings.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Settings as read from the config file and environment.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Slack app-level token used for Socket Mode (`SLACK_ROUTER_SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Slack bot token used for posting messages (`SLACK_ROUTER_SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// Help text posted to a channel when a mention has no command, or an unknown one (`SLACK_ROUTER_HELP_MESSAGE`).
    #[serde(default = "default_help_message")]
    pub help_message: String,
    /// Log every raw envelope at debug level (`SLACK_ROUTER_DEBUG`).
    #[serde(default)]
    pub debug: bool,
    /// Dispatch envelopes one at a time, in arrival order (`SLACK_ROUTER_SEQUENTIAL_DISPATCH`).
    ///
    /// When disabled (the default), every envelope is dispatched on its own task,
    /// so a slow handler never holds up the next message, but effects of different
    /// messages may interleave.
    #[serde(default)]
    pub sequential_dispatch: bool,
    /// Deadline, in seconds, attached to the context of every dispatched message (`SLACK_ROUTER_DISPATCH_TIMEOUT_SECS`).
    #[serde(default)]
    pub dispatch_timeout_secs: Option<u64>,
    /// Upper bound on dispatches running at once in concurrent mode (`SLACK_ROUTER_MAX_CONCURRENT_DISPATCHES`).
    ///
    /// Unset means no bound. Envelopes beyond the bound wait in the inbound queue.
    #[serde(default)]
    pub max_concurrent_dispatches: Option<usize>,
}

impl Config {
    /// Wraps already assembled settings.
    pub fn new(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }

    /// Loads settings from `explicit_path` (or `.hidden/config.toml`) and `SLACK_ROUTER_*` variables.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("SLACK_ROUTER"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Checks the values that cannot be expressed through serde defaults.
    pub fn validate(&self) -> Void {
        if self.slack_app_token.trim().is_empty() {
            return Err(anyhow!("Slack app token must be set."));
        }

        if self.slack_bot_token.trim().is_empty() {
            return Err(anyhow!("Slack bot token must be set."));
        }

        if self.help_message.trim().is_empty() {
            return Err(anyhow!("Help message must not be empty."));
        }

        if self.dispatch_timeout_secs == Some(0) {
            return Err(anyhow!("Dispatch timeout must be at least one second."));
        }

        if self.max_concurrent_dispatches == Some(0) {
            return Err(anyhow!("Concurrent dispatch limit must be at least one."));
        }

        Ok(())
    }

    /// The per-message dispatch deadline, if one is configured.
    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.dispatch_timeout_secs.map(Duration::from_secs)
    }

    /// Returns a copy with `sequential_dispatch` replaced.
    pub fn with_sequential_dispatch(&self, sequential: bool) -> Self {
        Self::new(ConfigInner {
            sequential_dispatch: sequential,
            ..(*self.inner).clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ConfigInner {
        ConfigInner {
            slack_app_token: "xapp-test".to_string(),
            slack_bot_token: "xoxb-test".to_string(),
            help_message: default_help_message(),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_complete_config() {
        let config = Config::new(valid());

        assert!(config.validate().is_ok());
        assert_eq!(config.dispatch_timeout(), None);
    }

    #[test]
    fn rejects_missing_tokens() {
        let config = Config::new(ConfigInner { slack_app_token: " ".to_string(), ..valid() });
        assert!(config.validate().is_err());

        let config = Config::new(ConfigInner { slack_bot_token: String::new(), ..valid() });
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_help_message() {
        let config = Config::new(ConfigInner { help_message: String::new(), ..valid() });

        assert!(config.validate().is_err());
    }

    #[test]
    fn converts_dispatch_timeout() {
        let config = Config::new(ConfigInner { dispatch_timeout_secs: Some(3), ..valid() });
        assert_eq!(config.dispatch_timeout(), Some(Duration::from_secs(3)));

        let config = Config::new(ConfigInner { dispatch_timeout_secs: Some(0), ..valid() });
        assert!(config.validate().is_err());
    }

    #[test]
    fn fills_defaults_when_deserializing() {
        let inner: ConfigInner = serde_json::from_value(serde_json::json!({
            "slack_app_token": "xapp-test",
            "slack_bot_token": "xoxb-test",
        }))
        .unwrap();

        assert_eq!(inner.help_message, "override help message required");
        assert!(!inner.debug);
        assert!(!inner.sequential_dispatch);
        assert_eq!(inner.dispatch_timeout_secs, None);
        assert_eq!(inner.max_concurrent_dispatches, None);
    }

    #[test]
    fn rejects_zero_concurrent_dispatches() {
        let config = Config::new(ConfigInner { max_concurrent_dispatches: Some(0), ..valid() });
        assert!(config.validate().is_err());

        let config = Config::new(ConfigInner { max_concurrent_dispatches: Some(8), ..valid() });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_sequential_dispatch() {
        let config = Config::new(ConfigInner { dispatch_timeout_secs: Some(5), ..valid() });

        let sequential = config.with_sequential_dispatch(true);

        assert!(sequential.sequential_dispatch);
        assert_eq!(sequential.dispatch_timeout(), Some(Duration::from_secs(5)));
        assert!(!config.sequential_dispatch);
    }
}

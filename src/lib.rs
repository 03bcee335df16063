//! Library root for `slack-router`.
//!
//! Slack-router is a small event-dispatch layer for Slack bots:
//! - Receives Events API envelopes over a Socket Mode connection
//! - Classifies app mentions and reactions into typed events
//! - Routes mentions to handlers by command verb, falling back to a help message
//! - Reports failures with enough context to answer in the originating channel
//!
//! The chat platform sits behind the `GenericChatClient` trait, so the router
//! can be driven by anything that produces envelopes and can send text.

#[deny(missing_docs)]
pub mod base;
pub mod commands;
pub mod interaction;
pub mod runtime;
pub mod service;

use anyhow::anyhow;
use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the slack-router runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with the Slack chat client and router
/// - Registers the demo commands
/// - Starts the main event loop for processing messages
pub async fn start(config: Config) -> Void {
    info!("Starting slack-router ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().map_err(|_| anyhow!("Failed to install the crypto provider."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    commands::register_builtin(&runtime.router);

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}

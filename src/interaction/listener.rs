//! The outer message loop.
//!
//! Envelopes arrive on a channel from the chat client. Each one gets its own
//! [`Context`], is dispatched through the [`Router`], and has its outcome
//! logged. Errors that know their originating channel are answered with the
//! help text; nothing is retried and no single failure stops the loop.

use std::{sync::Arc, time::Duration};

use tokio::sync::{Semaphore, mpsc};
use tracing::{Instrument, debug, error, info, instrument, warn};

use super::{context::Context, envelope::Envelope, error::DispatchError, router::Router};
use crate::base::config::Config;

/// How the listener schedules dispatches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenOptions {
    /// Dispatch one envelope at a time, in arrival order.
    ///
    /// Otherwise every envelope runs on its own task; a slow handler then never
    /// delays the next envelope, but effects of different envelopes may interleave.
    pub sequential: bool,
    /// Deadline attached to every dispatch context.
    pub timeout: Option<Duration>,
    /// Log each raw envelope at debug level.
    pub debug: bool,
    /// Maximum number of concurrent dispatches; `None` spawns one task per envelope without bound.
    ///
    /// The inbound channel is unbounded either way, so envelopes waiting for a
    /// slot queue up there.
    pub max_in_flight: Option<usize>,
}

impl From<&Config> for ListenOptions {
    fn from(config: &Config) -> Self {
        Self {
            sequential: config.sequential_dispatch,
            timeout: config.dispatch_timeout(),
            debug: config.debug,
            max_in_flight: config.max_concurrent_dispatches,
        }
    }
}

/// Consumes envelopes until every sender has been dropped.
///
/// In concurrent mode, dispatches still in flight when the channel closes are
/// awaited before returning.
#[instrument(name = "listen", skip_all, fields(sequential = options.sequential, max_in_flight = ?options.max_in_flight))]
pub async fn listen(router: Router, mut envelopes: mpsc::UnboundedReceiver<Envelope>, options: ListenOptions) {
    info!("Listening for events ...");

    let mut in_flight = tokio::task::JoinSet::new();
    let slots = options.max_in_flight.map(|n| Arc::new(Semaphore::new(n)));

    while let Some(envelope) = envelopes.recv().await {
        if options.sequential {
            let _ = handle_envelope(&router, envelope, options).await;
            continue;
        }

        // Wait for a free slot before spawning.
        let permit = match &slots {
            Some(slots) => match slots.clone().acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(e) => {
                    error!("Dispatch slots unavailable: {}", e);
                    break;
                }
            },
            None => None,
        };

        let router = router.clone();
        in_flight.spawn(async move {
            let _ = handle_envelope(&router, envelope, options).await;
            drop(permit);
        });

        // Reap finished dispatches so the set does not grow without bound.
        while let Some(joined) = in_flight.try_join_next() {
            if let Err(e) = joined {
                error!("Dispatch task failed: {}", e);
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!("Dispatch task failed: {}", e);
        }
    }

    info!("Event stream closed.");
}

/// Dispatches a single envelope, logs the outcome, and runs the help recovery when the error allows it.
///
/// Returns the dispatch result (after recovery has been attempted).
pub async fn handle_envelope(router: &Router, envelope: Envelope, options: ListenOptions) -> Result<(), DispatchError> {
    let mut ctx = Context::for_event();
    if let Some(timeout) = options.timeout {
        ctx = ctx.with_timeout(timeout);
    }

    let span = ctx.span().clone();

    async move {
        if options.debug {
            debug!("Dispatching envelope: {:#?}", envelope);
        }

        let result = router.dispatch(&ctx, &envelope).await;
        let tags = ctx.tags();

        match &result {
            Ok(()) => info!(?tags, "succeeded"),
            Err(e) => {
                if e.is_malformed_payload() {
                    error!(?tags, error = %e, "Received a payload that does not match its event type.");
                } else {
                    warn!(?tags, error = %e, "Dispatch failed.");
                }

                if let Some(channel) = e.channel()
                    && let Err(help_err) = router.send_help(channel).await
                {
                    error!(error = %help_err, "Failed to send help message.");
                }
            }
        }

        result
    }
    .instrument(span)
    .await
}

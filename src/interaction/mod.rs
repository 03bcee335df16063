//! Event handling and user interactions for slack-router.
//!
//! This module turns inbound platform events into handler calls:
//! - Wrapping raw events in envelopes and classifying them into typed events
//! - Routing mentions by command verb, and reactions to their handler
//! - Running the message loop that dispatches, logs, and recovers with help text

pub mod classifier;
pub mod context;
pub mod envelope;
pub mod error;
pub mod listener;
pub mod router;

//! Webhook dispatch for triggers (§4.6): a [`Trigger`] wraps a
//! [`tycostream_core::View`] and turns its synthetic INSERT/DELETE transitions into
//! MATCH/UNMATCH envelope deliveries via a [`WebhookSink`].

#![warn(clippy::all, clippy::pedantic)]
#![forbid(unsafe_code)]

mod envelope;
mod sink;
mod trigger;

pub use envelope::WebhookEnvelope;
pub use sink::{ReqwestWebhookSink, RetryConfig, WebhookSink};
pub use trigger::Trigger;

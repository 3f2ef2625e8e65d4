//! Queue client: publish and consume job envelopes over a durable queue.
//!
//! Delivery is at-least-once. Each worker opens its own [`DeliveryStream`]
//! and settles every [`Delivery`] it receives exactly once, with
//! [`Delivery::ack`], [`Delivery::nak`] or [`Delivery::reject`].

mod config;
mod error;
mod nats;
mod traits;

pub use config::QueueConfig;
pub use error::QueueError;
pub use nats::NatsJobQueue;
pub use traits::{Acknowledger, Delivery, DeliveryStream, JobQueue};

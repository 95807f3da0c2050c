//! Dealroom domain events.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DomainEvent`]: the event envelope published after every NDA and
//!   document mutation.
//! - [`EventLogger`]: background subscriber that records every event in the
//!   structured log. Notification delivery hooks in at the same place.

pub mod bus;
pub mod logger;
pub mod types;

pub use bus::{DomainEvent, EventBus};
pub use logger::EventLogger;

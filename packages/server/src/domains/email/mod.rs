//! Email domain - the outbox
//!
//! Anything that wants mail sent logs a `QueueEmail`. [`EmailCommands`]
//! validates it on the way into the log; the [`Mailer`] consumer folds the
//! log into an [`Outbox`], hands queued mail to the transport on every tick
//! and logs the outcome as `SetEmailDeliveryStatus`.
//!
//! Delivery is at-least-once. Retry counters live only in the running
//! mailer and start over after a restart.

pub mod commands;
pub mod errors;
pub mod mailer;
pub mod models;
pub mod module;

pub use errors::EmailError;
pub use mailer::Mailer;
pub use models::{DeliveryStatus, Email, Outbox};
pub use module::EmailCommands;

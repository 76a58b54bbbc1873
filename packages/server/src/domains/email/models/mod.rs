pub mod outbox;

pub use outbox::{DeliveryStatus, Email, Outbox};

// Domain modules, each owning its commands, queries and derived state
pub mod auth;
pub mod content;
pub mod email;
pub mod notifier;

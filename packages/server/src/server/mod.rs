// Process setup: module mounting and background consumers
pub mod app;

pub use app::*;

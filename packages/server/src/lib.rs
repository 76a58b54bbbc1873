// Commons - link sharing and threaded discussion on an append-only command log
//
// Every state change is a command appended to the log. Modules fold the log
// into in-memory state and answer queries from it; consumers follow the log
// in the background to send email and fetch link previews.
//
// Domains are organized per-domain in domains/*; the request shell in shell/
// turns generic requests into typed commands and queries.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;
pub mod shell;

pub use config::*;

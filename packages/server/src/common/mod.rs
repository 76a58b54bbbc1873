// Commands, queries and the dispatcher type shared across the application

pub mod commands;
pub mod queries;

pub use commands::{command_codec, command_registry, Command};
pub use queries::{Query, QueryResult};

/// The dispatcher over this application's command and query sets.
pub type CommonsApp = ledger::App<Command, Query, QueryResult>;
pub type CommonsAppBuilder = ledger::AppBuilder<Command, Query, QueryResult>;

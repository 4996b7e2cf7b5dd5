//! Subcommand implementations.

pub mod account;
pub mod browse;
pub mod library;
pub mod watch;

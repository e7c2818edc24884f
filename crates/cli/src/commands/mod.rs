//! Non-interactive subcommands.

pub mod list;
pub mod run;

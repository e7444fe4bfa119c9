//! Tooling & Integration Layer
//!
//! Command-line front end over the timeline and photo stores.

pub mod cli;

pub use cli::{Cli, CliContext, Commands, PhotoCommands};

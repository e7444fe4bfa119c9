//! Timeline CLI Binary
//!
//! Command-line interface for the timeline and photo stores.

use clap::Parser;
use std::process;
use timeline::logging::init_logging;
use timeline::tooling::cli::{command_name, Cli, CliContext};
use timeline::views;

fn main() {
    let cli = Cli::parse();

    // Load config and build the stores
    let context = match CliContext::new(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing: {}", e);
            println!("{}", views::error_json(&e.to_string()));
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(context.logging_config()) {
        eprintln!("Error initializing logging: {}", e);
    }

    // Execute command
    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output.trim_end());
        }
        Err(e) => {
            tracing::error!(command = command_name(&cli.command), "Command failed: {}", e);
            println!("{}", views::error_json(&e.to_string()));
            process::exit(1);
        }
    }
}

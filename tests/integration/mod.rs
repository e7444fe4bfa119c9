//! Integration tests for the timeline and photo stores

mod cli_commands;
mod photo_store;
mod store_integration;
mod support;

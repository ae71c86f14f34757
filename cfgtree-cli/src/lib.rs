//! Library exports for cfgtree-cli.
//!
//! This module exports the CLI structure so the binary, the integration
//! tests and documentation tooling share one definition.

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

// Re-export CLI for the binary and tests
pub use cli::Cli;

//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `check`: Check override scripts for syntax errors
//! - `show`: Print the parsed statements of an override script
//! - `completions`: Generate shell completion scripts

pub mod check;
pub mod completions;
pub mod show;

pub use check::CheckCommand;
pub use completions::CompletionsCommand;
pub use show::ShowCommand;

//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{CheckCommand, CompletionsCommand, ShowCommand};
use clap::{Parser, Subcommand};

/// Command-line tool for inspecting cfgtree override scripts.
#[derive(Parser)]
#[command(name = "cfgtree")]
#[command(version, about = "Check and inspect cfgtree override scripts", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Check override scripts for syntax errors
    Check(CheckCommand),

    /// Print the parsed statements of an override script
    Show(ShowCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}

//! Main entry point for the cfgtree CLI.
//!
//! This is the command-line interface for cfgtree override scripts:
//! - `check`: Check override scripts for syntax errors
//! - `show`: Print the parsed statements of an override script
//! - `completions`: Generate shell completion scripts

use cfgtree_cli::cli::{Cli, Command};
use cfgtree_cli::utils::GlobalOptions;
use clap::Parser;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Route library logging through the stderr logger
    let logger = cfgtree::init_logger(cli.verbose, cli.quiet);
    if let Err(e) = logger.install() {
        eprintln!("Warning: logging disabled: {e}");
    }

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    // Execute the command
    let result = match cli.command {
        Command::Check(cmd) => cmd.execute(&global),
        Command::Show(cmd) => cmd.execute(&global),
        Command::Completions(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

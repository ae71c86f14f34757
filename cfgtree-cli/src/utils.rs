//! Utility functions for CLI operations.

use crate::error::CliError;
use cfgtree::script::{parse, Script};
use std::fs;
use std::path::Path;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,
}

/// Read an override script, rejecting paths that are not regular files.
pub fn read_script(path: &Path) -> Result<String, CliError> {
    if !path.exists() {
        return Err(CliError::InvalidArguments(format!(
            "File not found: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(CliError::InvalidArguments(format!(
            "Not a file: {}",
            path.display()
        )));
    }
    Ok(fs::read_to_string(path)?)
}

/// Read and parse an override script.
pub fn parse_script(path: &Path) -> Result<Script, CliError> {
    let text = read_script(path)?;
    log::debug!("parsing {} ({} bytes)", path.display(), text.len());
    Ok(parse(&text)?)
}

/// Render a library error for a script, prefixing syntax errors with
/// `file:line:column` the way compilers do.
pub fn describe_error(path: &Path, error: &cfgtree::Error) -> String {
    match error {
        cfgtree::Error::Syntax {
            line,
            column,
            message,
        } => format!("{}:{line}:{column}: {message}", path.display()),
        other => format!("{}: {other}", path.display()),
    }
}

//! Command to check override scripts for syntax errors.

use crate::error::CliError;
use crate::utils::{describe_error, parse_script, GlobalOptions};
use clap::Args;
use std::path::PathBuf;

/// Check override scripts for syntax errors.
#[derive(Args)]
pub struct CheckCommand {
    /// Override scripts to check
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

impl CheckCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut failed = 0;

        for path in &self.files {
            match parse_script(path) {
                Ok(script) => {
                    if !global.quiet {
                        println!("{}: ok ({} statements)", path.display(), script.statements.len());
                    }
                }
                Err(CliError::Library(e)) => {
                    eprintln!("{}", describe_error(path, &e));
                    failed += 1;
                }
                // Missing or unreadable files abort the whole run
                Err(e) => return Err(e),
            }
        }

        if failed > 0 {
            return Err(CliError::SemanticFailure(format!(
                "{failed} of {} scripts failed to parse",
                self.files.len()
            )));
        }
        Ok(())
    }
}

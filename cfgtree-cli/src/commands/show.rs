//! Command to print the parsed statements of an override script.
//!
//! Useful for seeing how a script will be interpreted (which names it
//! imports, which fields it assigns, which configs it retargets) without
//! needing the config classes it refers to.

use crate::error::CliError;
use crate::utils::{parse_script, GlobalOptions};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Print the parsed statements of an override script.
#[derive(Args)]
pub struct ShowCommand {
    /// Override script to show
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

/// Output format for the show command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

impl ShowCommand {
    pub fn execute(self, _global: &GlobalOptions) -> Result<(), CliError> {
        let script = parse_script(&self.file)?;

        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&script)? + "\n",
            OutputFormat::Yaml => serde_yaml::to_string(&script)?,
        };
        print!("{rendered}");

        Ok(())
    }
}

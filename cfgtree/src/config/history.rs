//! Per-instance assignment history.

use std::fmt;
use std::fmt::Write as _;
use std::panic::Location;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::value::Value;

/// Where an assigned value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// The field's default, applied at instantiation.
    Default,
    /// A call in Rust code.
    Code {
        /// Source file.
        file: String,
        /// 1-based line.
        line: u32,
        /// 1-based column.
        column: u32,
    },
    /// A statement of an override script.
    Script {
        /// Label of the script, usually its path.
        source: String,
        /// 1-based line of the statement.
        line: usize,
    },
}

impl Provenance {
    /// Provenance for a Rust call site.
    #[must_use]
    pub fn code(location: &Location<'_>) -> Self {
        Self::Code {
            file: location.file().to_string(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("<default>"),
            Self::Code { file, line, column } => write!(f, "{file}:{line}:{column}"),
            Self::Script { source, line } => write!(f, "{source}:{line}"),
        }
    }
}

/// One recorded assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// The value after the assignment.
    pub value: Value,
    /// Where the assignment happened.
    pub provenance: Provenance,
    /// When it happened.
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub(crate) fn new(value: Value, provenance: Provenance) -> Self {
        Self {
            value,
            provenance,
            recorded_at: Utc::now(),
        }
    }
}

/// Renders the history of one field of `config` as a small table.
///
/// # Errors
///
/// Returns [`crate::Error::Attribute`] if the config has no such field.
///
/// # Examples
///
/// ```
/// use cfgtree::{format_history, ConfigClass, Dtype, Field};
///
/// let class = ConfigClass::builder("Simple")
///     .field("f", Field::scalar(Dtype::Float, "float").default(3.0).build().unwrap())
///     .build()
///     .unwrap();
/// let mut config = class.instantiate().unwrap();
/// config.set("f", 4.0).unwrap();
/// let table = format_history(&config, "f").unwrap();
/// assert!(table.contains("<default>"));
/// assert!(table.contains("4.0"));
/// ```
pub fn format_history(config: &Config, name: &str) -> Result<String> {
    let entries = config.history(name)?;
    let values: Vec<String> = entries.iter().map(|entry| entry.value.to_string()).collect();
    let width = values.iter().map(String::len).max().unwrap_or(0).max("value".len());

    let mut out = String::new();
    let _ = writeln!(out, "{}:", config.child_path(name));
    let _ = writeln!(out, "  {:<width$}  {:<20}  source", "value", "recorded at");
    for (entry, value) in entries.iter().zip(&values) {
        let _ = writeln!(
            out,
            "  {value:<width$}  {:<20}  {}",
            entry.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            entry.provenance
        );
    }
    Ok(out)
}

//! Error types for the cfgtree library.
//!
//! This module provides the error hierarchy shared by every operation in the
//! library, using `thiserror` for ergonomic error handling. Field-level
//! failures always carry the field's full path so that callers can surface
//! them without further context.

use thiserror::Error;

/// Result type alias for operations that may fail with a cfgtree error.
///
/// # Examples
///
/// ```
/// use cfgtree::{Error, Result};
///
/// fn example_operation() -> Result<i64> {
///     Ok(42)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the cfgtree library.
#[derive(Debug, Error)]
pub enum Error {
    /// A field-level contract was violated: wrong type, out of range,
    /// disallowed choice, bad length or key, or mutation after freeze.
    #[error("{kind} '{path}' failed validation: {message}")]
    FieldValidation {
        /// The field type, e.g. `RangeField`.
        kind: &'static str,
        /// Full path of the field relative to the root config.
        path: String,
        /// Qualified name of the config class owning the field.
        owner: String,
        /// A description of the failure.
        message: String,
    },

    /// A whole-object or construction-time check failed.
    #[error("{0}")]
    Value(String),

    /// A name used by an override script is not bound.
    #[error("name '{name}' is not defined (line {line})")]
    Name {
        /// The unresolved name.
        name: String,
        /// Script line where the name was used.
        line: usize,
    },

    /// An override script could not be parsed.
    #[error("invalid syntax at line {line}, column {column}: {message}")]
    Syntax {
        /// 1-based line number.
        line: usize,
        /// 1-based column number.
        column: usize,
        /// What the parser expected or found.
        message: String,
    },

    /// An override script imported a module the catalog does not know.
    #[error("no module named '{module}'")]
    Import {
        /// The module path that failed to resolve.
        module: String,
    },

    /// An attribute or field does not exist on its owner.
    #[error("'{owner}' has no attribute '{name}'")]
    Attribute {
        /// The object that was accessed.
        owner: String,
        /// The missing attribute.
        name: String,
    },

    /// An operation was applied to an object of the wrong kind.
    #[error("type error: {0}")]
    Type(String),

    /// A registry already holds an entry under this name.
    #[error("'{name}' is already registered in {registry}")]
    NameConflict {
        /// Description of the registry.
        registry: String,
        /// The conflicting name.
        name: String,
    },

    /// The external property-set provider cannot produce property sets.
    #[error("property set provider is not available: {0}")]
    PropertySetUnavailable(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML encoding or decoding failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Builds a whole-object validation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use cfgtree::Error;
    ///
    /// let err = Error::value("outer.i.f must be greater than 5");
    /// assert!(err.is_value_error());
    /// ```
    pub fn value(message: impl Into<String>) -> Self {
        Self::Value(message.into())
    }

    /// True for field validation failures and whole-object value errors.
    #[must_use]
    pub fn is_value_error(&self) -> bool {
        matches!(self, Self::FieldValidation { .. } | Self::Value(_))
    }

    /// True only for field-level validation failures.
    #[must_use]
    pub fn is_field_validation(&self) -> bool {
        matches!(self, Self::FieldValidation { .. })
    }

    /// The full field path of a field validation failure.
    #[must_use]
    pub fn field_path(&self) -> Option<&str> {
        match self {
            Self::FieldValidation { path, .. } => Some(path),
            _ => None,
        }
    }
}

//! The override-script protocol.
//!
//! Configs are saved as small Python-compatible scripts that assign every
//! value differing from the defaults, and loaded by executing such scripts
//! against an instance. A script is parsed completely before any statement
//! runs, so syntax errors never leave a config half-updated.
//!
//! ```text
//! import pkg.sub
//! config.c.retarget(pkg.sub.Sub)
//! # Inner.f
//! config.c.f=1.0
//! config.r.name='AAA'
//! config.r['AAA'].i=3
//! ```
//!
//! # Examples
//!
//! ```
//! use cfgtree::{ConfigClass, Dtype, Field, Value};
//!
//! let class = ConfigClass::builder("Simple")
//!     .field("f", Field::scalar(Dtype::Float, "float test").default(3.0).build().unwrap())
//!     .build()
//!     .unwrap();
//! let mut config = class.instantiate().unwrap();
//! config.set("f", 5.0).unwrap();
//!
//! let text = config.save_to_string().unwrap();
//! assert_eq!(text, "# float test\nconfig.f=5.0\n");
//!
//! let mut copy = class.instantiate().unwrap();
//! copy.load_from_str(&text).unwrap();
//! assert_eq!(copy.get("f").unwrap(), &Value::Float(5.0));
//! ```

mod ast;
mod catalog;
mod interp;
mod lexer;
mod parser;
mod writer;

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::config::class::is_identifier;
use crate::config::Config;
use crate::error::{Error, Result};

pub use ast::{Expr, ImportName, Script, Statement};
pub use catalog::TypeCatalog;
pub(crate) use catalog::record_defined;
pub use parser::parse;

/// Root name used when none is given.
pub const DEFAULT_ROOT: &str = "config";

fn check_root(root: &str) -> Result<()> {
    if is_identifier(root) {
        Ok(())
    } else {
        Err(Error::value(format!("'{root}' is not a valid root name")))
    }
}

/// Loads override scripts with explicit options.
///
/// The default catalog contains every class reachable from the target
/// config's class, then every other class built with a module in this
/// process (see [`TypeCatalog::for_loading`]). An explicit catalog replaces
/// both.
///
/// # Examples
///
/// ```
/// use cfgtree::{ConfigClass, Dtype, Field, Loader, Provenance, TypeCatalog, Value};
///
/// let class = ConfigClass::builder("Simple")
///     .module("pkg")
///     .field("i", Field::scalar(Dtype::Int, "int").optional(true).build().unwrap())
///     .build()
///     .unwrap();
/// let mut config = class.instantiate().unwrap();
///
/// Loader::new()
///     .root("root")
///     .catalog(TypeCatalog::reachable_from(&class))
///     .source("overrides.py")
///     .load_str(&mut config, "import pkg\nroot.i = 4\n")
///     .unwrap();
///
/// assert_eq!(config.get("i").unwrap(), &Value::Int(4));
/// let last = config.history("i").unwrap().last().unwrap();
/// assert_eq!(last.provenance, Provenance::Script { source: "overrides.py".into(), line: 2 });
/// ```
#[derive(Debug, Clone)]
pub struct Loader {
    root: String,
    catalog: Option<TypeCatalog>,
    source: Option<String>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    /// A loader with root name `config` and the default catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            catalog: None,
            source: None,
        }
    }

    /// Sets the name scripts use for the top-level config.
    #[must_use]
    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Sets the classes scripts may reference.
    #[must_use]
    pub fn catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Sets the label recorded in history entries.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Executes `text` against `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] before touching the config if the script
    /// does not parse. Otherwise execution stops at the first failing
    /// statement with [`Error::Name`], [`Error::Import`],
    /// [`Error::Attribute`], [`Error::Type`] or the field's own error;
    /// earlier statements stay applied.
    pub fn load_str(&self, config: &mut Config, text: &str) -> Result<()> {
        check_root(&self.root)?;
        let script = parse(text)?;
        let default_catalog;
        let catalog = match &self.catalog {
            Some(catalog) => catalog,
            None => {
                default_catalog = TypeCatalog::for_loading(config.class());
                &default_catalog
            }
        };
        let source = self.source.as_deref().unwrap_or("<string>");
        log::debug!(
            "loading {} statements from {source} into {}",
            script.statements.len(),
            config.class().qualified_name()
        );
        interp::Interpreter::new(&self.root, catalog, source).run(config, &script)
    }

    /// Reads and executes the script at `path`. The path is the default
    /// history label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, then as
    /// [`Loader::load_str`].
    pub fn load_path(&self, config: &mut Config, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        if self.source.is_some() {
            self.load_str(config, &text)
        } else {
            self.clone()
                .source(path.display().to_string())
                .load_str(config, &text)
        }
    }
}

impl Config {
    /// Writes the override script for this config to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on write failures.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_as(path, DEFAULT_ROOT)
    }

    /// Writes the override script to `path` using `root` as the top-level
    /// name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] for an invalid root name and [`Error::Io`]
    /// on write failures.
    pub fn save_as(&self, path: impl AsRef<Path>, root: &str) -> Result<()> {
        let path = path.as_ref();
        let text = self.save_to_string_as(root)?;
        fs::write(path, text)?;
        log::debug!("saved {} to {}", self.class().qualified_name(), path.display());
        Ok(())
    }

    /// Writes the override script to `writer`.
    ///
    /// # Errors
    ///
    /// Same as [`Config::save_as`].
    pub fn save_to_writer<W: Write>(&self, mut writer: W, root: &str) -> Result<()> {
        let text = self.save_to_string_as(root)?;
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// The override script as a string, with root name `config`.
    ///
    /// # Errors
    ///
    /// Fails only if a baseline instance cannot be built.
    pub fn save_to_string(&self) -> Result<String> {
        self.save_to_string_as(DEFAULT_ROOT)
    }

    /// The override script as a string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] for an invalid root name.
    pub fn save_to_string_as(&self, root: &str) -> Result<String> {
        check_root(root)?;
        writer::render(self, root)
    }

    /// Executes the override script at `path`.
    ///
    /// # Errors
    ///
    /// See [`Loader::load_path`].
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        Loader::new().load_path(self, path)
    }

    /// Executes the override script at `path`, which names the top-level
    /// config `root`.
    ///
    /// # Errors
    ///
    /// See [`Loader::load_path`].
    pub fn load_as(&mut self, path: impl AsRef<Path>, root: &str) -> Result<()> {
        Loader::new().root(root).load_path(self, path)
    }

    /// Reads an override script from `reader` and executes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if reading fails, then as [`Loader::load_str`].
    pub fn load_from_reader<R: Read>(&mut self, mut reader: R, root: &str) -> Result<()> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Loader::new().root(root).load_str(self, &text)
    }

    /// Executes an override script held in memory.
    ///
    /// # Errors
    ///
    /// See [`Loader::load_str`].
    pub fn load_from_str(&mut self, text: &str) -> Result<()> {
        Loader::new().load_str(self, text)
    }

    /// Executes an override script held in memory, which names the
    /// top-level config `root`.
    ///
    /// # Errors
    ///
    /// See [`Loader::load_str`].
    pub fn load_from_str_as(&mut self, text: &str, root: &str) -> Result<()> {
        Loader::new().root(root).load_str(self, text)
    }
}

//! Named registries of config-consuming targets.
//!
//! A [`Registry`] maps names to targets, each of which declares the config
//! class it consumes. Registries are shared by reference: cloning a
//! `Registry` or building a field from it with [`Registry::make_field`]
//! shares the same map, so entries registered later are visible
//! everywhere. Registries are expected to be populated during start-up and
//! read afterwards.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::config::ConfigClass;
use crate::error::{Error, Result};
use crate::field::{ConfigChoiceSpec, FieldBuilder, TypeMap};

/// Something that is configured by an instance of a config class.
pub trait Configurable: Send + Sync {
    /// The config class this target consumes.
    fn config_class(&self) -> Arc<ConfigClass>;

    /// Human-readable name used in diagnostics.
    fn describe(&self) -> String {
        self.config_class().qualified_name()
    }
}

impl Configurable for Arc<ConfigClass> {
    fn config_class(&self) -> Arc<ConfigClass> {
        Arc::clone(self)
    }
}

struct RegistryInner {
    doc: String,
    base: Arc<ConfigClass>,
    entries: RwLock<IndexMap<String, Arc<dyn Configurable>>>,
}

/// A shared, named catalog of [`Configurable`] targets.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cfgtree::{ConfigClass, Registry};
///
/// let base = ConfigClass::builder("Base").build().unwrap();
/// let registry = Registry::new("algorithms", &base);
/// let field = registry.make_field("the algorithm").default("A").build().unwrap();
///
/// // Registered after the field was built, still visible to it.
/// registry.register("A", Arc::clone(&base)).unwrap();
/// assert!(registry.register("A", Arc::clone(&base)).is_err());
/// assert_eq!(field.type_name(), "RegistryField");
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Creates an empty registry whose targets must consume `base` or a
    /// subclass of it.
    pub fn new(doc: impl Into<String>, base: &Arc<ConfigClass>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                doc: doc.into(),
                base: Arc::clone(base),
                entries: RwLock::new(IndexMap::new()),
            }),
        }
    }

    /// Registry documentation.
    #[must_use]
    pub fn doc(&self) -> &str {
        &self.inner.doc
    }

    /// The base config class of every target.
    #[must_use]
    pub fn base(&self) -> &Arc<ConfigClass> {
        &self.inner.base
    }

    pub(crate) fn describe(&self) -> String {
        format!("registry '{}'", self.inner.doc)
    }

    /// Adds `target` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameConflict`] if `name` is taken and
    /// [`Error::Value`] if the target's config class does not derive from the
    /// registry's base class.
    pub fn register(&self, name: impl Into<String>, target: impl Configurable + 'static) -> Result<()> {
        self.insert(name.into(), Arc::new(target), false)
    }

    /// Adds or replaces the target under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] if the target's config class does not derive
    /// from the registry's base class.
    pub fn register_override(
        &self,
        name: impl Into<String>,
        target: impl Configurable + 'static,
    ) -> Result<()> {
        self.insert(name.into(), Arc::new(target), true)
    }

    fn insert(&self, name: String, target: Arc<dyn Configurable>, replace: bool) -> Result<()> {
        let class = target.config_class();
        if !class.is_subclass_of(&self.inner.base) {
            return Err(Error::value(format!(
                "{} is not compatible with {}: config class {} does not derive from {}",
                target.describe(),
                self.describe(),
                class.qualified_name(),
                self.inner.base.qualified_name()
            )));
        }
        let mut entries = self.inner.entries.write();
        if !replace && entries.contains_key(&name) {
            return Err(Error::NameConflict {
                registry: self.describe(),
                name,
            });
        }
        log::debug!("registering {} as '{name}' in {}", target.describe(), self.describe());
        entries.insert(name, target);
        Ok(())
    }

    /// The target registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Configurable>> {
        self.inner.entries.read().get(name).cloned()
    }

    /// The config class of the target registered under `name`.
    #[must_use]
    pub fn class_of(&self, name: &str) -> Option<Arc<ConfigClass>> {
        self.get(name).map(|target| target.config_class())
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.entries.read().contains_key(name)
    }

    /// Registered names, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner.entries.read().keys().cloned().collect()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// Whether the registry has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    /// Starts a config choice field whose typemap is this registry.
    #[track_caller]
    pub fn make_field(&self, doc: impl Into<String>) -> FieldBuilder<ConfigChoiceSpec> {
        FieldBuilder::new(doc, ConfigChoiceSpec::new(TypeMap::Registry(self.clone())))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("doc", &self.inner.doc)
            .field("base", &self.inner.base.qualified_name())
            .field("names", &self.names())
            .finish()
    }
}

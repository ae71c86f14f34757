//! Classes that override scripts may reference by name.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;

use crate::config::ConfigClass;
use crate::error::{Error, Result};
use crate::field::FieldKind;

/// The set of config classes an override script can name, indexed by
/// qualified name, plus every module path they live in.
///
/// Classes without a module are reachable by their bare name.
///
/// # Examples
///
/// ```
/// use cfgtree::{ConfigClass, TypeCatalog};
///
/// let class = ConfigClass::builder("Simple").module("pkg.configs").build().unwrap();
/// let catalog = TypeCatalog::reachable_from(&class);
/// assert!(catalog.has_module("pkg"));
/// assert!(catalog.has_module("pkg.configs"));
/// assert!(catalog.get("pkg.configs.Simple").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    classes: IndexMap<String, Arc<ConfigClass>>,
    modules: IndexSet<String>,
}

/// Every class built with a module in this process.
static DEFINED: OnceLock<RwLock<TypeCatalog>> = OnceLock::new();

fn defined_table() -> &'static RwLock<TypeCatalog> {
    DEFINED.get_or_init(RwLock::default)
}

/// Lists a freshly built class in the process-wide catalog. A later class
/// with the same qualified name replaces the earlier one.
pub(crate) fn record_defined(class: &Arc<ConfigClass>) {
    if class.module().is_empty() {
        return;
    }
    defined_table()
        .write()
        .insert(class.qualified_name(), Arc::clone(class));
}

impl TypeCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every class reachable from `class`: its ancestors, the classes of
    /// its nested config fields and the typemaps of its config choice
    /// fields, transitively.
    #[must_use]
    pub fn reachable_from(class: &Arc<ConfigClass>) -> Self {
        let mut catalog = Self::new();
        catalog.add_reachable(class);
        catalog
    }

    /// A snapshot of every class built with a module so far in this
    /// process, the most recent definition winning per qualified name.
    #[must_use]
    pub fn defined() -> Self {
        defined_table().read().clone()
    }

    /// The catalog loads use when none is given: everything reachable from
    /// `class`, then every other class defined with a module.
    #[must_use]
    pub fn for_loading(class: &Arc<ConfigClass>) -> Self {
        let mut catalog = Self::reachable_from(class);
        for (name, defined) in &defined_table().read().classes {
            if !catalog.classes.contains_key(name) {
                catalog.insert(name.clone(), Arc::clone(defined));
            }
        }
        catalog
    }

    /// Adds `class` and everything reachable from it. Names already in the
    /// catalog keep their first class.
    pub fn add_reachable(&mut self, class: &Arc<ConfigClass>) {
        let mut seen = HashSet::new();
        let mut pending = vec![Arc::clone(class)];
        while let Some(class) = pending.pop() {
            if !seen.insert(Arc::as_ptr(&class)) {
                continue;
            }
            pending.extend(class.ancestors().iter().cloned());
            for field in class.fields().values() {
                match field.kind() {
                    FieldKind::Config(spec) => pending.push(Arc::clone(spec.class())),
                    FieldKind::ConfigChoice(spec) => {
                        let typemap = spec.typemap();
                        pending.extend(typemap.classes());
                        if let Some(registry) = typemap.registry() {
                            pending.push(Arc::clone(registry.base()));
                        }
                    }
                    _ => {}
                }
            }
            let qualified = class.qualified_name();
            if !self.classes.contains_key(&qualified) {
                self.insert(qualified, class);
            }
        }
    }

    /// Adds a single class.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameConflict`] when a different class is already
    /// listed under the same qualified name.
    pub fn add(&mut self, class: &Arc<ConfigClass>) -> Result<()> {
        let qualified = class.qualified_name();
        if let Some(existing) = self.classes.get(&qualified) {
            if Arc::ptr_eq(existing, class) {
                return Ok(());
            }
            return Err(Error::NameConflict {
                registry: "type catalog".to_string(),
                name: qualified,
            });
        }
        self.insert(qualified, Arc::clone(class));
        Ok(())
    }

    /// Builder-style [`TypeCatalog::add`].
    ///
    /// # Errors
    ///
    /// Same as [`TypeCatalog::add`].
    pub fn with(mut self, class: &Arc<ConfigClass>) -> Result<Self> {
        self.add(class)?;
        Ok(self)
    }

    fn insert(&mut self, qualified: String, class: Arc<ConfigClass>) {
        let module = class.module();
        if !module.is_empty() {
            let mut prefix = String::new();
            for part in module.split('.') {
                if !prefix.is_empty() {
                    prefix.push('.');
                }
                prefix.push_str(part);
                self.modules.insert(prefix.clone());
            }
        }
        self.classes.insert(qualified, class);
    }

    /// The class with qualified name `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<ConfigClass>> {
        self.classes.get(name)
    }

    /// A class declared without a module, by bare name.
    #[must_use]
    pub fn get_unqualified(&self, name: &str) -> Option<&Arc<ConfigClass>> {
        self.classes.get(name).filter(|class| class.module().is_empty())
    }

    /// Whether `module` or one of its submodules holds a listed class.
    #[must_use]
    pub fn has_module(&self, module: &str) -> bool {
        self.modules.contains(module)
    }

    /// Listed classes, in insertion order.
    pub fn classes(&self) -> impl Iterator<Item = &Arc<ConfigClass>> {
        self.classes.values()
    }

    /// Number of listed classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no class is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

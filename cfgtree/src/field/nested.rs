//! Fields holding config instances: nested configs and config choices.

use std::sync::Arc;

use indexmap::IndexMap;

use super::{FieldBuilder, FieldKind, FieldSpec};
use crate::config::ConfigClass;
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::value::Value;

/// Spec of a nested config field.
#[derive(Debug, Clone)]
pub struct NestedSpec {
    class: Arc<ConfigClass>,
}

impl NestedSpec {
    pub(crate) const fn new(class: Arc<ConfigClass>) -> Self {
        Self { class }
    }

    /// Declared class of the nested config.
    #[must_use]
    pub const fn class(&self) -> &Arc<ConfigClass> {
        &self.class
    }
}

impl FieldSpec for NestedSpec {
    fn into_kind(self) -> Result<FieldKind> {
        if self.class.is_mixin() {
            return Err(Error::value(format!(
                "ConfigField cannot hold mixin class {}",
                self.class.qualified_name()
            )));
        }
        Ok(FieldKind::Config(self))
    }
}

/// Names available to a config choice field and the class behind each.
///
/// A registry-backed typemap shares the registry's map, so entries
/// registered after the field was built are visible to it.
#[derive(Debug, Clone)]
pub enum TypeMap {
    /// A fixed mapping built with the field.
    Static(Arc<IndexMap<String, Arc<ConfigClass>>>),
    /// The live contents of a registry.
    Registry(Registry),
}

impl Default for TypeMap {
    fn default() -> Self {
        Self::Static(Arc::new(IndexMap::new()))
    }
}

impl TypeMap {
    /// Names in registration order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        match self {
            Self::Static(map) => map.keys().cloned().collect(),
            Self::Registry(registry) => registry.names(),
        }
    }

    /// Class registered under `name`.
    #[must_use]
    pub fn class_of(&self, name: &str) -> Option<Arc<ConfigClass>> {
        match self {
            Self::Static(map) => map.get(name).cloned(),
            Self::Registry(registry) => registry.class_of(name),
        }
    }

    /// Whether `name` is known.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::Static(map) => map.contains_key(name),
            Self::Registry(registry) => registry.contains(name),
        }
    }

    /// Every class in the typemap, in key order.
    #[must_use]
    pub fn classes(&self) -> Vec<Arc<ConfigClass>> {
        self.keys().iter().filter_map(|key| self.class_of(key)).collect()
    }

    /// The backing registry, if any.
    #[must_use]
    pub const fn registry(&self) -> Option<&Registry> {
        match self {
            Self::Static(_) => None,
            Self::Registry(registry) => Some(registry),
        }
    }
}

/// Spec of a config choice field.
#[derive(Debug, Clone)]
pub struct ConfigChoiceSpec {
    typemap: TypeMap,
    multi: bool,
    misuse: Option<String>,
}

impl ConfigChoiceSpec {
    pub(crate) const fn new(typemap: TypeMap) -> Self {
        Self {
            typemap,
            multi: false,
            misuse: None,
        }
    }

    /// The candidate names and classes.
    #[must_use]
    pub const fn typemap(&self) -> &TypeMap {
        &self.typemap
    }

    /// Whether several candidates may be selected at once.
    #[must_use]
    pub const fn is_multi(&self) -> bool {
        self.multi
    }

    pub(crate) const fn type_name(&self) -> &'static str {
        match self.typemap {
            TypeMap::Static(_) => "ConfigChoiceField",
            TypeMap::Registry(_) => "RegistryField",
        }
    }

    /// Checks the shape of a selection: a name, or a list of names when
    /// `multi`.
    pub(crate) fn check_type(&self, value: Value) -> std::result::Result<Value, String> {
        match (&value, self.multi) {
            (Value::Str(_), false) => Ok(value),
            (Value::List(items), true) if items.iter().all(|item| item.as_str().is_some()) => {
                Ok(value)
            }
            (_, false) => Err(format!(
                "Selection {value} is of incorrect type {}. Expected type str",
                value.type_name()
            )),
            (_, true) => Err(format!(
                "Selection {value} is of incorrect type {}. Expected a list of str",
                value.type_name()
            )),
        }
    }
}

impl FieldSpec for ConfigChoiceSpec {
    fn into_kind(self) -> Result<FieldKind> {
        if let Some(message) = self.misuse {
            return Err(Error::Value(message));
        }
        Ok(FieldKind::ConfigChoice(self))
    }
}

impl FieldBuilder<ConfigChoiceSpec> {
    /// Adds a candidate to a fixed typemap.
    pub fn entry(mut self, name: impl Into<String>, class: &Arc<ConfigClass>) -> Self {
        match &mut self.spec.typemap {
            TypeMap::Static(map) => {
                Arc::make_mut(map).insert(name.into(), Arc::clone(class));
            }
            TypeMap::Registry(registry) => {
                self.spec.misuse = Some(format!(
                    "cannot add entry '{}' to a field backed by {}",
                    name.into(),
                    registry.describe()
                ));
            }
        }
        self
    }

    /// Allows selecting several candidates at once.
    pub fn multi(mut self, multi: bool) -> Self {
        self.spec.multi = multi;
        self
    }
}

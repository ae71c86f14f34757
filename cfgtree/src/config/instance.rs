//! Config instances.

use std::panic::Location;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::choice::{candidate_path, ConfigChoice};
use crate::config::class::ConfigClass;
use crate::config::history::{HistoryEntry, Provenance};
use crate::error::{Error, Result};
use crate::field::{Field, FieldKind};
use crate::value::{Key, Value};

#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Value(Value),
    Config(Box<Config>),
    Choice(Box<ConfigChoice>),
}

/// Borrowed view of one field's current value.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    /// Scalar, list or dict value.
    Value(&'a Value),
    /// Nested config.
    Config(&'a Config),
    /// Config choice.
    Choice(&'a ConfigChoice),
}

/// An instance of a [`ConfigClass`].
///
/// Every mutation goes through the owning field's checks; values are never
/// exposed mutably. Nested configs and config choice candidates are owned by
/// their parent, so a config tree is always acyclic.
///
/// # Examples
///
/// ```
/// use cfgtree::{ConfigClass, Dtype, Field, Value};
///
/// let class = ConfigClass::builder("Simple")
///     .field("i", Field::scalar(Dtype::Int, "integer test").optional(true).build().unwrap())
///     .field("f", Field::scalar(Dtype::Float, "float test").default(3.0).build().unwrap())
///     .build()
///     .unwrap();
/// let mut config = class.instantiate().unwrap();
/// assert_eq!(config.get("f").unwrap(), &Value::Float(3.0));
/// assert!(config.set("f", "x").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    class: Arc<ConfigClass>,
    path: String,
    slots: IndexMap<String, Slot>,
    frozen: bool,
    history: IndexMap<String, Vec<HistoryEntry>>,
    imports: IndexSet<String>,
}

pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

impl Config {
    /// Instantiates `class` as a root config.
    ///
    /// # Errors
    ///
    /// See [`ConfigClass::instantiate`].
    pub fn new(class: &Arc<ConfigClass>) -> Result<Self> {
        Self::with_path(class, String::new())
    }

    pub(crate) fn with_path(class: &Arc<ConfigClass>, path: String) -> Result<Self> {
        if class.is_mixin() {
            return Err(Error::Type(format!(
                "{} is a mixin and cannot be instantiated",
                class.qualified_name()
            )));
        }
        let owner = class.qualified_name();
        let mut slots = IndexMap::with_capacity(class.fields().len());
        let mut history = IndexMap::new();
        for (name, field) in class.fields() {
            let child = join_path(&path, name);
            let slot = match field.kind() {
                FieldKind::Config(spec) => {
                    Slot::Config(Box::new(Self::with_path(spec.class(), child)?))
                }
                FieldKind::ConfigChoice(_) => {
                    Slot::Choice(Box::new(ConfigChoice::new(field, &owner, child)?))
                }
                _ => {
                    let value = field.initial_value(&child, &owner)?;
                    history.insert(
                        name.clone(),
                        vec![HistoryEntry::new(value.clone(), Provenance::Default)],
                    );
                    Slot::Value(value)
                }
            };
            slots.insert(name.clone(), slot);
        }

        let mut config = Self {
            class: Arc::clone(class),
            path,
            slots,
            frozen: false,
            history,
            imports: IndexSet::new(),
        };
        for ancestor in class.hook_order() {
            if let Some(hook) = ancestor.set_defaults_hook() {
                hook(&mut config)?;
            }
        }
        Ok(config)
    }

    /// The instance's class.
    #[must_use]
    pub const fn class(&self) -> &Arc<ConfigClass> {
        &self.class
    }

    /// Location relative to the root config; empty for the root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether [`Config::freeze`] has been called.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Modules imported by the last loaded override script.
    #[must_use]
    pub const fn imports(&self) -> &IndexSet<String> {
        &self.imports
    }

    pub(crate) fn add_import(&mut self, module: &str) {
        self.imports.insert(module.to_string());
    }

    pub(crate) fn child_path(&self, name: &str) -> String {
        join_path(&self.path, name)
    }

    /// The descriptor of field `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attribute`] for unknown names.
    pub fn field(&self, name: &str) -> Result<&Arc<Field>> {
        self.class.field(name).ok_or_else(|| Error::Attribute {
            owner: self.class.qualified_name(),
            name: name.to_string(),
        })
    }

    /// Field names in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Field names with their current values.
    pub fn items(&self) -> impl Iterator<Item = (&str, FieldValue<'_>)> {
        self.slots
            .iter()
            .map(|(name, slot)| (name.as_str(), slot_view(slot)))
    }

    /// Whether the class has a field called `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    fn slot(&self, name: &str) -> Result<&Slot> {
        self.slots.get(name).ok_or_else(|| Error::Attribute {
            owner: self.class.qualified_name(),
            name: name.to_string(),
        })
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut Slot> {
        let owner = self.class.qualified_name();
        self.slots.get_mut(name).ok_or_else(|| Error::Attribute {
            owner,
            name: name.to_string(),
        })
    }

    /// The current value of field `name`, whatever its kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attribute`] for unknown names.
    pub fn field_value(&self, name: &str) -> Result<FieldValue<'_>> {
        self.slot(name).map(slot_view)
    }

    /// The value of a scalar, list or dict field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attribute`] for unknown names and [`Error::Type`]
    /// for nested config and config choice fields.
    pub fn get(&self, name: &str) -> Result<&Value> {
        match self.slot(name)? {
            Slot::Value(value) => Ok(value),
            Slot::Config(_) => Err(Error::Type(format!(
                "field '{}' holds a config; use nested()",
                self.child_path(name)
            ))),
            Slot::Choice(_) => Err(Error::Type(format!(
                "field '{}' holds a config choice; use choice()",
                self.child_path(name)
            ))),
        }
    }

    /// The nested config of a config field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attribute`] for unknown names and [`Error::Type`]
    /// for other field kinds.
    pub fn nested(&self, name: &str) -> Result<&Config> {
        match self.slot(name)? {
            Slot::Config(config) => Ok(config),
            _ => Err(self.not_a(name, "config field")),
        }
    }

    /// Mutable access to the nested config of a config field.
    ///
    /// # Errors
    ///
    /// Same as [`Config::nested`].
    pub fn nested_mut(&mut self, name: &str) -> Result<&mut Config> {
        let err = self.not_a(name, "config field");
        match self.slot_mut(name)? {
            Slot::Config(config) => Ok(config),
            _ => Err(err),
        }
    }

    /// The value of a config choice field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attribute`] for unknown names and [`Error::Type`]
    /// for other field kinds.
    pub fn choice(&self, name: &str) -> Result<&ConfigChoice> {
        match self.slot(name)? {
            Slot::Choice(choice) => Ok(choice),
            _ => Err(self.not_a(name, "config choice field")),
        }
    }

    /// Mutable access to a config choice field.
    ///
    /// # Errors
    ///
    /// Same as [`Config::choice`].
    pub fn choice_mut(&mut self, name: &str) -> Result<&mut ConfigChoice> {
        let err = self.not_a(name, "config choice field");
        match self.slot_mut(name)? {
            Slot::Choice(choice) => Ok(choice),
            _ => Err(err),
        }
    }

    fn not_a(&self, name: &str, what: &str) -> Error {
        Error::Type(format!("field '{}' is not a {what}", self.child_path(name)))
    }

    /// Assigns a field.
    ///
    /// Scalar, list and dict fields are checked against every constraint of
    /// their descriptor. For a config choice field the value is the new
    /// selection. Each successful assignment is recorded in the field's
    /// history with the caller's location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attribute`] for unknown names and
    /// [`Error::FieldValidation`] when the config is frozen or the value is
    /// rejected; the stored value is left unchanged.
    #[track_caller]
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let provenance = Provenance::code(Location::caller());
        self.set_with_provenance(name, value.into(), provenance)
    }

    pub(crate) fn set_with_provenance(
        &mut self,
        name: &str,
        value: Value,
        provenance: Provenance,
    ) -> Result<()> {
        let field = Arc::clone(self.field(name)?);
        let path = self.child_path(name);
        let owner = self.class.qualified_name();
        self.check_not_frozen(&field, &path, &owner)?;
        match self.slot_mut(name)? {
            Slot::Value(slot) => {
                let value = field.assign(value, &path, &owner)?;
                if let Some(message) = field.deprecated() {
                    log::warn!("Config field {path} is deprecated: {message}");
                }
                slot.clone_from(&value);
                self.history
                    .entry(name.to_string())
                    .or_default()
                    .push(HistoryEntry::new(value, provenance));
                Ok(())
            }
            Slot::Choice(choice) => choice.set_with_provenance(value, provenance),
            Slot::Config(_) => Err(field.error(
                &path,
                &owner,
                "Cannot assign a value to a config field; use retarget or set_config",
            )),
        }
    }

    fn check_not_frozen(&self, field: &Field, path: &str, owner: &str) -> Result<()> {
        if self.frozen && !field.is_mutable_after_freeze() {
            return Err(field.error(path, owner, "Cannot modify a frozen Config"));
        }
        Ok(())
    }

    /// Replaces the nested config of a config field with `config`, whose
    /// class must be the declared class or derive from it.
    ///
    /// # Errors
    ///
    /// Fails when frozen, when `name` is not a config field, or when the
    /// class is incompatible.
    #[track_caller]
    pub fn set_config(&mut self, name: &str, config: Config) -> Result<()> {
        let provenance = Provenance::code(Location::caller());
        self.set_config_with_provenance(name, config, provenance)
    }

    /// Replaces the nested config of a config field with a fresh default
    /// instance of `class`.
    ///
    /// # Errors
    ///
    /// Same as [`Config::set_config`], plus instantiation errors.
    #[track_caller]
    pub fn retarget(&mut self, name: &str, class: &Arc<ConfigClass>) -> Result<()> {
        let provenance = Provenance::code(Location::caller());
        self.retarget_with_provenance(name, class, provenance)
    }

    pub(crate) fn retarget_with_provenance(
        &mut self,
        name: &str,
        class: &Arc<ConfigClass>,
        provenance: Provenance,
    ) -> Result<()> {
        let config = Self::with_path(class, self.child_path(name))?;
        self.set_config_with_provenance(name, config, provenance)
    }

    fn set_config_with_provenance(
        &mut self,
        name: &str,
        mut config: Config,
        provenance: Provenance,
    ) -> Result<()> {
        let field = Arc::clone(self.field(name)?);
        let path = self.child_path(name);
        let owner = self.class.qualified_name();
        self.check_not_frozen(&field, &path, &owner)?;
        let FieldKind::Config(spec) = field.kind() else {
            return Err(self.not_a(name, "config field"));
        };
        if !config.class.is_subclass_of(spec.class()) {
            return Err(field.error(
                &path,
                &owner,
                format!(
                    "{} is not a subclass of {}",
                    config.class.qualified_name(),
                    spec.class().qualified_name()
                ),
            ));
        }
        config.set_path(path);
        let recorded = Value::Str(config.class.qualified_name());
        if let Slot::Config(slot) = self.slot_mut(name)? {
            **slot = config;
        }
        self.history
            .entry(name.to_string())
            .or_default()
            .push(HistoryEntry::new(recorded, provenance));
        Ok(())
    }

    /// Assignment history of field `name`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attribute`] for unknown names.
    pub fn history(&self, name: &str) -> Result<&[HistoryEntry]> {
        match self.slot(name)? {
            Slot::Choice(choice) => Ok(choice.history()),
            _ => Ok(self.history.get(name).map(Vec::as_slice).unwrap_or_default()),
        }
    }

    /// Locks this config and, recursively, every nested config and every
    /// config choice candidate, selected or not. Fields marked
    /// `mutable_after_freeze` stay assignable.
    pub fn freeze(&mut self) {
        self.frozen = true;
        for slot in self.slots.values_mut() {
            match slot {
                Slot::Config(config) => config.freeze(),
                Slot::Choice(choice) => choice.freeze(),
                Slot::Value(_) => {}
            }
        }
    }

    pub(crate) fn set_path(&mut self, path: String) {
        for (name, slot) in &mut self.slots {
            let child = join_path(&path, name);
            match slot {
                Slot::Config(config) => config.set_path(child),
                Slot::Choice(choice) => choice.set_path(child),
                Slot::Value(_) => {}
            }
        }
        self.path = path;
    }

    /// Nested mapping of the current values.
    ///
    /// Config choice fields become `{name|names, values}` where `values`
    /// only holds the selected candidates. Deprecated fields still at their
    /// default are left out.
    #[must_use]
    pub fn to_dict(&self) -> IndexMap<String, Value> {
        let mut out = IndexMap::with_capacity(self.slots.len());
        for (name, field) in self.class.fields() {
            let Some(slot) = self.slots.get(name) else {
                continue;
            };
            let value = match slot {
                Slot::Value(value) => {
                    if field.deprecated().is_some() && value == field.default_value() {
                        continue;
                    }
                    value.clone()
                }
                Slot::Config(config) => config.to_dict_value(),
                Slot::Choice(choice) => choice.to_dict_value(),
            };
            out.insert(name.clone(), value);
        }
        out
    }

    pub(crate) fn to_dict_value(&self) -> Value {
        Value::Dict(
            self.to_dict()
                .into_iter()
                .map(|(name, value)| (Key::Str(name), value))
                .collect(),
        )
    }

    /// Every leaf name in dotted form: plain fields, nested fields, and for
    /// config choices the selection plus every candidate's fields.
    ///
    /// ```
    /// use cfgtree::{ConfigClass, Dtype, Field};
    ///
    /// let inner = ConfigClass::builder("Inner")
    ///     .field("f", Field::scalar(Dtype::Float, "f").default(0.0).build().unwrap())
    ///     .build()
    ///     .unwrap();
    /// let outer = ConfigClass::builder("Outer")
    ///     .field("c", Field::config(&inner, "inner").build().unwrap())
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(outer.instantiate().unwrap().names(), vec!["c.f"]);
    /// ```
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_names("", &mut out);
        out
    }

    fn collect_names(&self, prefix: &str, out: &mut Vec<String>) {
        for (name, slot) in &self.slots {
            let full = join_path(prefix, name);
            match slot {
                Slot::Value(_) => out.push(full),
                Slot::Config(config) => config.collect_names(&full, out),
                Slot::Choice(choice) => {
                    let label = if choice.is_multi() { "names" } else { "name" };
                    out.push(format!("{full}.{label}"));
                    for (key, candidate) in choice.candidates() {
                        candidate.collect_names(&candidate_path(&full, key), out);
                    }
                }
            }
        }
    }

    pub(crate) fn slots(&self) -> &IndexMap<String, Slot> {
        &self.slots
    }
}

fn slot_view(slot: &Slot) -> FieldValue<'_> {
    match slot {
        Slot::Value(value) => FieldValue::Value(value),
        Slot::Config(config) => FieldValue::Config(config),
        Slot::Choice(choice) => FieldValue::Choice(choice),
    }
}

impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let dict = self.to_dict();
        let mut map = serializer.serialize_map(Some(dict.len()))?;
        for (name, value) in &dict {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

//! Config choice fields: several eagerly built candidates plus a selection.

use std::borrow::Cow;
use std::panic::Location;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::config::history::{HistoryEntry, Provenance};
use crate::config::instance::Config;
use crate::error::{Error, Result};
use crate::field::{Field, FieldKind, TypeMap};
use crate::registry::Configurable;
use crate::value::{Key, Value};

/// The selected candidate name(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// At most one name.
    Single(Option<String>),
    /// An ordered set of names.
    Multi(IndexSet<String>),
}

impl Selection {
    /// The selection as a script value: a name, a list of names or `None`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Single(name) => name.clone().into(),
            Self::Multi(names) => Value::List(names.iter().cloned().map(Value::Str).collect()),
        }
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(name) => name.is_none(),
            Self::Multi(names) => names.is_empty(),
        }
    }

    fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => name.iter().map(String::as_str).collect(),
            Self::Multi(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// The value of a config choice field.
///
/// Every name of the typemap gets its own candidate config when the owner is
/// instantiated, so candidates can be edited before (or without) being
/// selected. Only selected candidates take part in validation, comparison,
/// `to_dict` and saving.
#[derive(Debug, Clone)]
pub struct ConfigChoice {
    field: Arc<Field>,
    owner: String,
    path: String,
    typemap: TypeMap,
    multi: bool,
    selection: Selection,
    candidates: IndexMap<String, Config>,
    frozen: bool,
    history: Vec<HistoryEntry>,
}

pub(crate) fn candidate_path(path: &str, key: &str) -> String {
    format!("{path}[{}]", Key::from(key))
}

impl ConfigChoice {
    pub(crate) fn new(field: &Arc<Field>, owner: &str, path: String) -> Result<Self> {
        let FieldKind::ConfigChoice(spec) = field.kind() else {
            return Err(Error::Type(format!(
                "field '{path}' is a {}, not a config choice",
                field.type_name()
            )));
        };
        let typemap = spec.typemap().clone();
        let mut candidates = IndexMap::new();
        for key in typemap.keys() {
            if let Some(class) = typemap.class_of(&key) {
                let candidate = Config::with_path(&class, candidate_path(&path, &key))?;
                candidates.insert(key, candidate);
            }
        }
        let mut choice = Self {
            field: Arc::clone(field),
            owner: owner.to_string(),
            path,
            typemap,
            multi: spec.is_multi(),
            selection: if spec.is_multi() {
                Selection::Multi(IndexSet::new())
            } else {
                Selection::Single(None)
            },
            candidates,
            frozen: false,
            history: Vec::new(),
        };
        let default = field.default_value().clone();
        choice.apply_selection(default, Provenance::Default)?;
        Ok(choice)
    }

    /// The field descriptor.
    #[must_use]
    pub fn field(&self) -> &Arc<Field> {
        &self.field
    }

    /// Location of this field relative to the root config.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The names available for selection.
    #[must_use]
    pub const fn typemap(&self) -> &TypeMap {
        &self.typemap
    }

    /// Whether several candidates may be selected at once.
    #[must_use]
    pub const fn is_multi(&self) -> bool {
        self.multi
    }

    /// Whether an empty selection validates.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.field.is_optional()
    }

    /// Whether the selection is locked.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// The current selection.
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The selected name of a single-selection field.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.selection {
            Selection::Single(name) => name.as_deref(),
            Selection::Multi(_) => None,
        }
    }

    /// The selected names, in selection order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.selection.names()
    }

    /// Every name of the typemap.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.typemap.keys()
    }

    /// Selection history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The candidate registered under `key`, if it has been built.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Config> {
        self.candidates.get(key)
    }

    /// The candidate registered under `key`, built on first access when the
    /// name was added to the typemap after this field was instantiated.
    ///
    /// # Errors
    ///
    /// Returns a field validation error for names absent from the typemap.
    pub fn get_mut(&mut self, key: &str) -> Result<&mut Config> {
        let index = self.ensure_candidate(key)?;
        Ok(&mut self.candidates[index])
    }

    /// All built candidates, in typemap order.
    pub fn candidates(&self) -> impl Iterator<Item = (&str, &Config)> {
        self.candidates.iter().map(|(key, config)| (key.as_str(), config))
    }

    /// Selected candidates, in selection order.
    #[must_use]
    pub fn actives(&self) -> Vec<(&str, &Config)> {
        self.selection
            .names()
            .into_iter()
            .filter_map(|name| self.candidates.get(name).map(|config| (name, config)))
            .collect()
    }

    /// The single selected candidate.
    ///
    /// # Errors
    ///
    /// Fails when nothing is selected or the field is multi-selection.
    pub fn active(&self) -> Result<&Config> {
        let name = self.active_name()?;
        self.candidates.get(name).ok_or_else(|| self.unknown_key(name))
    }

    /// Mutable access to the single selected candidate.
    ///
    /// # Errors
    ///
    /// Fails when nothing is selected or the field is multi-selection.
    pub fn active_mut(&mut self) -> Result<&mut Config> {
        let name = self.active_name()?.to_string();
        self.get_mut(&name)
    }

    fn active_name(&self) -> Result<&str> {
        match &self.selection {
            Selection::Multi(_) => Err(Error::Type(format!(
                "multi-selection field '{}' has no single active config",
                self.path
            ))),
            Selection::Single(None) => Err(self.error("No active selection")),
            Selection::Single(Some(name)) => Ok(name),
        }
    }

    /// Replaces the selection: a name, a list of names for multi-selection
    /// fields, or `None` to clear it.
    ///
    /// # Errors
    ///
    /// Fails when frozen, when the value has the wrong shape, or when a name
    /// is not in the typemap.
    #[track_caller]
    pub fn set(&mut self, value: impl Into<Value>) -> Result<()> {
        let provenance = Provenance::code(Location::caller());
        self.set_with_provenance(value.into(), provenance)
    }

    /// Selects a single name.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigChoice::set`].
    #[track_caller]
    pub fn select(&mut self, name: &str) -> Result<()> {
        let provenance = Provenance::code(Location::caller());
        let value = if self.multi {
            Value::List(vec![Value::from(name)])
        } else {
            Value::from(name)
        };
        self.set_with_provenance(value, provenance)
    }

    pub(crate) fn set_with_provenance(&mut self, value: Value, provenance: Provenance) -> Result<()> {
        if self.frozen {
            return Err(self.error("Cannot modify a frozen Config"));
        }
        self.apply_selection(value, provenance)
    }

    fn apply_selection(&mut self, value: Value, provenance: Provenance) -> Result<()> {
        let selection = if value.is_none() {
            if self.multi {
                Selection::Multi(IndexSet::new())
            } else {
                Selection::Single(None)
            }
        } else {
            let value = self
                .field
                .kind()
                .check_type(value)
                .map_err(|message| self.error(message))?;
            match value {
                Value::Str(name) => Selection::Single(Some(name)),
                Value::List(items) => Selection::Multi(
                    items
                        .into_iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect(),
                ),
                other => return Err(self.error(format!("Invalid selection {other}"))),
            }
        };
        for name in selection.names() {
            self.ensure_candidate(name)?;
        }
        self.history
            .push(HistoryEntry::new(selection.to_value(), provenance));
        self.selection = selection;
        Ok(())
    }

    /// Index of the candidate for `key`, building it if needed.
    fn ensure_candidate(&mut self, key: &str) -> Result<usize> {
        if let Some(index) = self.candidates.get_index_of(key) {
            return Ok(index);
        }
        let class = self
            .typemap
            .class_of(key)
            .ok_or_else(|| self.unknown_key(key))?;
        let mut candidate = Config::with_path(&class, candidate_path(&self.path, key))?;
        if self.frozen || self.candidates.values().any(Config::is_frozen) {
            candidate.freeze();
        }
        let (index, _) = self.candidates.insert_full(key.to_string(), candidate);
        Ok(index)
    }

    /// The candidate for `key`, or a fresh default instance when it has not
    /// been built yet.
    pub(crate) fn candidate_or_fresh(&self, key: &str) -> Result<Cow<'_, Config>> {
        if let Some(candidate) = self.candidates.get(key) {
            return Ok(Cow::Borrowed(candidate));
        }
        let class = self
            .typemap
            .class_of(key)
            .ok_or_else(|| self.unknown_key(key))?;
        Config::with_path(&class, candidate_path(&self.path, key)).map(Cow::Owned)
    }

    /// The registered target of the single selection.
    ///
    /// # Errors
    ///
    /// Fails when the field is not registry-backed or nothing is selected.
    pub fn target(&self) -> Result<Arc<dyn Configurable>> {
        let name = self.active_name()?;
        self.lookup_target(name)
    }

    /// The registered targets of every selected name.
    ///
    /// # Errors
    ///
    /// Fails when the field is not registry-backed.
    pub fn targets(&self) -> Result<Vec<Arc<dyn Configurable>>> {
        self.selection
            .names()
            .into_iter()
            .map(|name| self.lookup_target(name))
            .collect()
    }

    fn lookup_target(&self, name: &str) -> Result<Arc<dyn Configurable>> {
        let registry = self.typemap.registry().ok_or_else(|| {
            Error::Type(format!("field '{}' is not backed by a registry", self.path))
        })?;
        registry.get(name).ok_or_else(|| self.unknown_key(name))
    }

    /// Selection is set (unless optional) and every selected candidate
    /// validates.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.selection.is_empty() && !self.is_optional() {
            return Err(self.error("Required value cannot be None"));
        }
        for name in self.selection.names() {
            let candidate = self.candidates.get(name).ok_or_else(|| self.unknown_key(name))?;
            candidate.validate()?;
        }
        Ok(())
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = !self.field.is_mutable_after_freeze();
        for candidate in self.candidates.values_mut() {
            candidate.freeze();
        }
    }

    pub(crate) fn set_path(&mut self, path: String) {
        for (key, candidate) in &mut self.candidates {
            candidate.set_path(candidate_path(&path, key));
        }
        self.path = path;
    }

    /// `{name|names: ..., values: {key: candidate dict}}` over the selected
    /// candidates only.
    pub(crate) fn to_dict_value(&self) -> Value {
        let label = if self.multi { "names" } else { "name" };
        let values = self
            .actives()
            .into_iter()
            .map(|(key, config)| (Key::from(key), config.to_dict_value()))
            .collect();
        Value::Dict(IndexMap::from([
            (Key::from(label), self.selection.to_value()),
            (Key::from("values"), Value::Dict(values)),
        ]))
    }

    fn unknown_key(&self, key: &str) -> Error {
        self.error(format!("Unknown key {} in {}", Key::from(key), self.field.type_name()))
    }

    fn error(&self, message: impl Into<String>) -> Error {
        self.field.error(&self.path, &self.owner, message)
    }
}

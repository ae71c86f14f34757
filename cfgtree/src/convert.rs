//! Export of a config to a flat, typed property bag.
//!
//! Every leaf is written under its dotted path through one of four typed
//! setters chosen by the field's dtype. Unset optional values are left out.
//! Config choice fields write their selection as `<path>.name` or
//! `<path>.names`, then every candidate (selected or not) under
//! `<path>.values.<key>`.

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::{join_path, Config, ConfigChoice, FieldValue};
use crate::error::{Error, Result};
use crate::field::FieldKind;
use crate::value::{Dtype, Value};

/// A single value or an array of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue<T> {
    /// One value.
    Scalar(T),
    /// Several values, as exported from list fields.
    Array(Vec<T>),
}

/// Receiver of typed properties.
#[cfg_attr(test, mockall::automock)]
pub trait PropertySet {
    /// Stores string properties.
    fn set_string(&mut self, name: &str, value: PropertyValue<String>);
    /// Stores boolean properties.
    fn set_bool(&mut self, name: &str, value: PropertyValue<bool>);
    /// Stores 64-bit integer properties.
    fn set_long_long(&mut self, name: &str, value: PropertyValue<i64>);
    /// Stores double-precision properties.
    fn set_double(&mut self, name: &str, value: PropertyValue<f64>);
}

/// Source of empty property sets.
pub trait PropertySetProvider {
    /// The property set type produced.
    type Set: PropertySet;

    /// Whether the provider can currently produce sets.
    fn is_available(&self) -> bool {
        true
    }

    /// A new, empty property set.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures.
    fn new_property_set(&self) -> Result<Self::Set>;
}

/// Flattens `config` into a new property set from `provider`.
///
/// Returns `Ok(None)` when `config` is `None`.
///
/// # Errors
///
/// Returns [`Error::PropertySetUnavailable`] when the provider is not
/// available, whether or not a config was given.
///
/// # Examples
///
/// ```
/// use cfgtree::convert::{make_property_set, Property, PropertyBagProvider, PropertyValue};
/// use cfgtree::{ConfigClass, Dtype, Field};
///
/// let class = ConfigClass::builder("Simple")
///     .field("i", Field::scalar(Dtype::Int, "int").optional(true).build().unwrap())
///     .field("ll", Field::list(Dtype::Int, "list").default(vec![1, 2]).build().unwrap())
///     .build()
///     .unwrap();
/// let config = class.instantiate().unwrap();
///
/// let bag = make_property_set(&PropertyBagProvider, Some(&config)).unwrap().unwrap();
/// assert!(bag.get("i").is_none());
/// assert_eq!(bag.get("ll"), Some(&Property::LongLong(PropertyValue::Array(vec![1, 2]))));
/// assert!(make_property_set(&PropertyBagProvider, None).unwrap().is_none());
/// ```
pub fn make_property_set<P: PropertySetProvider>(
    provider: &P,
    config: Option<&Config>,
) -> Result<Option<P::Set>> {
    if !provider.is_available() {
        return Err(Error::PropertySetUnavailable(
            "the provider reported itself unavailable".to_string(),
        ));
    }
    let Some(config) = config else {
        return Ok(None);
    };
    let mut set = provider.new_property_set()?;
    export_config(&mut set, config, "")?;
    Ok(Some(set))
}

fn export_config<S: PropertySet + ?Sized>(set: &mut S, config: &Config, prefix: &str) -> Result<()> {
    for (name, field) in config.class().fields() {
        let path = join_path(prefix, name);
        match config.field_value(name)? {
            FieldValue::Value(value) => {
                if value.is_none()
                    || (field.deprecated().is_some() && value == field.default_value())
                {
                    continue;
                }
                match field.kind() {
                    FieldKind::Dict(spec) => {
                        let Some(entries) = value.as_dict() else {
                            continue;
                        };
                        for (key, item) in entries {
                            if !item.is_none() {
                                let item_path = join_path(&path, &key.to_path_segment());
                                export_scalar(set, &item_path, spec.itemtype(), item);
                            }
                        }
                    }
                    FieldKind::List(spec) => {
                        let items = value.as_list().unwrap_or_default();
                        export_array(set, &path, spec.itemtype(), items);
                    }
                    kind => {
                        if let Some(dtype) = kind.dtype() {
                            export_scalar(set, &path, dtype, value);
                        }
                    }
                }
            }
            FieldValue::Config(nested) => export_config(set, nested, &path)?,
            FieldValue::Choice(choice) => export_choice(set, choice, &path)?,
        }
    }
    Ok(())
}

fn export_choice<S: PropertySet + ?Sized>(
    set: &mut S,
    choice: &ConfigChoice,
    path: &str,
) -> Result<()> {
    if choice.is_multi() {
        let names = choice.names().into_iter().map(str::to_string).collect();
        set.set_string(&format!("{path}.names"), PropertyValue::Array(names));
    } else if let Some(name) = choice.name() {
        set.set_string(&format!("{path}.name"), PropertyValue::Scalar(name.to_string()));
    }
    for key in choice.keys() {
        let candidate = choice.candidate_or_fresh(&key)?;
        export_config(set, &candidate, &format!("{path}.values.{key}"))?;
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn as_double(value: &Value) -> Option<f64> {
    match value {
        Value::Float(x) => Some(*x),
        Value::Int(i) => Some(*i as f64),
        _ => None,
    }
}

fn export_scalar<S: PropertySet + ?Sized>(set: &mut S, name: &str, dtype: Dtype, value: &Value) {
    match dtype {
        Dtype::Str => {
            if let Some(text) = value.as_str() {
                set.set_string(name, PropertyValue::Scalar(text.to_string()));
            }
        }
        Dtype::Bool => {
            if let Some(b) = value.as_bool() {
                set.set_bool(name, PropertyValue::Scalar(b));
            }
        }
        Dtype::Int => {
            if let Some(i) = value.as_int() {
                set.set_long_long(name, PropertyValue::Scalar(i));
            }
        }
        Dtype::Float => {
            if let Some(x) = as_double(value) {
                set.set_double(name, PropertyValue::Scalar(x));
            }
        }
    }
}

/// Lists holding `None` have no typed array form and are skipped whole.
fn export_array<S: PropertySet + ?Sized>(set: &mut S, name: &str, dtype: Dtype, items: &[Value]) {
    let exported = match dtype {
        Dtype::Str => items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(|values| set.set_string(name, PropertyValue::Array(values))),
        Dtype::Bool => items
            .iter()
            .map(Value::as_bool)
            .collect::<Option<Vec<_>>>()
            .map(|values| set.set_bool(name, PropertyValue::Array(values))),
        Dtype::Int => items
            .iter()
            .map(Value::as_int)
            .collect::<Option<Vec<_>>>()
            .map(|values| set.set_long_long(name, PropertyValue::Array(values))),
        Dtype::Float => items
            .iter()
            .map(as_double)
            .collect::<Option<Vec<_>>>()
            .map(|values| set.set_double(name, PropertyValue::Array(values))),
    };
    if exported.is_none() {
        log::debug!("not exporting {name}: the list holds None items");
    }
}

/// One typed entry of a [`PropertyBag`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Property {
    /// Set through `set_string`.
    String(PropertyValue<String>),
    /// Set through `set_bool`.
    Bool(PropertyValue<bool>),
    /// Set through `set_long_long`.
    LongLong(PropertyValue<i64>),
    /// Set through `set_double`.
    Double(PropertyValue<f64>),
}

/// In-memory [`PropertySet`] keeping insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertyBag {
    properties: IndexMap<String, Property>,
}

impl PropertyBag {
    /// An empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The property stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Property names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Names with their properties.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(name, property)| (name.as_str(), property))
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl PropertySet for PropertyBag {
    fn set_string(&mut self, name: &str, value: PropertyValue<String>) {
        self.properties.insert(name.to_string(), Property::String(value));
    }

    fn set_bool(&mut self, name: &str, value: PropertyValue<bool>) {
        self.properties.insert(name.to_string(), Property::Bool(value));
    }

    fn set_long_long(&mut self, name: &str, value: PropertyValue<i64>) {
        self.properties.insert(name.to_string(), Property::LongLong(value));
    }

    fn set_double(&mut self, name: &str, value: PropertyValue<f64>) {
        self.properties.insert(name.to_string(), Property::Double(value));
    }
}

/// Provider of [`PropertyBag`]s; always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyBagProvider;

impl PropertySetProvider for PropertyBagProvider {
    type Set = PropertyBag;

    fn new_property_set(&self) -> Result<PropertyBag> {
        Ok(PropertyBag::new())
    }
}

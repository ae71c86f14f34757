//! Field descriptors.
//!
//! A [`Field`] describes one named, typed slot of a config class: its kind
//! (scalar, range, choice, list, dict, nested config or config choice), its
//! default, whether `None` is accepted, an optional predicate and an optional
//! deprecation message. Fields are built with a [`FieldBuilder`] whose type
//! parameter is the variant spec, so variant-specific options are only
//! available on the matching builder.
//!
//! # Examples
//!
//! ```
//! use cfgtree::{Dtype, Field};
//!
//! let field = Field::range(Dtype::Int, "worker threads")
//!     .default(4)
//!     .min(1)
//!     .max(64)
//!     .build()
//!     .unwrap();
//! assert_eq!(field.type_name(), "RangeField");
//! ```

mod choice;
mod dict;
mod list;
mod nested;
mod range;

pub use choice::ChoiceSpec;
pub use dict::DictSpec;
pub use list::ListSpec;
pub use nested::{ConfigChoiceSpec, NestedSpec, TypeMap};
pub use range::RangeSpec;

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use crate::config::ConfigClass;
use crate::error::{Error, Result};
use crate::value::{Dtype, Value};

/// A user-supplied predicate over a field value.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Predicate {
    /// Wraps a closure.
    pub fn new(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Evaluates the predicate.
    #[must_use]
    pub fn test(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<predicate>")
    }
}

/// Variant-specific part of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// A plain scalar of the given dtype.
    Scalar(Dtype),
    /// A bounded numeric scalar.
    Range(RangeSpec),
    /// A scalar restricted to an enumerated set of values.
    Choice(ChoiceSpec),
    /// A typed, optionally bounded sequence.
    List(ListSpec),
    /// A typed mapping.
    Dict(DictSpec),
    /// A nested config instance.
    Config(NestedSpec),
    /// A selection among several eagerly built config instances.
    ConfigChoice(ConfigChoiceSpec),
}

impl FieldKind {
    /// Name of the field type used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "Field",
            Self::Range(_) => "RangeField",
            Self::Choice(_) => "ChoiceField",
            Self::List(_) => "ListField",
            Self::Dict(_) => "DictField",
            Self::Config(_) => "ConfigField",
            Self::ConfigChoice(spec) => spec.type_name(),
        }
    }

    /// Scalar dtype for scalar-like kinds, item dtype for lists and dicts.
    #[must_use]
    pub fn dtype(&self) -> Option<Dtype> {
        match self {
            Self::Scalar(dtype) => Some(*dtype),
            Self::Range(spec) => Some(spec.dtype()),
            Self::Choice(spec) => Some(spec.dtype()),
            Self::List(spec) => Some(spec.itemtype()),
            Self::Dict(spec) => Some(spec.itemtype()),
            Self::Config(_) | Self::ConfigChoice(_) => None,
        }
    }

    /// Whether values of this kind live directly in the owning config.
    #[must_use]
    pub fn holds_value(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::ConfigChoice(_))
    }

    /// Converts a non-`None` value to the kind's storage type.
    pub(crate) fn check_type(&self, value: Value) -> std::result::Result<Value, String> {
        match self {
            Self::Scalar(dtype) => coerce_scalar(*dtype, value),
            Self::Range(spec) => coerce_scalar(spec.dtype(), value),
            Self::Choice(spec) => coerce_scalar(spec.dtype(), value),
            Self::List(spec) => spec.check_type(value),
            Self::Dict(spec) => spec.check_type(value),
            Self::ConfigChoice(spec) => spec.check_type(value),
            Self::Config(spec) => Err(format!(
                "Cannot assign a value to a field of type {}; use retarget or set_config",
                spec.class().qualified_name()
            )),
        }
    }

    /// Variant constraints on an already type-checked, non-`None` value.
    pub(crate) fn check_constraints(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            Self::Range(spec) => spec.check_constraints(value),
            Self::Choice(spec) => spec.check_constraints(value),
            Self::List(spec) => spec.check_constraints(value),
            Self::Dict(spec) => spec.check_constraints(value),
            Self::Scalar(_) | Self::Config(_) | Self::ConfigChoice(_) => Ok(()),
        }
    }
}

pub(crate) fn coerce_scalar(dtype: Dtype, value: Value) -> std::result::Result<Value, String> {
    let type_name = value.type_name();
    let shown = value.to_string();
    dtype
        .coerce(value)
        .ok_or_else(|| format!("Value {shown} is of incorrect type {type_name}. Expected type {dtype}"))
}

/// Turns a variant spec into a [`FieldKind`], checking its own invariants.
pub trait FieldSpec {
    /// Consumes the spec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] when the spec is inconsistent.
    fn into_kind(self) -> Result<FieldKind>;
}

/// Spec of a plain scalar field.
#[derive(Debug, Clone, Copy)]
pub struct ScalarSpec(Dtype);

impl FieldSpec for ScalarSpec {
    fn into_kind(self) -> Result<FieldKind> {
        Ok(FieldKind::Scalar(self.0))
    }
}

/// A field descriptor, shared by every instance of the classes using it.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    doc: String,
    kind: FieldKind,
    default: Value,
    optional: bool,
    mutable_after_freeze: bool,
    check: Option<Predicate>,
    deprecated: Option<String>,
    defined_at: &'static Location<'static>,
}

impl Field {
    /// Starts a plain scalar field.
    #[track_caller]
    pub fn scalar(dtype: Dtype, doc: impl Into<String>) -> FieldBuilder<ScalarSpec> {
        FieldBuilder::new(doc, ScalarSpec(dtype))
    }

    /// Starts a numeric field bounded by `min`/`max`.
    ///
    /// By default `min` is inclusive and `max` exclusive.
    #[track_caller]
    pub fn range(dtype: Dtype, doc: impl Into<String>) -> FieldBuilder<RangeSpec> {
        FieldBuilder::new(doc, RangeSpec::new(dtype))
    }

    /// Starts a field restricted to the values added with
    /// [`FieldBuilder::allow`].
    #[track_caller]
    pub fn choice(dtype: Dtype, doc: impl Into<String>) -> FieldBuilder<ChoiceSpec> {
        FieldBuilder::new(doc, ChoiceSpec::new(dtype))
    }

    /// Starts a list field whose items have the given dtype.
    #[track_caller]
    pub fn list(itemtype: Dtype, doc: impl Into<String>) -> FieldBuilder<ListSpec> {
        FieldBuilder::new(doc, ListSpec::new(itemtype))
    }

    /// Starts a dict field.
    #[track_caller]
    pub fn dict(keytype: Dtype, itemtype: Dtype, doc: impl Into<String>) -> FieldBuilder<DictSpec> {
        FieldBuilder::new(doc, DictSpec::new(keytype, itemtype))
    }

    /// Starts a nested config field; each owner gets a fresh instance of
    /// `class`.
    #[track_caller]
    pub fn config(class: &Arc<ConfigClass>, doc: impl Into<String>) -> FieldBuilder<NestedSpec> {
        FieldBuilder::new(doc, NestedSpec::new(Arc::clone(class)))
    }

    /// Starts a config choice field over a fixed typemap.
    #[track_caller]
    pub fn config_choice(doc: impl Into<String>) -> FieldBuilder<ConfigChoiceSpec> {
        FieldBuilder::new(doc, ConfigChoiceSpec::new(TypeMap::default()))
    }

    /// The field's name in its class (empty until attached).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Documentation, including the deprecation notice if any.
    #[must_use]
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Variant-specific description.
    #[must_use]
    pub const fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Field type name used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Default value; `None` when the field has no default.
    #[must_use]
    pub const fn default_value(&self) -> &Value {
        &self.default
    }

    /// Whether `None` is an acceptable value.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether the field may be assigned after its config is frozen.
    #[must_use]
    pub const fn is_mutable_after_freeze(&self) -> bool {
        self.mutable_after_freeze
    }

    /// Deprecation message, if the field is deprecated.
    #[must_use]
    pub fn deprecated(&self) -> Option<&str> {
        self.deprecated.as_deref()
    }

    /// Source location of the builder call that created the field.
    #[must_use]
    pub const fn defined_at(&self) -> &'static Location<'static> {
        self.defined_at
    }

    pub(crate) fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Copy of this field with a different default, used for partial
    /// redefinition in subclasses.
    pub(crate) fn with_default(&self, value: Value) -> Result<Self> {
        let mut field = self.clone();
        field.default = checked_default(&field.kind, &field.name, value)?;
        Ok(field)
    }

    pub(crate) fn error(&self, path: &str, owner: &str, message: impl Into<String>) -> Error {
        Error::FieldValidation {
            kind: self.type_name(),
            path: path.to_string(),
            owner: owner.to_string(),
            message: message.into(),
        }
    }

    /// Full check of a non-`None` value: type, variant constraints, then the
    /// user predicate.
    fn check_value(&self, value: Value) -> std::result::Result<Value, String> {
        let value = self.kind.check_type(value)?;
        self.kind.check_constraints(&value)?;
        if let Some(check) = &self.check {
            if !check.test(&value) {
                return Err(format!("Value {value} is not a valid value"));
            }
        }
        Ok(value)
    }

    /// Validates a value being assigned and returns it in storage form.
    pub(crate) fn assign(&self, value: Value, path: &str, owner: &str) -> Result<Value> {
        if value.is_none() {
            if self.optional {
                return Ok(Value::None);
            }
            return Err(self.error(path, owner, "Required value cannot be None"));
        }
        self.check_value(value)
            .map_err(|message| self.error(path, owner, message))
    }

    /// Value an instance starts with. A missing default is not checked here;
    /// `validate` reports it for non-optional fields.
    pub(crate) fn initial_value(&self, path: &str, owner: &str) -> Result<Value> {
        if self.default.is_none() {
            return Ok(Value::None);
        }
        self.check_value(self.default.clone())
            .map_err(|message| self.error(path, owner, message))
    }

    /// Re-checks a stored value.
    pub(crate) fn validate_value(&self, value: &Value, path: &str, owner: &str) -> Result<()> {
        self.assign(value.clone(), path, owner).map(|_| ())
    }
}

fn checked_default(kind: &FieldKind, name: &str, value: Value) -> Result<Value> {
    if value.is_none() {
        return Ok(value);
    }
    if let FieldKind::Config(_) = kind {
        return Err(Error::value(format!(
            "config field '{name}' takes its default from its class"
        )));
    }
    let value = kind
        .check_type(value)
        .map_err(|message| Error::value(format!("invalid default for field '{name}': {message}")))?;
    if let FieldKind::Choice(_) = kind {
        kind.check_constraints(&value).map_err(|message| {
            Error::value(format!("invalid default for field '{name}': {message}"))
        })?;
    }
    Ok(value)
}

/// Builder for [`Field`]; `K` is the variant spec.
#[derive(Debug)]
#[must_use]
pub struct FieldBuilder<K> {
    doc: String,
    spec: K,
    default: Value,
    optional: bool,
    mutable_after_freeze: bool,
    check: Option<Predicate>,
    deprecated: Option<String>,
    defined_at: &'static Location<'static>,
}

impl<K: FieldSpec> FieldBuilder<K> {
    #[track_caller]
    pub(crate) fn new(doc: impl Into<String>, spec: K) -> Self {
        Self {
            doc: doc.into(),
            spec,
            default: Value::None,
            optional: false,
            mutable_after_freeze: false,
            check: None,
            deprecated: None,
            defined_at: Location::caller(),
        }
    }

    /// Sets the default value.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    /// Allows `None` as a value.
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Adds a predicate every non-`None` value must satisfy.
    pub fn check(mut self, check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.check = Some(Predicate::new(check));
        self
    }

    /// Marks the field deprecated; assignments log a warning with `message`.
    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = Some(message.into());
        self
    }

    /// Keeps the field assignable after its config is frozen.
    pub fn mutable_after_freeze(mut self, mutable: bool) -> Self {
        self.mutable_after_freeze = mutable;
        self
    }

    /// Finishes the field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] if the spec is inconsistent or the default
    /// does not have the field's type.
    pub fn build(self) -> Result<Field> {
        let kind = self.spec.into_kind()?;
        let default = checked_default(&kind, "", self.default)?;
        let doc = match &self.deprecated {
            Some(message) => format!("{} Deprecated: {message}", self.doc),
            None => self.doc,
        };
        Ok(Field {
            name: String::new(),
            doc,
            kind,
            default,
            optional: self.optional,
            mutable_after_freeze: self.mutable_after_freeze,
            check: self.check,
            deprecated: self.deprecated,
            defined_at: self.defined_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_default_and_type() {
        let field = Field::scalar(Dtype::Float, "float test")
            .default(3.0)
            .build()
            .unwrap();
        assert_eq!(field.default_value(), &Value::Float(3.0));
        assert_eq!(field.type_name(), "Field");
        assert!(!field.is_optional());
    }

    #[test]
    fn test_int_default_widens_to_float() {
        let field = Field::scalar(Dtype::Float, "f").default(3).build().unwrap();
        assert_eq!(field.default_value(), &Value::Float(3.0));
    }

    #[test]
    fn test_default_of_wrong_type_is_rejected() {
        let err = Field::scalar(Dtype::Int, "i").default("x").build().unwrap_err();
        assert!(matches!(err, Error::Value(_)));
        assert!(format!("{err}").contains("Expected type int"));
    }

    #[test]
    fn test_deprecated_doc() {
        let field = Field::scalar(Dtype::Int, "Something.")
            .default(10)
            .deprecated("not used!")
            .build()
            .unwrap();
        assert_eq!(field.doc(), "Something. Deprecated: not used!");
        assert_eq!(field.deprecated(), Some("not used!"));
    }

    #[test]
    fn test_assign_none_requires_optional() {
        let required = Field::scalar(Dtype::Int, "r").build().unwrap();
        let err = required.assign(Value::None, "r", "Simple").unwrap_err();
        assert!(err.is_field_validation());

        let optional = Field::scalar(Dtype::Int, "o").optional(true).build().unwrap();
        assert_eq!(optional.assign(Value::None, "o", "Simple").unwrap(), Value::None);
    }

    #[test]
    fn test_assign_rejects_bool_for_int() {
        let field = Field::scalar(Dtype::Int, "i").build().unwrap();
        let err = field.assign(Value::Bool(true), "i", "Simple").unwrap_err();
        let display = format!("{err}");
        assert!(display.contains("'i'"));
        assert!(display.contains("bool"));
        assert!(display.contains("int"));
    }

    #[test]
    fn test_check_predicate() {
        let field = Field::scalar(Dtype::Float, "Inner.f")
            .default(0.0)
            .check(|v| v.as_float().is_some_and(|x| x >= 0.0))
            .build()
            .unwrap();
        assert!(field.assign(Value::Float(1.0), "f", "Inner").is_ok());
        let err = field.assign(Value::Float(-5.0), "f", "Inner").unwrap_err();
        assert!(format!("{err}").contains("not a valid value"));
    }

    #[test]
    fn test_missing_default_is_not_checked_at_instantiation() {
        let field = Field::scalar(Dtype::Int, "i").build().unwrap();
        assert_eq!(field.initial_value("i", "Simple").unwrap(), Value::None);
        assert!(field.validate_value(&Value::None, "i", "Simple").is_err());
    }

    #[test]
    fn test_defined_at_points_here() {
        let field = Field::scalar(Dtype::Int, "i").build().unwrap();
        assert!(field.defined_at().file().ends_with("mod.rs"));
    }
}

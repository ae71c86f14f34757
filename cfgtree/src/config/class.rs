//! Config classes and inheritance-aware field collection.
//!
//! A [`ConfigClass`] is the runtime schema of a config: an ordered, immutable
//! table of field descriptors assembled once when the class is built. Bases
//! are linearised with the C3 algorithm, and the field table is collected by
//! walking that order from the most basic class to the class itself, so the
//! declaration closest to the class wins while each name keeps the position
//! where it was first declared.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::value::Value;

/// Hook run at instantiation, after field defaults, to adjust defaults.
pub type SetDefaultsHook = Arc<dyn Fn(&mut Config) -> Result<()> + Send + Sync>;

/// Hook run by [`Config::validate`] after the per-field checks.
pub type ValidateHook = Arc<dyn Fn(&Config) -> Result<()> + Send + Sync>;

/// The schema of a config: name, bases, field table and hooks.
///
/// Classes are shared as `Arc<ConfigClass>` and compared by identity.
///
/// # Examples
///
/// ```
/// use cfgtree::{ConfigClass, Dtype, Field};
///
/// let inner = ConfigClass::builder("InnerConfig")
///     .module("tests")
///     .field("f", Field::scalar(Dtype::Float, "Inner.f").default(0.0).build().unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(inner.qualified_name(), "tests.InnerConfig");
/// assert!(inner.field("f").is_some());
/// ```
pub struct ConfigClass {
    name: String,
    module: String,
    doc: String,
    bases: Vec<Arc<ConfigClass>>,
    ancestors: Vec<Arc<ConfigClass>>,
    own_fields: IndexMap<String, Arc<Field>>,
    fields: IndexMap<String, Arc<Field>>,
    set_defaults: Option<SetDefaultsHook>,
    validate: Option<ValidateHook>,
    mixin: bool,
}

impl ConfigClass {
    /// Starts building a class called `name`.
    pub fn builder(name: impl Into<String>) -> ConfigClassBuilder {
        ConfigClassBuilder {
            name: name.into(),
            module: String::new(),
            doc: String::new(),
            bases: Vec::new(),
            decls: Vec::new(),
            set_defaults: None,
            validate: None,
            mixin: false,
        }
    }

    /// Bare class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted module path; empty for classes outside any module.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// `module.Name`, or just `Name` when the module is empty.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.module.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.module, self.name)
        }
    }

    /// Class documentation.
    #[must_use]
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Direct bases, left to right.
    #[must_use]
    pub fn bases(&self) -> &[Arc<ConfigClass>] {
        &self.bases
    }

    /// Method resolution order without the class itself.
    #[must_use]
    pub fn ancestors(&self) -> &[Arc<ConfigClass>] {
        &self.ancestors
    }

    /// Method resolution order starting with the class itself.
    #[must_use]
    pub fn mro(self: &Arc<Self>) -> Vec<Arc<ConfigClass>> {
        std::iter::once(Arc::clone(self))
            .chain(self.ancestors.iter().cloned())
            .collect()
    }

    /// Whether this is a mixin, which contributes fields but cannot be
    /// instantiated.
    #[must_use]
    pub const fn is_mixin(&self) -> bool {
        self.mixin
    }

    /// Whether `self` is `other` or derives from it.
    #[must_use]
    pub fn is_subclass_of(&self, other: &ConfigClass) -> bool {
        std::ptr::eq(self, other)
            || self
                .ancestors
                .iter()
                .any(|ancestor| std::ptr::eq(Arc::as_ptr(ancestor), other))
    }

    /// The complete field table, in declaration order.
    #[must_use]
    pub const fn fields(&self) -> &IndexMap<String, Arc<Field>> {
        &self.fields
    }

    /// Fields declared (or redefined) directly on this class.
    #[must_use]
    pub const fn own_fields(&self) -> &IndexMap<String, Arc<Field>> {
        &self.own_fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Arc<Field>> {
        self.fields.get(name)
    }

    /// Builds a new instance with every default applied.
    ///
    /// # Errors
    ///
    /// Fails for mixins, for defaults that violate their field's
    /// constraints, and for errors raised by `set_defaults` hooks.
    pub fn instantiate(self: &Arc<Self>) -> Result<Config> {
        Config::new(self)
    }

    /// Classes in base-to-derived order, for running hooks.
    pub(crate) fn hook_order(self: &Arc<Self>) -> impl Iterator<Item = Arc<ConfigClass>> + '_ {
        self.ancestors
            .iter()
            .rev()
            .cloned()
            .chain(std::iter::once(Arc::clone(self)))
    }

    pub(crate) fn set_defaults_hook(&self) -> Option<&SetDefaultsHook> {
        self.set_defaults.as_ref()
    }

    pub(crate) fn validate_hook(&self) -> Option<&ValidateHook> {
        self.validate.as_ref()
    }
}

impl fmt::Debug for ConfigClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigClass")
            .field("name", &self.qualified_name())
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ConfigClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

enum Decl {
    Field(String, Field),
    Default(String, Value),
}

/// Builder for [`ConfigClass`].
#[must_use]
pub struct ConfigClassBuilder {
    name: String,
    module: String,
    doc: String,
    bases: Vec<Arc<ConfigClass>>,
    decls: Vec<Decl>,
    set_defaults: Option<SetDefaultsHook>,
    validate: Option<ValidateHook>,
    mixin: bool,
}

impl ConfigClassBuilder {
    /// Sets the dotted module path used to reference the class from scripts.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Sets the class documentation.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Appends a base class. Bases are linearised left to right.
    pub fn base(mut self, base: &Arc<ConfigClass>) -> Self {
        self.bases.push(Arc::clone(base));
        self
    }

    /// Declares a field, replacing any inherited field of the same name.
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.decls.push(Decl::Field(name.into(), field));
        self
    }

    /// Redefines only the default of an inherited field.
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.decls.push(Decl::Default(name.into(), value.into()));
        self
    }

    /// Hook adjusting defaults; hooks run base class first.
    pub fn set_defaults(
        mut self,
        hook: impl Fn(&mut Config) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.set_defaults = Some(Arc::new(hook));
        self
    }

    /// Whole-object validation hook; hooks run base class first.
    pub fn validate(mut self, hook: impl Fn(&Config) -> Result<()> + Send + Sync + 'static) -> Self {
        self.validate = Some(Arc::new(hook));
        self
    }

    /// Marks the class as a mixin.
    pub fn mixin(mut self) -> Self {
        self.mixin = true;
        self
    }

    /// Linearises the bases and collects the field table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] for an inconsistent hierarchy or an invalid
    /// field name, and [`Error::Attribute`] when `with_default` names a
    /// field no base declares.
    pub fn build(self) -> Result<Arc<ConfigClass>> {
        let qualified = if self.module.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.module, self.name)
        };
        if !is_identifier(&self.name) {
            return Err(Error::value(format!("invalid class name '{}'", self.name)));
        }
        let ancestors = linearize(&self.bases).ok_or_else(|| {
            Error::value(format!(
                "cannot create a consistent method resolution order for {qualified}"
            ))
        })?;

        let mut fields: IndexMap<String, Arc<Field>> = IndexMap::new();
        for class in ancestors.iter().rev() {
            for (name, field) in &class.own_fields {
                fields.insert(name.clone(), Arc::clone(field));
            }
        }

        let mut own_fields: IndexMap<String, Arc<Field>> = IndexMap::new();
        for decl in self.decls {
            match decl {
                Decl::Field(name, field) => {
                    if !is_identifier(&name) {
                        return Err(Error::value(format!(
                            "invalid field name '{name}' in {qualified}"
                        )));
                    }
                    let field = Arc::new(field.with_name(&name));
                    own_fields.insert(name, field);
                }
                Decl::Default(name, value) => {
                    let inherited = own_fields
                        .get(&name)
                        .or_else(|| fields.get(&name))
                        .ok_or_else(|| Error::Attribute {
                            owner: qualified.clone(),
                            name: name.clone(),
                        })?;
                    let field = Arc::new(inherited.with_default(value)?);
                    own_fields.insert(name, field);
                }
            }
        }
        for (name, field) in &own_fields {
            fields.insert(name.clone(), Arc::clone(field));
        }

        log::debug!("built config class {qualified} with {} fields", fields.len());
        let class = Arc::new(ConfigClass {
            name: self.name,
            module: self.module,
            doc: self.doc,
            bases: self.bases,
            ancestors,
            own_fields,
            fields,
            set_defaults: self.set_defaults,
            validate: self.validate,
            mixin: self.mixin,
        });
        crate::script::record_defined(&class);
        Ok(class)
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// C3 linearisation of `bases`; `None` when no consistent order exists.
fn linearize(bases: &[Arc<ConfigClass>]) -> Option<Vec<Arc<ConfigClass>>> {
    let mut seqs: Vec<Vec<Arc<ConfigClass>>> = bases.iter().map(ConfigClass::mro).collect();
    seqs.push(bases.to_vec());
    let mut result: Vec<Arc<ConfigClass>> = Vec::new();
    loop {
        seqs.retain(|seq| !seq.is_empty());
        if seqs.is_empty() {
            return Some(result);
        }
        let head = seqs
            .iter()
            .map(|seq| &seq[0])
            .find(|head| {
                !seqs
                    .iter()
                    .any(|seq| seq[1..].iter().any(|class| Arc::ptr_eq(class, head)))
            })
            .cloned()?;
        for seq in &mut seqs {
            if Arc::ptr_eq(&seq[0], &head) {
                seq.remove(0);
            }
        }
        result.push(head);
    }
}

//! Config validation.
//!
//! Validation is a fail-fast, depth-first walk: every field is re-checked
//! against its descriptor, nested configs and the selected candidates of
//! config choices are validated recursively, then the class's `validate`
//! hooks run from the most basic class to the class itself.

use crate::config::instance::{Config, Slot};
use crate::error::Result;

impl Config {
    /// Validates the whole tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`crate::Error::FieldValidation`] found, or the
    /// error of the first failing `validate` hook.
    ///
    /// # Examples
    ///
    /// ```
    /// use cfgtree::{ConfigClass, Dtype, Field};
    ///
    /// let class = ConfigClass::builder("Required")
    ///     .field("i", Field::scalar(Dtype::Int, "no default").build().unwrap())
    ///     .build()
    ///     .unwrap();
    /// let mut config = class.instantiate().unwrap();
    /// assert!(config.validate().is_err());
    /// config.set("i", 1).unwrap();
    /// config.validate().unwrap();
    /// ```
    pub fn validate(&self) -> Result<()> {
        let owner = self.class().qualified_name();
        for (name, field) in self.class().fields() {
            match self.slots().get(name) {
                Some(Slot::Value(value)) => {
                    field.validate_value(value, &self.child_path(name), &owner)?;
                }
                Some(Slot::Config(config)) => config.validate()?,
                Some(Slot::Choice(choice)) => choice.validate()?,
                None => {}
            }
        }
        for class in self.class().hook_order() {
            if let Some(hook) = class.validate_hook() {
                hook(self)?;
            }
        }
        Ok(())
    }
}

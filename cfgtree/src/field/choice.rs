//! Enumerated fields.

use super::{coerce_scalar, FieldBuilder, FieldKind, FieldSpec};
use crate::error::{Error, Result};
use crate::value::{Dtype, Value};

/// Spec of a choice field: a scalar restricted to the `allowed` values, each
/// with a description.
#[derive(Debug, Clone)]
pub struct ChoiceSpec {
    dtype: Dtype,
    allowed: Vec<(Value, String)>,
}

impl ChoiceSpec {
    pub(crate) const fn new(dtype: Dtype) -> Self {
        Self {
            dtype,
            allowed: Vec::new(),
        }
    }

    /// Scalar dtype.
    #[must_use]
    pub const fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Permitted values with their descriptions, in declaration order.
    #[must_use]
    pub fn allowed(&self) -> &[(Value, String)] {
        &self.allowed
    }

    pub(crate) fn check_constraints(&self, value: &Value) -> std::result::Result<(), String> {
        if self.allowed.iter().any(|(allowed, _)| allowed == value) {
            Ok(())
        } else {
            Err(format!("Value {value} is not allowed"))
        }
    }
}

impl FieldSpec for ChoiceSpec {
    fn into_kind(mut self) -> Result<FieldKind> {
        if self.allowed.is_empty() {
            return Err(Error::value("ChoiceField must allow at least one choice"));
        }
        let dtype = self.dtype;
        self.allowed = self
            .allowed
            .into_iter()
            .map(|(value, doc)| {
                coerce_scalar(dtype, value)
                    .map(|value| (value, doc))
                    .map_err(Error::Value)
            })
            .collect::<Result<_>>()?;
        Ok(FieldKind::Choice(self))
    }
}

impl FieldBuilder<ChoiceSpec> {
    /// Adds a permitted value.
    pub fn allow(mut self, value: impl Into<Value>, description: impl Into<String>) -> Self {
        self.spec.allowed.push((value.into(), description.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::field::Field;
    use crate::value::{Dtype, Value};

    fn hello_world() -> Field {
        Field::choice(Dtype::Str, "choice test")
            .default("Hello")
            .allow("Hello", "First choice")
            .allow("World", "second choice")
            .build()
            .unwrap()
    }

    #[test]
    fn test_allowed_values() {
        let field = hello_world();
        assert!(field.assign(Value::from("World"), "c", "Simple").is_ok());
        let err = field.assign(Value::from("Mars"), "c", "Simple").unwrap_err();
        assert!(format!("{err}").contains("'Mars' is not allowed"));
    }

    #[test]
    fn test_default_must_be_allowed() {
        let result = Field::choice(Dtype::Str, "c")
            .default("Mars")
            .allow("Hello", "First choice")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_allowed_rejected() {
        assert!(Field::choice(Dtype::Int, "c").build().is_err());
    }

    #[test]
    fn test_optional_choice_accepts_none() {
        let field = Field::choice(Dtype::Int, "c")
            .optional(true)
            .allow(1, "one")
            .build()
            .unwrap();
        assert_eq!(field.assign(Value::None, "c", "C").unwrap(), Value::None);
    }
}

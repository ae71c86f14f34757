//! Typed mapping fields.

use super::{coerce_scalar, FieldBuilder, FieldKind, FieldSpec, Predicate};
use crate::error::{Error, Result};
use crate::value::{Dtype, Value};

/// Spec of a dict field.
#[derive(Debug, Clone)]
pub struct DictSpec {
    keytype: Dtype,
    itemtype: Dtype,
    item_check: Option<Predicate>,
    dict_check: Option<Predicate>,
}

impl DictSpec {
    pub(crate) const fn new(keytype: Dtype, itemtype: Dtype) -> Self {
        Self {
            keytype,
            itemtype,
            item_check: None,
            dict_check: None,
        }
    }

    /// Dtype of the keys.
    #[must_use]
    pub const fn keytype(&self) -> Dtype {
        self.keytype
    }

    /// Dtype of the values.
    #[must_use]
    pub const fn itemtype(&self) -> Dtype {
        self.itemtype
    }

    pub(crate) fn check_type(&self, value: Value) -> std::result::Result<Value, String> {
        let Value::Dict(entries) = value else {
            return Err(format!(
                "Value {value} is of incorrect type {}. Expected type dict",
                value.type_name()
            ));
        };
        entries
            .into_iter()
            .map(|(key, item)| {
                if !self.keytype.matches(&key.to_value()) {
                    let shown = key.to_value();
                    return Err(format!(
                        "Key {shown} is of incorrect type {}. Expected type {}",
                        shown.type_name(),
                        self.keytype
                    ));
                }
                if item.is_none() {
                    return Ok((key, item));
                }
                coerce_scalar(self.itemtype, item)
                    .map(|item| (key.clone(), item))
                    .map_err(|e| format!("Item for key {key}: {e}"))
            })
            .collect::<std::result::Result<_, _>>()
            .map(Value::Dict)
    }

    pub(crate) fn check_constraints(&self, value: &Value) -> std::result::Result<(), String> {
        let Some(entries) = value.as_dict() else {
            return Err(format!("Value {value} is not a dict"));
        };
        if let Some(check) = &self.item_check {
            if let Some((key, item)) = entries.iter().find(|(_, item)| !check.test(item)) {
                return Err(format!("Item at key {key} with value {item} is not a valid value"));
            }
        }
        if let Some(check) = &self.dict_check {
            if !check.test(value) {
                return Err(format!("{value} is not a valid value"));
            }
        }
        Ok(())
    }
}

impl FieldSpec for DictSpec {
    fn into_kind(self) -> Result<FieldKind> {
        if !self.keytype.is_hashable() {
            return Err(Error::value(format!(
                "DictField keys cannot be of type {}",
                self.keytype
            )));
        }
        Ok(FieldKind::Dict(self))
    }
}

impl FieldBuilder<DictSpec> {
    /// Predicate applied to every value, `None` values included.
    pub fn item_check(mut self, check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.spec.item_check = Some(Predicate::new(check));
        self
    }

    /// Predicate applied to the whole mapping.
    pub fn dict_check(mut self, check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.spec.dict_check = Some(Predicate::new(check));
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::field::Field;
    use crate::value::{Dtype, Value};

    fn v_dict() -> Field {
        Field::dict(Dtype::Str, Dtype::Str, "dict test")
            .default(Value::dict([("key", "value")]))
            .item_check(|x| x.as_str().is_some_and(|s| s.starts_with('v')))
            .build()
            .unwrap()
    }

    #[test]
    fn test_item_check() {
        let field = v_dict();
        assert!(field.assign(Value::dict([("a", "vv")]), "d", "Simple").is_ok());
        let err = field
            .assign(Value::dict([("failKey", "failValue")]), "d", "Simple")
            .unwrap_err();
        assert!(format!("{err}").contains("'failKey'"));
    }

    #[test]
    fn test_key_type() {
        let field = v_dict();
        let err = field.assign(Value::dict([(1_i64, "v")]), "d", "Simple").unwrap_err();
        assert!(format!("{err}").contains("Key 1"));
    }

    #[test]
    fn test_item_type() {
        let field = v_dict();
        let err = field.assign(Value::dict([("k", 3)]), "d", "Simple").unwrap_err();
        assert!(format!("{err}").contains("Expected type str"));
    }

    #[test]
    fn test_float_keys_rejected() {
        assert!(Field::dict(Dtype::Float, Dtype::Int, "d").build().is_err());
    }

    #[test]
    fn test_dict_check() {
        let field = Field::dict(Dtype::Str, Dtype::Int, "d")
            .dict_check(|v| v.as_dict().is_some_and(|d| d.len() <= 1))
            .build()
            .unwrap();
        assert!(field.assign(Value::dict([("a", 1)]), "d", "C").is_ok());
        assert!(field.assign(Value::dict([("a", 1), ("b", 2)]), "d", "C").is_err());
    }
}

//! Typed list fields.

use super::{coerce_scalar, FieldBuilder, FieldKind, FieldSpec, Predicate};
use crate::error::{Error, Result};
use crate::value::{Dtype, Value};

/// Spec of a list field.
#[derive(Debug, Clone)]
pub struct ListSpec {
    itemtype: Dtype,
    min_length: Option<usize>,
    max_length: Option<usize>,
    item_check: Option<Predicate>,
    list_check: Option<Predicate>,
}

impl ListSpec {
    pub(crate) const fn new(itemtype: Dtype) -> Self {
        Self {
            itemtype,
            min_length: None,
            max_length: None,
            item_check: None,
            list_check: None,
        }
    }

    /// Dtype of the items.
    #[must_use]
    pub const fn itemtype(&self) -> Dtype {
        self.itemtype
    }

    /// Minimum number of items, if bounded.
    #[must_use]
    pub const fn min_length(&self) -> Option<usize> {
        self.min_length
    }

    /// Maximum number of items, if bounded.
    #[must_use]
    pub const fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub(crate) fn check_type(&self, value: Value) -> std::result::Result<Value, String> {
        let Value::List(items) = value else {
            return Err(format!(
                "Value {value} is of incorrect type {}. Expected type list",
                value.type_name()
            ));
        };
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                if item.is_none() {
                    Ok(item)
                } else {
                    coerce_scalar(self.itemtype, item).map_err(|e| format!("List item {i}: {e}"))
                }
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::List)
    }

    pub(crate) fn check_constraints(&self, value: &Value) -> std::result::Result<(), String> {
        let Some(items) = value.as_list() else {
            return Err(format!("Value {value} is not a list"));
        };
        if let Some(min) = self.min_length {
            if items.len() < min {
                return Err(format!("Required list length >= {min}, got {}", items.len()));
            }
        }
        if let Some(max) = self.max_length {
            if items.len() > max {
                return Err(format!("Required list length <= {max}, got {}", items.len()));
            }
        }
        if let Some(check) = &self.item_check {
            if let Some((i, item)) = items.iter().enumerate().find(|(_, item)| !check.test(item)) {
                return Err(format!("Item at position {i} with value {item} is not a valid value"));
            }
        }
        if let Some(check) = &self.list_check {
            if !check.test(value) {
                return Err(format!("{value} is not a valid value"));
            }
        }
        Ok(())
    }
}

impl FieldSpec for ListSpec {
    fn into_kind(self) -> Result<FieldKind> {
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(Error::value(format!(
                    "ListField min_length {min} is greater than max_length {max}"
                )));
            }
        }
        Ok(FieldKind::List(self))
    }
}

impl FieldBuilder<ListSpec> {
    /// Requires at least `min` items.
    pub fn min_length(mut self, min: usize) -> Self {
        self.spec.min_length = Some(min);
        self
    }

    /// Allows at most `max` items.
    pub fn max_length(mut self, max: usize) -> Self {
        self.spec.max_length = Some(max);
        self
    }

    /// Predicate applied to every item, `None` items included.
    pub fn item_check(mut self, check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.spec.item_check = Some(Predicate::new(check));
        self
    }

    /// Predicate applied to the whole list.
    pub fn list_check(mut self, check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.spec.list_check = Some(Predicate::new(check));
        self
    }
}

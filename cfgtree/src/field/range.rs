//! Bounded numeric fields.

use std::cmp::Ordering;

use super::{coerce_scalar, FieldBuilder, FieldKind, FieldSpec};
use crate::error::{Error, Result};
use crate::value::{Dtype, Value};

/// Spec of a range field: an `Int` or `Float` scalar within an interval.
#[derive(Debug, Clone)]
pub struct RangeSpec {
    dtype: Dtype,
    min: Option<Value>,
    max: Option<Value>,
    inclusive_min: bool,
    inclusive_max: bool,
}

impl RangeSpec {
    pub(crate) const fn new(dtype: Dtype) -> Self {
        Self {
            dtype,
            min: None,
            max: None,
            inclusive_min: true,
            inclusive_max: false,
        }
    }

    /// Scalar dtype.
    #[must_use]
    pub const fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Lower bound, if any.
    #[must_use]
    pub const fn min(&self) -> Option<&Value> {
        self.min.as_ref()
    }

    /// Upper bound, if any.
    #[must_use]
    pub const fn max(&self) -> Option<&Value> {
        self.max.as_ref()
    }

    /// Interval in bracket notation, e.g. `[3.0, inf)`.
    #[must_use]
    pub fn describe(&self) -> String {
        let open = if self.inclusive_min { '[' } else { '(' };
        let close = if self.inclusive_max { ']' } else { ')' };
        let min = self.min.as_ref().map_or_else(|| "-inf".to_string(), ToString::to_string);
        let max = self.max.as_ref().map_or_else(|| "inf".to_string(), ToString::to_string);
        format!("{open}{min}, {max}{close}")
    }

    pub(crate) fn check_constraints(&self, value: &Value) -> std::result::Result<(), String> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(format!("{value} is outside range {}", self.describe()))
        }
    }

    fn contains(&self, value: &Value) -> bool {
        let above_min = self.min.as_ref().map_or(true, |min| {
            match numeric_cmp(value, min) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => self.inclusive_min,
                _ => false,
            }
        });
        let below_max = self.max.as_ref().map_or(true, |max| {
            match numeric_cmp(value, max) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => self.inclusive_max,
                _ => false,
            }
        });
        above_min && below_max
    }
}

/// Orders two numeric values; `None` for NaN or non-numbers.
fn numeric_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        #[allow(clippy::cast_precision_loss)]
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        #[allow(clippy::cast_precision_loss)]
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        _ => None,
    }
}

impl FieldSpec for RangeSpec {
    fn into_kind(mut self) -> Result<FieldKind> {
        if !matches!(self.dtype, Dtype::Int | Dtype::Float) {
            return Err(Error::value(format!(
                "RangeField only supports int and float, not {}",
                self.dtype
            )));
        }
        self.min = self
            .min
            .take()
            .map(|v| coerce_scalar(self.dtype, v).map_err(Error::Value))
            .transpose()?;
        self.max = self
            .max
            .take()
            .map(|v| coerce_scalar(self.dtype, v).map_err(Error::Value))
            .transpose()?;
        if let (Some(min), Some(max)) = (&self.min, &self.max) {
            let ordering = numeric_cmp(min, max);
            let empty = match ordering {
                Some(Ordering::Greater) | None => true,
                Some(Ordering::Equal) => !(self.inclusive_min && self.inclusive_max),
                Some(Ordering::Less) => false,
            };
            if empty {
                return Err(Error::value(format!(
                    "RangeField interval {} is empty",
                    self.describe()
                )));
            }
        }
        Ok(FieldKind::Range(self))
    }
}

impl FieldBuilder<RangeSpec> {
    /// Sets the lower bound.
    pub fn min(mut self, min: impl Into<Value>) -> Self {
        self.spec.min = Some(min.into());
        self
    }

    /// Sets the upper bound.
    pub fn max(mut self, max: impl Into<Value>) -> Self {
        self.spec.max = Some(max.into());
        self
    }

    /// Whether the lower bound itself is allowed (default `true`).
    pub fn inclusive_min(mut self, inclusive: bool) -> Self {
        self.spec.inclusive_min = inclusive;
        self
    }

    /// Whether the upper bound itself is allowed (default `false`).
    pub fn inclusive_max(mut self, inclusive: bool) -> Self {
        self.spec.inclusive_max = inclusive;
        self
    }
}

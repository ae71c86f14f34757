//! Deep comparison of config trees with path-qualified difference reports.

use std::sync::Arc;

use crate::config::choice::ConfigChoice;
use crate::config::instance::{join_path, Config, Slot};
use crate::value::{Key, Value};

impl Config {
    /// Whether `self` and `other` are equal, stopping at the first
    /// difference.
    #[must_use]
    pub fn compare(&self, other: &Config) -> bool {
        self.compare_with(other, true, &mut |_| {})
    }

    /// Compares two config trees, reporting each difference to `output`.
    ///
    /// With `shortcut` the walk stops at the first difference, so `output`
    /// is called at most once; otherwise every differing leaf is reported.
    /// Classes must be identical. Floats compare with `==`, so NaN never
    /// equals NaN. For config choices only the selection and the selected
    /// candidates are compared.
    ///
    /// # Examples
    ///
    /// ```
    /// use cfgtree::{ConfigClass, Dtype, Field};
    ///
    /// let class = ConfigClass::builder("Simple")
    ///     .field("f", Field::scalar(Dtype::Float, "f").default(3.0).build().unwrap())
    ///     .build()
    ///     .unwrap();
    /// let a = class.instantiate().unwrap();
    /// let mut b = class.instantiate().unwrap();
    /// b.set("f", 4.0).unwrap();
    ///
    /// let mut messages = Vec::new();
    /// assert!(!a.compare_with(&b, false, &mut |m| messages.push(m.to_string())));
    /// assert_eq!(messages, vec!["Inequality in f: 3.0 != 4.0"]);
    /// ```
    pub fn compare_with(
        &self,
        other: &Config,
        shortcut: bool,
        output: &mut dyn FnMut(&str),
    ) -> bool {
        if !Arc::ptr_eq(self.class(), other.class()) {
            let path = if self.path().is_empty() { "config" } else { self.path() };
            output(&format!(
                "Config types do not match for {path}: {} != {}",
                self.class().qualified_name(),
                other.class().qualified_name()
            ));
            return false;
        }

        let mut equal = true;
        for (name, slot) in self.slots() {
            let Some(other_slot) = other.slots().get(name) else {
                continue;
            };
            let path = join_path(self.path(), name);
            let same = match (slot, other_slot) {
                (Slot::Value(a), Slot::Value(b)) => compare_values(&path, a, b, shortcut, output),
                (Slot::Config(a), Slot::Config(b)) => a.compare_with(b, shortcut, output),
                (Slot::Choice(a), Slot::Choice(b)) => compare_choices(&path, a, b, shortcut, output),
                _ => {
                    output(&format!("Inequality in {path}: field kinds differ"));
                    false
                }
            };
            if !same {
                equal = false;
                if shortcut {
                    return false;
                }
            }
        }
        equal
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other)
    }
}

fn inequality(output: &mut dyn FnMut(&str), path: &str, a: &dyn std::fmt::Display, b: &dyn std::fmt::Display) {
    output(&format!("Inequality in {path}: {a} != {b}"));
}

fn compare_values(
    path: &str,
    a: &Value,
    b: &Value,
    shortcut: bool,
    output: &mut dyn FnMut(&str),
) -> bool {
    match (a, b) {
        (Value::List(xs), Value::List(ys)) => {
            if xs.len() != ys.len() {
                output(&format!("Inequality in size for {path}: {} != {}", xs.len(), ys.len()));
                return false;
            }
            let mut equal = true;
            for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
                if x != y {
                    inequality(output, &format!("{path}[{i}]"), x, y);
                    equal = false;
                    if shortcut {
                        return false;
                    }
                }
            }
            equal
        }
        (Value::Dict(xs), Value::Dict(ys)) => {
            let same_keys = xs.len() == ys.len() && xs.keys().all(|k| ys.contains_key(k));
            if !same_keys {
                let keys = |d: &indexmap::IndexMap<Key, Value>| {
                    Value::List(d.keys().map(Key::to_value).collect())
                };
                output(&format!(
                    "Inequality in keys for {path}: {} != {}",
                    keys(xs),
                    keys(ys)
                ));
                return false;
            }
            let mut equal = true;
            for (key, x) in xs {
                let y = &ys[key];
                if x != y {
                    inequality(output, &format!("{path}[{key}]"), x, y);
                    equal = false;
                    if shortcut {
                        return false;
                    }
                }
            }
            equal
        }
        _ => {
            if a == b {
                true
            } else {
                inequality(output, path, a, b);
                false
            }
        }
    }
}

fn compare_choices(
    path: &str,
    a: &ConfigChoice,
    b: &ConfigChoice,
    shortcut: bool,
    output: &mut dyn FnMut(&str),
) -> bool {
    if a.selection() != b.selection() {
        let label = if a.is_multi() { "names" } else { "name" };
        inequality(
            output,
            &format!("{path}.{label}"),
            &a.selection().to_value(),
            &b.selection().to_value(),
        );
        return false;
    }
    let mut equal = true;
    for name in a.names() {
        let same = match (a.candidate_or_fresh(name), b.candidate_or_fresh(name)) {
            (Ok(x), Ok(y)) => x.compare_with(&y, shortcut, output),
            (Err(err), _) | (_, Err(err)) => {
                output(&format!("Inequality in {path}: {err}"));
                false
            }
        };
        if !same {
            equal = false;
            if shortcut {
                return false;
            }
        }
    }
    equal
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::config::ConfigClass;
    use crate::field::Field;
    use crate::value::{Dtype, Value};

    fn simple() -> Arc<ConfigClass> {
        ConfigClass::builder("Simple")
            .field("f", Field::scalar(Dtype::Float, "f").default(3.0).build().unwrap())
            .field("ll", Field::list(Dtype::Int, "ll").default(vec![1, 2, 3]).build().unwrap())
            .field(
                "d",
                Field::dict(Dtype::Str, Dtype::Str, "d")
                    .default(Value::dict([("key", "value")]))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn messages(a: &crate::Config, b: &crate::Config, shortcut: bool) -> (bool, Vec<String>) {
        let mut out = Vec::new();
        let equal = a.compare_with(b, shortcut, &mut |m| out.push(m.to_string()));
        (equal, out)
    }

    #[test]
    fn test_reflexive_and_default_equal() {
        let class = simple();
        let a = class.instantiate().unwrap();
        let b = class.instantiate().unwrap();
        assert!(a.compare(&a));
        assert!(a.compare(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_list_size_and_items() {
        let class = simple();
        let a = class.instantiate().unwrap();
        let mut b = class.instantiate().unwrap();
        b.set("ll", vec![1, 2, 3, 4]).unwrap();
        let (equal, out) = messages(&a, &b, false);
        assert!(!equal);
        assert_eq!(out, vec!["Inequality in size for ll: 3 != 4"]);

        b.set("ll", vec![1, 5, 6]).unwrap();
        let (_, out) = messages(&a, &b, false);
        assert_eq!(out, vec!["Inequality in ll[1]: 2 != 5", "Inequality in ll[2]: 3 != 6"]);
    }

    #[test]
    fn test_dict_keys_and_items() {
        let class = simple();
        let a = class.instantiate().unwrap();
        let mut b = class.instantiate().unwrap();
        b.set("d", Value::dict([("key", "other")])).unwrap();
        let (_, out) = messages(&a, &b, false);
        assert_eq!(out, vec!["Inequality in d['key']: 'value' != 'other'"]);

        b.set("d", Value::dict([("foo", "bar")])).unwrap();
        let (_, out) = messages(&a, &b, false);
        assert_eq!(out, vec!["Inequality in keys for d: ['key'] != ['foo']"]);
    }

    #[test]
    fn test_shortcut_reports_once() {
        let class = simple();
        let a = class.instantiate().unwrap();
        let mut b = class.instantiate().unwrap();
        b.set("f", 1.0).unwrap();
        b.set("ll", vec![9]).unwrap();
        let (_, out) = messages(&a, &b, true);
        assert_eq!(out.len(), 1);
        let (_, out) = messages(&a, &b, false);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_nan_never_equal() {
        let class = simple();
        let mut a = class.instantiate().unwrap();
        let mut b = class.instantiate().unwrap();
        a.set("f", f64::NAN).unwrap();
        assert!(!a.compare(&b));
        b.set("f", f64::NAN).unwrap();
        assert!(!a.compare(&b));
    }

    #[test]
    fn test_different_classes() {
        let a = simple().instantiate().unwrap();
        let b = simple().instantiate().unwrap();
        let (equal, out) = messages(&a, &b, true);
        assert!(!equal);
        assert!(out[0].starts_with("Config types do not match for config"));
    }
}

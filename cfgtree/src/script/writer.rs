//! Renders a config as an override script.
//!
//! Only values that differ from a freshly instantiated config of the same
//! class are written, so `set_defaults` effects count as defaults. Loading
//! the output into a fresh instance reproduces the original.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::{Config, FieldValue};
use crate::error::{Error, Result};
use crate::value::Key;

#[derive(Default)]
struct Writer {
    imports: BTreeSet<String>,
    body: Vec<String>,
}

/// Renders `config` with `root` as the name of the top-level config.
pub(crate) fn render(config: &Config, root: &str) -> Result<String> {
    let baseline = Config::with_path(config.class(), config.path().to_string())?;
    let mut writer = Writer::default();
    writer.imports.extend(config.imports().iter().cloned());
    writer.config(config, &baseline, root)?;

    let mut out = String::new();
    for module in &writer.imports {
        out.push_str("import ");
        out.push_str(module);
        out.push('\n');
    }
    for line in &writer.body {
        out.push_str(line);
        out.push('\n');
    }
    Ok(out)
}

impl Writer {
    fn doc(&mut self, doc: &str) {
        for line in doc.lines().filter(|line| !line.trim().is_empty()) {
            self.body.push(format!("# {}", line.trim()));
        }
    }

    fn config(&mut self, config: &Config, baseline: &Config, prefix: &str) -> Result<()> {
        for (name, field) in config.class().fields() {
            let target = format!("{prefix}.{name}");
            match (config.field_value(name)?, baseline.field_value(name)?) {
                (FieldValue::Value(value), FieldValue::Value(default)) => {
                    // NaN never equals itself, so it is always written.
                    if value != default {
                        self.doc(field.doc());
                        self.body.push(format!("{target}={value}"));
                    }
                }
                (FieldValue::Config(nested), FieldValue::Config(default)) => {
                    if Arc::ptr_eq(nested.class(), default.class()) {
                        self.config(nested, default, &target)?;
                    } else {
                        let class = nested.class();
                        if !class.module().is_empty() {
                            self.imports.insert(class.module().to_string());
                        }
                        self.body.push(format!("{target}.retarget({})", class.qualified_name()));
                        let fresh = Config::with_path(class, nested.path().to_string())?;
                        self.config(nested, &fresh, &target)?;
                    }
                }
                (FieldValue::Choice(choice), FieldValue::Choice(default)) => {
                    if choice.selection() != default.selection() {
                        let label = if choice.is_multi() { "names" } else { "name" };
                        self.doc(field.doc());
                        self.body
                            .push(format!("{target}.{label}={}", choice.selection().to_value()));
                    }
                    for (key, candidate) in choice.actives() {
                        let candidate_default = default.candidate_or_fresh(key)?;
                        let path = format!("{target}[{}]", Key::from(key));
                        self.config(candidate, &candidate_default, &path)?;
                    }
                }
                _ => {
                    return Err(Error::Type(format!(
                        "field '{}' changed kind since the config was built",
                        config.child_path(name)
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigClass;
    use crate::field::Field;
    use crate::value::Dtype;

    fn inner() -> Arc<ConfigClass> {
        ConfigClass::builder("Inner")
            .module("pkg")
            .field("f", Field::scalar(Dtype::Float, "Inner.f").default(0.0).build().unwrap())
            .build()
            .unwrap()
    }

    fn outer() -> Arc<ConfigClass> {
        let inner = inner();
        let sub = ConfigClass::builder("Sub").module("pkg.sub").base(&inner).build().unwrap();
        ConfigClass::builder("Outer")
            .module("pkg")
            .field(
                "s",
                Field::scalar(Dtype::Str, "a string\nover two lines").default("x").build().unwrap(),
            )
            .field("c", Field::config(&inner, "nested").build().unwrap())
            .field(
                "r",
                Field::config_choice("choice")
                    .entry("A", &inner)
                    .entry("B", &sub)
                    .multi(true)
                    .build()
                    .unwrap(),
            )
            .set_defaults(|config| config.nested_mut("c")?.set("f", 2.0))
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults_produce_empty_script() {
        let config = outer().instantiate().unwrap();
        assert_eq!(render(&config, "config").unwrap(), "");
    }

    #[test]
    fn test_changed_values_with_doc_comments() {
        let mut config = outer().instantiate().unwrap();
        config.set("s", "it's").unwrap();
        config.nested_mut("c").unwrap().set("f", f64::NAN).unwrap();
        let text = render(&config, "root").unwrap();
        assert_eq!(
            text,
            "# a string\n# over two lines\nroot.s='it\\'s'\n# Inner.f\nroot.c.f=float('nan')\n"
        );
    }

    #[test]
    fn test_retarget_and_choice_output() {
        let outer = outer();
        let mut config = outer.instantiate().unwrap();
        let sub = config.choice("r").unwrap().typemap().class_of("B").unwrap();
        config.retarget("c", &sub).unwrap();
        let choice = config.choice_mut("r").unwrap();
        choice.set(vec!["B"]).unwrap();
        choice.get_mut("B").unwrap().set("f", 1.0).unwrap();
        choice.get_mut("A").unwrap().set("f", 9.0).unwrap();

        let text = render(&config, "config").unwrap();
        assert_eq!(
            text,
            "import pkg.sub\n\
             config.c.retarget(pkg.sub.Sub)\n\
             # choice\n\
             config.r.names=['B']\n\
             # Inner.f\n\
             config.r['B'].f=1.0\n"
        );
        assert!(!text.contains("9.0"));
    }
}

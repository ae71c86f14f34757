//! YAML adapter.
//!
//! A config is stored as a two-key document: the qualified name of its
//! class and its override script. Restoring it needs a [`TypeCatalog`] that
//! lists the class (and any class the script retargets to).
//!
//! ```
//! use cfgtree::yaml::{from_yaml, to_yaml};
//! use cfgtree::{ConfigClass, Dtype, Field, TypeCatalog, Value};
//!
//! let class = ConfigClass::builder("Simple")
//!     .module("app")
//!     .field("f", Field::scalar(Dtype::Float, "float test").default(3.0).build().unwrap())
//!     .build()
//!     .unwrap();
//! let mut config = class.instantiate().unwrap();
//! config.set("f", 0.5).unwrap();
//!
//! let text = to_yaml(&config).unwrap();
//! let restored = from_yaml(&text, &TypeCatalog::reachable_from(&class)).unwrap();
//! assert_eq!(restored.get("f").unwrap(), &Value::Float(0.5));
//! ```

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::script::{Loader, TypeCatalog};

/// The serialized form of a config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YamlDocument {
    /// Qualified name of the config's class.
    pub class: String,
    /// Override script reproducing the config from its defaults.
    pub overrides: String,
}

impl YamlDocument {
    /// Captures `config`.
    ///
    /// # Errors
    ///
    /// Fails if the override script cannot be rendered.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            class: config.class().qualified_name(),
            overrides: config.save_to_string()?,
        })
    }

    /// Rebuilds the config with classes from `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] when the class is not in the catalog, then
    /// any instantiation or script error.
    pub fn to_config(&self, catalog: &TypeCatalog) -> Result<Config> {
        let class = catalog
            .get(&self.class)
            .ok_or_else(|| Error::value(format!("unknown config class '{}'", self.class)))?;
        let mut config = class.instantiate()?;
        Loader::new()
            .catalog(catalog.clone())
            .source(format!("<yaml {}>", self.class))
            .load_str(&mut config, &self.overrides)?;
        Ok(config)
    }
}

/// Serializes `config` to a YAML document.
///
/// # Errors
///
/// Returns [`Error::Yaml`] if encoding fails.
pub fn to_yaml(config: &Config) -> Result<String> {
    let document = YamlDocument::from_config(config)?;
    Ok(serde_yaml::to_string(&document)?)
}

/// Restores a config from a document written by [`to_yaml`].
///
/// # Errors
///
/// Returns [`Error::Yaml`] for malformed documents, then as
/// [`YamlDocument::to_config`].
pub fn from_yaml(text: &str, catalog: &TypeCatalog) -> Result<Config> {
    let document: YamlDocument = serde_yaml::from_str(text)?;
    document.to_config(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigClass;
    use crate::field::Field;
    use crate::value::{Dtype, Value};

    #[test]
    fn test_unknown_class() {
        let text = "class: nowhere.Missing\noverrides: ''\n";
        let err = from_yaml(text, &TypeCatalog::new()).unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(from_yaml("class: [", &TypeCatalog::new()), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_document_shape() {
        let class = ConfigClass::builder("Simple")
            .module("app")
            .field("s", Field::scalar(Dtype::Str, "s").optional(true).build().unwrap())
            .build()
            .unwrap();
        let mut config = class.instantiate().unwrap();
        config.set("s", "x").unwrap();
        let document: serde_yaml::Value = serde_yaml::from_str(&to_yaml(&config).unwrap()).unwrap();
        assert_eq!(document["class"], serde_yaml::Value::from("app.Simple"));
        assert_eq!(document["overrides"], serde_yaml::Value::from("# s\nconfig.s='x'\n"));

        let restored = from_yaml(&to_yaml(&config).unwrap(), &TypeCatalog::reachable_from(&class)).unwrap();
        assert_eq!(restored.get("s").unwrap(), &Value::from("x"));
    }
}

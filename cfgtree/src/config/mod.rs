//! The config object model.
//!
//! This module provides:
//! - [`ConfigClass`]: the runtime schema, with C3-linearised inheritance,
//!   mixins, partial field redefinition and `set_defaults`/`validate` hooks
//! - [`Config`]: an instance holding one value per field, routing every
//!   mutation through the field's checks
//! - [`ConfigChoice`]: the value of a config choice field
//! - validation, comparison, freezing, `to_dict` and per-field history
//!
//! # Examples
//!
//! ```
//! use cfgtree::{ConfigClass, Dtype, Error, Field, Value};
//!
//! let inner = ConfigClass::builder("InnerConfig")
//!     .field(
//!         "f",
//!         Field::scalar(Dtype::Float, "Inner.f")
//!             .default(0.0)
//!             .check(|v| v.as_float().is_some_and(|x| x >= 0.0))
//!             .build()
//!             .unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//! let outer = ConfigClass::builder("OuterConfig")
//!     .base(&inner)
//!     .field("i", Field::config(&inner, "Outer.i").build().unwrap())
//!     .set_defaults(|config| config.nested_mut("i")?.set("f", 5.0))
//!     .validate(|config| {
//!         if config.nested("i")?.get("f")?.as_float() < Some(5.0) {
//!             return Err(Error::value("outer.i.f must be greater than 5"));
//!         }
//!         Ok(())
//!     })
//!     .build()
//!     .unwrap();
//!
//! let mut config = outer.instantiate().unwrap();
//! assert_eq!(config.nested("i").unwrap().get("f").unwrap(), &Value::Float(5.0));
//! config.validate().unwrap();
//!
//! config.nested_mut("i").unwrap().set("f", 1.0).unwrap();
//! assert!(config.validate().is_err());
//! ```

mod choice;
pub mod class;
mod compare;
pub mod history;
mod instance;
mod validator;

pub use choice::{ConfigChoice, Selection};
pub use class::{ConfigClass, ConfigClassBuilder, SetDefaultsHook, ValidateHook};
pub use history::{format_history, HistoryEntry, Provenance};
pub use instance::{Config, FieldValue};

pub(crate) use instance::join_path;

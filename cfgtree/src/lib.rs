#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # cfgtree
//!
//! Typed, validated, nested configuration trees.
//!
//! A [`ConfigClass`] is a schema made of typed [`Field`]s: scalars, ranges,
//! choices, lists, dicts, nested configs and selections among several
//! candidate configs (optionally backed by a shared [`Registry`]). Classes
//! inherit fields from their bases and may redefine defaults. Instances
//! ([`Config`]) start from the defaults, check every assignment, validate
//! whole-object invariants, compare with path-qualified diagnostics, freeze,
//! and keep a history of where each value came from.
//!
//! Configs round-trip through a small, Python-compatible override script
//! (see [`script`]), and export to nested mappings, typed property bags
//! ([`convert`]) and YAML ([`yaml`]).
//!
//! ## Core Types
//!
//! - [`Field`], [`FieldBuilder`] and [`FieldKind`]: field descriptors
//! - [`ConfigClass`] and [`Config`]: schemas and their instances
//! - [`ConfigChoice`] and [`Registry`]: polymorphic selections
//! - [`Value`], [`Key`] and [`Dtype`]: dynamic values
//! - [`Error`] and [`Result`]: error handling types
//! - [`Logger`] and [`LogLevel`]: logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use cfgtree::{ConfigClass, Dtype, Field, Value};
//!
//! let class = ConfigClass::builder("Simple")
//!     .module("app")
//!     .field(
//!         "r",
//!         Field::range(Dtype::Float, "range test").min(3.0).max(4.0).default(3.5).build().unwrap(),
//!     )
//!     .field("ll", Field::list(Dtype::Int, "list test").default(vec![1, 2, 3]).build().unwrap())
//!     .build()
//!     .unwrap();
//!
//! let mut config = class.instantiate().unwrap();
//! assert!(config.set("r", 5.0).is_err());
//! config.set("ll", vec![4]).unwrap();
//! config.validate().unwrap();
//!
//! let mut copy = class.instantiate().unwrap();
//! copy.load_from_str(&config.save_to_string().unwrap()).unwrap();
//! assert!(copy.compare(&config));
//! assert_eq!(copy.get("ll").unwrap(), &Value::from(vec![4]));
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod field;
pub mod logging;
pub mod registry;
pub mod script;
pub mod value;
pub mod yaml;

// Re-export key types at crate root for convenience
pub use config::{
    format_history, Config, ConfigChoice, ConfigClass, ConfigClassBuilder, FieldValue,
    HistoryEntry, Provenance, Selection,
};
pub use convert::{make_property_set, PropertyBag, PropertySet, PropertySetProvider, PropertyValue};
pub use error::{Error, Result};
pub use field::{Field, FieldBuilder, FieldKind, TypeMap};
pub use logging::{init_logger, LogLevel, Logger};
pub use registry::{Configurable, Registry};
pub use script::{Loader, TypeCatalog};
pub use value::{Dtype, Key, Value};

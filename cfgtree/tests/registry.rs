//! Registries and the config choice fields built from them.

mod common;

use std::sync::Arc;

use cfgtree::{ConfigClass, Configurable, Dtype, Error, Field, Registry, Value};
use common::fixtures;

/// A target that is configured by `class` and reports its own name.
struct Algorithm {
    name: &'static str,
    class: Arc<ConfigClass>,
}

impl Configurable for Algorithm {
    fn config_class(&self) -> Arc<ConfigClass> {
        Arc::clone(&self.class)
    }

    fn describe(&self) -> String {
        format!("algorithm {}", self.name)
    }
}

fn base() -> Arc<ConfigClass> {
    ConfigClass::builder("AlgorithmConfig")
        .module("tests.algorithms")
        .field("scale", Field::scalar(Dtype::Float, "scale factor").default(1.0).build().unwrap())
        .build()
        .unwrap()
}

#[test]
fn test_registered_targets_drive_selection() {
    let base = base();
    let registry = Registry::new("algorithms", &base);
    registry
        .register("fast", Algorithm { name: "fast", class: Arc::clone(&base) })
        .unwrap();
    let owner = ConfigClass::builder("Task")
        .field("alg", registry.make_field("which algorithm").default("fast").build().unwrap())
        .build()
        .unwrap();

    let mut task = owner.instantiate().unwrap();
    let choice = task.choice_mut("alg").unwrap();
    assert_eq!(choice.target().unwrap().describe(), "algorithm fast");
    choice.active_mut().unwrap().set("scale", 2.0).unwrap();

    // Registered after the instance was built.
    let slow = ConfigClass::builder("SlowConfig")
        .base(&base)
        .field("steps", Field::scalar(Dtype::Int, "steps").default(10).build().unwrap())
        .build()
        .unwrap();
    registry
        .register("slow", Algorithm { name: "slow", class: Arc::clone(&slow) })
        .unwrap();
    assert_eq!(choice.keys(), vec!["fast", "slow"]);
    assert!(choice.get("slow").is_none());
    choice.select("slow").unwrap();
    let active = choice.active().unwrap();
    assert!(Arc::ptr_eq(active.class(), &slow));
    assert_eq!(active.get("steps").unwrap(), &Value::Int(10));
    assert_eq!(active.path(), "alg['slow']");
    assert!(Arc::ptr_eq(&choice.target().unwrap().config_class(), &slow));
}

#[test]
fn test_registration_rules() {
    let base = base();
    let registry = Registry::new("algorithms", &base);
    registry.register("a", Arc::clone(&base)).unwrap();

    let err = registry.register("a", Arc::clone(&base)).unwrap_err();
    assert!(matches!(err, Error::NameConflict { ref name, .. } if name == "a"));

    let unrelated = ConfigClass::builder("Unrelated").build().unwrap();
    let err = registry.register("b", unrelated).unwrap_err();
    assert!(err.is_value_error());
    assert!(err.to_string().contains("does not derive from tests.algorithms.AlgorithmConfig"));

    let replacement = ConfigClass::builder("Replacement").base(&base).build().unwrap();
    registry.register_override("a", Arc::clone(&replacement)).unwrap();
    assert!(Arc::ptr_eq(&registry.class_of("a").unwrap(), &replacement));
    assert_eq!(registry.names(), vec!["a"]);
    assert_eq!(registry.len(), 1);
    assert!(registry.contains("a"));
    assert!(!registry.contains("b"));
}

#[test]
fn test_clones_share_entries() {
    let base = base();
    let registry = Registry::new("algorithms", &base);
    let alias = registry.clone();
    alias.register("x", Arc::clone(&base)).unwrap();
    assert!(registry.contains("x"));
    assert!(!registry.is_empty());
}

#[test]
fn test_unknown_and_non_registry_targets() {
    let fx = fixtures();
    let mut owner = fx.registry_owner.instantiate().unwrap();
    assert!(owner.set("alg", "missing").unwrap_err().to_string().contains("Unknown key"));
    assert_eq!(owner.choice("alg").unwrap().name(), Some("plain"));

    let complex = fx.complex.instantiate().unwrap();
    let err = complex.choice("r").unwrap().target().err().unwrap();
    assert!(matches!(err, Error::Type(_)));
}

#[test]
fn test_multi_selection_targets() {
    let fx = fixtures();
    let mut owner = fx.registry_owner.instantiate().unwrap();
    let algs = owner.choice_mut("algs").unwrap();
    assert!(algs.is_multi());
    assert!(algs.names().is_empty());
    assert!(algs.target().is_err());

    algs.set(vec!["extended", "plain"]).unwrap();
    let classes: Vec<String> = algs
        .targets()
        .unwrap()
        .iter()
        .map(|target| target.config_class().name().to_string())
        .collect();
    assert_eq!(classes, vec!["InnerSub", "InnerConfig"]);
    assert_eq!(algs.actives().len(), 2);
    assert!(algs.active().is_err());

    // A single name is not a valid multi selection.
    assert!(algs.set("plain").is_err());
    algs.select("plain").unwrap();
    assert_eq!(algs.names(), vec!["plain"]);
}

#[test]
fn test_multi_selection_in_scripts() {
    let fx = fixtures();
    let mut owner = fx.registry_owner.instantiate().unwrap();
    owner
        .load_from_str("config.algs.names = ['plain', 'extended']\nconfig.algs['extended'].g = 4\n")
        .unwrap();
    let text = owner.save_to_string().unwrap();
    assert_eq!(
        text,
        "# several algorithms\nconfig.algs.names=['plain', 'extended']\n# extra\nconfig.algs['extended'].g=4\n"
    );

    let err = owner.load_from_str("config.algs.name = 'plain'\n").unwrap_err();
    assert!(matches!(err, Error::Attribute { .. }));
    let err = owner.load_from_str("config.alg.names = ['plain']\n").unwrap_err();
    assert!(matches!(err, Error::Attribute { .. }));

    let mut loaded = fx.registry_owner.instantiate().unwrap();
    loaded.load_from_str(&text).unwrap();
    assert_eq!(loaded, owner);
    loaded.validate().unwrap();
}

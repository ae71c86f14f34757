//! Freezing and deep comparison of config trees.

mod common;

use cfgtree::{Config, ConfigClass, Dtype, Field, Value};
use common::fixtures;

fn report(a: &Config, b: &Config, shortcut: bool) -> (bool, Vec<String>) {
    let mut messages = Vec::new();
    let equal = a.compare_with(b, shortcut, &mut |m| messages.push(m.to_string()));
    (equal, messages)
}

#[test]
fn test_freeze_locks_the_whole_tree() {
    let mut complex = fixtures().complex.instantiate().unwrap();
    complex.freeze();
    assert!(complex.is_frozen());

    let err = complex.nested_mut("c").unwrap().set("f", 1.0).unwrap_err();
    assert!(err.to_string().contains("Cannot modify a frozen Config"));
    assert_eq!(err.field_path(), Some("c.f"));

    assert!(complex.set("r", "BBB").is_err());
    assert_eq!(complex.choice("r").unwrap().name(), Some("AAA"));

    // Unselected candidates are frozen too.
    let bbb = complex.choice_mut("r").unwrap().get_mut("BBB").unwrap();
    assert!(bbb.is_frozen());
    assert!(bbb.set("f", 1.0).is_err());

    assert!(complex.retarget("c", &fixtures().inner).is_err());
}

#[test]
fn test_mutable_after_freeze() {
    let class = ConfigClass::builder("Tunable")
        .field("fixed", Field::scalar(Dtype::Int, "fixed").default(1).build().unwrap())
        .field(
            "knob",
            Field::scalar(Dtype::Int, "tunable")
                .default(1)
                .mutable_after_freeze(true)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let mut config = class.instantiate().unwrap();
    config.freeze();
    assert!(config.set("fixed", 2).is_err());
    config.set("knob", 2).unwrap();
    assert_eq!(config.get("knob").unwrap(), &Value::Int(2));
}

#[test]
fn test_frozen_config_can_still_be_read_and_saved() {
    let mut inner = fixtures().inner.instantiate().unwrap();
    inner.set("f", 1.0).unwrap();
    inner.freeze();
    assert_eq!(inner.save_to_string().unwrap(), "# Inner.f\nconfig.f=1.0\n");
    inner.validate().unwrap();

    let mut copy = inner.clone();
    assert!(copy.is_frozen());
    assert!(copy.load_from_str("config.f = 2.0\n").is_err());
}

#[test]
fn test_compare_reports_every_difference() {
    let fx = fixtures();
    let mut a = fx.complex.instantiate().unwrap();
    let mut b = fx.complex.instantiate().unwrap();
    for config in [&mut a, &mut b] {
        // NaN in the active Simple candidate would always differ.
        config.set("r", "BBB").unwrap();
    }
    assert!(a.compare(&b));

    b.nested_mut("c").unwrap().set("f", 1.0).unwrap();
    b.set("p", Value::None).unwrap();

    let (equal, messages) = report(&a, &b, false);
    assert!(!equal);
    assert_eq!(
        messages,
        vec!["Inequality in c.f: 0.0 != 1.0", "Inequality in p.name: 'BBB' != None"]
    );

    let (equal, messages) = report(&a, &b, true);
    assert!(!equal);
    assert_eq!(messages.len(), 1);
}

#[test]
fn test_compare_lists_and_dicts() {
    let fx = fixtures();
    let a = fx.simple.instantiate().unwrap();
    let mut b = fx.simple.instantiate().unwrap();

    b.set("ll", vec![1, 2]).unwrap();
    b.set("d", Value::dict([("other", "v")])).unwrap();
    let (_, messages) = report(&a, &b, false);
    assert!(messages.contains(&"Inequality in size for ll: 3 != 2".to_string()));
    assert!(messages.contains(&"Inequality in keys for d: ['key'] != ['other']".to_string()));

    b.set("ll", vec![1, 5, 3]).unwrap();
    b.set("d", Value::dict([("key", "v2")])).unwrap();
    let (_, messages) = report(&a, &b, false);
    assert!(messages.contains(&"Inequality in ll[1]: 2 != 5".to_string()));
    assert!(messages.contains(&"Inequality in d['key']: 'value' != 'v2'".to_string()));
}

#[test]
fn test_nan_never_compares_equal() {
    let fx = fixtures();
    let a = fx.simple.instantiate().unwrap();
    assert!(!a.compare(&a.clone()));
    assert_ne!(a, a.clone());

    let mut b = a.clone();
    b.set("n", 1.0).unwrap();
    let mut c = a.clone();
    c.set("n", 1.0).unwrap();
    assert!(b.compare(&c));
}

#[test]
fn test_compare_requires_identical_classes() {
    let fx = fixtures();
    let inner = fx.inner.instantiate().unwrap();
    let derived = ConfigClass::builder("InnerConfig")
        .module("tests.fixtures")
        .base(&fx.inner)
        .build()
        .unwrap()
        .instantiate()
        .unwrap();
    let (equal, messages) = report(&inner, &derived, false);
    assert!(!equal);
    assert_eq!(
        messages,
        vec!["Config types do not match for config: tests.fixtures.InnerConfig != tests.fixtures.InnerConfig"]
    );

    let mut a = fx.complex.instantiate().unwrap();
    let b = a.clone();
    a.retarget("c", &fx.inner_sub).unwrap();
    let (_, messages) = report(&a, &b, true);
    assert_eq!(
        messages,
        vec!["Config types do not match for c: tests.plugins.InnerSub != tests.fixtures.InnerConfig"]
    );
}

#[test]
fn test_compare_multi_choices() {
    let fx = fixtures();
    let mut a = fx.registry_owner.instantiate().unwrap();
    let mut b = fx.registry_owner.instantiate().unwrap();
    a.set("algs", vec!["plain", "extended"]).unwrap();
    b.set("algs", vec!["plain"]).unwrap();

    let (_, messages) = report(&a, &b, false);
    assert_eq!(messages, vec!["Inequality in algs.names: ['plain', 'extended'] != ['plain']"]);

    b.set("algs", vec!["plain", "extended"]).unwrap();
    b.choice_mut("algs")
        .unwrap()
        .get_mut("extended")
        .unwrap()
        .set("g", 5)
        .unwrap();
    let (_, messages) = report(&a, &b, false);
    assert_eq!(messages, vec!["Inequality in algs['extended'].g: 1 != 5"]);
}

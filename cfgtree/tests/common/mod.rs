//! Common fixtures for integration tests.
//!
//! The classes live in a process-wide [`OnceLock`] so every test sees the
//! same `Arc<ConfigClass>` values; comparisons and retargeting rely on class
//! identity.

use std::sync::{Arc, OnceLock};

use cfgtree::{ConfigClass, Dtype, Error, Field, Registry, Value};

/// The shared schema used across the integration suites.
#[allow(dead_code)]
pub struct Fixtures {
    /// One field of every scalar-ish kind, including a NaN default.
    pub simple: Arc<ConfigClass>,
    /// A single non-negative float.
    pub inner: Arc<ConfigClass>,
    /// Derives from `inner`, nests an `inner`, and sets/validates `i.f`.
    pub outer: Arc<ConfigClass>,
    /// A nested config plus two config choice fields over `simple`/`inner`.
    pub complex: Arc<ConfigClass>,
    /// A deprecated field.
    pub deprecation: Arc<ConfigClass>,
    /// Subclass of `inner` usable for retargeting.
    pub inner_sub: Arc<ConfigClass>,
    /// A registry whose base is `inner`.
    pub registry: Registry,
    /// Holds a field backed by `registry`.
    pub registry_owner: Arc<ConfigClass>,
}

fn simple() -> Arc<ConfigClass> {
    ConfigClass::builder("Simple")
        .module("tests.fixtures")
        .field("i", Field::scalar(Dtype::Int, "integer test").optional(true).build().unwrap())
        .field("f", Field::scalar(Dtype::Float, "float test").default(3.0).build().unwrap())
        .field("b", Field::scalar(Dtype::Bool, "boolean test").default(false).build().unwrap())
        .field(
            "c",
            Field::choice(Dtype::Str, "choice test")
                .allow("Hello", "First choice")
                .allow("World", "second choice")
                .default("Hello")
                .build()
                .unwrap(),
        )
        .field(
            "r",
            Field::range(Dtype::Float, "Range test")
                .min(3.0)
                .inclusive_min(true)
                .default(3.0)
                .build()
                .unwrap(),
        )
        .field(
            "ll",
            Field::list(Dtype::Int, "list test")
                .default(vec![1, 2, 3])
                .max_length(5)
                .item_check(|x| x.as_int().is_some_and(|x| x > 0))
                .build()
                .unwrap(),
        )
        .field(
            "d",
            Field::dict(Dtype::Str, Dtype::Str, "dict test")
                .default(Value::dict([("key", "value")]))
                .item_check(|x| x.as_str().is_some_and(|s| s.starts_with('v')))
                .build()
                .unwrap(),
        )
        .field("n", Field::scalar(Dtype::Float, "nan test").default(f64::NAN).build().unwrap())
        .build()
        .unwrap()
}

fn inner() -> Arc<ConfigClass> {
    ConfigClass::builder("InnerConfig")
        .module("tests.fixtures")
        .field(
            "f",
            Field::scalar(Dtype::Float, "Inner.f")
                .default(0.0)
                .check(|x| x.as_float().is_some_and(|x| x >= 0.0))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

fn outer(inner: &Arc<ConfigClass>) -> Arc<ConfigClass> {
    ConfigClass::builder("OuterConfig")
        .module("tests.fixtures")
        .base(inner)
        .field("i", Field::config(inner, "Outer.i").build().unwrap())
        .set_defaults(|config| config.nested_mut("i")?.set("f", 5.0))
        .validate(|config| {
            if config.nested("i")?.get("f")?.as_float() < Some(5.0) {
                return Err(Error::value(
                    "validation failed, outer.i.f must be greater than 5",
                ));
            }
            Ok(())
        })
        .build()
        .unwrap()
}

fn complex(simple: &Arc<ConfigClass>, inner: &Arc<ConfigClass>) -> Arc<ConfigClass> {
    ConfigClass::builder("Complex")
        .module("tests.fixtures")
        .field("c", Field::config(inner, "an inner config").build().unwrap())
        .field(
            "r",
            Field::config_choice("a registry field")
                .entry("AAA", simple)
                .entry("BBB", inner)
                .default("AAA")
                .build()
                .unwrap(),
        )
        .field(
            "p",
            Field::config_choice("another registry")
                .entry("AAA", simple)
                .entry("BBB", inner)
                .default("BBB")
                .optional(true)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

fn build() -> Fixtures {
    let simple = simple();
    let inner = inner();
    let outer = outer(&inner);
    let complex = complex(&simple, &inner);
    let deprecation = ConfigClass::builder("Deprecation")
        .module("tests.fixtures")
        .field(
            "old",
            Field::scalar(Dtype::Int, "Something.").default(10).deprecated("not used!").build().unwrap(),
        )
        .build()
        .unwrap();
    let inner_sub = ConfigClass::builder("InnerSub")
        .module("tests.plugins")
        .base(&inner)
        .field("g", Field::scalar(Dtype::Int, "extra").default(1).build().unwrap())
        .build()
        .unwrap();
    let registry = Registry::new("inner algorithms", &inner);
    registry.register("plain", Arc::clone(&inner)).unwrap();
    registry.register("extended", Arc::clone(&inner_sub)).unwrap();
    let registry_owner = ConfigClass::builder("RegistryOwner")
        .module("tests.fixtures")
        .field("alg", registry.make_field("the algorithm").default("plain").build().unwrap())
        .field(
            "algs",
            registry.make_field("several algorithms").multi(true).optional(true).build().unwrap(),
        )
        .build()
        .unwrap();

    Fixtures {
        simple,
        inner,
        outer,
        complex,
        deprecation,
        inner_sub,
        registry,
        registry_owner,
    }
}

/// The shared fixtures.
#[allow(dead_code)]
pub fn fixtures() -> &'static Fixtures {
    static FIXTURES: OnceLock<Fixtures> = OnceLock::new();
    FIXTURES.get_or_init(build)
}

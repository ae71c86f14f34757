//! Executes a parsed override script against a config.
//!
//! Scripts address the config through a root name (`config` by default).
//! Assignments go through the same checks as [`Config::set`]; item
//! assignment on list and dict fields reads the current value, updates the
//! copy and assigns it back so the field's constraints still apply.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::{Config, ConfigClass, ConfigChoice, FieldValue, Provenance};
use crate::error::{Error, Result};
use crate::script::ast::{Expr, Script, Statement};
use crate::script::catalog::TypeCatalog;
use crate::value::{Key, Value};

/// One step from the root config to an assignable location.
#[derive(Debug, Clone)]
enum Seg {
    Attr(String),
    Index(Value),
}

#[derive(Debug, Clone, Copy)]
enum Builtin {
    Float,
    Int,
    Str,
    Bool,
}

impl Builtin {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "float" => Some(Self::Float),
            "int" => Some(Self::Int),
            "str" => Some(Self::Str),
            "bool" => Some(Self::Bool),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Str => "str",
            Self::Bool => "bool",
        }
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn call(self, value: Value) -> Result<Value> {
        let invalid = |value: &Value| {
            Error::value(format!("invalid literal for {}(): {value}", self.name()))
        };
        match (self, value) {
            (Self::Float, Value::Float(x)) => Ok(Value::Float(x)),
            (Self::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
            (Self::Float, Value::Bool(b)) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
            (Self::Float, Value::Str(text)) => parse_float(&text)
                .map(Value::Float)
                .ok_or_else(|| invalid(&Value::Str(text))),
            (Self::Int, Value::Int(i)) => Ok(Value::Int(i)),
            (Self::Int, Value::Bool(b)) => Ok(Value::Int(i64::from(b))),
            (Self::Int, Value::Float(x)) if x.is_finite() => Ok(Value::Int(x.trunc() as i64)),
            (Self::Int, Value::Float(x)) => Err(Error::value(format!(
                "cannot convert float {} to integer",
                Value::Float(x)
            ))),
            (Self::Int, Value::Str(text)) => text
                .trim()
                .replace('_', "")
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| invalid(&Value::Str(text))),
            (Self::Str, Value::Str(text)) => Ok(Value::Str(text)),
            (Self::Str, other) => Ok(Value::Str(other.to_string())),
            (Self::Bool, other) => Ok(Value::Bool(truthy(&other))),
            (_, other) => Err(Error::Type(format!(
                "{}() argument must be a string or a number, not '{}'",
                self.name(),
                other.type_name()
            ))),
        }
    }
}

fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let (sign, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    match body.to_ascii_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        "inf" | "infinity" => Some(sign * f64::INFINITY),
        _ => trimmed.replace('_', "").parse::<f64>().ok(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::None => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(x) => *x != 0.0,
        Value::Str(text) => !text.is_empty(),
        Value::List(items) => !items.is_empty(),
        Value::Dict(entries) => !entries.is_empty(),
    }
}

/// What a name or expression evaluates to.
#[derive(Debug, Clone)]
enum Object {
    Value(Value),
    Module(String),
    Class(Arc<ConfigClass>),
    Builtin(Builtin),
    Place(Vec<Seg>),
}

#[derive(Debug, Clone)]
enum Binding {
    Root,
    Module(String),
    Class(Arc<ConfigClass>),
}

enum NodeMut<'c> {
    Config(&'c mut Config),
    Choice(&'c mut ConfigChoice),
}

enum Kind {
    Value,
    Config,
    Choice,
}

fn kind_of(config: &Config, name: &str) -> Result<Kind> {
    Ok(match config.field_value(name)? {
        FieldValue::Value(_) => Kind::Value,
        FieldValue::Config(_) => Kind::Config,
        FieldValue::Choice(_) => Kind::Choice,
    })
}

fn selection_label(choice: &ConfigChoice) -> &'static str {
    if choice.is_multi() {
        "names"
    } else {
        "name"
    }
}

fn choice_attribute_error(choice: &ConfigChoice, name: &str) -> Error {
    Error::Attribute {
        owner: format!("{} '{}'", choice.field().type_name(), choice.path()),
        name: name.to_string(),
    }
}

fn candidate_key(choice: &ConfigChoice, index: &Value) -> Result<String> {
    index.as_str().map(str::to_string).ok_or_else(|| {
        Error::Type(format!(
            "{} '{}' keys are strings, not {}",
            choice.field().type_name(),
            choice.path(),
            index.type_name()
        ))
    })
}

/// Walks config and choice nodes as far as `segs` allows. Stops at the last
/// segment, or before the first segment that descends into a value field.
fn resolve_mut<'c, 's>(node: NodeMut<'c>, segs: &'s [Seg]) -> Result<(NodeMut<'c>, &'s [Seg])> {
    let Some((first, rest)) = segs.split_first() else {
        return Ok((node, segs));
    };
    if rest.is_empty() {
        return Ok((node, segs));
    }
    match node {
        NodeMut::Config(config) => {
            let Seg::Attr(name) = first else {
                return Ok((NodeMut::Config(config), segs));
            };
            match kind_of(config, name)? {
                Kind::Value => Ok((NodeMut::Config(config), segs)),
                Kind::Config => resolve_mut(NodeMut::Config(config.nested_mut(name)?), rest),
                Kind::Choice => resolve_mut(NodeMut::Choice(config.choice_mut(name)?), rest),
            }
        }
        NodeMut::Choice(choice) => match first {
            Seg::Index(index) => {
                let key = candidate_key(choice, index)?;
                resolve_mut(NodeMut::Config(choice.get_mut(&key)?), rest)
            }
            Seg::Attr(name) if name == "active" => {
                resolve_mut(NodeMut::Config(choice.active_mut()?), rest)
            }
            Seg::Attr(_) => Ok((NodeMut::Choice(choice), segs)),
        },
    }
}

fn read_config(config: &Config, segs: &[Seg]) -> Result<Value> {
    let Some((first, rest)) = segs.split_first() else {
        return Err(Error::Type(format!(
            "config '{}' of type {} cannot be used as a value",
            config.path(),
            config.class().qualified_name()
        )));
    };
    match first {
        Seg::Attr(name) => match config.field_value(name)? {
            FieldValue::Value(value) => read_value(value, rest),
            FieldValue::Config(nested) => read_config(nested, rest),
            FieldValue::Choice(choice) => read_choice(choice, rest),
        },
        Seg::Index(_) => Err(Error::Type(format!(
            "{} object is not subscriptable",
            config.class().qualified_name()
        ))),
    }
}

fn read_choice(choice: &ConfigChoice, segs: &[Seg]) -> Result<Value> {
    let Some((first, rest)) = segs.split_first() else {
        return Err(Error::Type(format!(
            "{} '{}' cannot be used as a value",
            choice.field().type_name(),
            choice.path()
        )));
    };
    match first {
        Seg::Attr(name) if name == selection_label(choice) => {
            read_value(&choice.selection().to_value(), rest)
        }
        Seg::Attr(name) if name == "active" => read_config(choice.active()?, rest),
        Seg::Attr(name) => Err(choice_attribute_error(choice, name)),
        Seg::Index(index) => {
            let key = candidate_key(choice, index)?;
            read_config(&*choice.candidate_or_fresh(&key)?, rest)
        }
    }
}

fn read_value(value: &Value, segs: &[Seg]) -> Result<Value> {
    let Some((first, rest)) = segs.split_first() else {
        return Ok(value.clone());
    };
    match first {
        Seg::Index(index) => read_value(item(value, index)?, rest),
        Seg::Attr(name) => Err(Error::Attribute {
            owner: value.type_name().to_string(),
            name: name.clone(),
        }),
    }
}

fn list_position(len: usize, index: &Value) -> Result<usize> {
    let Some(i) = index.as_int() else {
        return Err(Error::Type(format!(
            "list indices must be integers, not {}",
            index.type_name()
        )));
    };
    let position = if i < 0 {
        i64::try_from(len).ok().and_then(|len| usize::try_from(len + i).ok())
    } else {
        usize::try_from(i).ok()
    };
    position
        .filter(|&p| p < len)
        .ok_or_else(|| Error::value(format!("list index {i} out of range")))
}

fn dict_key(index: &Value) -> Result<Key> {
    Key::from_value(index)
        .ok_or_else(|| Error::Type(format!("unhashable dict key type: '{}'", index.type_name())))
}

fn item<'v>(value: &'v Value, index: &Value) -> Result<&'v Value> {
    match value {
        Value::List(items) => Ok(&items[list_position(items.len(), index)?]),
        Value::Dict(entries) => {
            let key = dict_key(index)?;
            entries
                .get(&key)
                .ok_or_else(|| Error::value(format!("key {key} not found")))
        }
        other => Err(Error::Type(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Stores `new` at `segs` inside `value`.
fn update_value(value: &mut Value, segs: &[Seg], new: Value) -> Result<()> {
    let Some((first, rest)) = segs.split_first() else {
        *value = new;
        return Ok(());
    };
    let Seg::Index(index) = first else {
        return Err(Error::Type(format!(
            "cannot set attributes on '{}' values",
            value.type_name()
        )));
    };
    match value {
        Value::List(items) => {
            let position = list_position(items.len(), index)?;
            update_value(&mut items[position], rest, new)
        }
        Value::Dict(entries) => {
            let key = dict_key(index)?;
            if rest.is_empty() {
                entries.insert(key, new);
                return Ok(());
            }
            let entry = entries
                .get_mut(&key)
                .ok_or_else(|| Error::value(format!("key {key} not found")))?;
            update_value(entry, rest, new)
        }
        other => Err(Error::Type(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

/// Runs statements in order against one config.
pub(crate) struct Interpreter<'a> {
    catalog: &'a TypeCatalog,
    source: &'a str,
    bindings: HashMap<String, Binding>,
    line: usize,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(root: &str, catalog: &'a TypeCatalog, source: &'a str) -> Self {
        let mut bindings = HashMap::new();
        bindings.insert(root.to_string(), Binding::Root);
        Self {
            catalog,
            source,
            bindings,
            line: 0,
        }
    }

    pub(crate) fn run(&mut self, config: &mut Config, script: &Script) -> Result<()> {
        for statement in &script.statements {
            self.line = statement.line();
            self.execute(config, statement)?;
        }
        Ok(())
    }

    fn provenance(&self) -> Provenance {
        Provenance::Script {
            source: self.source.to_string(),
            line: self.line,
        }
    }

    fn execute(&mut self, config: &mut Config, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Import { module, alias, .. } => {
                if !self.catalog.has_module(module) {
                    return Err(Error::Import {
                        module: module.clone(),
                    });
                }
                match alias {
                    Some(alias) => {
                        self.bindings
                            .insert(alias.clone(), Binding::Module(module.clone()));
                    }
                    None => {
                        let top = module.split('.').next().unwrap_or(module.as_str());
                        self.bindings
                            .insert(top.to_string(), Binding::Module(top.to_string()));
                    }
                }
                config.add_import(module);
                Ok(())
            }
            Statement::FromImport { module, names, .. } => {
                if !self.catalog.has_module(module) {
                    return Err(Error::Import {
                        module: module.clone(),
                    });
                }
                for import in names {
                    let qualified = format!("{module}.{}", import.name);
                    let binding = if let Some(class) = self.catalog.get(&qualified) {
                        Binding::Class(Arc::clone(class))
                    } else if self.catalog.has_module(&qualified) {
                        Binding::Module(qualified)
                    } else {
                        return Err(Error::Import { module: qualified });
                    };
                    let local = import.alias.as_ref().unwrap_or(&import.name);
                    self.bindings.insert(local.clone(), binding);
                }
                config.add_import(module);
                Ok(())
            }
            Statement::Assign { target, value, .. } => {
                let value = self.eval_value(config, value)?;
                let segs = self.place(config, target)?;
                self.assign(config, &segs, value)
            }
            Statement::Call { expr, .. } => self.call_statement(config, expr),
        }
    }

    fn place(&self, config: &Config, target: &Expr) -> Result<Vec<Seg>> {
        match self.eval(config, target)? {
            Object::Place(segs) if !segs.is_empty() => Ok(segs),
            _ => Err(Error::Type(format!(
                "line {}: only fields of the root config can be assigned",
                self.line
            ))),
        }
    }

    fn assign(&self, config: &mut Config, segs: &[Seg], value: Value) -> Result<()> {
        let provenance = self.provenance();
        let (node, rest) = resolve_mut(NodeMut::Config(config), segs)?;
        match (node, rest) {
            (NodeMut::Config(config), [Seg::Attr(name)]) => {
                config.set_with_provenance(name, value, provenance)
            }
            (NodeMut::Config(config), [Seg::Attr(name), tail @ ..]) => {
                let mut current = config.get(name)?.clone();
                update_value(&mut current, tail, value)?;
                config.set_with_provenance(name, current, provenance)
            }
            (NodeMut::Choice(choice), [Seg::Attr(name), tail @ ..]) => {
                if tail.is_empty() && name == selection_label(choice) {
                    choice.set_with_provenance(value, provenance)
                } else {
                    Err(choice_attribute_error(choice, name))
                }
            }
            (NodeMut::Choice(choice), _) => Err(Error::Type(format!(
                "candidates of {} '{}' cannot be replaced",
                choice.field().type_name(),
                choice.path()
            ))),
            (NodeMut::Config(config), _) => Err(Error::Type(format!(
                "{} object does not support item assignment",
                config.class().qualified_name()
            ))),
        }
    }

    fn call_statement(&self, config: &mut Config, expr: &Expr) -> Result<()> {
        let Expr::Call { func, args, kwargs } = expr else {
            return Err(Error::Type(format!("line {}: expected a call", self.line)));
        };
        if let Expr::Attribute { value, name } = func.as_ref() {
            if name == "retarget" {
                if let Object::Place(segs) = self.eval(config, value)? {
                    return self.retarget(config, &segs, args, kwargs);
                }
            }
        }
        self.eval(config, expr).map(|_| ())
    }

    fn retarget(
        &self,
        config: &mut Config,
        segs: &[Seg],
        args: &[Expr],
        kwargs: &[(String, Expr)],
    ) -> Result<()> {
        let mut targets = args.iter().collect::<Vec<_>>();
        for (name, expr) in kwargs {
            if name != "target" && name != "ConfigClass" {
                return Err(Error::Type(format!(
                    "retarget() got an unexpected keyword argument '{name}'"
                )));
            }
            targets.push(expr);
        }
        let [target] = targets.as_slice() else {
            return Err(Error::Type(format!(
                "retarget() takes exactly one class, got {}",
                targets.len()
            )));
        };
        let Object::Class(class) = self.eval(config, target)? else {
            return Err(Error::Type("retarget() argument must be a config class".to_string()));
        };
        let provenance = self.provenance();
        match resolve_mut(NodeMut::Config(config), segs)? {
            (NodeMut::Config(parent), [Seg::Attr(name)]) => {
                parent.retarget_with_provenance(name, &class, provenance)
            }
            _ => Err(Error::Type(
                "retarget() applies to config fields only".to_string(),
            )),
        }
    }

    fn lookup(&self, name: &str) -> Result<Object> {
        if let Some(binding) = self.bindings.get(name) {
            return Ok(match binding {
                Binding::Root => Object::Place(Vec::new()),
                Binding::Module(module) => Object::Module(module.clone()),
                Binding::Class(class) => Object::Class(Arc::clone(class)),
            });
        }
        if let Some(builtin) = Builtin::lookup(name) {
            return Ok(Object::Builtin(builtin));
        }
        if let Some(class) = self.catalog.get_unqualified(name) {
            return Ok(Object::Class(Arc::clone(class)));
        }
        Err(Error::Name {
            name: name.to_string(),
            line: self.line,
        })
    }

    fn eval(&self, config: &Config, expr: &Expr) -> Result<Object> {
        match expr {
            Expr::Literal(value) => Ok(Object::Value(value.clone())),
            Expr::Name(name) => self.lookup(name),
            Expr::List(items) | Expr::Tuple(items) => items
                .iter()
                .map(|item| self.eval_value(config, item))
                .collect::<Result<Vec<_>>>()
                .map(|items| Object::Value(Value::List(items))),
            Expr::Dict(entries) => {
                let mut dict = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = dict_key(&self.eval_value(config, key)?)?;
                    dict.insert(key, self.eval_value(config, value)?);
                }
                Ok(Object::Value(Value::Dict(dict)))
            }
            Expr::Neg(inner) => match self.eval_value(config, inner)? {
                Value::Int(i) => i
                    .checked_neg()
                    .map(|i| Object::Value(Value::Int(i)))
                    .ok_or_else(|| Error::value("integer overflow")),
                Value::Float(x) => Ok(Object::Value(Value::Float(-x))),
                other => Err(Error::Type(format!(
                    "bad operand type for unary -: '{}'",
                    other.type_name()
                ))),
            },
            Expr::Attribute { value, name } => match self.eval(config, value)? {
                Object::Place(mut segs) => {
                    segs.push(Seg::Attr(name.clone()));
                    Ok(Object::Place(segs))
                }
                Object::Module(module) => {
                    let qualified = format!("{module}.{name}");
                    if let Some(class) = self.catalog.get(&qualified) {
                        Ok(Object::Class(Arc::clone(class)))
                    } else if self.catalog.has_module(&qualified) {
                        Ok(Object::Module(qualified))
                    } else {
                        Err(Error::Attribute {
                            owner: format!("module '{module}'"),
                            name: name.clone(),
                        })
                    }
                }
                Object::Class(class) => Err(Error::Attribute {
                    owner: class.qualified_name(),
                    name: name.clone(),
                }),
                Object::Builtin(builtin) => Err(Error::Attribute {
                    owner: builtin.name().to_string(),
                    name: name.clone(),
                }),
                Object::Value(value) => Err(Error::Attribute {
                    owner: value.type_name().to_string(),
                    name: name.clone(),
                }),
            },
            Expr::Subscript { value, index } => {
                let index = self.eval_value(config, index)?;
                match self.eval(config, value)? {
                    Object::Place(mut segs) => {
                        segs.push(Seg::Index(index));
                        Ok(Object::Place(segs))
                    }
                    Object::Value(value) => item(&value, &index).cloned().map(Object::Value),
                    _ => Err(Error::Type("object is not subscriptable".to_string())),
                }
            }
            Expr::Call { func, args, kwargs } => {
                let callee = self.eval(config, func)?;
                let Object::Builtin(builtin) = callee else {
                    return Err(Error::Type(format!(
                        "line {}: only float(), int(), str() and bool() can be called here",
                        self.line
                    )));
                };
                if !kwargs.is_empty() || args.len() != 1 {
                    return Err(Error::Type(format!(
                        "{}() takes exactly one positional argument",
                        builtin.name()
                    )));
                }
                let argument = self.eval_value(config, &args[0])?;
                builtin.call(argument).map(Object::Value)
            }
        }
    }

    fn eval_value(&self, config: &Config, expr: &Expr) -> Result<Value> {
        match self.eval(config, expr)? {
            Object::Value(value) => Ok(value),
            Object::Place(segs) => read_config(config, &segs),
            Object::Module(module) => Err(Error::Type(format!(
                "module '{module}' cannot be used as a value"
            ))),
            Object::Class(class) => Err(Error::Type(format!(
                "class {} cannot be used as a value",
                class.qualified_name()
            ))),
            Object::Builtin(builtin) => Err(Error::Type(format!(
                "builtin {}() cannot be used as a value",
                builtin.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::script::parser::parse;
    use crate::value::Dtype;

    fn inner() -> Arc<ConfigClass> {
        ConfigClass::builder("Inner")
            .module("pkg.conf")
            .field("f", Field::scalar(Dtype::Float, "f").default(0.0).build().unwrap())
            .build()
            .unwrap()
    }

    fn root() -> Arc<ConfigClass> {
        let inner = inner();
        let sub = ConfigClass::builder("Sub")
            .module("pkg.conf")
            .base(&inner)
            .field("g", Field::scalar(Dtype::Int, "g").default(1).build().unwrap())
            .build()
            .unwrap();
        ConfigClass::builder("Root")
            .module("pkg")
            .field("i", Field::scalar(Dtype::Int, "i").optional(true).build().unwrap())
            .field("f", Field::scalar(Dtype::Float, "f").default(0.0).build().unwrap())
            .field("ll", Field::list(Dtype::Int, "ll").default(vec![1, 2, 3]).build().unwrap())
            .field(
                "d",
                Field::dict(Dtype::Str, Dtype::Str, "d")
                    .default(Value::dict([("key", "value")]))
                    .build()
                    .unwrap(),
            )
            .field("c", Field::config(&inner, "c").build().unwrap())
            .field(
                "r",
                Field::config_choice("r")
                    .entry("A", &inner)
                    .entry("B", &sub)
                    .default("A")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn run(config: &mut Config, text: &str) -> Result<()> {
        let catalog = TypeCatalog::reachable_from(config.class());
        let script = parse(text)?;
        Interpreter::new("config", &catalog, "test.py").run(config, &script)
    }

    #[test]
    fn test_scalar_and_nested_assignment() {
        let mut config = root().instantiate().unwrap();
        run(&mut config, "config.i = -3\nconfig.f = 2\nconfig.c.f = float('nan')\n").unwrap();
        assert_eq!(config.get("i").unwrap(), &Value::Int(-3));
        assert_eq!(config.get("f").unwrap(), &Value::Float(2.0));
        assert!(config.nested("c").unwrap().get("f").unwrap().as_float().unwrap().is_nan());
        match &config.history("i").unwrap()[1].provenance {
            Provenance::Script { source, line } => {
                assert_eq!(source, "test.py");
                assert_eq!(*line, 1);
            }
            other => panic!("unexpected provenance {other:?}"),
        }
    }

    #[test]
    fn test_item_assignment_goes_through_field() {
        let mut config = root().instantiate().unwrap();
        run(&mut config, "config.ll[-1] = 7\nconfig.d['new'] = 'x'\n").unwrap();
        assert_eq!(config.get("ll").unwrap(), &Value::from(vec![1, 2, 7]));
        assert_eq!(config.get("d").unwrap().as_dict().unwrap().len(), 2);

        let err = run(&mut config, "config.ll[0] = 'nope'").unwrap_err();
        assert!(err.is_field_validation());
        assert_eq!(config.get("ll").unwrap(), &Value::from(vec![1, 2, 7]));
    }

    #[test]
    fn test_choice_selection_and_candidates() {
        let mut config = root().instantiate().unwrap();
        run(&mut config, "config.r.name = 'B'\nconfig.r['B'].g = 5\nconfig.r.active.f = 1.5\n")
            .unwrap();
        let choice = config.choice("r").unwrap();
        assert_eq!(choice.name(), Some("B"));
        assert_eq!(choice.active().unwrap().get("g").unwrap(), &Value::Int(5));
        assert_eq!(choice.active().unwrap().get("f").unwrap(), &Value::Float(1.5));

        let err = run(&mut config, "config.r.names = ['A']").unwrap_err();
        assert!(matches!(err, Error::Attribute { .. }));
        assert!(run(&mut config, "config.r.name = 'Z'").unwrap_err().is_field_validation());
    }

    #[test]
    fn test_retarget_with_module_path() {
        let mut config = root().instantiate().unwrap();
        run(&mut config, "import pkg.conf\nconfig.c.retarget(pkg.conf.Sub)\nconfig.c.g = 4\n")
            .unwrap();
        let nested = config.nested("c").unwrap();
        assert_eq!(nested.class().qualified_name(), "pkg.conf.Sub");
        assert_eq!(nested.get("g").unwrap(), &Value::Int(4));
        assert!(config.imports().contains("pkg.conf"));
    }

    #[test]
    fn test_retarget_keyword_and_from_import() {
        let mut config = root().instantiate().unwrap();
        run(&mut config, "from pkg.conf import Sub as S\nconfig.c.retarget(ConfigClass=S)\n").unwrap();
        assert_eq!(config.nested("c").unwrap().class().name(), "Sub");
    }

    #[test]
    fn test_reads_from_config() {
        let mut config = root().instantiate().unwrap();
        run(&mut config, "config.f = config.c.f\nconfig.i = config.ll[1]\n").unwrap();
        assert_eq!(config.get("i").unwrap(), &Value::Int(2));

        // An unselected candidate reads as a fresh instance.
        run(&mut config, "config.i = config.r['B'].g\n").unwrap();
        assert_eq!(config.get("i").unwrap(), &Value::Int(1));
    }

    #[test]
    fn test_unknown_names_and_modules() {
        let mut config = root().instantiate().unwrap();
        assert!(matches!(
            run(&mut config, "\nconfig.f = undefined"),
            Err(Error::Name { line: 2, .. })
        ));
        assert!(matches!(run(&mut config, "import nowhere"), Err(Error::Import { .. })));
        assert!(matches!(
            run(&mut config, "from pkg import Missing"),
            Err(Error::Import { .. })
        ));
        assert!(matches!(run(&mut config, "config.nope = 1"), Err(Error::Attribute { .. })));
    }

    #[test]
    fn test_builtins() {
        assert_eq!(Builtin::Float.call(Value::from("-inf")).unwrap(), Value::Float(f64::NEG_INFINITY));
        assert_eq!(Builtin::Int.call(Value::Float(2.9)).unwrap(), Value::Int(2));
        assert_eq!(Builtin::Str.call(Value::Int(3)).unwrap(), Value::from("3"));
        assert_eq!(Builtin::Bool.call(Value::List(vec![])).unwrap(), Value::Bool(false));
        assert!(Builtin::Float.call(Value::from("abc")).is_err());
    }
}

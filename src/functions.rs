//! Function registry and the built-in functions.
//!
//! A [`FunctionRegistry`] maps names to native callables. Every compiled
//! expression owns one, built by merging the built-ins with the caller's
//! functions (the caller's win on a name clash). It is never mutated after
//! compilation, so a compiled expression can be shared across threads.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{path, value::Value};

/// Error type returned by native functions. It reaches the caller unchanged,
/// as the source of [`EvalError::Function`](crate::EvalError::Function).
pub type FunctionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A callable that can be invoked from an expression.
///
/// Arguments arrive evaluated, left to right. Arity is up to the function:
/// extra arguments may be ignored, missing ones treated as absent.
pub type NativeFunction = Arc<dyn Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync>;

/// Names of the built-in functions.
pub const BUILTINS: [&str; 11] = [
    "abs", "ceil", "floor", "log", "max", "min", "random", "round", "sqrt", "get", "has",
];

#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, NativeFunction>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding only the built-in functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("abs", |args| Ok(unary_math(args, f64::abs)));
        registry.register("ceil", |args| Ok(unary_math(args, f64::ceil)));
        registry.register("floor", |args| Ok(unary_math(args, f64::floor)));
        registry.register("log", |args| Ok(unary_math(args, f64::ln)));
        registry.register("sqrt", |args| Ok(unary_math(args, f64::sqrt)));
        // Halves round towards positive infinity
        registry.register("round", |args| Ok(unary_math(args, |n| (n + 0.5).floor())));
        registry.register("max", |args| Ok(fold_math(args, f64::NEG_INFINITY, f64::max)));
        registry.register("min", |args| Ok(fold_math(args, f64::INFINITY, f64::min)));
        registry.register("random", |_| Ok(Value::Float(rand::random::<f64>())));
        registry.register("get", |args| Ok(get(args)));
        registry.register("has", |args| {
            let container = args.first().unwrap_or(&Value::Missing);
            let item = args.get(1).unwrap_or(&Value::Missing);
            Ok(Value::Boolean(has(container, item)))
        });
        registry
    }

    /// Adds or replaces a function.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    /// Adds every function of `other`, replacing same-named entries.
    pub fn merge(mut self, other: FunctionRegistry) -> Self {
        self.functions.extend(other.functions);
        self
    }

    pub fn get(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

fn unary_math(args: &[Value], op: impl Fn(f64) -> f64) -> Value {
    let n = args.first().map_or(f64::NAN, Value::to_number);
    Value::from_f64(op(n))
}

fn fold_math(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> Value {
    let mut acc = init;
    for arg in args {
        let n = arg.to_number();
        if n.is_nan() {
            return Value::Float(f64::NAN);
        }
        acc = pick(acc, n);
    }
    Value::from_f64(acc)
}

/// `get(record, path)` walks a dotted/bracketed path; `get(record, a, b, ...)`
/// walks the given segments literally. Neither form tries the flat-name
/// shortcut that bare paths use.
fn get(args: &[Value]) -> Value {
    let Some((record, segments)) = args.split_first() else {
        return Value::Missing;
    };

    let resolved = match segments {
        [] => return Value::Missing,
        [Value::String(raw)] => {
            let normalized = path::normalize(raw);
            path::walk(record, normalized.split('.')).map(|v| v.into_owned())
        }
        _ => path::walk(record, segments.iter().map(Value::to_text)).map(|v| v.into_owned()),
    };
    resolved.unwrap_or(Value::Missing)
}

/// Field existence for objects (keyed by the item's text form), membership
/// for arrays, false for anything else.
pub fn has(container: &Value, item: &Value) -> bool {
    match container {
        Value::Object(map) => !matches!(item, Value::Missing) && map.contains_key(&item.to_text()),
        Value::Array(items) => items.iter().any(|candidate| candidate.equals(item)),
        _ => false,
    }
}

// tests/function_tests.rs

use filtrate::functions::{BUILTINS, FunctionRegistry};
use filtrate::{Compiler, Value};
use pretty_assertions::assert_eq;

#[test]
fn test_builtin_names() {
    let registry = FunctionRegistry::with_builtins();
    let mut expected = BUILTINS.to_vec();
    expected.sort_unstable();
    assert_eq!(registry.names(), expected);
}

#[test]
fn test_register_and_call() {
    let mut registry = FunctionRegistry::new();
    assert!(registry.is_empty());
    registry
        .register("one", |_| Ok(Value::Integer(1)))
        .register("count", |args| Ok(Value::Integer(args.len() as i64)));

    assert_eq!(registry.len(), 2);
    let count = registry.get("count").unwrap();
    assert_eq!(count(&[Value::Null, Value::Null]).unwrap(), Value::Integer(2));
    assert!(registry.get("abs").is_none());
}

#[test]
fn test_compiler_with_registry() {
    let mut registry = FunctionRegistry::new();
    registry.register("clamp", |args| {
        let n = args.first().map_or(f64::NAN, Value::to_number);
        Ok(Value::from_f64(n.clamp(0.0, 10.0)))
    });
    let expr = Compiler::new()
        .with_functions(registry)
        .compile("clamp(x) + abs(-1)")
        .unwrap();

    let record = Value::from(serde_json::json!({ "x": 42 }));
    assert_eq!(expr.evaluate(&record).unwrap(), Value::Integer(11));
}

#[test]
fn test_later_functions_win() {
    let mut first = FunctionRegistry::new();
    first.register("f", |_| Ok(Value::Integer(1)));
    let expr = Compiler::new()
        .with_functions(first)
        .with_function("f", |_| Ok(Value::Integer(2)))
        .compile("f()")
        .unwrap();
    assert_eq!(expr.evaluate(&Value::Null).unwrap(), Value::Integer(2));
}

#[test]
fn test_debug_lists_names() {
    let mut registry = FunctionRegistry::new();
    registry.register("b", |_| Ok(Value::Null)).register("a", |_| Ok(Value::Null));
    assert_eq!(format!("{:?}", registry), r#"{"a", "b"}"#);
}

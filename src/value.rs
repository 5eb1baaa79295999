use std::{cmp::Ordering, collections::HashMap};

/// A record value, or an intermediate result of evaluation.
///
/// Records are loosely structured JSON-like data. Integers and floats are kept
/// apart so that whole-number results stay integers.
///
/// # Examples
///
/// ```
/// use filtrate::Value;
/// use std::collections::HashMap;
///
/// let integer = Value::Integer(42);
/// let string = Value::String("hello".to_string());
///
/// let mut obj = HashMap::new();
/// obj.insert("price".to_string(), Value::Float(9.5));
/// let object = Value::Object(obj);
///
/// assert!(integer.is_truthy());
/// assert_eq!(object.type_name(), "object");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Result of a path that does not resolve. Not a JSON value; it
    /// serializes as `null`.
    Missing,

    /// JSON null
    Null,

    /// JSON boolean; produced by `in`, `not in`, `has` and `match`
    Boolean(bool),

    /// Floating-point number
    Float(f64),

    /// Integer number; comparisons and `and`/`or`/`not` produce `1` or `0`
    Integer(i64),

    /// UTF-8 string
    String(String),

    /// Array of values
    Array(Vec<Value>),

    /// Object with string keys
    Object(HashMap<String, Value>),
}

impl Value {
    /// The numeric truth value: `1` for true, `0` for false.
    pub fn truth(b: bool) -> Self {
        Value::Integer(b as i64)
    }

    /// Builds a number, collapsing whole finite floats to integers.
    pub fn from_f64(n: f64) -> Self {
        if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
            Value::Integer(n as i64)
        } else {
            Value::Float(n)
        }
    }

    /// Truthiness used by `and`, `or`, `not` and the ternary condition.
    ///
    /// Missing, null, `false`, zero, NaN and the empty string are false.
    /// Everything else, including empty arrays and objects, is true.
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Missing | Null => false,
            Boolean(b) => *b,
            Float(n) => *n != 0.0 && !n.is_nan(),
            Integer(n) => *n != 0,
            String(s) => !s.is_empty(),
            Array(_) | Object(_) => true,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Get as float, for numbers only
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric coercion for arithmetic and the numeric built-ins.
    ///
    /// Booleans become 1/0, null becomes 0, strings are parsed after trimming
    /// (an empty string is 0). Anything else is NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Integer(n) => *n as f64,
            Value::Float(n) => *n,
            Value::Boolean(b) => *b as i64 as f64,
            Value::Null => 0.0,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Missing | Value::Array(_) | Value::Object(_) => f64::NAN,
        }
    }

    /// Text form used by string concatenation, `match` and `has` keys.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) => format_float(*n),
            Value::Boolean(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::Missing => String::new(),
            Value::Array(items) => items
                .iter()
                .map(Value::to_text)
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => crate::output::to_json(self),
        }
    }

    /// Equality used by `==`, `!=`, `in` and sequence `has`.
    ///
    /// Integers and floats compare numerically. Missing equals nothing, not
    /// even another missing value. Values of different kinds are unequal.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Missing, _) | (_, Value::Missing) => false,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => a.as_float() == b.as_float(),
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v.equals(other)))
            }
            _ => false,
        }
    }

    /// Ordering used by `<`, `<=`, `>`, `>=`.
    ///
    /// Defined for two numbers, two strings (by code point) or two booleans.
    /// `None` makes every ordering comparison false.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (a, b) if a.is_number() && b.is_number() => {
                a.as_float()?.partial_cmp(&b.as_float()?)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

/// Formats a float without a trailing `.0` and with JavaScript-style names
/// for the non-finite values.
pub(crate) fn format_float(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        n.to_string()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

//! JSON output for evaluation results.
//!
//! Output is deterministic (object keys are sorted) and follows standard JSON
//! formatting rules. Values that JSON cannot express are written as `null`:
//! the missing signal of an unresolved path, NaN and the infinities.
//!
//! # Examples
//!
//! ```
//! use filtrate::Value;
//! use filtrate::output::{to_json, to_json_pretty};
//!
//! assert_eq!(to_json(&Value::Integer(1)), "1");
//! assert_eq!(to_json(&Value::Boolean(true)), "true");
//! assert_eq!(to_json(&Value::Missing), "null");
//! assert_eq!(to_json_pretty(&Value::Array(vec![])), "[]");
//! ```

use std::collections::HashMap;

use crate::value::Value;

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, value: &Value) -> String {
        let mut out = String::new();
        self.print_value(value, 0, &mut out);
        out
    }

    fn print_value(&self, value: &Value, indent: usize, out: &mut String) {
        match value {
            Value::Missing | Value::Null => out.push_str("null"),
            Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Integer(n) => out.push_str(&n.to_string()),
            Value::Float(n) if n.is_finite() => out.push_str(&n.to_string()),
            Value::Float(_) => out.push_str("null"),
            Value::String(s) => self.print_string(s, out),
            Value::Array(arr) => self.print_array(arr, indent, out),
            Value::Object(obj) => self.print_object(obj, indent, out),
        }
    }

    fn print_array(&self, arr: &[Value], indent: usize, out: &mut String) {
        if arr.is_empty() {
            out.push_str("[]");
            return;
        }

        out.push('[');
        for (i, item) in arr.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.newline(indent + 1, out);
            self.print_value(item, indent + 1, out);
        }
        self.newline(indent, out);
        out.push(']');
    }

    fn print_object(&self, obj: &HashMap<String, Value>, indent: usize, out: &mut String) {
        if obj.is_empty() {
            out.push_str("{}");
            return;
        }

        // Sort keys for deterministic output
        let mut entries: Vec<_> = obj.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        out.push('{');
        for (i, (key, value)) in entries.into_iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.newline(indent + 1, out);
            self.print_string(key, out);
            out.push(':');
            if self.pretty {
                out.push(' ');
            }
            self.print_value(value, indent + 1, out);
        }
        self.newline(indent, out);
        out.push('}');
    }

    fn newline(&self, level: usize, out: &mut String) {
        if self.pretty {
            out.push('\n');
            out.push_str(&"  ".repeat(level));
        }
    }

    fn print_string(&self, s: &str, out: &mut String) {
        out.push('"');
        for c in s.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                // Unicode escape for control chars
                c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
        }
        out.push('"');
    }
}

/// Converts a Value to compact JSON.
pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

/// Converts a Value to JSON with 2-space indentation, one element or
/// property per line.
///
/// # Examples
///
/// ```
/// use filtrate::Value;
/// use filtrate::output::to_json_pretty;
/// use std::collections::HashMap;
///
/// let mut obj = HashMap::new();
/// obj.insert("name".to_string(), Value::String("Alice".to_string()));
/// obj.insert("age".to_string(), Value::Integer(30));
///
/// assert_eq!(
///     to_json_pretty(&Value::Object(obj)),
///     "{\n  \"age\": 30,\n  \"name\": \"Alice\"\n}"
/// );
/// ```
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}

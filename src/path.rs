//! Property-path canonicalization and resolution.
//!
//! A raw identifier such as `foo[bar].things[2]` is canonicalized once, at
//! parse time, into the dotted form `foo.bar.things.2`. At evaluation time the
//! dotted form is resolved against a record in two steps:
//!
//! 1. If the record is an object holding the *entire* path as a literal key,
//!    that value wins. Flat records whose keys contain dots stay reachable.
//! 2. Otherwise the path is split on `.` and walked segment by segment.
//!
//! Resolution never fails. An unresolvable path yields `None`, which the
//! evaluator turns into [`Value::Missing`].

use std::borrow::Cow;

use crate::value::Value;

/// Canonicalizes a raw path: every `[word]` becomes `.word`, then a single
/// leading dot is stripped.
///
/// Bracket content is always a literal segment name, never a lookup of a
/// field with that name. Text that does not match `[word]` is kept as is.
///
/// ```
/// use filtrate::path::normalize;
///
/// assert_eq!(normalize("foo[bar][baz]"), "foo.bar.baz");
/// assert_eq!(normalize("things[2]"), "things.2");
/// assert_eq!(normalize("[a].b"), "a.b");
/// ```
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let word_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if word_len > 0 && after[word_len..].starts_with(']') {
            out.push('.');
            out.push_str(&after[..word_len]);
            rest = &after[word_len + 1..];
        } else {
            out.push('[');
            rest = after;
        }
    }
    out.push_str(rest);

    match out.strip_prefix('.') {
        Some(stripped) => stripped.to_string(),
        None => out,
    }
}

/// Resolves a canonical path against `record`, trying the flat-name shortcut
/// before the segment walk.
pub fn resolve<'a>(path: &str, record: &'a Value) -> Option<Cow<'a, Value>> {
    if let Value::Object(map) = record
        && let Some(value) = map.get(path)
    {
        return Some(Cow::Borrowed(value));
    }
    walk(record, path.split('.'))
}

/// Walks `record` one segment at a time.
///
/// Objects descend into the named field, arrays index by non-negative integer
/// segments, and the segment `length` on an array yields its element count.
/// The first segment that cannot be followed ends the walk with `None`.
pub fn walk<'a, S>(record: &'a Value, segments: impl IntoIterator<Item = S>) -> Option<Cow<'a, Value>>
where
    S: AsRef<str>,
{
    let mut current = Cow::Borrowed(record);

    for segment in segments {
        let segment = segment.as_ref();
        current = match current {
            Cow::Borrowed(value) => step(value, segment)?,
            // Only `length` produces an owned value, and nothing descends into a number
            Cow::Owned(_) => return None,
        };
    }
    Some(current)
}

fn step<'a>(value: &'a Value, segment: &str) -> Option<Cow<'a, Value>> {
    match value {
        Value::Object(map) => map.get(segment).map(Cow::Borrowed),
        Value::Array(items) => {
            if segment == "length" {
                return Some(Cow::Owned(Value::Integer(items.len() as i64)));
            }
            // Canonical indices only: "01" and "+1" name no element.
            if !segment.bytes().all(|b| b.is_ascii_digit())
                || (segment.len() > 1 && segment.starts_with('0'))
            {
                return None;
            }
            let index = segment.parse::<usize>().ok()?;
            items.get(index).map(Cow::Borrowed)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn test_normalize_leaves_non_word_brackets() {
        assert_eq!(normalize("a[b-c]"), "a[b-c]");
        assert_eq!(normalize("a[]"), "a[]");
        assert_eq!(normalize("..a"), ".a");
    }

    #[test]
    fn test_flat_name_wins_over_nested() {
        let doc = record(json!({ "a.b": 9, "a": { "b": 4 } }));
        assert_eq!(resolve("a.b", &doc).unwrap().into_owned(), Value::Integer(9));
        assert_eq!(
            walk(&doc, ["a", "b"]).unwrap().into_owned(),
            Value::Integer(4)
        );
    }

    #[test]
    fn test_length_is_terminal() {
        let doc = record(json!({ "xs": [1, 2, 3] }));
        assert_eq!(resolve("xs.length", &doc).unwrap().into_owned(), Value::Integer(3));
        assert!(resolve("xs.length.foo", &doc).is_none());
    }

    #[test]
    fn test_negative_and_non_numeric_index() {
        let doc = record(json!({ "xs": [1, 2, 3] }));
        assert!(resolve("xs.-1", &doc).is_none());
        assert!(resolve("xs.first", &doc).is_none());
        assert!(resolve("xs.3", &doc).is_none());
    }
}

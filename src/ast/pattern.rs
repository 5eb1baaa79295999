use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Flag letters accepted after a regex literal.
///
/// `i`, `m`, `s` and `x` map onto [`RegexBuilder`] options; `g` and `u` are
/// accepted for familiarity and have no effect.
pub const REGEX_FLAGS: &str = "imsxgu";

/// A compiled regular-expression literal (`/pattern/flags`).
///
/// The literal is compiled once, when it is lexed, and the compiled form is
/// carried through the AST into the compiled program. Two patterns are equal
/// when their source and flags are equal.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "PatternSource", into = "PatternSource")]
pub struct Pattern {
    source: String,
    flags: String,
    regex: Regex,
}

/// Serialized form of a [`Pattern`]: the text it was compiled from.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PatternSource {
    source: String,
    #[serde(default)]
    flags: String,
}

impl Pattern {
    /// Compiles `source` with the given flag letters.
    ///
    /// Unknown flag letters are rejected with [`PatternError::UnknownFlag`].
    pub fn new(source: &str, flags: &str) -> Result<Self, PatternError> {
        let mut builder = RegexBuilder::new(source);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                'g' | 'u' => &mut builder,
                other => return Err(PatternError::UnknownFlag(other)),
            };
        }
        let regex = builder
            .build()
            .map_err(|e| PatternError::Syntax(e.to_string()))?;
        Ok(Pattern {
            source: source.to_string(),
            flags: flags.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

/// Reasons a regex literal can fail to compile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatternError {
    #[error("unknown regex flag '{0}'")]
    UnknownFlag(char),

    #[error("{0}")]
    Syntax(String),
}

impl TryFrom<PatternSource> for Pattern {
    type Error = PatternError;

    fn try_from(repr: PatternSource) -> Result<Self, Self::Error> {
        Pattern::new(&repr.source, &repr.flags)
    }
}

impl From<Pattern> for PatternSource {
    fn from(pattern: Pattern) -> Self {
        PatternSource {
            source: pattern.source,
            flags: pattern.flags,
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({self})")
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source.replace('/', "\\/"), self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_flag() {
        let pattern = Pattern::new("^bar", "i").unwrap();
        assert!(pattern.is_match("BARZ"));
        assert!(!Pattern::new("^bar", "").unwrap().is_match("BARZ"));
    }

    #[test]
    fn test_all_flags_accepted() {
        let pattern = Pattern::new("a b", REGEX_FLAGS).unwrap();
        assert!(pattern.is_match("AB"));
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert_eq!(
            Pattern::new("a", "q").unwrap_err(),
            PatternError::UnknownFlag('q')
        );
    }

    #[test]
    fn test_display_escapes_slashes() {
        let pattern = Pattern::new("^/path", "g").unwrap();
        assert_eq!(pattern.to_string(), "/^\\/path/g");
    }
}

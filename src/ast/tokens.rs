use std::fmt;

use crate::ast::Pattern;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Floating point number
    ///
    /// # Examples
    /// ```text
    /// 1.5
    /// 0.25
    /// ```
    Float(f64),

    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 7
    /// ```
    Integer(i64),

    /// String literal enclosed in double or single quotes
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'item #1'
    /// ```
    String(String),

    /// Regular expression literal with optional flags
    ///
    /// # Examples
    /// ```text
    /// /^bar/
    /// /z$/i
    /// ```
    Regex(Pattern),

    /// Raw property path as written, before bracket normalization
    ///
    /// Starts with a letter or underscore, followed by letters, digits,
    /// underscores, dots, or bracketed word segments.
    ///
    /// # Examples
    /// ```text
    /// price
    /// foo.bar.baz
    /// foo[bar][baz]
    /// things.0
    /// ```
    Identifier(String),

    // Keyword operators
    /// Logical AND
    And,

    /// Logical OR
    Or,

    /// Logical NOT
    Not,

    /// Tuple membership (`in`)
    In,

    /// Negated tuple membership (`not in`)
    NotIn,

    /// Field existence or sequence membership (`has`)
    Has,

    /// Regex match (`match` or `~`)
    Match,

    // Comparison
    /// Equality operator
    EqEq,

    /// Inequality operator
    NotEq,

    /// Less than
    Lt,

    /// Greater than
    Gt,

    /// Less than or equal
    LtEq,

    /// Greater than or equal
    GtEq,

    // Arithmetic
    /// Addition or string concatenation
    Plus,

    /// Subtraction or negation
    Minus,

    /// Multiplication
    Star,

    /// Division
    Slash,

    /// Modulo
    Percent,

    /// Exponentiation
    Caret,

    // Punctuation
    /// Ternary condition marker
    Question,

    /// Ternary branch separator
    Colon,

    /// Left parenthesis for grouping, calls and tuples
    LParen,

    /// Right parenthesis
    RParen,

    /// Comma for separating arguments or tuple elements
    Comma,

    /// End of input
    Eof,
}

impl Token {
    /// True when the next token is expected to start an operand, which is
    /// where a `/` opens a regex literal instead of meaning division.
    pub fn expects_operand(&self) -> bool {
        !matches!(
            self,
            Token::Float(_)
                | Token::Integer(_)
                | Token::String(_)
                | Token::Regex(_)
                | Token::Identifier(_)
                | Token::RParen
                | Token::Eof
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Float(n) => write!(f, "number {}", n),
            Token::Integer(n) => write!(f, "number {}", n),
            Token::String(s) => write!(f, "string {:?}", s),
            Token::Regex(p) => write!(f, "regex {}", p),
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::And => write!(f, "'and'"),
            Token::Or => write!(f, "'or'"),
            Token::Not => write!(f, "'not'"),
            Token::In => write!(f, "'in'"),
            Token::NotIn => write!(f, "'not in'"),
            Token::Has => write!(f, "'has'"),
            Token::Match => write!(f, "'match'"),
            Token::EqEq => write!(f, "'=='"),
            Token::NotEq => write!(f, "'!='"),
            Token::Lt => write!(f, "'<'"),
            Token::Gt => write!(f, "'>'"),
            Token::LtEq => write!(f, "'<='"),
            Token::GtEq => write!(f, "'>='"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Percent => write!(f, "'%'"),
            Token::Caret => write!(f, "'^'"),
            Token::Question => write!(f, "'?'"),
            Token::Colon => write!(f, "':'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

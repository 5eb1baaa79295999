use std::fmt;

use crate::ast::{BinOp, LogicalOp, Pattern, UnaryOp};

/// Abstract Syntax Tree node representing a parsed expression.
///
/// The tree is immutable once the parser returns it. `Display` renders it
/// back as fully parenthesized source, which makes precedence visible.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Literal floating point number
    ///
    /// # Example
    /// ```text
    /// 1.1
    /// ```
    Float(f64),

    /// Literal integer
    ///
    /// # Example
    /// ```text
    /// 42
    /// ```
    Integer(i64),

    /// String literal
    ///
    /// # Example
    /// ```text
    /// "hello"
    /// ```
    String(String),

    /// Property path, already normalized (`foo[bar]` becomes `foo.bar`)
    ///
    /// # Examples
    /// ```text
    /// price
    /// foo.things.0
    /// ```
    Path(String),

    // Operations
    /// Prefix operation (`not x`, `-x`)
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation (arithmetic, comparison, `has`)
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Short-circuiting `and` / `or`
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Tuple membership test
    ///
    /// The right-hand side is always a tuple literal.
    ///
    /// # Examples
    /// ```text
    /// status in ("open", "pending")
    /// 5 not in (1, 2, 3)
    /// ```
    In {
        needle: Box<Expr>,
        tuple: Vec<Expr>,
        negated: bool,
    },

    /// Regex match against a literal pattern
    ///
    /// # Examples
    /// ```text
    /// name match /^bar/i
    /// name ~ /z$/
    /// ```
    Match {
        subject: Box<Expr>,
        pattern: Pattern,
    },

    /// Conditional (`cond ? a : b`)
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Function call resolved against the function registry at evaluation time
    ///
    /// # Examples
    /// ```text
    /// max(a, b)
    /// get(foo, key, "baz")
    /// random()
    /// ```
    Call { name: String, args: Vec<Expr> },
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Float(n) => write!(f, "{:?}", n),
            Expr::Integer(n) => write!(f, "{}", n),
            Expr::String(s) => write!(f, "{:?}", s),
            Expr::Path(path) => f.write_str(path),
            Expr::Unary { op, operand } => write!(f, "({}{})", op, operand),
            Expr::BinaryOp { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Logical { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::In {
                needle,
                tuple,
                negated,
            } => {
                let keyword = if *negated { "not in" } else { "in" };
                write!(f, "({} {} (", needle, keyword)?;
                write_list(f, tuple)?;
                f.write_str("))")
            }
            Expr::Match { subject, pattern } => write!(f, "({} match {})", subject, pattern),
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "({} ? {} : {})", condition, then_branch, else_branch),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                f.write_str(")")
            }
        }
    }
}

//! filtrate compiles small, user-authored filter expressions into reusable
//! evaluators over loosely structured records.
//!
//! ```
//! use filtrate::{compile, Value};
//! use serde_json::json;
//!
//! let expr = compile("price < 10 and category in ('books', 'music')").unwrap();
//! let record = Value::from(json!({ "price": 7.5, "category": "books" }));
//! assert_eq!(expr.evaluate(&record).unwrap(), Value::Integer(1));
//! ```
//!
//! Expressions can only read the record, call the built-in functions and call
//! functions the host registers on a [`Compiler`]. Nothing else is reachable.

pub mod ast;
pub mod compiler;
pub mod convert;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod path;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod logging;

pub use ast::{BinOp, Expr, LogicalOp, Pattern, Token, UnaryOp};
pub use compiler::{compile, CompileError, CompiledExpression, Compiler, Constant, Instr, Program};
pub use evaluator::EvalError;
pub use functions::{FunctionError, FunctionRegistry, NativeFunction};
pub use lexer::{LexError, Lexer, Position};
pub use output::{to_json, to_json_pretty};
pub use parser::{parse, ParseError, Parser, MAX_DEPTH, MAX_NESTING};
pub use value::Value;

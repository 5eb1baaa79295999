//! # Filtrate Expression Language - Abstract Syntax Tree
//!
//! This module defines the tokens and the Abstract Syntax Tree (AST) for the
//! filtrate expression language: boolean predicates and arithmetic over a
//! loosely structured data record, authored by end users and evaluated
//! repeatedly against many records.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, paths, operations, calls)
//! - **[operators]** - Binary, logical and unary operators
//! - **[pattern]** - Compiled regex literals
//!
//! ## Quick Start
//!
//! ```text
//! 4 > lowNumber * 2 and (max(a, b) < 20 or foo) ? 1.1 : 9.4
//! ```
//!
//! ## Core Concepts
//!
//! ### Precedence
//!
//! Loosest to tightest:
//!
//! ```text
//! ? :                      (right-associative)
//! or
//! and
//! not
//! == != > >= < <=
//! in  not in  has  match ~
//! + -
//! * / %
//! ^                        (right-associative)
//! unary -
//! ```
//!
//! ### Two Kinds of Truth
//!
//! Comparisons and `and`/`or`/`not` produce the numbers `1` and `0`.
//! `in`, `not in`, `has` and `match` produce genuine booleans.
//!
//! ### Property Paths
//!
//! Identifiers are property paths. Bracketed words are literal segments, so
//! `foo[bar][baz]` is the same path as `foo.bar.baz`.
//!
//! ## Examples
//!
//! ```text
//! price * qty > 100
//! status in ("open", "pending") and not archived
//! tags has "urgent"
//! email ~ /@example\.com$/i
//! get(record, "things", things.length - 1)
//! ```
pub mod expressions;
pub mod operators;
pub mod pattern;
pub mod tokens;

pub use expressions::Expr;
pub use operators::{BinOp, LogicalOp, UnaryOp};
pub use pattern::{Pattern, PatternError, REGEX_FLAGS};
pub use tokens::Token;

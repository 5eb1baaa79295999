//! CLI support for filtrate
//!
//! The command implementations live here, separate from argument parsing, so
//! other tools can drive them programmatically.

mod compile;
mod eval;

pub use compile::{CompileFormat, CompileOptions, execute_compile};
pub use eval::{EvalOptions, EvalResult, execute_eval};

use std::io;

use crate::FunctionRegistry;

/// Errors that can occur during CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Compile error: {0}")]
    Compile(#[from] crate::CompileError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,
}

/// One line per built-in function, for the `functions` command.
pub fn list_functions() -> String {
    let registry = FunctionRegistry::with_builtins();
    registry
        .names()
        .into_iter()
        .map(|name| format!("{}\n", name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_functions_is_sorted() {
        let listing = list_functions();
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines.first(), Some(&"abs"));
        assert!(lines.contains(&"random"));
        assert_eq!(lines.len(), crate::functions::BUILTINS.len());
    }
}

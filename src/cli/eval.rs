//! Evaluate an expression against a JSON record

use super::CliError;
use crate::{Compiler, Value, output};

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON record
    pub input: Option<String>,
    /// Pretty-print the output
    pub pretty: bool,
    /// Only check that the expression compiles
    pub syntax_only: bool,
}

/// Result of an eval operation
#[derive(Debug, PartialEq)]
pub enum EvalResult {
    /// The expression compiled
    SyntaxValid,
    /// The rendered JSON result
    Success(String),
}

pub fn execute_eval(options: &EvalOptions) -> Result<EvalResult, CliError> {
    let expr = Compiler::new().compile(&options.expression)?;
    if options.syntax_only {
        return Ok(EvalResult::SyntaxValid);
    }

    let json = options.input.as_deref().ok_or(CliError::NoInput)?;
    let record = Value::from(serde_json::from_str::<serde_json::Value>(json)?);
    tracing::debug!(expression = %options.expression, "evaluating against input record");

    let result = expr.evaluate(&record)?;
    let rendered = if options.pretty {
        output::to_json_pretty(&result)
    } else {
        output::to_json(&result)
    };
    Ok(EvalResult::Success(rendered))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(expression: &str, input: Option<&str>) -> EvalOptions {
        EvalOptions {
            expression: expression.to_string(),
            input: input.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_eval_renders_json() {
        let result = execute_eval(&options("a * 2", Some(r#"{"a": 21}"#))).unwrap();
        assert_eq!(result, EvalResult::Success("42".to_string()));
    }

    #[test]
    fn test_missing_result_renders_null() {
        let result = execute_eval(&options("nope", Some("{}"))).unwrap();
        assert_eq!(result, EvalResult::Success("null".to_string()));
    }

    #[test]
    fn test_syntax_only_needs_no_input() {
        let mut opts = options("a > 1", None);
        opts.syntax_only = true;
        assert_eq!(execute_eval(&opts).unwrap(), EvalResult::SyntaxValid);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            execute_eval(&options("a >", Some("{}"))),
            Err(CliError::Compile(_))
        ));
        assert!(matches!(execute_eval(&options("a", None)), Err(CliError::NoInput)));
        assert!(matches!(
            execute_eval(&options("a", Some("{"))),
            Err(CliError::Json(_))
        ));
        assert!(matches!(
            execute_eval(&options("nope(1)", Some("{}"))),
            Err(CliError::Eval(_))
        ));
    }
}

//! Show the compiled program for an expression

use super::CliError;
use crate::Compiler;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompileFormat {
    /// Human-readable disassembly
    #[default]
    Listing,
    /// The serialized program, loadable with `Compiler::bind`
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub expression: String,
    pub format: CompileFormat,
}

pub fn execute_compile(options: &CompileOptions) -> Result<String, CliError> {
    let program = Compiler::new().compile_program(&options.expression)?;
    Ok(match options.format {
        CompileFormat::Listing => program.to_string(),
        CompileFormat::Json => serde_json::to_string_pretty(&program)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Program;

    #[test]
    fn test_json_output_loads_back() {
        let options = CompileOptions {
            expression: "x in (1, 2) or s ~ /^a/i".to_string(),
            format: CompileFormat::Json,
        };
        let json = execute_compile(&options).unwrap();
        let program: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(program, Compiler::new().compile_program(&options.expression).unwrap());
    }

    #[test]
    fn test_listing_output() {
        let options = CompileOptions {
            expression: "abs(x)".to_string(),
            format: CompileFormat::Listing,
        };
        let listing = execute_compile(&options).unwrap();
        assert_eq!(listing, "0000  path      x\n0001  call      abs/1\n");
    }
}

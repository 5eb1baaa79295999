//! Compilation: source text → syntax tree → [`Program`] → [`CompiledExpression`].
//!
//! Lowering is a single recursive walk over the syntax tree that emits a flat
//! instruction sequence for the stack machine in [`crate::evaluator`].
//! `and`, `or` and the ternary become conditional jumps, so the operand that
//! does not decide the result is never evaluated.
//!
//! A [`Program`] is plain data: it serializes with `serde` and prints as a
//! disassembly. Binding it to a [`FunctionRegistry`] gives the callable
//! [`CompiledExpression`]; the two forms share one evaluator.

use std::{collections::HashMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    ast::{BinOp, Expr, LogicalOp, Pattern, UnaryOp},
    evaluator::{self, EvalError},
    functions::{FunctionError, FunctionRegistry},
    lexer::{LexError, Lexer, Position},
    parser::{ParseError, Parser},
    value::Value,
};

/// Errors that abort compilation. No partial expression is produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("lex error: {0}")]
    Lex(#[source] LexError),

    #[error("parse error: {0}")]
    Parse(#[source] ParseError),
}

impl CompileError {
    /// Where in the source the problem was found.
    pub fn position(&self) -> Position {
        match self {
            CompileError::Lex(e) => e.position(),
            CompileError::Parse(e) => e.position(),
        }
    }
}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::Lex(e) => CompileError::Lex(e),
            e => CompileError::Parse(e),
        }
    }
}

impl From<LexError> for CompileError {
    fn from(e: LexError) -> Self {
        CompileError::Lex(e)
    }
}

/// Literal operand stored in a program's constant pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Integer(i64),
    Float(f64),
    String(String),
}

impl From<&Constant> for Value {
    fn from(c: &Constant) -> Self {
        match c {
            Constant::Integer(n) => Value::Integer(*n),
            Constant::Float(n) => Value::Float(*n),
            Constant::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Integer(n) => write!(f, "{}", n),
            Constant::Float(n) => write!(f, "{:?}", n),
            Constant::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// A single stack-machine instruction.
///
/// Pool operands index into the owning [`Program`]; jump operands are
/// absolute instruction indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Instr {
    /// Push `constants[idx]`.
    PushConst(usize),
    /// Push the numeric truth value `1` or `0`.
    PushTruth(bool),
    /// Resolve `paths[idx]` against the record and push the result.
    LoadPath(usize),
    /// Pop one operand, push the result.
    Unary(UnaryOp),
    /// Pop right then left, push the result.
    Binary(BinOp),
    /// Pop `len` tuple elements and the needle, push a boolean.
    In { len: usize, negated: bool },
    /// Pop the subject, push whether `patterns[idx]` matches its text form.
    Match(usize),
    /// Pop `argc` arguments, call `functions[name]`, push the result.
    Call { name: usize, argc: usize },
    /// Continue at the target.
    Jump(usize),
    /// Pop; continue at the target if the value is falsy.
    JumpIfFalse(usize),
    /// Pop; continue at the target if the value is truthy.
    JumpIfTrue(usize),
}

/// The compiled, inspectable form of an expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub instructions: Vec<Instr>,
    pub constants: Vec<Constant>,
    pub paths: Vec<String>,
    pub patterns: Vec<Pattern>,
    pub functions: Vec<String>,
}

fn pool_entry<T: fmt::Display>(pool: &[T], idx: usize) -> String {
    pool.get(idx)
        .map_or_else(|| format!("<invalid #{}>", idx), ToString::to_string)
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (ip, instr) in self.instructions.iter().enumerate() {
            write!(f, "{:04}  ", ip)?;
            match *instr {
                Instr::PushConst(idx) => writeln!(f, "const     {}", pool_entry(&self.constants, idx))?,
                Instr::PushTruth(b) => writeln!(f, "truth     {}", b as i64)?,
                Instr::LoadPath(idx) => writeln!(f, "path      {}", pool_entry(&self.paths, idx))?,
                Instr::Unary(UnaryOp::Not) => writeln!(f, "not")?,
                Instr::Unary(UnaryOp::Negate) => writeln!(f, "neg")?,
                Instr::Binary(op) => writeln!(f, "binary    {}", op)?,
                Instr::In { len, negated } => {
                    let name = if negated { "not_in" } else { "in" };
                    writeln!(f, "{:<9} {}", name, len)?
                }
                Instr::Match(idx) => writeln!(f, "match     {}", pool_entry(&self.patterns, idx))?,
                Instr::Call { name, argc } => {
                    writeln!(f, "call      {}/{}", pool_entry(&self.functions, name), argc)?
                }
                Instr::Jump(target) => writeln!(f, "jump      -> {:04}", target)?,
                Instr::JumpIfFalse(target) => writeln!(f, "jump_if_0 -> {:04}", target)?,
                Instr::JumpIfTrue(target) => writeln!(f, "jump_if_1 -> {:04}", target)?,
            }
        }
        Ok(())
    }
}

/// Lowers one syntax tree into a [`Program`].
#[derive(Default)]
struct Lowering {
    program: Program,
    path_index: HashMap<String, usize>,
    function_index: HashMap<String, usize>,
}

impl Lowering {
    fn finish(mut self, expr: &Expr) -> Program {
        self.lower(expr);
        self.program
    }

    fn emit(&mut self, instr: Instr) {
        self.program.instructions.push(instr);
    }

    /// Index of the next instruction to be emitted.
    fn here(&self) -> usize {
        self.program.instructions.len()
    }

    fn emit_jump(&mut self, placeholder: fn(usize) -> Instr) -> usize {
        let pos = self.here();
        self.emit(placeholder(usize::MAX));
        pos
    }

    fn patch_jump(&mut self, pos: usize, target: usize) {
        let patched = match self.program.instructions[pos] {
            Instr::Jump(_) => Instr::Jump(target),
            Instr::JumpIfFalse(_) => Instr::JumpIfFalse(target),
            Instr::JumpIfTrue(_) => Instr::JumpIfTrue(target),
            other => other,
        };
        self.program.instructions[pos] = patched;
    }

    fn intern(pool: &mut Vec<String>, index: &mut HashMap<String, usize>, name: &str) -> usize {
        if let Some(&idx) = index.get(name) {
            return idx;
        }
        let idx = pool.len();
        pool.push(name.to_string());
        index.insert(name.to_string(), idx);
        idx
    }

    fn push_const(&mut self, constant: Constant) {
        let idx = self.program.constants.len();
        self.program.constants.push(constant);
        self.emit(Instr::PushConst(idx));
    }

    fn lower(&mut self, expr: &Expr) {
        match expr {
            Expr::Integer(n) => self.push_const(Constant::Integer(*n)),
            Expr::Float(n) => self.push_const(Constant::Float(*n)),
            Expr::String(s) => self.push_const(Constant::String(s.clone())),
            Expr::Path(path) => {
                let idx = Self::intern(&mut self.program.paths, &mut self.path_index, path);
                self.emit(Instr::LoadPath(idx));
            }
            Expr::Unary { op, operand } => {
                self.lower(operand);
                self.emit(Instr::Unary(*op));
            }
            Expr::BinaryOp { op, left, right } => {
                self.lower(left);
                self.lower(right);
                self.emit(Instr::Binary(*op));
            }
            Expr::Logical { op, left, right } => self.lower_logical(*op, left, right),
            Expr::In {
                needle,
                tuple,
                negated,
            } => {
                self.lower(needle);
                for element in tuple {
                    self.lower(element);
                }
                self.emit(Instr::In {
                    len: tuple.len(),
                    negated: *negated,
                });
            }
            Expr::Match { subject, pattern } => {
                self.lower(subject);
                let idx = self.program.patterns.len();
                self.program.patterns.push(pattern.clone());
                self.emit(Instr::Match(idx));
            }
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.lower(condition);
                let to_else = self.emit_jump(Instr::JumpIfFalse);
                self.lower(then_branch);
                let to_end = self.emit_jump(Instr::Jump);
                let else_start = self.here();
                self.patch_jump(to_else, else_start);
                self.lower(else_branch);
                let end = self.here();
                self.patch_jump(to_end, end);
            }
            Expr::Call { name, args } => {
                for arg in args {
                    self.lower(arg);
                }
                let name = Self::intern(&mut self.program.functions, &mut self.function_index, name);
                self.emit(Instr::Call {
                    name,
                    argc: args.len(),
                });
            }
        }
    }

    /// `a and b`:
    /// ```text
    ///     a; jump_if_0 F; b; jump_if_0 F; truth 1; jump E
    /// F:  truth 0
    /// E:
    /// ```
    /// `or` is the mirror image with `jump_if_1`.
    fn lower_logical(&mut self, op: LogicalOp, left: &Expr, right: &Expr) {
        let (branch, decided) = match op {
            LogicalOp::And => (Instr::JumpIfFalse as fn(usize) -> Instr, false),
            LogicalOp::Or => (Instr::JumpIfTrue as fn(usize) -> Instr, true),
        };

        self.lower(left);
        let first = self.emit_jump(branch);
        self.lower(right);
        let second = self.emit_jump(branch);
        self.emit(Instr::PushTruth(!decided));
        let to_end = self.emit_jump(Instr::Jump);

        let short_circuit = self.here();
        self.patch_jump(first, short_circuit);
        self.patch_jump(second, short_circuit);
        self.emit(Instr::PushTruth(decided));

        let end = self.here();
        self.patch_jump(to_end, end);
    }
}

/// Lowers a syntax tree into a program.
pub fn lower(expr: &Expr) -> Program {
    Lowering::default().finish(expr)
}

/// Builds compiled expressions, optionally with extra functions.
///
/// # Examples
///
/// ```
/// use filtrate::{Compiler, Value};
///
/// let expr = Compiler::new()
///     .with_function("triple", |args| Ok(Value::from_f64(args[0].to_number() * 3.0)))
///     .compile("triple(v)")
///     .unwrap();
///
/// let record = Value::from(serde_json::json!({ "v": 7 }));
/// assert_eq!(expr.evaluate(&record).unwrap(), Value::Integer(21));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    extra: FunctionRegistry,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a function, shadowing any built-in of the same name.
    pub fn with_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.extra.register(name, function);
        self
    }

    /// Adds every function in `functions`, shadowing same-named entries.
    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.extra = std::mem::take(&mut self.extra).merge(functions);
        self
    }

    /// The registry a compiled expression is bound to: built-ins first, then
    /// the extra functions on top.
    fn registry(&self) -> Arc<FunctionRegistry> {
        Arc::new(FunctionRegistry::with_builtins().merge(self.extra.clone()))
    }

    /// Compiles `source` into a callable expression.
    pub fn compile(&self, source: &str) -> Result<CompiledExpression, CompileError> {
        let ast = Parser::new(Lexer::new(source))?.parse()?;
        let program = lower(&ast);
        tracing::debug!(
            source,
            instructions = program.instructions.len(),
            "compiled expression"
        );
        Ok(CompiledExpression {
            ast: Some(ast),
            program,
            functions: self.registry(),
        })
    }

    /// Compiles `source` but stops at the inspectable [`Program`].
    pub fn compile_program(&self, source: &str) -> Result<Program, CompileError> {
        let ast = Parser::new(Lexer::new(source))?.parse()?;
        Ok(lower(&ast))
    }

    /// Binds a previously produced program, for example one loaded from a
    /// cache, to this compiler's functions.
    pub fn bind(&self, program: Program) -> CompiledExpression {
        CompiledExpression {
            ast: None,
            program,
            functions: self.registry(),
        }
    }
}

/// A reusable evaluator for one expression.
///
/// Immutable after construction: evaluation allocates its own stack, so the
/// same expression may be evaluated from many threads at once.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    ast: Option<Expr>,
    program: Program,
    functions: Arc<FunctionRegistry>,
}

impl CompiledExpression {
    /// Evaluates the expression against one record.
    pub fn evaluate(&self, record: &Value) -> Result<Value, EvalError> {
        evaluator::run(&self.program, &self.functions, record)
    }

    /// Evaluates against a JSON record and returns JSON. A missing result
    /// becomes `null`.
    pub fn evaluate_json(&self, record: &serde_json::Value) -> Result<serde_json::Value, EvalError> {
        self.evaluate(&Value::from(record)).map(serde_json::Value::from)
    }

    /// The syntax tree, when the expression was compiled from source.
    pub fn ast(&self) -> Option<&Expr> {
        self.ast.as_ref()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }
}

/// Compiles `source` with the built-in functions only.
pub fn compile(source: &str) -> Result<CompiledExpression, CompileError> {
    Compiler::new().compile(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_lowers_to_jumps() {
        let program = Compiler::new().compile_program("a and b").unwrap();
        assert_eq!(
            program.instructions,
            vec![
                Instr::LoadPath(0),
                Instr::JumpIfFalse(6),
                Instr::LoadPath(1),
                Instr::JumpIfFalse(6),
                Instr::PushTruth(true),
                Instr::Jump(7),
                Instr::PushTruth(false),
            ]
        );
    }

    #[test]
    fn test_paths_and_functions_are_interned() {
        let program = Compiler::new().compile_program("max(a, a) + max(a)").unwrap();
        assert_eq!(program.paths, vec!["a".to_string()]);
        assert_eq!(program.functions, vec!["max".to_string()]);
    }

    #[test]
    fn test_disassembly() {
        let program = Compiler::new().compile_program("x > 1 ? 'a' : 'b'").unwrap();
        let text = program.to_string();
        assert!(text.contains("0000  path      x"));
        assert!(text.contains("binary    >"));
        assert!(text.contains("jump_if_0 -> 0006"));
        assert!(text.contains("const     \"b\""));
    }
}

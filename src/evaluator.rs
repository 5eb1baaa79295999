use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    ast::{BinOp, UnaryOp},
    compiler::{Instr, Program},
    functions::{self, FunctionError, FunctionRegistry},
    path,
    value::Value,
};

/// Errors raised while evaluating a compiled expression against a record.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// A call named a function that is neither built in nor supplied.
    #[error("Unknown function: {0}()")]
    UnknownFunction(String),

    /// A native function returned an error. The function's own error is the source.
    #[error("function {name}() failed: {source}")]
    Function {
        name: String,
        #[source]
        source: FunctionError,
    },

    /// A program that did not come from the compiler references a pool entry
    /// that does not exist, jumps backwards, or leaves the stack unbalanced.
    #[error("corrupt program: {0}")]
    CorruptProgram(&'static str),
}

/// Runs `program` against `record`.
///
/// Every call gets a fresh operand stack, so a program and its registry can be
/// shared freely between threads.
pub(crate) fn run(
    program: &Program,
    functions: &FunctionRegistry,
    record: &Value,
) -> Result<Value, EvalError> {
    tracing::trace!(instructions = program.instructions.len(), "evaluating");

    let mut stack: Vec<Value> = Vec::with_capacity(8);
    let mut ip = 0;

    while let Some(instr) = program.instructions.get(ip) {
        ip += 1;
        match *instr {
            Instr::PushConst(idx) => {
                let constant = program
                    .constants
                    .get(idx)
                    .ok_or(EvalError::CorruptProgram("constant index out of range"))?;
                stack.push(Value::from(constant));
            }
            Instr::PushTruth(b) => stack.push(Value::truth(b)),
            Instr::LoadPath(idx) => {
                let name = program
                    .paths
                    .get(idx)
                    .ok_or(EvalError::CorruptProgram("path index out of range"))?;
                let value = path::resolve(name, record).map_or(Value::Missing, |v| v.into_owned());
                stack.push(value);
            }
            Instr::Unary(op) => {
                let operand = pop(&mut stack)?;
                stack.push(apply_unary(op, &operand));
            }
            Instr::Binary(op) => {
                let right = pop(&mut stack)?;
                let left = pop(&mut stack)?;
                stack.push(apply_binop(op, &left, &right));
            }
            Instr::In { len, negated } => {
                let tuple = pop_n(&mut stack, len)?;
                let needle = pop(&mut stack)?;
                let found = tuple.iter().any(|candidate| needle.equals(candidate));
                stack.push(Value::Boolean(found != negated));
            }
            Instr::Match(idx) => {
                let pattern = program
                    .patterns
                    .get(idx)
                    .ok_or(EvalError::CorruptProgram("pattern index out of range"))?;
                let subject = pop(&mut stack)?;
                stack.push(Value::Boolean(pattern.is_match(&subject.to_text())));
            }
            Instr::Call { name, argc } => {
                let name = program
                    .functions
                    .get(name)
                    .ok_or(EvalError::CorruptProgram("function index out of range"))?;
                let args = pop_n(&mut stack, argc)?;
                let Some(function) = functions.get(name) else {
                    tracing::debug!(function = %name, "call to unknown function");
                    return Err(EvalError::UnknownFunction(name.clone()));
                };
                tracing::trace!(function = %name, argc, "calling function");
                let result = function(&args).map_err(|source| EvalError::Function {
                    name: name.clone(),
                    source,
                })?;
                stack.push(result);
            }
            Instr::Jump(target) => ip = forward(ip, target)?,
            Instr::JumpIfFalse(target) => {
                if !pop(&mut stack)?.is_truthy() {
                    ip = forward(ip, target)?;
                }
            }
            Instr::JumpIfTrue(target) => {
                if pop(&mut stack)?.is_truthy() {
                    ip = forward(ip, target)?;
                }
            }
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(result), true) => Ok(result),
        _ => Err(EvalError::CorruptProgram("stack not balanced at end of program")),
    }
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, EvalError> {
    stack.pop().ok_or(EvalError::CorruptProgram("operand stack underflow"))
}

fn pop_n(stack: &mut Vec<Value>, n: usize) -> Result<Vec<Value>, EvalError> {
    let at = stack
        .len()
        .checked_sub(n)
        .ok_or(EvalError::CorruptProgram("operand stack underflow"))?;
    Ok(stack.split_off(at))
}

// Only forward jumps are valid, which also guarantees termination.
fn forward(ip: usize, target: usize) -> Result<usize, EvalError> {
    if target >= ip {
        Ok(target)
    } else {
        Err(EvalError::CorruptProgram("backward jump"))
    }
}

pub(crate) fn apply_unary(op: UnaryOp, operand: &Value) -> Value {
    match op {
        UnaryOp::Not => Value::truth(!operand.is_truthy()),
        UnaryOp::Negate => match Number::of(operand) {
            Number::Int(n) => n
                .checked_neg()
                .map_or_else(|| Value::Float(-(n as f64)), Value::Integer),
            Number::Float(n) => Value::from_f64(-n),
        },
    }
}

pub(crate) fn apply_binop(op: BinOp, left: &Value, right: &Value) -> Value {
    match op {
        BinOp::Equal => Value::truth(left.equals(right)),
        BinOp::NotEqual => Value::truth(!left.equals(right)),
        BinOp::LessThan => Value::truth(left.compare(right).is_some_and(|o| o.is_lt())),
        BinOp::GreaterThan => Value::truth(left.compare(right).is_some_and(|o| o.is_gt())),
        BinOp::LessEqual => Value::truth(left.compare(right).is_some_and(|o| o.is_le())),
        BinOp::GreaterEqual => Value::truth(left.compare(right).is_some_and(|o| o.is_ge())),
        BinOp::Has => Value::Boolean(functions::has(left, right)),
        BinOp::Add => match (left, right) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::String(left.to_text() + &right.to_text())
            }
            _ => arithmetic(ArithOp::Add, left, right),
        },
        BinOp::Subtract => arithmetic(ArithOp::Sub, left, right),
        BinOp::Multiply => arithmetic(ArithOp::Mul, left, right),
        BinOp::Divide => arithmetic(ArithOp::Div, left, right),
        BinOp::Modulo => arithmetic(ArithOp::Rem, left, right),
        BinOp::Power => arithmetic(ArithOp::Pow, left, right),
    }
}

#[derive(Debug, Clone, Copy)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

/// A value after numeric coercion. Integers, booleans and null stay integral.
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Self {
        match value {
            Value::Integer(n) => Number::Int(*n),
            Value::Boolean(b) => Number::Int(*b as i64),
            Value::Null => Number::Int(0),
            other => Number::Float(other.to_number()),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    fn as_decimal(self) -> Option<Decimal> {
        match self {
            Number::Int(n) => Decimal::from_i64(n),
            Number::Float(n) => Decimal::from_f64(n),
        }
    }
}

/// Integer arithmetic first, then decimal, then plain floats. Each stage
/// gives up (returns `None`) on overflow, inexact or rounded results and
/// division by zero, so the last stage produces the IEEE result.
fn arithmetic(op: ArithOp, left: &Value, right: &Value) -> Value {
    let (a, b) = (Number::of(left), Number::of(right));
    if let (Number::Int(x), Number::Int(y)) = (a, b)
        && let Some(n) = integer_arithmetic(op, x, y)
    {
        return Value::Integer(n);
    }
    if let Some(result) = decimal_arithmetic(op, a, b) {
        return result;
    }
    float_arithmetic(op, a.as_f64(), b.as_f64())
}

fn integer_arithmetic(op: ArithOp, a: i64, b: i64) -> Option<i64> {
    match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Sub => a.checked_sub(b),
        ArithOp::Mul => a.checked_mul(b),
        ArithOp::Div => {
            let quotient = a.checked_div(b)?;
            (a.checked_rem(b)? == 0).then_some(quotient)
        }
        ArithOp::Rem => a.checked_rem(b),
        ArithOp::Pow => a.checked_pow(u32::try_from(b).ok()?),
    }
}

/// Fractional digits a `Decimal` can hold.
const DECIMAL_MAX_SCALE: u32 = 28;

fn decimal_arithmetic(op: ArithOp, a: Number, b: Number) -> Option<Value> {
    // Powers go straight to floats; fractional exponents have no exact form.
    if matches!(op, ArithOp::Pow) {
        return None;
    }
    let (x, y) = (a.as_decimal()?, b.as_decimal()?);
    // A product finer than the decimal scale limit would be rounded.
    if matches!(op, ArithOp::Mul) && x.scale() + y.scale() > DECIMAL_MAX_SCALE {
        return None;
    }
    let result = match op {
        ArithOp::Add => x.checked_add(y),
        ArithOp::Sub => x.checked_sub(y),
        ArithOp::Mul => x.checked_mul(y),
        ArithOp::Div => x.checked_div(y),
        ArithOp::Rem => x.checked_rem(y),
        ArithOp::Pow => None,
    }?;
    // Quotients that fill every decimal place were cut short, and a zero from
    // nonzero operands means the true value underflowed.
    let underflowed = result.is_zero() && !x.is_zero() && !y.is_zero();
    if result.scale() >= DECIMAL_MAX_SCALE
        || (underflowed && matches!(op, ArithOp::Mul | ArithOp::Div))
    {
        return None;
    }
    if result.is_integer()
        && let Some(n) = result.to_i64()
    {
        return Some(Value::Integer(n));
    }
    // Through the decimal text so the float is the closest one to it.
    result.to_string().parse().ok().map(Value::Float)
}

fn float_arithmetic(op: ArithOp, a: f64, b: f64) -> Value {
    let result = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Rem => a % b,
        ArithOp::Pow => a.powf(b),
    };
    Value::from_f64(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    fn float(n: f64) -> Value {
        Value::Float(n)
    }

    fn text(s: &str) -> Value {
        Value::String(s.to_string())
    }

    #[test]
    fn test_integer_division_stays_exact() {
        assert_eq!(apply_binop(BinOp::Divide, &int(6), &int(3)), int(2));
        assert_eq!(apply_binop(BinOp::Divide, &int(7), &int(2)), float(3.5));
    }

    #[test]
    fn test_division_by_zero_is_ieee() {
        assert_eq!(apply_binop(BinOp::Divide, &int(1), &int(0)), float(f64::INFINITY));
        let Value::Float(n) = apply_binop(BinOp::Modulo, &int(1), &int(0)) else {
            panic!("expected float");
        };
        assert!(n.is_nan());
    }

    #[test]
    fn test_decimal_arithmetic() {
        assert_eq!(apply_binop(BinOp::Multiply, &float(1.4), &float(1.1)), float(1.54));
        assert_eq!(apply_binop(BinOp::Add, &float(0.1), &float(0.2)), float(0.3));
        assert_eq!(apply_binop(BinOp::Multiply, &float(2.5), &int(4)), int(10));
    }

    #[test]
    fn test_decimal_underflow_falls_back_to_float() {
        let Value::Float(product) = apply_binop(BinOp::Multiply, &float(1e-15), &float(1e-15))
        else {
            panic!("expected float");
        };
        assert!((product - 1e-30).abs() < 1e-40);

        let divisor = int(100_000_000_000_000_000);
        let Value::Float(quotient) = apply_binop(BinOp::Divide, &float(1e-13), &divisor) else {
            panic!("expected float");
        };
        assert!((quotient - 1e-30).abs() < 1e-40);

        assert_eq!(apply_binop(BinOp::Divide, &int(1), &int(3)), float(1.0 / 3.0));
        assert_eq!(apply_binop(BinOp::Multiply, &float(0.0), &float(1e-15)), int(0));
    }

    #[test]
    fn test_overflow_falls_back_to_float() {
        let Value::Float(n) = apply_binop(BinOp::Multiply, &int(i64::MAX), &int(2)) else {
            panic!("expected float");
        };
        assert!(n > 1.8e19);
        assert_eq!(apply_binop(BinOp::Power, &int(2), &int(10)), int(1024));
        assert_eq!(apply_binop(BinOp::Power, &int(4), &float(0.5)), int(2));
        assert_eq!(apply_binop(BinOp::Power, &int(2), &int(-1)), float(0.5));
    }

    #[test]
    fn test_plus_concatenates_strings() {
        assert_eq!(apply_binop(BinOp::Add, &text("a"), &int(1)), text("a1"));
        assert_eq!(apply_binop(BinOp::Add, &float(1.5), &text("x")), text("1.5x"));
        assert_eq!(apply_binop(BinOp::Add, &Value::Boolean(true), &int(1)), int(2));
    }

    #[test]
    fn test_negate_and_not() {
        assert_eq!(apply_unary(UnaryOp::Negate, &int(3)), int(-3));
        assert_eq!(apply_unary(UnaryOp::Negate, &text("2")), int(-2));
        assert_eq!(apply_unary(UnaryOp::Negate, &int(i64::MIN)), float(9.223372036854776e18));
        assert_eq!(apply_unary(UnaryOp::Not, &Value::Missing), int(1));
    }

    #[test]
    fn test_mixed_type_ordering_is_false() {
        assert_eq!(apply_binop(BinOp::LessThan, &int(1), &text("2")), int(0));
        assert_eq!(apply_binop(BinOp::GreaterEqual, &int(1), &text("2")), int(0));
        assert_eq!(apply_binop(BinOp::LessEqual, &text("a"), &text("b")), int(1));
    }
}

//! Binary and unary operators.
//!
//! `&&` and `||` short-circuit and are handled by the evaluator; everything
//! else comes through [`evaluate_binary`] with both operands evaluated.

use std::cmp::Ordering;

use crate::ast::{BinaryOp, UnaryOp};
use crate::errors::{EvalError, EvalErrorKind, EvalResult};
use crate::value::Value;

fn mismatch(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::new(EvalErrorKind::BinaryTypeMismatch {
        op,
        left: left.type_name(),
        right: right.type_name(),
    })
}

#[inline]
fn checked(result: Option<i64>, op: &'static str) -> EvalResult {
    result
        .map(Value::Int)
        .ok_or_else(|| EvalError::new(EvalErrorKind::IntegerOverflow { op }))
}

pub fn evaluate_binary(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => return Ok(Value::Bool(left != right)),
        _ => {}
    }

    match (left, right) {
        (Value::Int(a), Value::Int(b)) => eval_int_binary(*a, *b, op),
        (Value::Str(a), Value::Str(b)) => match op {
            BinaryOp::Add => Ok(Value::string(format!("{a}{b}"))),
            _ => compare(a.cmp(b), op).ok_or_else(|| mismatch(op, left, right)),
        },
        // `+` with one string operand concatenates the other's display form.
        (Value::Str(_), _) | (_, Value::Str(_)) if op == BinaryOp::Add => {
            Ok(Value::string(format!("{left}{right}")))
        }
        _ => Err(mismatch(op, left, right)),
    }
}

fn eval_int_binary(a: i64, b: i64, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Add => checked(a.checked_add(b), "+"),
        BinaryOp::Sub => checked(a.checked_sub(b), "-"),
        BinaryOp::Mul => checked(a.checked_mul(b), "*"),
        BinaryOp::Div if b == 0 => Err(EvalError::new(EvalErrorKind::DivisionByZero)),
        BinaryOp::Div => checked(a.checked_div(b), "/"),
        BinaryOp::Mod if b == 0 => Err(EvalError::new(EvalErrorKind::DivisionByZero)),
        BinaryOp::Mod => checked(a.checked_rem(b), "%"),
        _ => compare(a.cmp(&b), op).ok_or_else(|| mismatch(op, &Value::Int(a), &Value::Int(b))),
    }
}

fn compare(ordering: Ordering, op: BinaryOp) -> Option<Value> {
    let result = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::LtEq => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::GtEq => ordering.is_ge(),
        _ => return None,
    };
    Some(Value::Bool(result))
}

pub fn evaluate_unary(operand: &Value, op: UnaryOp) -> EvalResult {
    match (op, operand) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => checked(n.checked_neg(), "-"),
        (UnaryOp::Neg, other) => Err(EvalError::new(EvalErrorKind::UnaryTypeMismatch {
            op: "-",
            operand: other.type_name(),
        })),
    }
}

//! Operator semantics on plain (already unwrapped) values.

use std::rc::Rc;

use crate::template::{BinaryOp, UnaryOp};
use crate::value::Value;

/// `+`: numeric addition when both operands are numbers, otherwise string
/// concatenation of the stringified operands.
pub fn add(left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
        _ => {
            let mut out = left.to_template_string();
            out.push_str(&right.to_template_string());
            Value::from(out)
        }
    }
}

/// Exponentiation with the template language's edge cases: a `NaN` exponent
/// always yields `NaN`, and so does `±1 ** ±Infinity`.
pub fn pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

/// `===`: same type and same value. Aggregates compare by identity.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
        (Value::Signal(a), Value::Signal(b)) => a == b,
        (Value::Computed(a), Value::Computed(b)) => a == b,
        _ => false,
    }
}

/// `==`.
///
/// | left | right | rule |
/// |------|-------|------|
/// | nullish | nullish | equal |
/// | nullish | anything else | not equal |
/// | string | string | compared as strings |
/// | number, string or bool | number, string or bool | compared numerically |
/// | otherwise | | `===` |
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (l, r) if l.is_nullish() || r.is_nullish() => l.is_nullish() && r.is_nullish(),
        (Value::String(a), Value::String(b)) => a == b,
        (
            Value::Number(_) | Value::String(_) | Value::Bool(_),
            Value::Number(_) | Value::String(_) | Value::Bool(_),
        ) => left.to_number() == right.to_number(),
        _ => strict_equals(left, right),
    }
}

/// `<`, `>`, `<=`, `>=`: two strings compare lexicographically, anything else
/// numerically. Any `NaN` operand makes the comparison false.
pub fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Gt => a > b,
            BinaryOp::LtEq => a <= b,
            _ => a >= b,
        };
    }
    let (a, b) = (left.to_number(), right.to_number());
    match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Gt => a > b,
        BinaryOp::LtEq => a <= b,
        _ => a >= b,
    }
}

/// Apply a non-logical binary operator. `&&`, `||` short-circuit and are
/// handled by the evaluator.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Pow => Value::Number(pow(left.to_number(), right.to_number())),
        BinaryOp::Eq => Value::Bool(loose_equals(left, right)),
        BinaryOp::NotEq => Value::Bool(!loose_equals(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNotEq => Value::Bool(!strict_equals(left, right)),
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => {
            Value::Bool(compare(op, left, right))
        }
        BinaryOp::And => {
            if left.is_truthy() {
                right.clone()
            } else {
                left.clone()
            }
        }
        BinaryOp::Or => {
            if left.is_truthy() {
                left.clone()
            } else {
                right.clone()
            }
        }
    }
}

pub fn unary(op: UnaryOp, operand: &Value) -> Value {
    match op {
        UnaryOp::Neg => Value::Number(-operand.to_number()),
        UnaryOp::Plus => Value::Number(operand.to_number()),
        UnaryOp::Not => Value::Bool(!operand.is_truthy()),
    }
}

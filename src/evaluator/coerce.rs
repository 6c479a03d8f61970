// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Rank-directed coercion of a single operand
//!
//! Every helper takes the operand's resolved rank. Values whose rank already
//! names the target are returned as-is, numbers widen directly, and anything
//! else is handed to [`ElEvalContext::convert`].

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::Zero;

use super::context::ElEvalContext;
use super::error::{EvaluationError, EvaluationResult};
use super::messages::CANNOT_CONVERT;
use crate::model::{ElClass, TypeCoercion, TypeRank, Value};

/// String containing `.`, `e` or `E`, i.e. one that parses as a floating value
pub fn is_dot_ee(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.contains(['.', 'e', 'E']))
}

/// Float or double ranked, or floating text
pub fn is_float_or_double_or_dot_ee(rank: TypeRank, value: &Value) -> bool {
    rank.is_float_or_double() || is_dot_ee(value)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn unexpected(ctx: &dyn ElEvalContext, value: &Value, target: &ElClass, converted: &Value) -> EvaluationError {
    let target_name = Value::from(target.to_string());
    let cause = Value::from(format!("converter returned {}", converted.class()));
    EvaluationError::Conversion {
        message: ctx.message(CANNOT_CONVERT, &[value, &target_name, &cause]),
    }
}

/// Coerce to a decimal
pub fn to_big_decimal(ctx: &dyn ElEvalContext, rank: TypeRank, value: &Value) -> EvaluationResult<BigDecimal> {
    if rank == TypeRank::BIG_DECIMAL {
        if let Value::BigDecimal(d) = value {
            return Ok(d.clone());
        }
    }
    if is_blank(value) {
        return Ok(BigDecimal::zero());
    }
    let direct = match value {
        Value::BigDecimal(d) => Some(d.clone()),
        Value::BigInteger(b) => Some(BigDecimal::new(b.clone(), 0)),
        Value::Float(_) | Value::Double(_) => value.double_value().and_then(TypeCoercion::exact_decimal),
        Value::Byte(_) | Value::Short(_) | Value::Int(_) | Value::Long(_) | Value::Char(_) => {
            value.long_value().map(BigDecimal::from)
        }
        Value::Boolean(b) => Some(BigDecimal::from(i64::from(*b))),
        _ => None,
    };
    if let Some(d) = direct {
        return Ok(d);
    }
    let target = ElClass::BigDecimal;
    match ctx.convert(value, &target)? {
        Value::BigDecimal(d) => Ok(d),
        other => Err(unexpected(ctx, value, &target, &other).into()),
    }
}

/// Coerce to an arbitrary precision integer
///
/// Numbers above the short rank go through a 64-bit truncation first, so a
/// large decimal loses its high bits.
pub fn to_big_integer(ctx: &dyn ElEvalContext, rank: TypeRank, value: &Value) -> EvaluationResult<BigInt> {
    if let Value::BigInteger(b) = value {
        return Ok(b.clone());
    }
    if is_blank(value) {
        return Ok(BigInt::from(0));
    }
    if rank.is_number() {
        if let Some(v) = value.long_value() {
            return Ok(BigInt::from(v));
        }
    }
    match value {
        Value::Char(c) => return Ok(BigInt::from(u32::from(*c))),
        Value::Boolean(b) => return Ok(BigInt::from(u8::from(*b))),
        Value::Byte(v) => return Ok(BigInt::from(*v)),
        _ => {}
    }
    let target = ElClass::BigInteger;
    match ctx.convert(value, &target)? {
        Value::BigInteger(b) => Ok(b),
        other => Err(unexpected(ctx, value, &target, &other).into()),
    }
}

/// Coerce to a 64-bit float
///
/// A char is read as the digit it spells, not as its code point.
pub fn to_double(ctx: &dyn ElEvalContext, rank: TypeRank, value: &Value) -> EvaluationResult<f64> {
    if rank.is_double() {
        if let Value::Double(v) = value {
            return Ok(*v);
        }
    }
    if is_blank(value) {
        return Ok(0.0);
    }
    match value {
        Value::String(s) => {
            if let Ok(v) = s.trim().parse::<f64>() {
                return Ok(v);
            }
        }
        Value::Boolean(b) => return Ok(if *b { 1.0 } else { 0.0 }),
        Value::Char(c) => {
            if let Some(v) = c.to_digit(10) {
                return Ok(f64::from(v));
            }
        }
        other => {
            if let Some(v) = other.double_value() {
                return Ok(v);
            }
        }
    }
    let target = ElClass::BoxedDouble;
    match ctx.convert(value, &target)? {
        Value::Double(v) => Ok(v),
        other => Err(unexpected(ctx, value, &target, &other).into()),
    }
}

/// Coerce to a 64-bit integer
pub fn to_long(ctx: &dyn ElEvalContext, rank: TypeRank, value: &Value) -> EvaluationResult<i64> {
    if let Value::Long(v) = value {
        return Ok(*v);
    }
    if is_blank(value) {
        return Ok(0);
    }
    if rank.is_number() {
        if let Some(v) = value.long_value() {
            return Ok(v);
        }
    }
    match value {
        Value::Char(c) => return Ok(i64::from(u32::from(*c))),
        Value::Boolean(b) => return Ok(i64::from(*b)),
        Value::Byte(v) => return Ok(i64::from(*v)),
        _ => {}
    }
    let target = ElClass::BoxedLong;
    match ctx.convert(value, &target)? {
        Value::Long(v) => Ok(v),
        other => Err(unexpected(ctx, value, &target, &other).into()),
    }
}

/// Coerce to a boolean; numbers are true when non-zero
pub fn to_boolean(ctx: &dyn ElEvalContext, rank: TypeRank, value: &Value) -> EvaluationResult<bool> {
    if let Value::Boolean(b) = value {
        return Ok(*b);
    }
    if rank.is_number() {
        if let Some(v) = value.double_value() {
            return Ok(v != 0.0);
        }
    }
    let target = ElClass::BoxedBoolean;
    match ctx.convert(value, &target)? {
        Value::Boolean(b) => Ok(b),
        Value::Null => Ok(false),
        other => Err(unexpected(ctx, value, &target, &other).into()),
    }
}

/// Coerce to text; strings are returned unchanged, everything else is formatted by the context
pub fn to_string(ctx: &dyn ElEvalContext, _rank: TypeRank, value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        other => ctx.format_value(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::DefaultEvalContext;

    #[test]
    fn test_dot_ee_detection() {
        assert!(is_dot_ee(&Value::from("1.5")));
        assert!(is_dot_ee(&Value::from("1e3")));
        assert!(is_dot_ee(&Value::from("2E1")));
        assert!(!is_dot_ee(&Value::from("12")));
        assert!(!is_dot_ee(&Value::Double(1.5)));
        assert!(is_float_or_double_or_dot_ee(TypeRank::FLOAT, &Value::Float(1.0)));
    }

    #[test]
    fn test_to_long() {
        let ctx = DefaultEvalContext::new();
        assert_eq!(to_long(&ctx, TypeRank::OBJECT, &Value::Null).unwrap(), 0);
        assert_eq!(to_long(&ctx, TypeRank::STRING, &Value::from("")).unwrap(), 0);
        assert_eq!(to_long(&ctx, TypeRank::STRING, &Value::from("42")).unwrap(), 42);
        assert_eq!(to_long(&ctx, TypeRank::BOXED_DOUBLE, &Value::Double(2.7)).unwrap(), 2);
        assert_eq!(to_long(&ctx, TypeRank::BOXED_CHAR, &Value::Char('A')).unwrap(), 65);
        assert_eq!(to_long(&ctx, TypeRank::BOXED_BOOLEAN, &Value::Boolean(true)).unwrap(), 1);
        assert!(to_long(&ctx, TypeRank::STRING, &Value::from("abc")).is_err());
    }

    #[test]
    fn test_to_big_decimal_uses_exact_float_value() {
        let ctx = DefaultEvalContext::new();
        let d = to_big_decimal(&ctx, TypeRank::BOXED_FLOAT, &Value::Float(0.1)).unwrap();
        assert_ne!(d, "0.1".parse::<BigDecimal>().unwrap());
        assert_eq!(
            to_big_decimal(&ctx, TypeRank::STRING, &Value::from("1e0")).unwrap(),
            BigDecimal::from(1)
        );
        let big = BigInt::from(10).pow(30);
        assert_eq!(
            to_big_decimal(&ctx, TypeRank::BIG_INTEGER, &Value::BigInteger(big.clone())).unwrap(),
            BigDecimal::new(big, 0)
        );
    }

    #[test]
    fn test_to_big_integer_truncates_through_long() {
        let ctx = DefaultEvalContext::new();
        let d = Value::BigDecimal("7.9".parse::<BigDecimal>().unwrap());
        assert_eq!(
            to_big_integer(&ctx, TypeRank::BIG_DECIMAL, &d).unwrap(),
            BigInt::from(7)
        );
    }

    #[test]
    fn test_to_double_reads_char_digits() {
        let ctx = DefaultEvalContext::new();
        assert_eq!(to_double(&ctx, TypeRank::BOXED_CHAR, &Value::Char('5')).unwrap(), 5.0);
        assert_eq!(to_double(&ctx, TypeRank::CHAR, &Value::Char('0')).unwrap(), 0.0);
        assert!(to_double(&ctx, TypeRank::BOXED_CHAR, &Value::Char('x')).is_err());
        // long widening keeps the code point
        assert_eq!(to_long(&ctx, TypeRank::BOXED_CHAR, &Value::Char('5')).unwrap(), 53);
    }

    #[test]
    fn test_to_boolean_and_string() {
        let ctx = DefaultEvalContext::new();
        assert!(to_boolean(&ctx, TypeRank::BOXED_DOUBLE, &Value::Double(0.5)).unwrap());
        assert!(!to_boolean(&ctx, TypeRank::BOXED_INT, &Value::Int(0)).unwrap());
        assert!(to_boolean(&ctx, TypeRank::STRING, &Value::from("yes")).unwrap());
        assert!(!to_boolean(&ctx, TypeRank::OBJECT, &Value::Null).unwrap());
        assert_eq!(to_string(&ctx, TypeRank::OBJECT, &Value::Null), "");
        assert_eq!(to_string(&ctx, TypeRank::BOXED_INT, &Value::Int(3)), "3");
    }
}

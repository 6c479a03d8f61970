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

//! Arithmetic, equality and relational semantics with numeric promotion
//!
//! Each binary operation receives the operands together with their ranks.
//! A rank of [`TypeRank::UNKNOWN`] is resolved from the runtime value. The
//! promotion target is then picked by comparing ranks, first match wins:
//! decimal, then floating (or floating text), then big integer, then 64-bit
//! integer.

use std::cmp::Ordering;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use super::coerce::{
    is_dot_ee, is_float_or_double_or_dot_ee, to_big_decimal, to_big_integer, to_boolean,
    to_double, to_long, to_string,
};
use super::context::ElEvalContext;
use super::error::{EvaluationError, EvaluationResult};
use super::messages::{CANNOT_APPLY_MINUS, DIVISION_BY_ZERO, VALUES_NOT_COMPARABLE};
use crate::model::{TypeCoercion, TypeRank, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arith {
    Add,
    Sub,
    Mul,
}

impl Arith {
    fn apply_decimal(self, a: BigDecimal, b: BigDecimal) -> BigDecimal {
        match self {
            Arith::Add => a + b,
            Arith::Sub => a - b,
            Arith::Mul => a * b,
        }
    }

    fn apply_double(self, a: f64, b: f64) -> f64 {
        match self {
            Arith::Add => a + b,
            Arith::Sub => a - b,
            Arith::Mul => a * b,
        }
    }

    fn apply_big_integer(self, a: BigInt, b: BigInt) -> BigInt {
        match self {
            Arith::Add => a + b,
            Arith::Sub => a - b,
            Arith::Mul => a * b,
        }
    }

    fn apply_long(self, a: i64, b: i64) -> i64 {
        match self {
            Arith::Add => a.wrapping_add(b),
            Arith::Sub => a.wrapping_sub(b),
            Arith::Mul => a.wrapping_mul(b),
        }
    }
}

fn division_by_zero(ctx: &dyn ElEvalContext, l: &Value, r: &Value) -> EvaluationError {
    EvaluationError::Arithmetic {
        message: ctx.message(DIVISION_BY_ZERO, &[l, r]),
    }
}

fn is_big_decimal(lt: TypeRank, rt: TypeRank) -> bool {
    lt == TypeRank::BIG_DECIMAL || rt == TypeRank::BIG_DECIMAL
}

fn is_big_integer(lt: TypeRank, rt: TypeRank) -> bool {
    lt == TypeRank::BIG_INTEGER || rt == TypeRank::BIG_INTEGER
}

fn arithmetic(
    ctx: &dyn ElEvalContext,
    op: Arith,
    lt: TypeRank,
    l: &Value,
    rt: TypeRank,
    r: &Value,
) -> EvaluationResult<Value> {
    if is_big_decimal(lt, rt) {
        return decimal_arithmetic(ctx, op, lt, l, rt, r);
    }
    if is_float_or_double_or_dot_ee(lt, l) || is_float_or_double_or_dot_ee(rt, r) {
        if is_big_integer(lt, rt) {
            return decimal_arithmetic(ctx, op, lt, l, rt, r);
        }
        let result = op.apply_double(to_double(ctx, lt, l)?, to_double(ctx, rt, r)?);
        return Ok(Value::Double(result));
    }
    if is_big_integer(lt, rt) {
        let result = op.apply_big_integer(to_big_integer(ctx, lt, l)?, to_big_integer(ctx, rt, r)?);
        return Ok(Value::BigInteger(result));
    }
    Ok(Value::Long(op.apply_long(to_long(ctx, lt, l)?, to_long(ctx, rt, r)?)))
}

fn decimal_arithmetic(
    ctx: &dyn ElEvalContext,
    op: Arith,
    lt: TypeRank,
    l: &Value,
    rt: TypeRank,
    r: &Value,
) -> EvaluationResult<Value> {
    let a = to_big_decimal(ctx, lt, l)?;
    let b = to_big_decimal(ctx, rt, r)?;
    Ok(Value::BigDecimal(op.apply_decimal(a, b)))
}

/// Quotient at the dividend's scale, rounding half away from zero
///
/// Works on the unscaled integers so nothing is rounded twice. The divisor
/// must be non-zero.
fn divide_half_up(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    let (ua, scale) = a.as_bigint_and_exponent();
    let (ub, sb) = b.as_bigint_and_exponent();
    let shift = num_traits::pow(BigInt::from(10), sb.unsigned_abs() as usize);
    let (n, d) = if sb >= 0 { (ua * shift, ub) } else { (ua, ub * shift) };

    let mut q = &n / &d;
    let r = &n % &d;
    if r.abs() * 2u32 >= d.abs() {
        if n.sign() == d.sign() {
            q += BigInt::from(1);
        } else {
            q -= BigInt::from(1);
        }
    }
    BigDecimal::new(q, scale)
}

/// `+`: numeric promotion when either side is numeric, otherwise string concatenation
pub fn add(
    ctx: &dyn ElEvalContext,
    lt: TypeRank,
    l: &Value,
    rt: TypeRank,
    r: &Value,
) -> EvaluationResult<Value> {
    if l.is_null() && r.is_null() {
        return Ok(Value::Long(0));
    }
    let lt = lt.or_resolve(l);
    let rt = rt.or_resolve(r);
    if lt.is_numeric() || rt.is_numeric() {
        return arithmetic(ctx, Arith::Add, lt, l, rt, r);
    }
    let mut text = to_string(ctx, lt, l);
    text.push_str(&to_string(ctx, rt, r));
    Ok(Value::from(text))
}

/// `-`
pub fn sub(
    ctx: &dyn ElEvalContext,
    lt: TypeRank,
    l: &Value,
    rt: TypeRank,
    r: &Value,
) -> EvaluationResult<Value> {
    if l.is_null() && r.is_null() {
        return Ok(Value::Long(0));
    }
    arithmetic(ctx, Arith::Sub, lt.or_resolve(l), l, rt.or_resolve(r), r)
}

/// `*`
pub fn mul(
    ctx: &dyn ElEvalContext,
    lt: TypeRank,
    l: &Value,
    rt: TypeRank,
    r: &Value,
) -> EvaluationResult<Value> {
    if l.is_null() && r.is_null() {
        return Ok(Value::Long(0));
    }
    arithmetic(ctx, Arith::Mul, lt.or_resolve(l), l, rt.or_resolve(r), r)
}

/// `/`: decimal division when a big number is involved, double division otherwise
///
/// Decimal quotients keep the dividend's scale, rounding half up.
pub fn div(
    ctx: &dyn ElEvalContext,
    lt: TypeRank,
    l: &Value,
    rt: TypeRank,
    r: &Value,
) -> EvaluationResult<Value> {
    if l.is_null() && r.is_null() {
        return Ok(Value::Long(0));
    }
    let lt = lt.or_resolve(l);
    let rt = rt.or_resolve(r);
    if lt.is_big() || rt.is_big() {
        let a = to_big_decimal(ctx, lt, l)?;
        let b = to_big_decimal(ctx, rt, r)?;
        if b.is_zero() {
            return Err(division_by_zero(ctx, l, r).into());
        }
        return Ok(Value::BigDecimal(divide_half_up(&a, &b)));
    }
    Ok(Value::Double(to_double(ctx, lt, l)? / to_double(ctx, rt, r)?))
}

/// `%`
pub fn modulo(
    ctx: &dyn ElEvalContext,
    lt: TypeRank,
    l: &Value,
    rt: TypeRank,
    r: &Value,
) -> EvaluationResult<Value> {
    if l.is_null() && r.is_null() {
        return Ok(Value::Long(0));
    }
    let lt = lt.or_resolve(l);
    let rt = rt.or_resolve(r);
    if is_big_decimal(lt, rt) || is_float_or_double_or_dot_ee(lt, l) || is_float_or_double_or_dot_ee(rt, r) {
        return Ok(Value::Double(to_double(ctx, lt, l)? % to_double(ctx, rt, r)?));
    }
    if is_big_integer(lt, rt) {
        let a = to_big_integer(ctx, lt, l)?;
        let b = to_big_integer(ctx, rt, r)?;
        if b.is_zero() {
            return Err(division_by_zero(ctx, l, r).into());
        }
        return Ok(Value::BigInteger(a % b));
    }
    let a = to_long(ctx, lt, l)?;
    let b = to_long(ctx, rt, r)?;
    if b == 0 {
        return Err(division_by_zero(ctx, l, r).into());
    }
    Ok(Value::Long(a.wrapping_rem(b)))
}

/// `==` without the identity and null checks done by the operator
pub fn eq(
    ctx: &dyn ElEvalContext,
    lt: TypeRank,
    l: &Value,
    rt: TypeRank,
    r: &Value,
) -> EvaluationResult<bool> {
    let lt = lt.or_resolve(l);
    let rt = rt.or_resolve(r);

    if lt.is_boolean() || rt.is_boolean() {
        return Ok(to_boolean(ctx, lt, l)? == to_boolean(ctx, rt, r)?);
    }

    if lt == TypeRank::ENUM {
        if rt == TypeRank::ENUM {
            return Ok(l == r);
        }
        return Ok(*l == ctx.convert(r, &l.class())?);
    } else if rt == TypeRank::ENUM {
        return Ok(*r == ctx.convert(l, &r.class())?);
    }

    if lt == TypeRank::STRING || rt == TypeRank::STRING {
        return Ok(to_string(ctx, lt, l) == to_string(ctx, rt, r));
    }

    if lt.is_numeric() || rt.is_numeric() {
        if is_big_decimal(lt, rt) {
            // scale-sensitive, 1.0 != 1.00
            let a = to_big_decimal(ctx, lt, l)?;
            let b = to_big_decimal(ctx, rt, r)?;
            return Ok(a == b && TypeCoercion::decimal_scale(&a) == TypeCoercion::decimal_scale(&b));
        }
        if lt.is_float_or_double() || rt.is_float_or_double() {
            return Ok(to_double(ctx, lt, l)? == to_double(ctx, rt, r)?);
        }
        if is_big_integer(lt, rt) {
            return Ok(to_big_integer(ctx, lt, l)? == to_big_integer(ctx, rt, r)?);
        }
        return Ok(to_long(ctx, lt, l)? == to_long(ctx, rt, r)?);
    }

    Ok(l == r)
}

/// Relational operator sharing the comparison cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Gt,
    Ge,
    Lt,
    Le,
}

impl Relation {
    fn test(self, ord: Ordering) -> bool {
        match self {
            Relation::Gt => ord == Ordering::Greater,
            Relation::Ge => ord != Ordering::Less,
            Relation::Lt => ord == Ordering::Less,
            Relation::Le => ord != Ordering::Greater,
        }
    }

    fn test_double(self, a: f64, b: f64) -> bool {
        match self {
            Relation::Gt => a > b,
            Relation::Ge => a >= b,
            Relation::Lt => a < b,
            Relation::Le => a <= b,
        }
    }

    // `<=` on strings only holds for strictly smaller text
    fn test_text(self, ord: Ordering) -> bool {
        match self {
            Relation::Le => ord == Ordering::Less,
            other => other.test(ord),
        }
    }

    // `ord` is right compared to left
    fn test_inverted(self, ord: Ordering) -> bool {
        match self {
            Relation::Gt => ord != Ordering::Greater,
            Relation::Ge => ord == Ordering::Less,
            Relation::Lt => ord != Ordering::Less,
            Relation::Le => ord == Ordering::Greater,
        }
    }
}

/// Natural ordering of values that carry one: booleans, enum constants and
/// comparable host objects. `None` when `value` has no ordering at all.
fn natural_order(value: &Value, other: &Value) -> Option<Option<Ordering>> {
    match value {
        Value::Boolean(a) => Some(match other {
            Value::Boolean(b) => Some(a.cmp(b)),
            _ => None,
        }),
        Value::Enum(a) => Some(match other {
            Value::Enum(b) if a.type_name == b.type_name => Some(a.ordinal.cmp(&b.ordinal)),
            _ => None,
        }),
        Value::Object(obj) => obj.as_comparable().map(|c| c.compare_to(other)),
        _ => None,
    }
}

fn compare(
    ctx: &dyn ElEvalContext,
    rel: Relation,
    lt: TypeRank,
    l: &Value,
    rt: TypeRank,
    r: &Value,
) -> EvaluationResult<bool> {
    let lt = lt.or_resolve(l);
    let rt = rt.or_resolve(r);

    if is_big_decimal(lt, rt) {
        let a = to_big_decimal(ctx, lt, l)?;
        let b = to_big_decimal(ctx, rt, r)?;
        return Ok(rel.test(a.cmp(&b)));
    }
    if lt.is_float_or_double() || rt.is_float_or_double() {
        return Ok(rel.test_double(to_double(ctx, lt, l)?, to_double(ctx, rt, r)?));
    }
    if is_big_integer(lt, rt) {
        let a = to_big_integer(ctx, lt, l)?;
        let b = to_big_integer(ctx, rt, r)?;
        return Ok(rel.test(a.cmp(&b)));
    }
    if lt.is_numeric() || rt.is_numeric() {
        return Ok(rel.test(to_long(ctx, lt, l)?.cmp(&to_long(ctx, rt, r)?)));
    }
    if lt == TypeRank::STRING || rt == TypeRank::STRING {
        let a = to_string(ctx, lt, l);
        let b = to_string(ctx, rt, r);
        return Ok(rel.test_text(a.cmp(&b)));
    }

    let not_comparable = || -> EvaluationResult<bool> {
        Err(EvaluationError::ValuesNotComparable {
            message: ctx.message(VALUES_NOT_COMPARABLE, &[l, r]),
        }
        .into())
    };
    match natural_order(l, r) {
        Some(Some(ord)) => return Ok(rel.test(ord)),
        Some(None) => return not_comparable(),
        None => {}
    }
    match natural_order(r, l) {
        Some(Some(ord)) => Ok(rel.test_inverted(ord)),
        _ => not_comparable(),
    }
}

/// `>`
pub fn gt(ctx: &dyn ElEvalContext, lt: TypeRank, l: &Value, rt: TypeRank, r: &Value) -> EvaluationResult<bool> {
    compare(ctx, Relation::Gt, lt, l, rt, r)
}

/// `>=`
pub fn ge(ctx: &dyn ElEvalContext, lt: TypeRank, l: &Value, rt: TypeRank, r: &Value) -> EvaluationResult<bool> {
    compare(ctx, Relation::Ge, lt, l, rt, r)
}

/// `<`
pub fn lt(ctx: &dyn ElEvalContext, lt: TypeRank, l: &Value, rt: TypeRank, r: &Value) -> EvaluationResult<bool> {
    compare(ctx, Relation::Lt, lt, l, rt, r)
}

/// `<=`
pub fn le(ctx: &dyn ElEvalContext, lt: TypeRank, l: &Value, rt: TypeRank, r: &Value) -> EvaluationResult<bool> {
    compare(ctx, Relation::Le, lt, l, rt, r)
}

/// Unary `-`
///
/// Int, long, float and double keep their width; byte and short widen to int.
pub fn minus(ctx: &dyn ElEvalContext, rank: TypeRank, value: &Value) -> EvaluationResult<Value> {
    if value.is_null() {
        return Ok(Value::Long(0));
    }
    let rank = rank.or_resolve(value);

    match value {
        Value::BigDecimal(d) if rank == TypeRank::BIG_DECIMAL => return Ok(Value::BigDecimal(-d.clone())),
        Value::BigInteger(b) if rank == TypeRank::BIG_INTEGER => return Ok(Value::BigInteger(-b)),
        _ => {}
    }

    if rank == TypeRank::STRING {
        return if is_dot_ee(value) {
            Ok(Value::Double(-to_double(ctx, rank, value)?))
        } else {
            Ok(Value::Long(to_long(ctx, rank, value)?.wrapping_neg()))
        };
    }

    if rank.is_signed() {
        let negated = match value {
            Value::Int(v) => Some(Value::Int(v.wrapping_neg())),
            Value::Long(v) => Some(Value::Long(v.wrapping_neg())),
            Value::Double(v) => Some(Value::Double(-v)),
            Value::Float(v) => Some(Value::Float(-v)),
            Value::Short(v) => Some(Value::Int(-i32::from(*v))),
            Value::Byte(v) => Some(Value::Int(-i32::from(*v))),
            _ => None,
        };
        if let Some(negated) = negated {
            return Ok(negated);
        }
    }

    Err(EvaluationError::CannotApplyMinus {
        message: ctx.message(CANNOT_APPLY_MINUS, &[value]),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::DefaultEvalContext;
    use std::str::FromStr;

    const U: TypeRank = TypeRank::UNKNOWN;

    fn dec(s: &str) -> Value {
        Value::BigDecimal(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn test_add_null_null_is_long_zero() {
        let ctx = DefaultEvalContext::new();
        assert_eq!(add(&ctx, U, &Value::Null, U, &Value::Null).unwrap(), Value::Long(0));
    }

    #[test]
    fn test_add_promotions() {
        let ctx = DefaultEvalContext::new();
        assert_eq!(add(&ctx, U, &Value::Int(1), U, &Value::Int(2)).unwrap(), Value::Long(3));
        assert_eq!(add(&ctx, U, &Value::Int(1), U, &Value::from("2.5")).unwrap(), Value::Double(3.5));
        assert_eq!(add(&ctx, U, &Value::from("a"), U, &Value::from("b")).unwrap(), Value::from("ab"));
        assert_eq!(add(&ctx, U, &dec("1.1"), U, &Value::Int(2)).unwrap(), dec("3.1"));
        assert_eq!(add(&ctx, U, &Value::Null, U, &Value::from("x")).unwrap(), Value::from("x"));
    }

    #[test]
    fn test_static_rank_wins_over_runtime_value() {
        let ctx = DefaultEvalContext::new();
        let result = add(&ctx, TypeRank::BIG_DECIMAL, &Value::Int(1), U, &Value::Int(1)).unwrap();
        assert_eq!(result, dec("2"));
    }

    #[test]
    fn test_div_and_mod() {
        let ctx = DefaultEvalContext::new();
        assert_eq!(div(&ctx, U, &Value::Int(5), U, &Value::Int(2)).unwrap(), Value::Double(2.5));
        assert_eq!(div(&ctx, U, &dec("5"), U, &dec("2")).unwrap(), dec("3"));
        assert_eq!(div(&ctx, U, &dec("1.00"), U, &dec("3")).unwrap(), dec("0.33"));
        assert_eq!(modulo(&ctx, U, &Value::Int(7), U, &Value::Int(3)).unwrap(), Value::Long(1));
        assert_eq!(modulo(&ctx, U, &Value::Double(7.5), U, &Value::Int(2)).unwrap(), Value::Double(1.5));
        assert!(modulo(&ctx, U, &Value::Int(7), U, &Value::Int(0)).is_err());
        assert!(div(&ctx, U, &dec("1"), U, &dec("0")).is_err());
        assert!(matches!(
            div(&ctx, U, &Value::Int(1), U, &Value::Int(0)).unwrap(),
            Value::Double(v) if v.is_infinite()
        ));
    }

    #[test]
    fn test_decimal_division_rounds_half_up_at_dividend_scale() {
        let ctx = DefaultEvalContext::new();
        assert_eq!(div(&ctx, U, &dec("2.5"), U, &dec("2")).unwrap(), dec("1.3"));
        assert_eq!(div(&ctx, U, &dec("-2.5"), U, &dec("2")).unwrap(), dec("-1.3"));
        assert_eq!(div(&ctx, U, &dec("2.4"), U, &dec("-2")).unwrap(), dec("-1.2"));
        assert_eq!(div(&ctx, U, &dec("10"), U, &dec("0.3")).unwrap(), dec("33"));
        // negative scale is kept, so 500 rounds to the nearest thousand
        assert_eq!(div(&ctx, U, &dec("1E+3"), U, &dec("2")).unwrap(), dec("1E+3"));
    }

    #[test]
    fn test_decimal_arithmetic_is_unbounded() {
        let ctx = DefaultEvalContext::new();
        let big = Value::BigInteger(BigInt::from(10).pow(30));
        assert_eq!(
            add(&ctx, U, &big, U, &Value::Double(1.5)).unwrap(),
            dec("1000000000000000000000000000001.5")
        );
        assert_eq!(mul(&ctx, U, &dec("1e20"), U, &dec("1e20")).unwrap(), dec("1e40"));
        assert_eq!(minus(&ctx, U, &dec("1e40")).unwrap(), dec("-1e40"));
    }

    #[test]
    fn test_long_arithmetic_wraps() {
        let ctx = DefaultEvalContext::new();
        assert_eq!(
            add(&ctx, U, &Value::Long(i64::MAX), U, &Value::Long(1)).unwrap(),
            Value::Long(i64::MIN)
        );
    }

    #[test]
    fn test_eq_cascade() {
        let ctx = DefaultEvalContext::new();
        assert!(eq(&ctx, U, &Value::Int(1), U, &Value::Long(1)).unwrap());
        assert!(eq(&ctx, U, &Value::Int(1), U, &Value::Double(1.0)).unwrap());
        assert!(eq(&ctx, U, &Value::from("1"), U, &Value::Int(1)).unwrap());
        assert!(eq(&ctx, U, &Value::Boolean(true), U, &Value::from("true")).unwrap());
        assert!(eq(&ctx, U, &dec("2.0"), U, &dec("2.0")).unwrap());
        assert!(!eq(&ctx, U, &dec("2.0"), U, &dec("2.00")).unwrap());
    }

    #[test]
    fn test_relational_cascade() {
        let ctx = DefaultEvalContext::new();
        assert!(lt(&ctx, U, &Value::from("abc"), U, &Value::from("abd")).unwrap());
        assert!(gt(&ctx, U, &dec("1.5"), U, &Value::Int(1)).unwrap());
        assert!(ge(&ctx, U, &Value::Int(2), U, &Value::Long(2)).unwrap());
        assert!(!le(&ctx, U, &Value::from("a"), U, &Value::from("a")).unwrap());
        assert!(gt(&ctx, U, &Value::Boolean(true), U, &Value::Boolean(false)).unwrap());
        let err = lt(&ctx, U, &Value::from(Vec::<Value>::new()), U, &Value::from(Vec::<Value>::new())).unwrap_err();
        assert_eq!(err.to_string(), "Values [] and [] are not comparable");
    }

    #[test]
    fn test_minus() {
        let ctx = DefaultEvalContext::new();
        assert_eq!(minus(&ctx, U, &Value::Null).unwrap(), Value::Long(0));
        assert_eq!(minus(&ctx, U, &Value::Short(3)).unwrap(), Value::Int(-3));
        assert_eq!(minus(&ctx, U, &Value::from("1.5")).unwrap(), Value::Double(-1.5));
        assert_eq!(minus(&ctx, U, &Value::from("2")).unwrap(), Value::Long(-2));
        assert!(matches!(
            minus(&ctx, U, &Value::Boolean(true)).unwrap_err().as_evaluation(),
            Some(EvaluationError::CannotApplyMinus { .. })
        ));
        assert!(minus(&ctx, U, &Value::Char('a')).is_err());
    }
}

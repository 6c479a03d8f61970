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

//! Conversion of values to a target class
//!
//! This is the conversion service behind [`ElEvalContext::convert`]. The
//! coercion helpers in the evaluator handle the common numeric cases inline
//! and fall back here for everything else.
//!
//! [`ElEvalContext::convert`]: crate::evaluator::ElEvalContext::convert

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Float, FromPrimitive, ToPrimitive, Zero};

use super::types::ElClass;
use super::value::Value;

/// Result type for type coercion operations
pub type CoercionResult<T> = Result<T, CoercionError>;

/// Errors that can occur during type coercion
#[derive(Debug, Clone, PartialEq)]
pub enum CoercionError {
    /// Cannot coerce between the specified types
    IncompatibleTypes {
        /// Source class
        from: String,
        /// Target class
        to: String,
    },
    /// The text cannot be parsed as the target type
    InvalidFormat {
        /// Offending text
        value: String,
        /// Target class
        target_type: String,
    },
    /// The number does not fit the target width
    Overflow {
        /// Offending value
        value: String,
        /// Target class
        target_type: String,
    },
}

impl std::fmt::Display for CoercionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoercionError::IncompatibleTypes { from, to } => {
                write!(f, "Cannot coerce from {from} to {to}")
            }
            CoercionError::InvalidFormat { value, target_type } => {
                write!(f, "Invalid format '{value}' for type {target_type}")
            }
            CoercionError::Overflow { value, target_type } => {
                write!(f, "Value {value} is out of range for type {target_type}")
            }
        }
    }
}

impl std::error::Error for CoercionError {}

/// Type coercion utility for expression values
pub struct TypeCoercion;

impl TypeCoercion {
    /// Coerce a value to the given class; null passes through unchanged
    pub fn coerce_to(value: &Value, target: &ElClass) -> CoercionResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match target {
            ElClass::Boolean | ElClass::BoxedBoolean => Self::coerce_to_boolean(value),
            ElClass::Char | ElClass::BoxedChar => Self::coerce_to_char(value),
            ElClass::Byte | ElClass::BoxedByte => {
                Self::coerce_to_integral(value, target, i64::from(i8::MIN), i64::from(i8::MAX))
                    .map(|v| Value::Byte(v as i8))
            }
            ElClass::Short | ElClass::BoxedShort => {
                Self::coerce_to_integral(value, target, i64::from(i16::MIN), i64::from(i16::MAX))
                    .map(|v| Value::Short(v as i16))
            }
            ElClass::Int | ElClass::BoxedInt => {
                Self::coerce_to_integral(value, target, i64::from(i32::MIN), i64::from(i32::MAX))
                    .map(|v| Value::Int(v as i32))
            }
            ElClass::Long | ElClass::BoxedLong => {
                Self::coerce_to_integral(value, target, i64::MIN, i64::MAX).map(Value::Long)
            }
            ElClass::Float | ElClass::BoxedFloat => {
                Self::coerce_to_floating(value, target).map(|v| Value::Float(v as f32))
            }
            ElClass::Double | ElClass::BoxedDouble => {
                Self::coerce_to_floating(value, target).map(Value::Double)
            }
            ElClass::BigInteger => Self::coerce_to_big_integer(value).map(Value::BigInteger),
            ElClass::BigDecimal => Self::coerce_to_big_decimal(value).map(Value::BigDecimal),
            ElClass::String => Ok(Value::from(value.to_string())),
            ElClass::Object => Ok(value.clone()),
            ElClass::Map | ElClass::List | ElClass::Enum(_) | ElClass::Named(_) => {
                if &value.class() == target {
                    Ok(value.clone())
                } else {
                    Err(Self::incompatible(value, target))
                }
            }
        }
    }

    /// Check if a value can be coerced to the given class
    pub fn can_coerce_to(value: &Value, target: &ElClass) -> bool {
        Self::coerce_to(value, target).is_ok()
    }

    /// Coerce to a boolean
    pub fn coerce_to_boolean(value: &Value) -> CoercionResult<Value> {
        match value {
            Value::Boolean(_) => Ok(value.clone()),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Ok(Value::Boolean(true)),
                "false" | "f" | "no" | "n" | "0" | "" => Ok(Value::Boolean(false)),
                _ => Err(CoercionError::InvalidFormat {
                    value: s.to_string(),
                    target_type: ElClass::BoxedBoolean.to_string(),
                }),
            },
            other => match other.long_value() {
                Some(v) => Ok(Value::Boolean(v != 0)),
                None => Err(Self::incompatible(other, &ElClass::BoxedBoolean)),
            },
        }
    }

    /// Coerce to a single character
    pub fn coerce_to_char(value: &Value) -> CoercionResult<Value> {
        match value {
            Value::Char(_) => Ok(value.clone()),
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(CoercionError::InvalidFormat {
                        value: s.to_string(),
                        target_type: ElClass::BoxedChar.to_string(),
                    }),
                }
            }
            Value::Byte(_) | Value::Short(_) | Value::Int(_) | Value::Long(_) => value
                .long_value()
                .and_then(|v| u32::try_from(v).ok())
                .and_then(char::from_u32)
                .map(Value::Char)
                .ok_or_else(|| CoercionError::Overflow {
                    value: value.to_string(),
                    target_type: ElClass::BoxedChar.to_string(),
                }),
            other => Err(Self::incompatible(other, &ElClass::BoxedChar)),
        }
    }

    fn coerce_to_integral(
        value: &Value,
        target: &ElClass,
        min: i64,
        max: i64,
    ) -> CoercionResult<i64> {
        let wide: i128 = match value {
            Value::String(s) => {
                let text = s.trim();
                if text.is_empty() {
                    0
                } else {
                    text.parse::<i128>()
                        .map_err(|_| CoercionError::InvalidFormat {
                            value: s.to_string(),
                            target_type: target.to_string(),
                        })?
                }
            }
            Value::BigInteger(b) => b.to_i128().ok_or_else(|| Self::overflow(value, target))?,
            Value::BigDecimal(d) => Self::truncate_decimal(d)
                .to_i128()
                .ok_or_else(|| Self::overflow(value, target))?,
            Value::Float(_) | Value::Double(_) => {
                let v = value.double_value().unwrap_or(f64::NAN);
                if !v.is_finite() {
                    return Err(Self::overflow(value, target));
                }
                v.trunc() as i128
            }
            Value::Boolean(b) => i128::from(*b),
            Value::Null | Value::Enum(_) | Value::List(_) | Value::Map(_) | Value::Object(_) => {
                return Err(Self::incompatible(value, target));
            }
            other => i128::from(other.long_value().ok_or_else(|| Self::incompatible(other, target))?),
        };
        if wide < i128::from(min) || wide > i128::from(max) {
            return Err(Self::overflow(value, target));
        }
        Ok(wide as i64)
    }

    fn coerce_to_floating(value: &Value, target: &ElClass) -> CoercionResult<f64> {
        match value {
            Value::String(s) => {
                let text = s.trim();
                if text.is_empty() {
                    return Ok(0.0);
                }
                text.parse::<f64>().map_err(|_| CoercionError::InvalidFormat {
                    value: s.to_string(),
                    target_type: target.to_string(),
                })
            }
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Char(c) => c
                .to_digit(10)
                .map(f64::from)
                .ok_or_else(|| CoercionError::InvalidFormat {
                    value: c.to_string(),
                    target_type: target.to_string(),
                }),
            other => other
                .double_value()
                .ok_or_else(|| Self::incompatible(other, target)),
        }
    }

    /// Coerce to an arbitrary precision integer
    pub fn coerce_to_big_integer(value: &Value) -> CoercionResult<BigInt> {
        let target = ElClass::BigInteger;
        match value {
            Value::BigInteger(b) => Ok(b.clone()),
            Value::String(s) => {
                let text = s.trim();
                if text.is_empty() {
                    return Ok(BigInt::from(0));
                }
                BigInt::from_str(text).map_err(|_| CoercionError::InvalidFormat {
                    value: s.to_string(),
                    target_type: target.to_string(),
                })
            }
            Value::BigDecimal(d) => Ok(Self::truncate_decimal(d)),
            Value::Float(_) | Value::Double(_) => value
                .double_value()
                .and_then(|v| BigInt::from_f64(v.trunc()))
                .ok_or_else(|| Self::overflow(value, &target)),
            Value::Boolean(b) => Ok(BigInt::from(u8::from(*b))),
            other => other
                .long_value()
                .map(BigInt::from)
                .ok_or_else(|| Self::incompatible(other, &target)),
        }
    }

    /// Coerce to a decimal
    pub fn coerce_to_big_decimal(value: &Value) -> CoercionResult<BigDecimal> {
        let target = ElClass::BigDecimal;
        match value {
            Value::BigDecimal(d) => Ok(d.clone()),
            Value::String(s) => {
                let text = s.trim();
                if text.is_empty() {
                    return Ok(BigDecimal::zero());
                }
                Self::parse_decimal(text).ok_or_else(|| CoercionError::InvalidFormat {
                    value: s.to_string(),
                    target_type: target.to_string(),
                })
            }
            Value::BigInteger(b) => Ok(BigDecimal::new(b.clone(), 0)),
            Value::Float(_) | Value::Double(_) => value
                .double_value()
                .and_then(Self::exact_decimal)
                .ok_or_else(|| Self::overflow(value, &target)),
            Value::Boolean(b) => Ok(BigDecimal::from(i64::from(*b))),
            other => other
                .long_value()
                .map(BigDecimal::from)
                .ok_or_else(|| Self::incompatible(other, &target)),
        }
    }

    /// Parse decimal text, accepting exponent notation
    pub fn parse_decimal(text: &str) -> Option<BigDecimal> {
        BigDecimal::from_str(text.trim()).ok()
    }

    /// Decimal holding the exact binary value of a float
    ///
    /// The scale is the smallest non-negative one that represents the value,
    /// so `0.5` has scale 1 and `100.0` has scale 0. Non-finite input has no
    /// decimal form.
    pub fn exact_decimal(v: f64) -> Option<BigDecimal> {
        if !v.is_finite() {
            return None;
        }
        let (mantissa, exponent, sign) = Float::integer_decode(v);
        let mut digits = BigInt::from(mantissa) * i64::from(sign);
        if exponent >= 0 {
            return Some(BigDecimal::new(digits << usize::from(exponent.unsigned_abs()), 0));
        }
        // m / 2^k == m * 5^k / 10^k
        let mut scale = i64::from(exponent.unsigned_abs());
        digits *= num_traits::pow(BigInt::from(5), usize::from(exponent.unsigned_abs()));
        let ten = BigInt::from(10);
        while scale > 0 && (&digits % &ten).is_zero() {
            digits /= &ten;
            scale -= 1;
        }
        Some(BigDecimal::new(digits, scale))
    }

    /// Whole part of a decimal, truncated toward zero
    pub fn truncate_decimal(d: &BigDecimal) -> BigInt {
        let (digits, _) = d.with_scale(0).into_bigint_and_exponent();
        digits
    }

    /// Number of digits after the decimal point; negative for scaled-up integers
    pub fn decimal_scale(d: &BigDecimal) -> i64 {
        let (_, scale) = d.as_bigint_and_exponent();
        scale
    }

    fn incompatible(value: &Value, target: &ElClass) -> CoercionError {
        CoercionError::IncompatibleTypes {
            from: value.class().to_string(),
            to: target.to_string(),
        }
    }

    fn overflow(value: &Value, target: &ElClass) -> CoercionError {
        CoercionError::Overflow {
            value: value.to_string(),
            target_type: target.to_string(),
        }
    }
}

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

//! Core value type for expression evaluation

use std::fmt;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;

use super::object::ElObject;
use super::type_coercion::TypeCoercion;
use super::types::ElClass;

/// Insertion-ordered map value
pub type ValueMap = IndexMap<String, Value>;

/// Runtime value produced and consumed by expressions
///
/// Numeric variants mirror the widths the rank table distinguishes, so that
/// promotion can pick the exact result width. Heap variants are reference
/// counted, which makes cloning cheap and gives them an identity.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,

    /// Boolean value
    Boolean(bool),

    /// Single character
    Char(char),

    /// 8-bit signed integer
    Byte(i8),

    /// 16-bit signed integer
    Short(i16),

    /// 32-bit signed integer
    Int(i32),

    /// 64-bit signed integer
    Long(i64),

    /// 32-bit float
    Float(f32),

    /// 64-bit float
    Double(f64),

    /// Arbitrary precision integer
    BigInteger(BigInt),

    /// Decimal number with scale
    BigDecimal(BigDecimal),

    /// String value
    String(Arc<str>),

    /// Enumeration constant
    Enum(EnumValue),

    /// Ordered list
    List(Arc<Vec<Value>>),

    /// Map keyed by property name
    Map(Arc<ValueMap>),

    /// Host object
    Object(Arc<dyn ElObject>),
}

/// Constant of a named enumeration
#[derive(Clone, Debug)]
pub struct EnumValue {
    /// Enumeration type name
    pub type_name: Arc<str>,
    /// Constant name
    pub name: Arc<str>,
    /// Declaration index, used for ordering
    pub ordinal: u32,
}

impl EnumValue {
    /// Create an enumeration constant
    pub fn new(type_name: impl Into<Arc<str>>, name: impl Into<Arc<str>>, ordinal: u32) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            ordinal,
        }
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.name == other.name
    }
}

impl Eq for EnumValue {}

impl Value {
    /// Wrap a host object
    pub fn object(obj: impl ElObject + 'static) -> Self {
        Self::Object(Arc::new(obj))
    }

    /// Create a string value
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::String(s.into())
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the string content
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Runtime class of this value
    pub fn class(&self) -> ElClass {
        ElClass::of_value(self)
    }

    /// Downcast a host object to its concrete type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Object(obj) => obj.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Reference identity
    ///
    /// Null is identical to null, booleans and enum constants are interned and
    /// compare by value, heap values compare by pointer. Numbers are never
    /// identical because each one is a fresh box.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::String(a), Self::String(b)) => Arc::ptr_eq(a, b),
            (Self::List(a), Self::List(b)) => Arc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }

    /// Narrow to a 64-bit integer the way a numeric box would
    ///
    /// Big integers keep their low 64 bits, fractional values truncate toward
    /// zero, floats saturate. Non-numbers return `None`.
    pub fn long_value(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            Self::Double(v) => Some(*v as i64),
            Self::Char(c) => Some(i64::from(u32::from(*c))),
            Self::BigInteger(b) => Some(low_bits(b)),
            Self::BigDecimal(d) => Some(low_bits(&TypeCoercion::truncate_decimal(d))),
            _ => None,
        }
    }

    /// Widen to a 64-bit float; non-numbers return `None`
    pub fn double_value(&self) -> Option<f64> {
        match self {
            Self::Byte(v) => Some(f64::from(*v)),
            Self::Short(v) => Some(f64::from(*v)),
            Self::Int(v) => Some(f64::from(*v)),
            Self::Long(v) => Some(*v as f64),
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            Self::Char(c) => Some(f64::from(u32::from(*c))),
            Self::BigInteger(b) => b.to_f64(),
            Self::BigDecimal(d) => d.to_f64(),
            _ => None,
        }
    }
}

fn low_bits(b: &BigInt) -> i64 {
    let (sign, digits) = b.to_u64_digits();
    let low = digits.first().copied().unwrap_or(0) as i64;
    if sign == Sign::Minus {
        low.wrapping_neg()
    } else {
        low
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::BigInteger(a), Self::BigInteger(b)) => a == b,
            // scale is part of decimal identity: 2.0 != 2.00
            (Self::BigDecimal(a), Self::BigDecimal(b)) => {
                a == b && TypeCoercion::decimal_scale(a) == TypeCoercion::decimal_scale(b)
            }
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), _) => self.is_same(other) || a.equals_value(other),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&format_float(f64::from(*v), v.to_string())),
            Self::Double(v) => f.write_str(&format_float(*v, v.to_string())),
            Self::BigInteger(v) => write!(f, "{v}"),
            Self::BigDecimal(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
            Self::Enum(e) => f.write_str(&e.name),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
            Self::Object(obj) => f.write_str(&obj.to_el_string()),
        }
    }
}

/// Render a float the way boxed floating point numbers print: whole numbers
/// keep a trailing `.0`, very large or small magnitudes use `E` notation.
///
/// `shortest` is the shortest round-trip text of the value at its own width.
fn format_float(v: f64, shortest: String) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = v.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        if shortest.contains('.') {
            shortest
        } else {
            format!("{shortest}.0")
        }
    } else {
        let sci = format!("{:e}", shortest.parse::<f64>().unwrap_or(v));
        match sci.split_once('e') {
            Some((mantissa, exponent)) if mantissa.contains('.') => format!("{mantissa}E{exponent}"),
            Some((mantissa, exponent)) => format!("{mantissa}.0E{exponent}"),
            None => sci,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Self::Byte(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::Short(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Self {
        Self::BigInteger(v)
    }
}

impl From<BigDecimal> for Value {
    fn from(v: BigDecimal) -> Self {
        Self::BigDecimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(Arc::from(v))
    }
}

impl From<EnumValue> for Value {
    fn from(v: EnumValue) -> Self {
        Self::Enum(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(Arc::new(v))
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Self::Map(Arc::new(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Long(i)
                } else if let Some(u) = n.as_u64() {
                    Self::BigInteger(BigInt::from(u))
                } else {
                    Self::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::from(s),
            serde_json::Value::Array(items) => {
                Self::from(items.into_iter().map(Value::from).collect::<Vec<_>>())
            }
            serde_json::Value::Object(fields) => Self::from(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect::<ValueMap>(),
            ),
        }
    }
}

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

//! Static classes and the type-rank table driving numeric promotion

use std::fmt;
use std::sync::Arc;

use super::value::Value;

/// Class of an expression value, either declared statically or observed at runtime
///
/// Primitive and boxed variants are kept apart because the rank table
/// distinguishes them. Runtime values always classify as the boxed variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElClass {
    /// Top type, statically unknown
    Object,
    /// Primitive boolean
    Boolean,
    /// Boxed boolean
    BoxedBoolean,
    /// Primitive character
    Char,
    /// Boxed character
    BoxedChar,
    /// Primitive 8-bit integer
    Byte,
    /// Boxed 8-bit integer
    BoxedByte,
    /// Primitive 16-bit integer
    Short,
    /// Boxed 16-bit integer
    BoxedShort,
    /// Primitive 32-bit integer
    Int,
    /// Boxed 32-bit integer
    BoxedInt,
    /// Primitive 64-bit integer
    Long,
    /// Boxed 64-bit integer
    BoxedLong,
    /// Primitive 32-bit float
    Float,
    /// Boxed 32-bit float
    BoxedFloat,
    /// Primitive 64-bit float
    Double,
    /// Boxed 64-bit float
    BoxedDouble,
    /// Arbitrary precision integer
    BigInteger,
    /// Decimal number
    BigDecimal,
    /// Character string
    String,
    /// Map-like container
    Map,
    /// Ordered list
    List,
    /// Enumeration type with the given name
    Enum(Arc<str>),
    /// Host object class with the given name
    Named(Arc<str>),
}

impl ElClass {
    /// Create a host object class
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::Named(name.into())
    }

    /// Create an enumeration class
    pub fn enumeration(name: impl Into<Arc<str>>) -> Self {
        Self::Enum(name.into())
    }

    /// Runtime class of a value
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Object,
            Value::Boolean(_) => Self::BoxedBoolean,
            Value::Char(_) => Self::BoxedChar,
            Value::Byte(_) => Self::BoxedByte,
            Value::Short(_) => Self::BoxedShort,
            Value::Int(_) => Self::BoxedInt,
            Value::Long(_) => Self::BoxedLong,
            Value::Float(_) => Self::BoxedFloat,
            Value::Double(_) => Self::BoxedDouble,
            Value::BigInteger(_) => Self::BigInteger,
            Value::BigDecimal(_) => Self::BigDecimal,
            Value::String(_) => Self::String,
            Value::Enum(e) => Self::Enum(e.type_name.clone()),
            Value::List(_) => Self::List,
            Value::Map(_) => Self::Map,
            Value::Object(obj) => obj.class(),
        }
    }

    /// Check if this is an enumeration class
    pub fn is_enum(&self) -> bool {
        matches!(self, Self::Enum(_))
    }

    /// Human readable class name
    pub fn name(&self) -> &str {
        match self {
            Self::Object => "object",
            Self::Boolean => "boolean",
            Self::BoxedBoolean => "boxed boolean",
            Self::Char => "char",
            Self::BoxedChar => "boxed char",
            Self::Byte => "byte",
            Self::BoxedByte => "boxed byte",
            Self::Short => "short",
            Self::BoxedShort => "boxed short",
            Self::Int => "int",
            Self::BoxedInt => "boxed int",
            Self::Long => "long",
            Self::BoxedLong => "boxed long",
            Self::Float => "float",
            Self::BoxedFloat => "boxed float",
            Self::Double => "double",
            Self::BoxedDouble => "boxed double",
            Self::BigInteger => "big integer",
            Self::BigDecimal => "big decimal",
            Self::String => "string",
            Self::Map => "map",
            Self::List => "list",
            Self::Enum(name) | Self::Named(name) => name,
        }
    }
}

impl fmt::Display for ElClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Integer classification of a class, compared numerically to pick a promotion target
///
/// The relative order and the thresholds are load-bearing: every coercion
/// decision is a comparison against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeRank(i16);

impl TypeRank {
    /// Not known statically, classify the runtime value instead
    pub const UNKNOWN: Self = Self(-1);
    /// Any non-numeric object
    pub const OBJECT: Self = Self(0);
    /// Enumeration constant
    pub const ENUM: Self = Self(1);
    /// String
    pub const STRING: Self = Self(2);
    /// Primitive boolean
    pub const BOOLEAN: Self = Self(10);
    /// Boxed boolean
    pub const BOXED_BOOLEAN: Self = Self(11);
    /// Primitive character
    pub const CHAR: Self = Self(30);
    /// Boxed character
    pub const BOXED_CHAR: Self = Self(31);
    /// Primitive byte
    pub const BYTE: Self = Self(40);
    /// Boxed byte
    pub const BOXED_BYTE: Self = Self(41);
    /// Primitive short
    pub const SHORT: Self = Self(50);
    /// Boxed short
    pub const BOXED_SHORT: Self = Self(51);
    /// Primitive int
    pub const INT: Self = Self(52);
    /// Boxed int
    pub const BOXED_INT: Self = Self(53);
    /// Primitive long
    pub const LONG: Self = Self(54);
    /// Boxed long
    pub const BOXED_LONG: Self = Self(55);
    /// Primitive float
    pub const FLOAT: Self = Self(60);
    /// Boxed float
    pub const BOXED_FLOAT: Self = Self(61);
    /// Primitive double
    pub const DOUBLE: Self = Self(62);
    /// Boxed double
    pub const BOXED_DOUBLE: Self = Self(63);
    /// Arbitrary precision integer
    pub const BIG_INTEGER: Self = Self(70);
    /// Decimal
    pub const BIG_DECIMAL: Self = Self(71);

    /// Ranks above this are numeric
    pub const NUMERIC_THRESHOLD: Self = Self(29);
    /// Ranks above this can be negated keeping their width
    pub const SIGNED_THRESHOLD: Self = Self(39);
    /// Ranks above this widen directly to 64-bit integers and doubles
    pub const NUMBER_THRESHOLD: Self = Self(49);
    /// Ranks above this are big numbers
    pub const BIG_NUMBER_THRESHOLD: Self = Self(69);

    /// Raw rank value
    pub const fn value(self) -> i16 {
        self.0
    }

    /// Rank of a statically resolved class; `None` and the top type are unknown
    pub fn of_class(class: Option<&ElClass>) -> Self {
        let Some(class) = class else {
            return Self::UNKNOWN;
        };
        match class {
            ElClass::Object => Self::UNKNOWN,
            ElClass::Boolean => Self::BOOLEAN,
            ElClass::BoxedBoolean => Self::BOXED_BOOLEAN,
            ElClass::Char => Self::CHAR,
            ElClass::BoxedChar => Self::BOXED_CHAR,
            ElClass::Byte => Self::BYTE,
            ElClass::BoxedByte => Self::BOXED_BYTE,
            ElClass::Short => Self::SHORT,
            ElClass::BoxedShort => Self::BOXED_SHORT,
            ElClass::Int => Self::INT,
            ElClass::BoxedInt => Self::BOXED_INT,
            ElClass::Long => Self::LONG,
            ElClass::BoxedLong => Self::BOXED_LONG,
            ElClass::Float => Self::FLOAT,
            ElClass::BoxedFloat => Self::BOXED_FLOAT,
            ElClass::Double => Self::DOUBLE,
            ElClass::BoxedDouble => Self::BOXED_DOUBLE,
            ElClass::BigInteger => Self::BIG_INTEGER,
            ElClass::BigDecimal => Self::BIG_DECIMAL,
            ElClass::String => Self::STRING,
            ElClass::Enum(_) => Self::ENUM,
            ElClass::Map | ElClass::List | ElClass::Named(_) => Self::OBJECT,
        }
    }

    /// Rank of a runtime value
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Boolean(_) => Self::BOXED_BOOLEAN,
            Value::Char(_) => Self::BOXED_CHAR,
            Value::Byte(_) => Self::BOXED_BYTE,
            Value::Short(_) => Self::BOXED_SHORT,
            Value::Int(_) => Self::BOXED_INT,
            Value::Long(_) => Self::BOXED_LONG,
            Value::Float(_) => Self::BOXED_FLOAT,
            Value::Double(_) => Self::BOXED_DOUBLE,
            Value::BigInteger(_) => Self::BIG_INTEGER,
            Value::BigDecimal(_) => Self::BIG_DECIMAL,
            Value::String(_) => Self::STRING,
            Value::Enum(_) => Self::ENUM,
            Value::Null | Value::List(_) | Value::Map(_) | Value::Object(_) => Self::OBJECT,
        }
    }

    /// Keep a known rank, otherwise classify the runtime value
    #[inline]
    pub fn or_resolve(self, value: &Value) -> Self {
        if self == Self::UNKNOWN {
            Self::of_value(value)
        } else {
            self
        }
    }

    /// Check if the rank is unknown
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }

    /// Numeric zone: chars, integers, floats and big numbers
    pub fn is_numeric(self) -> bool {
        self > Self::NUMERIC_THRESHOLD
    }

    /// Numbers whose negation keeps their width
    pub fn is_signed(self) -> bool {
        self > Self::SIGNED_THRESHOLD
    }

    /// Numbers that widen directly to 64-bit integers and doubles
    pub fn is_number(self) -> bool {
        self > Self::NUMBER_THRESHOLD
    }

    /// Big integer or decimal
    pub fn is_big(self) -> bool {
        self > Self::BIG_NUMBER_THRESHOLD
    }

    /// Primitive or boxed boolean
    pub fn is_boolean(self) -> bool {
        self == Self::BOOLEAN || self == Self::BOXED_BOOLEAN
    }

    /// Primitive or boxed float or double
    pub fn is_float_or_double(self) -> bool {
        matches!(
            self,
            Self::FLOAT | Self::BOXED_FLOAT | Self::DOUBLE | Self::BOXED_DOUBLE
        )
    }

    /// Primitive or boxed long
    pub fn is_long(self) -> bool {
        self == Self::LONG || self == Self::BOXED_LONG
    }

    /// Primitive or boxed double
    pub fn is_double(self) -> bool {
        self == Self::DOUBLE || self == Self::BOXED_DOUBLE
    }
}

impl fmt::Display for TypeRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

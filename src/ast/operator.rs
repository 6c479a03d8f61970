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

//! Operator definitions and their evaluation contracts

use std::fmt;

use super::expression::ExpressionNode;
use crate::evaluator::operations;
use crate::evaluator::{ElError, ElEvalContext, EvaluationResult};
use crate::model::{ElClass, TypeRank, Value};

/// Binary operators of the expression language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic operators
    /// Addition or string concatenation (+)
    Add,
    /// Subtraction (-)
    Subtract,
    /// Multiplication (*)
    Multiply,
    /// Division (/)
    Divide,
    /// Remainder (%)
    Modulo,

    // Logical operators
    /// Short-circuit AND (&&)
    And,
    /// Short-circuit OR (||)
    Or,

    // Comparison operators
    /// Equality (==)
    Equal,
    /// Inequality (!=)
    NotEqual,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal (<=)
    LessThanOrEqual,

    // Unsupported placeholders
    /// Type check (instanceof)
    InstanceOf,
    /// Bitwise AND (&)
    BitAnd,
    /// Bitwise OR (|)
    BitOr,
    /// Bitwise XOR (^)
    BitXor,
    /// Assignment (=)
    Assign,
    /// Compound multiplication (*=)
    MultiplyAssign,
    /// Compound division (/=)
    DivideAssign,
    /// Compound addition (+=)
    AddAssign,
    /// Compound subtraction (-=)
    SubtractAssign,
    /// Left shift (<<)
    ShiftLeft,
    /// Right shift (>>)
    ShiftRight,
}

impl BinaryOperator {
    /// Every binary operator
    pub const ALL: [BinaryOperator; 24] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Modulo,
        Self::And,
        Self::Or,
        Self::Equal,
        Self::NotEqual,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::LessThan,
        Self::LessThanOrEqual,
        Self::InstanceOf,
        Self::BitAnd,
        Self::BitOr,
        Self::BitXor,
        Self::Assign,
        Self::MultiplyAssign,
        Self::DivideAssign,
        Self::AddAssign,
        Self::SubtractAssign,
        Self::ShiftLeft,
        Self::ShiftRight,
    ];

    /// Get the symbol representation of this operator
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::And => "&&",
            Self::Or => "||",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::InstanceOf => "instanceof",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Assign => "=",
            Self::MultiplyAssign => "*=",
            Self::DivideAssign => "/=",
            Self::AddAssign => "+=",
            Self::SubtractAssign => "-=",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
        }
    }

    /// Look up an operator by its symbol
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Priority used by the parser and the printer (lower binds tighter)
    pub fn priority(self) -> u8 {
        match self {
            Self::BitXor => 50,
            Self::Multiply | Self::Divide | Self::Modulo => 60,
            Self::Add | Self::Subtract => 70,
            Self::ShiftLeft | Self::ShiftRight => 80,
            Self::BitAnd => 90,
            Self::BitOr => 100,
            Self::NotEqual
            | Self::GreaterThan
            | Self::GreaterThanOrEqual
            | Self::LessThan
            | Self::LessThanOrEqual
            | Self::InstanceOf => 110,
            Self::And => 140,
            Self::Or => 160,
            Self::Assign
            | Self::MultiplyAssign
            | Self::DivideAssign
            | Self::AddAssign
            | Self::SubtractAssign => 169,
            Self::Equal => 170,
        }
    }

    /// Check if this operator is arithmetic
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide | Self::Modulo
        )
    }

    /// Check if this operator is logical
    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Check if this operator is comparison
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::GreaterThan
                | Self::GreaterThanOrEqual
                | Self::LessThan
                | Self::LessThanOrEqual
        )
    }

    /// Check if this operator has runtime semantics
    ///
    /// Evaluating an unsupported operator fails before either operand is evaluated.
    pub fn is_supported(self) -> bool {
        self.is_arithmetic() || self.is_logical() || self.is_comparison()
    }

    /// Static result type given the static operand types
    ///
    /// Only `+` infers anything: a string operand makes the result a string.
    pub fn result_type(self, left: Option<&ElClass>, right: Option<&ElClass>) -> Option<ElClass> {
        match self {
            Self::Add
                if TypeRank::of_class(left) == TypeRank::STRING
                    || TypeRank::of_class(right) == TypeRank::STRING =>
            {
                Some(ElClass::String)
            }
            _ => None,
        }
    }

    /// Evaluate the operator over two operand nodes
    ///
    /// Operands are evaluated lazily where the operator short-circuits.
    /// Unsupported operators fail before evaluating either operand.
    pub fn eval(
        self,
        ctx: &dyn ElEvalContext,
        left: &ExpressionNode,
        left_rank: TypeRank,
        right: &ExpressionNode,
        right_rank: TypeRank,
    ) -> EvaluationResult<Value> {
        match self {
            Self::Add => operations::add(ctx, left_rank, &left.eval(ctx)?, right_rank, &right.eval(ctx)?),
            Self::Subtract => operations::sub(ctx, left_rank, &left.eval(ctx)?, right_rank, &right.eval(ctx)?),
            Self::Multiply => operations::mul(ctx, left_rank, &left.eval(ctx)?, right_rank, &right.eval(ctx)?),
            Self::Divide => operations::div(ctx, left_rank, &left.eval(ctx)?, right_rank, &right.eval(ctx)?),
            Self::Modulo => {
                operations::modulo(ctx, left_rank, &left.eval(ctx)?, right_rank, &right.eval(ctx)?)
            }
            Self::And => {
                if !ctx.test(&left.eval(ctx)?) {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(ctx.test(&right.eval(ctx)?)))
            }
            Self::Or => {
                if ctx.test(&left.eval(ctx)?) {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(ctx.test(&right.eval(ctx)?)))
            }
            Self::Equal => {
                let l = left.eval(ctx)?;
                let r = right.eval(ctx)?;
                if l.is_same(&r) {
                    return Ok(Value::Boolean(true));
                }
                if l.is_null() || r.is_null() {
                    return Ok(Value::Boolean(false));
                }
                operations::eq(ctx, left_rank, &l, right_rank, &r).map(Value::Boolean)
            }
            Self::NotEqual => {
                let l = left.eval(ctx)?;
                let r = right.eval(ctx)?;
                if l.is_same(&r) {
                    return Ok(Value::Boolean(false));
                }
                if l.is_null() || r.is_null() {
                    return Ok(Value::Boolean(true));
                }
                operations::eq(ctx, left_rank, &l, right_rank, &r).map(|eq| Value::Boolean(!eq))
            }
            Self::GreaterThan | Self::LessThan => {
                let l = left.eval(ctx)?;
                if l.is_null() {
                    return Ok(Value::Boolean(false));
                }
                let r = right.eval(ctx)?;
                if r.is_null() || l.is_same(&r) {
                    return Ok(Value::Boolean(false));
                }
                let result = if self == Self::GreaterThan {
                    operations::gt(ctx, left_rank, &l, right_rank, &r)?
                } else {
                    operations::lt(ctx, left_rank, &l, right_rank, &r)?
                };
                Ok(Value::Boolean(result))
            }
            Self::GreaterThanOrEqual | Self::LessThanOrEqual => {
                let l = left.eval(ctx)?;
                let r = right.eval(ctx)?;
                if l.is_same(&r) {
                    return Ok(Value::Boolean(true));
                }
                if l.is_null() || r.is_null() {
                    return Ok(Value::Boolean(false));
                }
                let result = if self == Self::GreaterThanOrEqual {
                    operations::ge(ctx, left_rank, &l, right_rank, &r)?
                } else {
                    operations::le(ctx, left_rank, &l, right_rank, &r)?
                };
                Ok(Value::Boolean(result))
            }
            unsupported => Err(ElError::unsupported(unsupported.symbol())),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators of the expression language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Logical negation (!)
    Not,
    /// Positive sign (+)
    Positive,
    /// Arithmetic negation (-)
    Negate,
    /// Prefix increment (++x), unsupported
    PreIncrement,
    /// Prefix decrement (--x), unsupported
    PreDecrement,
    /// Postfix increment (x++), unsupported
    PostIncrement,
    /// Postfix decrement (x--), unsupported
    PostDecrement,
}

impl UnaryOperator {
    /// Get the symbol representation of this operator
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Positive => "+",
            Self::Negate => "-",
            Self::PreIncrement | Self::PostIncrement => "++",
            Self::PreDecrement | Self::PostDecrement => "--",
        }
    }

    /// Priority of all unary operators
    pub fn priority(self) -> u8 {
        20
    }

    /// Operator is written before its operand
    pub fn is_prefix(self) -> bool {
        !matches!(self, Self::PostIncrement | Self::PostDecrement)
    }

    /// Check if this operator has runtime semantics
    ///
    /// Evaluating an unsupported operator fails without evaluating the operand.
    pub fn is_supported(self) -> bool {
        matches!(self, Self::Not | Self::Positive | Self::Negate)
    }

    /// Static result type given the operand's static type
    ///
    /// Unary operators never infer one.
    pub fn result_type(self, _operand: Option<&ElClass>) -> Option<ElClass> {
        None
    }

    /// Evaluate the operator over its operand node
    pub fn eval(
        self,
        ctx: &dyn ElEvalContext,
        operand: &ExpressionNode,
        rank: TypeRank,
    ) -> EvaluationResult<Value> {
        match self {
            Self::Not => Ok(Value::Boolean(!ctx.test(&operand.eval(ctx)?))),
            Self::Positive => operand.eval(ctx),
            Self::Negate => operations::minus(ctx, rank, &operand.eval(ctx)?),
            unsupported => Err(ElError::unsupported(unsupported.symbol())),
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_round_trip() {
        for op in BinaryOperator::ALL {
            assert_eq!(BinaryOperator::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(BinaryOperator::from_symbol("and"), None);
    }

    #[test]
    fn test_priorities() {
        assert!(BinaryOperator::Multiply.priority() < BinaryOperator::Add.priority());
        assert!(BinaryOperator::And.priority() < BinaryOperator::Or.priority());
        assert_eq!(BinaryOperator::Equal.priority(), 170);
        assert_eq!(BinaryOperator::NotEqual.priority(), 110);
        assert_eq!(UnaryOperator::Negate.priority(), 20);
    }

    #[test]
    fn test_static_result_type() {
        let string = ElClass::String;
        let int = ElClass::Int;
        assert_eq!(
            BinaryOperator::Add.result_type(Some(&int), Some(&string)),
            Some(ElClass::String)
        );
        assert_eq!(BinaryOperator::Add.result_type(Some(&int), Some(&int)), None);
        assert_eq!(BinaryOperator::Add.result_type(None, None), None);
        assert_eq!(
            BinaryOperator::Equal.result_type(Some(&string), Some(&string)),
            None
        );
        for op in [UnaryOperator::Positive, UnaryOperator::Negate, UnaryOperator::Not] {
            assert_eq!(op.result_type(Some(&string)), None);
        }
    }

    #[test]
    fn test_support_flags() {
        assert!(BinaryOperator::LessThanOrEqual.is_supported());
        assert!(!BinaryOperator::BitXor.is_supported());
        assert!(!UnaryOperator::PostIncrement.is_prefix());
        assert!(!UnaryOperator::PreIncrement.is_supported());
    }
}

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

//! Expression AST node definitions
//!
//! Nodes are built once by a parser and then evaluated any number of times,
//! possibly from several threads. The only state mutated during evaluation is
//! the descriptor cache inside [`PropertyData`]. Setters take `&mut self`, so
//! rewriting a tree can never overlap with evaluating it. Nodes keep no parent
//! back-reference; visitors see ancestry through the walk itself.

use std::fmt;

use super::operator::{BinaryOperator, UnaryOperator};
use super::printer::PrintVisitor;
use super::property::PropertyData;
use crate::evaluator::coerce::to_long;
use crate::evaluator::messages::NOT_INDEXABLE;
use crate::evaluator::{ElEvalContext, EvaluationError, EvaluationResult};
use crate::model::{ElClass, TypeRank, Value};

/// Rendering priority of property and indexed access
pub(crate) const ACCESS_PRIORITY: u8 = 10;

/// Rendering priority of the ternary choice
pub(crate) const CHOICE_PRIORITY: u8 = 180;

/// AST representation of expressions
///
/// Large variants are boxed to keep the enum small.
#[derive(Debug, Clone)]
pub enum ExpressionNode {
    /// The `null` literal
    Null,

    /// Literal value (string, number, boolean, etc.)
    Literal(LiteralData),

    /// Variable reference
    Identifier(IdentifierData),

    /// Binary operation
    Binary(Box<BinaryData>),

    /// Unary operation
    Unary(Box<UnaryData>),

    /// Ternary choice (`question ? yes : no`)
    Choice(Box<ChoiceData>),

    /// Property access (`owner.name`)
    Property(Box<PropertyData>),

    /// Indexed access (`array[index]`)
    Item(Box<ItemData>),
}

/// Literal value together with its static class
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralData {
    /// The value
    pub value: Value,
    /// Static class, the runtime class of the value
    pub class: ElClass,
}

/// Variable reference
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierData {
    /// Variable name
    pub name: String,
    /// Type declared by the parser, if any
    pub declared: Option<ElClass>,
}

/// Binary operation with operand ranks frozen from the static types
#[derive(Debug, Clone)]
pub struct BinaryData {
    left: ExpressionNode,
    operator: BinaryOperator,
    right: ExpressionNode,
    left_rank: TypeRank,
    right_rank: TypeRank,
    result_type: Option<ElClass>,
}

impl BinaryData {
    /// Create a binary operation
    pub fn new(left: ExpressionNode, operator: BinaryOperator, right: ExpressionNode) -> Self {
        let mut data = Self {
            left,
            operator,
            right,
            left_rank: TypeRank::UNKNOWN,
            right_rank: TypeRank::UNKNOWN,
            result_type: None,
        };
        data.freeze_types();
        data
    }

    fn freeze_types(&mut self) {
        let left_type = self.left.result_type();
        let right_type = self.right.result_type();
        self.left_rank = TypeRank::of_class(left_type.as_ref());
        self.right_rank = TypeRank::of_class(right_type.as_ref());
        self.result_type = self
            .operator
            .result_type(left_type.as_ref(), right_type.as_ref());
    }

    /// Left operand
    pub fn left(&self) -> &ExpressionNode {
        &self.left
    }

    /// Right operand
    pub fn right(&self) -> &ExpressionNode {
        &self.right
    }

    /// Operator
    pub fn operator(&self) -> BinaryOperator {
        self.operator
    }

    /// Rank of the left operand's static type
    pub fn left_rank(&self) -> TypeRank {
        self.left_rank
    }

    /// Rank of the right operand's static type
    pub fn right_rank(&self) -> TypeRank {
        self.right_rank
    }

    /// Static result type
    pub fn result_type(&self) -> Option<&ElClass> {
        self.result_type.as_ref()
    }

    /// Replace the left operand
    pub fn set_left(&mut self, left: ExpressionNode) {
        self.left = left;
        self.freeze_types();
    }

    /// Replace the right operand
    pub fn set_right(&mut self, right: ExpressionNode) {
        self.right = right;
        self.freeze_types();
    }

    /// Replace the operator
    pub fn set_operator(&mut self, operator: BinaryOperator) {
        self.operator = operator;
        self.freeze_types();
    }

    /// Evaluate against a context
    pub fn eval(&self, ctx: &dyn ElEvalContext) -> EvaluationResult<Value> {
        self.operator
            .eval(ctx, &self.left, self.left_rank, &self.right, self.right_rank)
    }
}

/// Unary operation
#[derive(Debug, Clone)]
pub struct UnaryData {
    operator: UnaryOperator,
    operand: ExpressionNode,
    rank: TypeRank,
}

impl UnaryData {
    /// Create a unary operation
    pub fn new(operator: UnaryOperator, operand: ExpressionNode) -> Self {
        let rank = TypeRank::of_class(operand.result_type().as_ref());
        Self {
            operator,
            operand,
            rank,
        }
    }

    /// Operator
    pub fn operator(&self) -> UnaryOperator {
        self.operator
    }

    /// Operand
    pub fn operand(&self) -> &ExpressionNode {
        &self.operand
    }

    /// Rank of the operand's static type
    pub fn rank(&self) -> TypeRank {
        self.rank
    }

    /// Replace the operand
    pub fn set_operand(&mut self, operand: ExpressionNode) {
        self.rank = TypeRank::of_class(operand.result_type().as_ref());
        self.operand = operand;
    }

    /// Evaluate against a context
    pub fn eval(&self, ctx: &dyn ElEvalContext) -> EvaluationResult<Value> {
        self.operator.eval(ctx, &self.operand, self.rank)
    }
}

/// Ternary choice
#[derive(Debug, Clone)]
pub struct ChoiceData {
    /// Condition
    pub question: ExpressionNode,
    /// Branch taken when the condition is truthy
    pub yes: ExpressionNode,
    /// Branch taken otherwise
    pub no: ExpressionNode,
}

impl ChoiceData {
    /// Evaluate the question, then exactly one branch
    pub fn eval(&self, ctx: &dyn ElEvalContext) -> EvaluationResult<Value> {
        if ctx.test(&self.question.eval(ctx)?) {
            self.yes.eval(ctx)
        } else {
            self.no.eval(ctx)
        }
    }
}

/// Indexed access
#[derive(Debug, Clone)]
pub struct ItemData {
    /// Indexed expression
    pub array: ExpressionNode,
    /// Index expression
    pub index: ExpressionNode,
}

impl ItemData {
    /// Evaluate `array[index]`
    ///
    /// Null array or index yields null, as does a list index out of range.
    pub fn eval(&self, ctx: &dyn ElEvalContext) -> EvaluationResult<Value> {
        let array = self.array.eval(ctx)?;
        if array.is_null() {
            return Ok(Value::Null);
        }
        let index = self.index.eval(ctx)?;
        if index.is_null() {
            return Ok(Value::Null);
        }
        match &array {
            Value::Map(map) => Ok(map
                .get(&ctx.format_value(&index))
                .cloned()
                .unwrap_or_default()),
            Value::List(items) => {
                let position = to_long(ctx, TypeRank::of_value(&index), &index)?;
                Ok(usize::try_from(position)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .unwrap_or_default())
            }
            Value::Object(obj) => match obj.as_property_resolver() {
                Some(resolver) => resolver.resolve_property(&ctx.format_value(&index), ctx),
                None => Err(not_indexable(ctx, &array, &index)),
            },
            _ => Err(not_indexable(ctx, &array, &index)),
        }
    }
}

fn not_indexable(ctx: &dyn ElEvalContext, array: &Value, index: &Value) -> crate::evaluator::ElError {
    EvaluationError::NotIndexable {
        message: ctx.message(NOT_INDEXABLE, &[array, index]),
    }
    .into()
}

impl ExpressionNode {
    /// The `null` literal
    pub fn null() -> Self {
        Self::Null
    }

    /// Literal node; its static type is the value's class
    pub fn literal(value: impl Into<Value>) -> Self {
        let value = value.into();
        if value.is_null() {
            return Self::Null;
        }
        let class = value.class();
        Self::Literal(LiteralData { value, class })
    }

    /// Literal node with an explicit static class
    pub fn typed_literal(value: impl Into<Value>, class: ElClass) -> Self {
        Self::Literal(LiteralData {
            value: value.into(),
            class,
        })
    }

    /// Variable reference with no declared type
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(IdentifierData {
            name: name.into(),
            declared: None,
        })
    }

    /// Variable reference with a declared type
    pub fn typed_identifier(name: impl Into<String>, class: ElClass) -> Self {
        Self::Identifier(IdentifierData {
            name: name.into(),
            declared: Some(class),
        })
    }

    /// Binary operation
    pub fn binary(left: ExpressionNode, operator: BinaryOperator, right: ExpressionNode) -> Self {
        Self::Binary(Box::new(BinaryData::new(left, operator, right)))
    }

    /// Unary operation
    pub fn unary(operator: UnaryOperator, operand: ExpressionNode) -> Self {
        Self::Unary(Box::new(UnaryData::new(operator, operand)))
    }

    /// Ternary choice
    pub fn choice(question: ExpressionNode, yes: ExpressionNode, no: ExpressionNode) -> Self {
        Self::Choice(Box::new(ChoiceData { question, yes, no }))
    }

    /// Property access
    pub fn property(owner: ExpressionNode, name: impl Into<String>) -> Self {
        Self::Property(Box::new(PropertyData::new(owner, name)))
    }

    /// Indexed access
    pub fn item(array: ExpressionNode, index: ExpressionNode) -> Self {
        Self::Item(Box::new(ItemData { array, index }))
    }

    /// Statically resolved type, `None` when only known at runtime
    pub fn result_type(&self) -> Option<ElClass> {
        match self {
            Self::Null | Self::Property(_) | Self::Item(_) => None,
            Self::Literal(data) => Some(data.class.clone()),
            Self::Identifier(data) => data.declared.clone(),
            Self::Binary(data) => data.result_type().cloned(),
            Self::Unary(data) => data.operator().result_type(data.operand().result_type().as_ref()),
            Self::Choice(data) => {
                let yes = data.yes.result_type();
                if yes == data.no.result_type() { yes } else { None }
            }
        }
    }

    /// Priority used when rendering (lower binds tighter)
    pub fn priority(&self) -> u8 {
        match self {
            Self::Null | Self::Literal(_) | Self::Identifier(_) => 0,
            Self::Property(_) | Self::Item(_) => ACCESS_PRIORITY,
            Self::Unary(data) => data.operator().priority(),
            Self::Binary(data) => data.operator().priority(),
            Self::Choice(_) => CHOICE_PRIORITY,
        }
    }

    /// Evaluate against a context
    pub fn eval(&self, ctx: &dyn ElEvalContext) -> EvaluationResult<Value> {
        match self {
            Self::Null => Ok(Value::Null),
            Self::Literal(data) => Ok(data.value.clone()),
            Self::Identifier(data) => Ok(ctx.resolve_variable(&data.name).unwrap_or_default()),
            Self::Binary(data) => data.eval(ctx),
            Self::Unary(data) => data.eval(ctx),
            Self::Choice(data) => data.eval(ctx),
            Self::Property(data) => data.eval(ctx),
            Self::Item(data) => data.eval(ctx),
        }
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&PrintVisitor::render(self))
    }
}

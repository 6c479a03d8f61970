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

//! Visitor pattern for AST traversal
//!
//! Composite nodes get a `start_*` hook before their children and an `end_*`
//! hook after them. Returning `false` from `start_*` skips the children, but
//! `end_*` is still called. Leaf nodes get a single `visit_*` hook.

use super::expression::{
    BinaryData, ChoiceData, ExpressionNode, IdentifierData, ItemData, LiteralData, UnaryData,
};
use super::property::PropertyData;

/// Trait for read-only walks over an expression tree
pub trait AstVisitor {
    /// Visit the `null` literal
    fn visit_null(&mut self) {}

    /// Visit a literal
    fn visit_literal(&mut self, _literal: &LiteralData) {}

    /// Visit a variable reference
    fn visit_identifier(&mut self, _identifier: &IdentifierData) {}

    /// Enter a binary operation
    fn start_binary(&mut self, _node: &BinaryData) -> bool {
        true
    }

    /// Leave a binary operation
    fn end_binary(&mut self, _node: &BinaryData) {}

    /// Enter a unary operation
    fn start_unary(&mut self, _node: &UnaryData) -> bool {
        true
    }

    /// Leave a unary operation
    fn end_unary(&mut self, _node: &UnaryData) {}

    /// Enter a ternary choice
    fn start_choice(&mut self, _node: &ChoiceData) -> bool {
        true
    }

    /// Leave a ternary choice
    fn end_choice(&mut self, _node: &ChoiceData) {}

    /// Enter a property access
    fn start_property(&mut self, _node: &PropertyData) -> bool {
        true
    }

    /// Leave a property access
    fn end_property(&mut self, _node: &PropertyData) {}

    /// Enter an indexed access
    fn start_item(&mut self, _node: &ItemData) -> bool {
        true
    }

    /// Leave an indexed access
    fn end_item(&mut self, _node: &ItemData) {}
}

/// Walk `node` in pre-order
pub fn walk<V: AstVisitor + ?Sized>(visitor: &mut V, node: &ExpressionNode) {
    match node {
        ExpressionNode::Null => visitor.visit_null(),
        ExpressionNode::Literal(data) => visitor.visit_literal(data),
        ExpressionNode::Identifier(data) => visitor.visit_identifier(data),
        ExpressionNode::Binary(data) => {
            if visitor.start_binary(data) {
                walk(visitor, data.left());
                walk(visitor, data.right());
            }
            visitor.end_binary(data);
        }
        ExpressionNode::Unary(data) => {
            if visitor.start_unary(data) {
                walk(visitor, data.operand());
            }
            visitor.end_unary(data);
        }
        ExpressionNode::Choice(data) => {
            if visitor.start_choice(data) {
                walk(visitor, &data.question);
                walk(visitor, &data.yes);
                walk(visitor, &data.no);
            }
            visitor.end_choice(data);
        }
        ExpressionNode::Property(data) => {
            if visitor.start_property(data) {
                walk(visitor, data.owner());
            }
            visitor.end_property(data);
        }
        ExpressionNode::Item(data) => {
            if visitor.start_item(data) {
                walk(visitor, &data.array);
                walk(visitor, &data.index);
            }
            visitor.end_item(data);
        }
    }
}

impl ExpressionNode {
    /// Accept a visitor
    pub fn accept<V: AstVisitor + ?Sized>(&self, visitor: &mut V) {
        walk(visitor, self)
    }
}

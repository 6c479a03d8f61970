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

//! Render an expression tree back to source text

use super::expression::{
    ACCESS_PRIORITY, BinaryData, CHOICE_PRIORITY, ChoiceData, ExpressionNode, IdentifierData,
    ItemData, LiteralData, UnaryData,
};
use super::property::PropertyData;
use super::visitor::{AstVisitor, walk};
use crate::model::Value;

/// Visitor writing expression text into a buffer
///
/// Composite nodes print their own children so that operators and
/// punctuation land between them, which is why every `start_*` returns false.
#[derive(Debug, Default)]
pub struct PrintVisitor {
    buf: String,
}

impl PrintVisitor {
    /// Create an empty printer
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a tree to text
    pub fn render(node: &ExpressionNode) -> String {
        let mut printer = Self::new();
        walk(&mut printer, node);
        printer.finish()
    }

    /// Text written so far
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Consume the printer, returning its text
    pub fn finish(self) -> String {
        self.buf
    }

    fn child(&mut self, node: &ExpressionNode, parenthesize: bool) {
        if parenthesize {
            self.buf.push('(');
            walk(self, node);
            self.buf.push(')');
        } else {
            walk(self, node);
        }
    }

    fn write_string_literal(&mut self, quote: char, text: &str) {
        self.buf.push(quote);
        for c in text.chars() {
            match c {
                '\\' => self.buf.push_str("\\\\"),
                '\n' => self.buf.push_str("\\n"),
                '\r' => self.buf.push_str("\\r"),
                '\t' => self.buf.push_str("\\t"),
                c if c == quote => {
                    self.buf.push('\\');
                    self.buf.push(c);
                }
                c => self.buf.push(c),
            }
        }
        self.buf.push(quote);
    }
}

impl AstVisitor for PrintVisitor {
    fn visit_null(&mut self) {
        self.buf.push_str("null");
    }

    fn visit_literal(&mut self, literal: &LiteralData) {
        match &literal.value {
            Value::String(s) => self.write_string_literal('"', s),
            Value::Char(c) => self.write_string_literal('\'', &c.to_string()),
            other => self.buf.push_str(&other.to_string()),
        }
    }

    fn visit_identifier(&mut self, identifier: &IdentifierData) {
        self.buf.push_str(&identifier.name);
    }

    fn start_binary(&mut self, node: &BinaryData) -> bool {
        let priority = node.operator().priority();
        self.child(node.left(), node.left().priority() > priority);
        self.buf.push(' ');
        self.buf.push_str(node.operator().symbol());
        self.buf.push(' ');
        self.child(node.right(), node.right().priority() >= priority);
        false
    }

    fn start_unary(&mut self, node: &UnaryData) -> bool {
        let parenthesize = node.operand().priority() > node.operator().priority();
        if node.operator().is_prefix() {
            self.buf.push_str(node.operator().symbol());
            self.child(node.operand(), parenthesize);
        } else {
            self.child(node.operand(), parenthesize);
            self.buf.push_str(node.operator().symbol());
        }
        false
    }

    fn start_choice(&mut self, node: &ChoiceData) -> bool {
        self.child(&node.question, node.question.priority() >= CHOICE_PRIORITY);
        self.buf.push_str(" ? ");
        self.child(&node.yes, false);
        self.buf.push_str(" : ");
        self.child(&node.no, false);
        false
    }

    fn start_property(&mut self, node: &PropertyData) -> bool {
        self.child(node.owner(), node.owner().priority() > ACCESS_PRIORITY);
        self.buf.push('.');
        self.buf.push_str(node.name());
        false
    }

    fn start_item(&mut self, node: &ItemData) -> bool {
        self.child(&node.array, node.array.priority() > ACCESS_PRIORITY);
        self.buf.push('[');
        self.child(&node.index, false);
        self.buf.push(']');
        false
    }
}

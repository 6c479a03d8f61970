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

//! Printing trees back to text and walking them with custom visitors

use octofhir_spel::ast::{
    AstVisitor, BinaryOperator, ExpressionNode, IdentifierData, PrintVisitor, PropertyData,
    UnaryOperator,
};
use octofhir_spel::evaluator::{ContextConfig, DefaultEvalContext, MessageBundle};
use octofhir_spel::Expression;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn id(name: &str) -> ExpressionNode {
    ExpressionNode::identifier(name)
}

fn lit(value: impl Into<octofhir_spel::Value>) -> ExpressionNode {
    ExpressionNode::literal(value)
}

fn bin(left: ExpressionNode, op: BinaryOperator, right: ExpressionNode) -> ExpressionNode {
    ExpressionNode::binary(left, op, right)
}

#[rstest]
#[case::precedence(
    bin(id("a"), BinaryOperator::Add, bin(id("b"), BinaryOperator::Multiply, id("c"))),
    "a + b * c"
)]
#[case::grouped_sum(
    bin(bin(id("a"), BinaryOperator::Add, id("b")), BinaryOperator::Multiply, id("c")),
    "(a + b) * c"
)]
#[case::logical(
    bin(
        bin(id("a"), BinaryOperator::GreaterThan, lit(1)),
        BinaryOperator::And,
        bin(id("b"), BinaryOperator::LessThanOrEqual, lit(2.5))
    ),
    "a > 1 && b <= 2.5"
)]
#[case::choice_in_sum(
    bin(
        ExpressionNode::choice(id("q"), lit(1), lit(2)),
        BinaryOperator::Add,
        lit(3)
    ),
    "(q ? 1 : 2) + 3"
)]
#[case::negated_access(
    ExpressionNode::unary(UnaryOperator::Negate, ExpressionNode::property(id("order"), "total")),
    "-order.total"
)]
#[case::indexed_literal(
    ExpressionNode::item(ExpressionNode::property(id("user"), "roles"), lit("admin")),
    "user.roles[\"admin\"]"
)]
#[case::null_comparison(bin(id("x"), BinaryOperator::Equal, ExpressionNode::null()), "x == null")]
fn test_render(#[case] node: ExpressionNode, #[case] expected: &str) {
    assert_eq!(PrintVisitor::render(&node), expected);
    assert_eq!(Expression::new(node).to_string(), expected);
}

#[test]
fn test_unsupported_operators_still_print() {
    let shift = bin(id("flags"), BinaryOperator::ShiftLeft, lit(2));
    assert_eq!(shift.to_string(), "flags << 2");
    let incr = ExpressionNode::unary(UnaryOperator::PreIncrement, id("i"));
    assert_eq!(incr.to_string(), "++i");
}

/// Collects variable names and property paths an expression reads
#[derive(Default)]
struct Dependencies {
    variables: Vec<String>,
    paths: Vec<String>,
}

impl AstVisitor for Dependencies {
    fn visit_identifier(&mut self, identifier: &IdentifierData) {
        self.variables.push(identifier.name.clone());
    }

    fn start_property(&mut self, node: &PropertyData) -> bool {
        self.paths.push(node.qualified_name().to_string());
        true
    }
}

#[test]
fn test_custom_visitor_collects_dependencies() {
    let expr = Expression::new(bin(
        ExpressionNode::property(ExpressionNode::property(id("order"), "customer"), "name"),
        BinaryOperator::Add,
        ExpressionNode::choice(id("vip"), lit(" (vip)"), lit("")),
    ));

    let mut deps = Dependencies::default();
    expr.accept(&mut deps);
    assert_eq!(deps.variables, vec!["order", "vip"]);
    assert_eq!(deps.paths, vec!["order.customer.name", "order.customer"]);
}

#[test]
fn test_custom_messages() {
    let messages = MessageBundle::new().with_message(
        octofhir_spel::evaluator::messages::VALUES_NOT_COMPARABLE,
        "cannot order {0} against {1}",
    );
    let ctx = DefaultEvalContext::new()
        .with_config(ContextConfig::new().with_messages(messages))
        .with_variable("a", vec![octofhir_spel::Value::Int(1)])
        .with_variable("b", vec![octofhir_spel::Value::Int(2)]);

    let err = Expression::new(bin(id("a"), BinaryOperator::GreaterThan, id("b")))
        .evaluate(&ctx)
        .unwrap_err();
    assert_eq!(err.to_string(), "cannot order [1] against [2]");
}

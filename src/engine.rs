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

//! Compiled expression - the main entry point for evaluation

use std::fmt;

use log::{debug, trace};

use crate::ast::{AstVisitor, ExpressionNode};
use crate::evaluator::{DefaultEvalContext, ElEvalContext, EvaluationResult};
use crate::model::{ElClass, Value};

/// A compiled expression, shareable across threads and evaluated any number of times
///
/// # Examples
///
/// ```rust
/// use octofhir_spel::ast::{BinaryOperator, ExpressionNode};
/// use octofhir_spel::model::Value;
/// use octofhir_spel::Expression;
///
/// let expr = Expression::new(ExpressionNode::binary(
///     ExpressionNode::identifier("price"),
///     BinaryOperator::Multiply,
///     ExpressionNode::literal(2),
/// ));
/// let result = expr.evaluate_with_variables([("price", 21)]).unwrap();
/// assert_eq!(result, Value::Long(42));
/// assert_eq!(expr.to_string(), "price * 2");
/// ```
#[derive(Debug, Clone)]
pub struct Expression {
    root: ExpressionNode,
}

impl Expression {
    /// Wrap a parsed tree
    pub fn new(root: ExpressionNode) -> Self {
        Self { root }
    }

    /// Root node
    pub fn root(&self) -> &ExpressionNode {
        &self.root
    }

    /// Evaluate against a context
    pub fn evaluate(&self, ctx: &dyn ElEvalContext) -> EvaluationResult<Value> {
        trace!("evaluating '{}'", self.root);
        self.root.eval(ctx).inspect_err(|err| {
            debug!("evaluation of '{}' failed: {}", self.root, err);
        })
    }

    /// Evaluate against a fresh default context holding the given variables
    pub fn evaluate_with_variables<I, K, V>(&self, variables: I) -> EvaluationResult<Value>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let ctx = DefaultEvalContext::new().with_variables(variables);
        self.evaluate(&ctx)
    }

    /// Statically resolved result type, if any
    pub fn result_type(&self) -> Option<ElClass> {
        self.root.result_type()
    }

    /// Walk the tree with a visitor
    pub fn accept<V: AstVisitor + ?Sized>(&self, visitor: &mut V) {
        self.root.accept(visitor)
    }
}

impl From<ExpressionNode> for Expression {
    fn from(root: ExpressionNode) -> Self {
        Self::new(root)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

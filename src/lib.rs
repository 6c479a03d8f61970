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

//! Embeddable expression language evaluator
//!
//! Evaluates pre-parsed expression trees over a host object graph, with
//! JSR-341 numeric promotion, short-circuit logic, null-safe comparisons and
//! a per-node property descriptor cache.

#![warn(missing_docs)]

pub mod ast;
pub mod engine;
pub mod evaluator;
pub mod model;

// Re-export main types
pub use ast::{BinaryOperator, ExpressionNode, UnaryOperator};
pub use engine::Expression;
pub use evaluator::{DefaultEvalContext, ElError, ElEvalContext, EvaluationError, EvaluationResult};
pub use model::{ElClass, TypeRank, Value};

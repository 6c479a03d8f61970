//! Evaluation Benchmarks
//!
//! Measures numeric promotion, short-circuit logic and cached property access
//! on prebuilt trees.

use std::any::Any;
use std::hint::black_box;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use octofhir_spel::ast::{BinaryOperator, ExpressionNode};
use octofhir_spel::evaluator::{DefaultEvalContext, PropertyRegistry};
use octofhir_spel::model::{ElClass, ElObject, Value};
use octofhir_spel::Expression;

#[derive(Debug)]
struct Order {
    total: i64,
}

impl ElObject for Order {
    fn class(&self) -> ElClass {
        ElClass::named("Order")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn context() -> DefaultEvalContext {
    let registry = PropertyRegistry::new().with_property(ElClass::named("Order"), "total", |owner| {
        Ok(owner
            .downcast_ref::<Order>()
            .map(|o| Value::Long(o.total))
            .unwrap_or_default())
    });
    DefaultEvalContext::new()
        .with_properties(Arc::new(registry))
        .with_variable("order", Value::object(Order { total: 120 }))
        .with_variable("qty", 3)
        .with_variable("price", BigDecimal::new(1999.into(), 2))
        .with_variable("name", "widget")
}

fn id(name: &str) -> ExpressionNode {
    ExpressionNode::identifier(name)
}

fn expressions() -> Vec<(&'static str, Expression)> {
    vec![
        (
            "long_arithmetic",
            Expression::new(ExpressionNode::binary(
                id("qty"),
                BinaryOperator::Multiply,
                ExpressionNode::literal(7),
            )),
        ),
        (
            "decimal_arithmetic",
            Expression::new(ExpressionNode::binary(
                id("price"),
                BinaryOperator::Multiply,
                id("qty"),
            )),
        ),
        (
            "string_concat",
            Expression::new(ExpressionNode::binary(
                ExpressionNode::literal("item: "),
                BinaryOperator::Add,
                id("name"),
            )),
        ),
        (
            "short_circuit",
            Expression::new(ExpressionNode::binary(
                ExpressionNode::literal(false),
                BinaryOperator::And,
                ExpressionNode::binary(id("qty"), BinaryOperator::GreaterThan, ExpressionNode::literal(1)),
            )),
        ),
        (
            "cached_property",
            Expression::new(ExpressionNode::binary(
                ExpressionNode::property(id("order"), "total"),
                BinaryOperator::GreaterThanOrEqual,
                ExpressionNode::literal(100),
            )),
        ),
    ]
}

fn bench_evaluation(c: &mut Criterion) {
    let ctx = context();
    let mut group = c.benchmark_group("evaluation");
    for (name, expr) in expressions() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &expr, |b, expr| {
            b.iter(|| black_box(expr.evaluate(&ctx)))
        });
    }
    group.finish();
}

fn bench_rendering(c: &mut Criterion) {
    let exprs = expressions();
    c.bench_function("render_all", |b| {
        b.iter(|| {
            for (_, expr) in &exprs {
                black_box(expr.to_string());
            }
        })
    });
}

criterion_group!(benches, bench_evaluation, bench_rendering);
criterion_main!(benches);

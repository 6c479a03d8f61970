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

//! Property resolution against host objects and the per-node descriptor cache

use std::any::Any;
use std::sync::Arc;

use octofhir_spel::ast::{ExpressionNode, PropertyData};
use octofhir_spel::evaluator::{
    DefaultEvalContext, ElEvalContext, EvaluationError, EvaluationResult, PropertyRegistry,
};
use octofhir_spel::model::{DynamicGetter, ElClass, ElObject, PropertyResolver, Value, ValueMap};
use octofhir_spel::Expression;
use pretty_assertions::assert_eq;

#[derive(Debug)]
struct Person {
    name: String,
    age: i32,
}

impl ElObject for Person {
    fn class(&self) -> ElClass {
        ElClass::named("Person")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_el_string(&self) -> String {
        format!("Person({})", self.name)
    }
}

#[derive(Debug)]
struct Pet {
    name: String,
}

impl ElObject for Pet {
    fn class(&self) -> ElClass {
        ElClass::named("Pet")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Object with free-form attributes
#[derive(Debug)]
struct Bag {
    attributes: Vec<(&'static str, Value)>,
}

impl ElObject for Bag {
    fn class(&self) -> ElClass {
        ElClass::named("Bag")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_dynamic_getter(&self) -> Option<&dyn DynamicGetter> {
        Some(self)
    }
}

impl DynamicGetter for Bag {
    fn get_property(&self, name: &str) -> EvaluationResult<Value> {
        Ok(self
            .attributes
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.clone())
            .unwrap_or_default())
    }
}

/// Object answering every property itself
#[derive(Debug)]
struct Settings;

impl ElObject for Settings {
    fn class(&self) -> ElClass {
        ElClass::named("Settings")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_property_resolver(&self) -> Option<&dyn PropertyResolver> {
        Some(self)
    }
}

impl PropertyResolver for Settings {
    fn resolve_property(&self, name: &str, ctx: &dyn ElEvalContext) -> EvaluationResult<Value> {
        Ok(ctx.resolve_variable(name).unwrap_or_else(|| Value::from(format!("default-{name}"))))
    }
}

fn registry() -> Arc<PropertyRegistry> {
    let registry = PropertyRegistry::new()
        .with_property(ElClass::named("Person"), "name", |owner| {
            Ok(owner
                .downcast_ref::<Person>()
                .map(|p| Value::from(p.name.as_str()))
                .unwrap_or_default())
        })
        .with_property(ElClass::named("Person"), "age", |owner| {
            Ok(owner.downcast_ref::<Person>().map(|p| Value::Int(p.age)).unwrap_or_default())
        })
        .with_property(ElClass::named("Person"), "address", |_| {
            let mut address = ValueMap::new();
            address.insert("city".to_string(), Value::from("Lyon"));
            Ok(Value::from(address))
        })
        .with_property(ElClass::named("Person"), "salary", |_| {
            Err(EvaluationError::Arithmetic {
                message: "payroll offline".to_string(),
            }
            .into())
        })
        .with_property(ElClass::named("Pet"), "name", |owner| {
            Ok(owner
                .downcast_ref::<Pet>()
                .map(|p| Value::from(p.name.as_str()))
                .unwrap_or_default())
        });
    Arc::new(registry)
}

fn ada() -> Value {
    Value::object(Person {
        name: "Ada".to_string(),
        age: 36,
    })
}

fn access(owner: &str, name: &str) -> Expression {
    Expression::new(ExpressionNode::property(ExpressionNode::identifier(owner), name))
}

fn property_node(expr: &Expression) -> &PropertyData {
    match expr.root() {
        ExpressionNode::Property(data) => data,
        other => panic!("not a property access: {other}"),
    }
}

#[test]
fn test_descriptor_is_cached_per_node() {
    let registry = registry();
    let ctx = DefaultEvalContext::new()
        .with_properties(Arc::clone(&registry))
        .with_variable("p", ada());
    let expr = access("p", "name");

    assert_eq!(expr.evaluate(&ctx).unwrap(), Value::from("Ada"));
    assert_eq!(expr.evaluate(&ctx).unwrap(), Value::from("Ada"));
    assert_eq!(registry.lookup_count(), 1);

    let (class, descriptor) = property_node(&expr).cached_descriptor().unwrap();
    assert_eq!(class, ElClass::named("Person"));
    assert!(!descriptor.is_absent());
}

#[test]
fn test_owner_class_change_resolves_again() {
    let registry = registry();
    let person = DefaultEvalContext::new()
        .with_properties(Arc::clone(&registry))
        .with_variable("x", ada());
    let pet = DefaultEvalContext::new()
        .with_properties(Arc::clone(&registry))
        .with_variable("x", Value::object(Pet { name: "Rex".to_string() }));
    let expr = access("x", "name");

    assert_eq!(expr.evaluate(&person).unwrap(), Value::from("Ada"));
    assert_eq!(expr.evaluate(&pet).unwrap(), Value::from("Rex"));
    assert_eq!(registry.lookup_count(), 2);
    assert_eq!(
        property_node(&expr).cached_descriptor().map(|(class, _)| class),
        Some(ElClass::named("Pet"))
    );

    assert_eq!(expr.evaluate(&person).unwrap(), Value::from("Ada"));
    assert_eq!(registry.lookup_count(), 3);
}

#[test]
fn test_nested_access_through_map() {
    let ctx = DefaultEvalContext::new()
        .with_properties(registry())
        .with_variable("p", ada());
    let expr = Expression::new(ExpressionNode::property(
        ExpressionNode::property(ExpressionNode::identifier("p"), "address"),
        "city",
    ));
    assert_eq!(expr.evaluate(&ctx).unwrap(), Value::from("Lyon"));
    assert_eq!(expr.to_string(), "p.address.city");
}

#[test]
fn test_null_owner_yields_null() {
    let registry = registry();
    let ctx = DefaultEvalContext::new().with_properties(Arc::clone(&registry));
    assert_eq!(access("nobody", "name").evaluate(&ctx).unwrap(), Value::Null);
    assert_eq!(registry.lookup_count(), 0);
}

#[test]
fn test_qualified_variable_takes_precedence() {
    let registry = registry();
    let ctx = DefaultEvalContext::new()
        .with_properties(Arc::clone(&registry))
        .with_variable("p", ada())
        .with_variable("p.name", "Countess");
    assert_eq!(access("p", "name").evaluate(&ctx).unwrap(), Value::from("Countess"));
    assert_eq!(registry.lookup_count(), 0);
}

#[test]
fn test_dynamic_getter_then_absent_marker() {
    let registry = registry();
    let bag = Bag {
        attributes: vec![("color", Value::from("red"))],
    };
    let ctx = DefaultEvalContext::new()
        .with_properties(Arc::clone(&registry))
        .with_variable("bag", Value::object(bag));

    assert_eq!(access("bag", "color").evaluate(&ctx).unwrap(), Value::from("red"));
    assert_eq!(registry.lookup_count(), 0);

    let size = access("bag", "size");
    assert_eq!(size.evaluate(&ctx).unwrap(), Value::Null);
    assert_eq!(size.evaluate(&ctx).unwrap(), Value::Null);
    assert_eq!(registry.lookup_count(), 1);
    let (_, descriptor) = property_node(&size).cached_descriptor().unwrap();
    assert!(descriptor.is_absent());
}

#[test]
fn test_property_resolver_bypasses_descriptors() {
    let registry = registry();
    let ctx = DefaultEvalContext::new()
        .with_properties(Arc::clone(&registry))
        .with_variable("settings", Value::object(Settings))
        .with_variable("theme", "dark");

    assert_eq!(access("settings", "theme").evaluate(&ctx).unwrap(), Value::from("dark"));
    assert_eq!(
        access("settings", "locale").evaluate(&ctx).unwrap(),
        Value::from("default-locale")
    );

    let indexed = Expression::new(ExpressionNode::item(
        ExpressionNode::identifier("settings"),
        ExpressionNode::literal("theme"),
    ));
    assert_eq!(indexed.evaluate(&ctx).unwrap(), Value::from("dark"));
    assert_eq!(registry.lookup_count(), 0);
}

#[test]
fn test_missing_property_reports_class() {
    let ctx = DefaultEvalContext::new()
        .with_properties(registry())
        .with_variable("p", ada());
    let expr = access("p", "height");

    let err = expr.evaluate(&ctx).unwrap_err();
    assert_eq!(err.to_string(), "Property 'height' not found on type Person");
    assert!(property_node(&expr).cached_descriptor().is_none());
}

#[test]
fn test_getter_failure_is_wrapped() {
    let ctx = DefaultEvalContext::new()
        .with_properties(registry())
        .with_variable("p", ada());
    let err = access("p", "salary").evaluate(&ctx).unwrap_err();

    assert_eq!(err.to_string(), "Error reading 'salary' on Person(Ada): payroll offline");
    match err.as_evaluation() {
        Some(EvaluationError::PropertyAccess {
            owner,
            property,
            source,
            ..
        }) => {
            assert_eq!(owner, "Person(Ada)");
            assert_eq!(property, "salary");
            assert_eq!(source.to_string(), "payroll offline");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_concurrent_evaluation_shares_one_tree() {
    let registry = registry();
    let ctx = DefaultEvalContext::new()
        .with_properties(Arc::clone(&registry))
        .with_variable("p", ada());
    let expr = access("p", "age");

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..100 {
                    assert_eq!(expr.evaluate(&ctx).unwrap(), Value::Int(36));
                }
            });
        }
    });

    // racing threads may each resolve once, never more
    assert!(registry.lookup_count() >= 1);
    assert!(registry.lookup_count() <= 8);
}

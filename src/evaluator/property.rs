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

//! Property descriptors and the per-class descriptor registry

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use super::context::ElEvalContext;
use super::error::EvaluationResult;
use crate::model::{ElClass, Value};

/// Reusable accessor reading one named property off instances of a class
pub trait ElProperty: Send + Sync + fmt::Debug {
    /// Property name
    fn name(&self) -> &str;

    /// Read the property from `owner`
    fn get_value(&self, ctx: &dyn ElEvalContext, owner: &Value) -> EvaluationResult<Value>;
}

/// Entry of a property node's descriptor cache
#[derive(Debug, Clone)]
pub enum PropertyDescriptor {
    /// Accessor resolved for the cached class
    Resolved(Arc<dyn ElProperty>),
    /// Property is known not to exist on the cached class
    Absent,
}

impl PropertyDescriptor {
    /// Check if this is the absent marker
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

type Getter = dyn Fn(&Value) -> EvaluationResult<Value> + Send + Sync;

/// Closure-backed property accessor
#[derive(Clone)]
pub struct FnProperty {
    name: String,
    getter: Arc<Getter>,
}

impl FnProperty {
    /// Create an accessor named `name`
    pub fn new<F>(name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&Value) -> EvaluationResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            getter: Arc::new(getter),
        }
    }
}

impl fmt::Debug for FnProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProperty").field("name", &self.name).finish()
    }
}

impl ElProperty for FnProperty {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_value(&self, _ctx: &dyn ElEvalContext, owner: &Value) -> EvaluationResult<Value> {
        (self.getter)(owner)
    }
}

/// Concurrent map from `(class, property name)` to accessors
///
/// Stands in for reflective lookup: a miss means the class has no such
/// property. Every lookup is counted so callers can observe how often the
/// slow path runs.
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    descriptors: DashMap<(ElClass, String), Arc<dyn ElProperty>>,
    lookups: AtomicUsize,
}

impl PropertyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an accessor for `class`
    pub fn register(&self, class: ElClass, property: Arc<dyn ElProperty>) {
        let key = (class, property.name().to_string());
        self.descriptors.insert(key, property);
    }

    /// Register a closure-backed accessor for `class`
    pub fn register_property<F>(&self, class: ElClass, name: &str, getter: F)
    where
        F: Fn(&Value) -> EvaluationResult<Value> + Send + Sync + 'static,
    {
        self.register(class, Arc::new(FnProperty::new(name, getter)));
    }

    /// Builder form of [`register_property`](Self::register_property)
    pub fn with_property<F>(self, class: ElClass, name: &str, getter: F) -> Self
    where
        F: Fn(&Value) -> EvaluationResult<Value> + Send + Sync + 'static,
    {
        self.register_property(class, name, getter);
        self
    }

    /// Find the accessor for `name` on `class`
    pub fn lookup(&self, class: &ElClass, name: &str) -> Option<Arc<dyn ElProperty>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.descriptors
            .get(&(class.clone(), name.to_string()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Number of lookups performed so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Number of registered accessors
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::DefaultEvalContext;

    #[test]
    fn test_register_and_lookup() {
        let registry = PropertyRegistry::new().with_property(
            ElClass::named("Point"),
            "x",
            |_| Ok(Value::Int(3)),
        );
        assert_eq!(registry.len(), 1);

        let property = registry.lookup(&ElClass::named("Point"), "x").unwrap();
        assert_eq!(property.name(), "x");
        let ctx = DefaultEvalContext::new();
        assert_eq!(property.get_value(&ctx, &Value::Null).unwrap(), Value::Int(3));

        assert!(registry.lookup(&ElClass::named("Point"), "y").is_none());
        assert!(registry.lookup(&ElClass::named("Line"), "x").is_none());
        assert_eq!(registry.lookup_count(), 3);
    }

    #[test]
    fn test_absent_marker() {
        assert!(PropertyDescriptor::Absent.is_absent());
        let resolved = PropertyDescriptor::Resolved(Arc::new(FnProperty::new("a", |_| Ok(Value::Null))));
        assert!(!resolved.is_absent());
    }
}

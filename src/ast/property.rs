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

//! Property access node with a per-node descriptor cache

use log::{debug, trace};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use super::expression::ExpressionNode;
use super::printer::PrintVisitor;
use crate::evaluator::messages::{NO_SUCH_PROPERTY, PROPERTY_ACCESS};
use crate::evaluator::{ElEvalContext, EvaluationError, EvaluationResult, PropertyDescriptor};
use crate::model::{ElClass, Value};

#[derive(Debug, Clone)]
struct CachedProperty {
    class: ElClass,
    descriptor: PropertyDescriptor,
}

/// `owner.name`
///
/// Resolution order on every evaluation:
/// 1. the qualified name (`owner-text.name`) as a context variable,
/// 2. null owner yields null,
/// 3. map owners are indexed by name,
/// 4. objects resolving their own properties are asked directly,
/// 5. objects with a dynamic getter are asked next, a non-null answer wins,
/// 6. a descriptor for the owner's runtime class, cached on this node.
///
/// The cache holds one class at a time and is replaced when the owner's class
/// changes. Concurrent evaluations may resolve redundantly; a descriptor is
/// only ever used for the class it was resolved for.
#[derive(Debug)]
pub struct PropertyData {
    owner: ExpressionNode,
    name: String,
    qualified: OnceCell<String>,
    cache: RwLock<Option<CachedProperty>>,
}

impl Clone for PropertyData {
    fn clone(&self) -> Self {
        Self::new(self.owner.clone(), self.name.clone())
    }
}

impl PropertyData {
    /// Create a property access node
    pub fn new(owner: ExpressionNode, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
            qualified: OnceCell::new(),
            cache: RwLock::new(None),
        }
    }

    /// Owner expression
    pub fn owner(&self) -> &ExpressionNode {
        &self.owner
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the owner, dropping cached state
    pub fn set_owner(&mut self, owner: ExpressionNode) {
        self.owner = owner;
        self.reset();
    }

    /// Replace the property name, dropping cached state
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.reset();
    }

    fn reset(&mut self) {
        self.qualified = OnceCell::new();
        *self.cache.get_mut() = None;
    }

    /// Owner text followed by `.name`, computed once
    pub fn qualified_name(&self) -> &str {
        self.qualified
            .get_or_init(|| format!("{}.{}", PrintVisitor::render(&self.owner), self.name))
    }

    /// Class and descriptor currently cached on this node
    pub fn cached_descriptor(&self) -> Option<(ElClass, PropertyDescriptor)> {
        self.cache
            .read()
            .as_ref()
            .map(|cached| (cached.class.clone(), cached.descriptor.clone()))
    }

    /// Evaluate the property access
    pub fn eval(&self, ctx: &dyn ElEvalContext) -> EvaluationResult<Value> {
        if let Some(value) = ctx.resolve_variable(self.qualified_name()) {
            if !value.is_null() {
                return Ok(value);
            }
        }

        let owner = self.owner.eval(ctx)?;
        let mut dynamic = false;
        match &owner {
            Value::Null => return Ok(Value::Null),
            Value::Map(map) => return Ok(map.get(&self.name).cloned().unwrap_or_default()),
            Value::Object(obj) => {
                if let Some(resolver) = obj.as_property_resolver() {
                    return resolver.resolve_property(&self.name, ctx);
                }
                if let Some(getter) = obj.as_dynamic_getter() {
                    let value = getter.get_property(&self.name)?;
                    if !value.is_null() {
                        return Ok(value);
                    }
                    dynamic = true;
                }
            }
            _ => {}
        }

        let class = owner.class();
        match self.descriptor(ctx, &owner, &class, dynamic)? {
            PropertyDescriptor::Absent => Ok(Value::Null),
            PropertyDescriptor::Resolved(property) => {
                property.get_value(ctx, &owner).map_err(|cause| {
                    let property_name = Value::from(self.name.as_str());
                    let reason = Value::from(cause.to_string());
                    EvaluationError::PropertyAccess {
                        owner: owner.to_string(),
                        property: self.name.clone(),
                        message: ctx.message(PROPERTY_ACCESS, &[&owner, &property_name, &reason]),
                        source: Box::new(cause),
                    }
                    .into()
                })
            }
        }
    }

    fn descriptor(
        &self,
        ctx: &dyn ElEvalContext,
        owner: &Value,
        class: &ElClass,
        dynamic: bool,
    ) -> EvaluationResult<PropertyDescriptor> {
        if let Some(cached) = self.cache.read().as_ref() {
            if &cached.class == class {
                trace!("property '{}' cache hit for {}", self.name, class);
                return Ok(cached.descriptor.clone());
            }
            debug!(
                "property '{}' owner class changed from {} to {}",
                self.name, cached.class, class
            );
        }

        let descriptor = match ctx.resolve_owner_property(owner, class, &self.name) {
            Some(property) => {
                debug!("resolved property '{}' on {}", self.name, class);
                PropertyDescriptor::Resolved(property)
            }
            None if dynamic => {
                debug!("property '{}' absent on dynamic {}", self.name, class);
                PropertyDescriptor::Absent
            }
            None => {
                let class_name = Value::from(class.to_string());
                let property_name = Value::from(self.name.as_str());
                return Err(EvaluationError::NoSuchProperty {
                    class: class.to_string(),
                    property: self.name.clone(),
                    message: ctx.message(NO_SUCH_PROPERTY, &[&class_name, &property_name]),
                }
                .into());
            }
        };

        *self.cache.write() = Some(CachedProperty {
            class: class.clone(),
            descriptor: descriptor.clone(),
        });
        Ok(descriptor)
    }
}

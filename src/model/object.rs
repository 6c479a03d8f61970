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

//! Host object capabilities
//!
//! Embedders expose their own types to expressions by implementing [`ElObject`].
//! Optional capabilities are discovered through the `as_*` accessors instead of
//! downcasting, so an object opts into property resolution, dynamic lookup or
//! ordering by returning `Some(self)`.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use super::types::ElClass;
use super::value::Value;
use crate::evaluator::{ElEvalContext, EvaluationResult};

/// A host object living inside a [`Value::Object`]
pub trait ElObject: fmt::Debug + Send + Sync {
    /// Runtime class used to look up property descriptors
    fn class(&self) -> ElClass;

    /// Access the concrete type
    fn as_any(&self) -> &dyn Any;

    /// Object resolves its own properties
    fn as_property_resolver(&self) -> Option<&dyn PropertyResolver> {
        None
    }

    /// Object supports by-name lookup of properties unknown to the class
    fn as_dynamic_getter(&self) -> Option<&dyn DynamicGetter> {
        None
    }

    /// Object has a natural ordering against other values
    fn as_comparable(&self) -> Option<&dyn ElComparable> {
        None
    }

    /// Native equality against another value
    fn equals_value(&self, _other: &Value) -> bool {
        false
    }

    /// Text form used by string concatenation and rendering
    fn to_el_string(&self) -> String {
        format!("{self:?}")
    }
}

/// Object that answers property reads itself, bypassing descriptor lookup
pub trait PropertyResolver {
    /// Resolve `name` on this object
    fn resolve_property(&self, name: &str, ctx: &dyn ElEvalContext) -> EvaluationResult<Value>;
}

/// Object with by-name access for properties that have no descriptor
///
/// Returning [`Value::Null`] means "not found" and lets descriptor lookup run.
pub trait DynamicGetter {
    /// Look up `name`
    fn get_property(&self, name: &str) -> EvaluationResult<Value>;
}

/// Object with a natural ordering
pub trait ElComparable {
    /// Compare this object with `other`; `None` if they are not comparable
    fn compare_to(&self, other: &Value) -> Option<Ordering>;
}

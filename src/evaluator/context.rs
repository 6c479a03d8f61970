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

//! Evaluation context consumed by the expression tree
//!
//! The tree never looks anything up on its own. Variables, property
//! descriptors, truthiness, text rendering, conversion and error messages all
//! come from an [`ElEvalContext`] supplied by the embedder.

use std::sync::Arc;

use num_traits::Zero;
use rustc_hash::FxHashMap;

use super::config::ContextConfig;
use super::error::{EvaluationError, EvaluationResult};
use super::messages::{CANNOT_CONVERT, MessageBundle};
use super::property::{ElProperty, PropertyRegistry};
use crate::model::{ElClass, EnumValue, TypeCoercion, Value};

/// Capabilities the evaluator needs from its host
pub trait ElEvalContext {
    /// Look up a variable by (possibly qualified) name
    fn resolve_variable(&self, name: &str) -> Option<Value>;

    /// Resolve the accessor for `name` on `class`
    fn resolve_property(&self, class: &ElClass, name: &str) -> Option<Arc<dyn ElProperty>>;

    /// Resolve the accessor for `name` given the owner instance
    fn resolve_owner_property(
        &self,
        _owner: &Value,
        class: &ElClass,
        name: &str,
    ) -> Option<Arc<dyn ElProperty>> {
        self.resolve_property(class, name)
    }

    /// Truthiness predicate used by logical operators and the choice node
    fn test(&self, value: &Value) -> bool {
        is_truthy(value)
    }

    /// Text used for string concatenation and string coercion
    fn format_value(&self, value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Convert a value to a target class
    fn convert(&self, value: &Value, target: &ElClass) -> EvaluationResult<Value> {
        coerce_with(self, value, target)
    }

    /// Localized message for an error key
    fn message(&self, key: &str, args: &[&Value]) -> String {
        MessageBundle::default_bundle().format(key, args)
    }
}

fn coerce_with<C: ElEvalContext + ?Sized>(
    ctx: &C,
    value: &Value,
    target: &ElClass,
) -> EvaluationResult<Value> {
    TypeCoercion::coerce_to(value, target).map_err(|err| {
        let target_name = Value::from(target.to_string());
        let cause = Value::from(err.to_string());
        EvaluationError::Conversion {
            message: ctx.message(CANNOT_CONVERT, &[value, &target_name, &cause]),
        }
        .into()
    })
}

/// Default truthiness
///
/// Null is false, booleans are themselves, numbers are true when non-zero,
/// strings when non-empty and not `"false"`, containers when non-empty.
/// Everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    truthiness(value, true)
}

fn truthiness(value: &Value, false_string_is_falsy: bool) -> bool {
    match value {
        Value::Null => false,
        Value::Boolean(b) => *b,
        Value::Char(c) => *c != '\0',
        Value::Byte(v) => *v != 0,
        Value::Short(v) => *v != 0,
        Value::Int(v) => *v != 0,
        Value::Long(v) => *v != 0,
        Value::Float(v) => *v != 0.0,
        Value::Double(v) => *v != 0.0,
        Value::BigInteger(v) => v.sign() != num_bigint::Sign::NoSign,
        Value::BigDecimal(v) => !v.is_zero(),
        Value::String(s) => !s.is_empty() && !(false_string_is_falsy && s.eq_ignore_ascii_case("false")),
        Value::List(items) => !items.is_empty(),
        Value::Map(map) => !map.is_empty(),
        Value::Enum(_) | Value::Object(_) => true,
    }
}

/// Context backed by in-memory variables and a property registry
///
/// # Examples
///
/// ```rust
/// use octofhir_spel::evaluator::{DefaultEvalContext, ElEvalContext};
/// use octofhir_spel::model::Value;
///
/// let ctx = DefaultEvalContext::new().with_variable("answer", 42i64);
/// assert_eq!(ctx.resolve_variable("answer"), Some(Value::Long(42)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultEvalContext {
    variables: FxHashMap<String, Value>,
    properties: Arc<PropertyRegistry>,
    enums: FxHashMap<String, Vec<Arc<str>>>,
    config: ContextConfig,
}

impl DefaultEvalContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_variable(name, value);
        self
    }

    /// Add several variables
    pub fn with_variables<I, K, V>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in variables {
            self.set_variable(name, value);
        }
        self
    }

    /// Set a variable in place
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Use a shared property registry
    pub fn with_properties(mut self, properties: Arc<PropertyRegistry>) -> Self {
        self.properties = properties;
        self
    }

    /// Register an enumeration type, constants in ordinal order
    pub fn with_enum<I, S>(mut self, type_name: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        self.enums
            .insert(type_name.into(), constants.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Property registry backing descriptor resolution
    pub fn properties(&self) -> &Arc<PropertyRegistry> {
        &self.properties
    }

    /// Active configuration
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Constant `name` of a registered enumeration
    pub fn enum_constant(&self, type_name: &str, name: &str) -> Option<Value> {
        let constants = self.enums.get(type_name)?;
        let ordinal = constants.iter().position(|c| c.as_ref() == name)?;
        Some(Value::Enum(EnumValue::new(
            type_name,
            Arc::clone(&constants[ordinal]),
            ordinal as u32,
        )))
    }

    fn enum_by_ordinal(&self, type_name: &str, ordinal: i64) -> Option<Value> {
        let constants = self.enums.get(type_name)?;
        let index = usize::try_from(ordinal).ok()?;
        let name = constants.get(index)?;
        Some(Value::Enum(EnumValue::new(
            type_name,
            Arc::clone(name),
            index as u32,
        )))
    }
}

impl ElEvalContext for DefaultEvalContext {
    fn resolve_variable(&self, name: &str) -> Option<Value> {
        self.variables.get(name).cloned()
    }

    fn resolve_property(&self, class: &ElClass, name: &str) -> Option<Arc<dyn ElProperty>> {
        self.properties.lookup(class, name)
    }

    fn test(&self, value: &Value) -> bool {
        truthiness(value, self.config.false_string_is_falsy)
    }

    fn convert(&self, value: &Value, target: &ElClass) -> EvaluationResult<Value> {
        if let ElClass::Enum(type_name) = target {
            let converted = match value {
                Value::Enum(e) if &e.type_name == type_name => Some(value.clone()),
                Value::String(s) => self.enum_constant(type_name, s.trim()),
                Value::Null => Some(Value::Null),
                other => other
                    .long_value()
                    .and_then(|ordinal| self.enum_by_ordinal(type_name, ordinal)),
            };
            if let Some(converted) = converted {
                return Ok(converted);
            }
        }
        coerce_with(self, value, target)
    }

    fn message(&self, key: &str, args: &[&Value]) -> String {
        self.config.messages.format(key, args)
    }
}

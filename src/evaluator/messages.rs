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

//! Localized error message templates
//!
//! Templates use positional placeholders (`{0}`, `{1}`, ...) that are
//! replaced with the display text of the arguments.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::model::Value;

/// Relational comparison of unordered operands: `{0}` left, `{1}` right
pub const VALUES_NOT_COMPARABLE: &str = "el.errors.valuesNotComparable";
/// Unary minus on an unsupported value: `{0}` operand
pub const CANNOT_APPLY_MINUS: &str = "el.errors.cannotApplyMinusOperatorTo";
/// Property not found: `{0}` owner class, `{1}` property
pub const NO_SUCH_PROPERTY: &str = "el.errors.noSuchProperty";
/// Getter failure: `{0}` owner, `{1}` property, `{2}` cause
pub const PROPERTY_ACCESS: &str = "el.errors.propertyAccess";
/// Conversion failure: `{0}` value, `{1}` target class, `{2}` cause
pub const CANNOT_CONVERT: &str = "el.errors.cannotConvert";
/// Division or remainder by zero: `{0}` dividend, `{1}` divisor
pub const DIVISION_BY_ZERO: &str = "el.errors.divisionByZero";
/// Indexed access on a non-container: `{0}` value, `{1}` index
pub const NOT_INDEXABLE: &str = "el.errors.notIndexable";

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    (VALUES_NOT_COMPARABLE, "Values {0} and {1} are not comparable"),
    (CANNOT_APPLY_MINUS, "Cannot apply '-' operator to {0}"),
    (NO_SUCH_PROPERTY, "Property '{1}' not found on type {0}"),
    (PROPERTY_ACCESS, "Error reading '{1}' on {0}: {2}"),
    (CANNOT_CONVERT, "Cannot convert {0} to {1}: {2}"),
    (DIVISION_BY_ZERO, "Division by zero: {0} / {1}"),
    (NOT_INDEXABLE, "Cannot index {0} with {1}"),
];

static DEFAULT_BUNDLE: Lazy<MessageBundle> = Lazy::new(MessageBundle::new);

/// Key to template lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct MessageBundle {
    templates: FxHashMap<String, String>,
}

impl Default for MessageBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBundle {
    /// Bundle with the English defaults
    pub fn new() -> Self {
        let templates = DEFAULT_TEMPLATES
            .iter()
            .map(|(key, template)| (key.to_string(), template.to_string()))
            .collect();
        Self { templates }
    }

    /// Shared instance holding the English defaults
    pub fn default_bundle() -> &'static MessageBundle {
        &DEFAULT_BUNDLE
    }

    /// Override one template
    pub fn with_message(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.set_message(key, template);
        self
    }

    /// Override one template in place
    pub fn set_message(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(key.into(), template.into());
    }

    /// Defaults overridden by the string members of a JSON object
    ///
    /// Non-string members are ignored. Anything other than an object yields
    /// the defaults.
    pub fn from_json(json: &serde_json::Value) -> Self {
        let mut bundle = Self::new();
        if let Some(entries) = json.as_object() {
            for (key, template) in entries {
                if let Some(template) = template.as_str() {
                    bundle.set_message(key.clone(), template);
                }
            }
        }
        bundle
    }

    /// Raw template for a key
    pub fn template(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// Render the message for `key`
    pub fn format(&self, key: &str, args: &[&Value]) -> String {
        match self.templates.get(key) {
            Some(template) => substitute(template, args),
            None if args.is_empty() => key.to_string(),
            None => {
                let rendered: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
                format!("{key}: {}", rendered.join(", "))
            }
        }
    }
}

fn substitute(template: &str, args: &[&Value]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let index = tail
            .find('}')
            .and_then(|close| tail[..close].parse::<usize>().ok().map(|i| (i, close)));
        match index {
            Some((i, close)) if i < args.len() => {
                out.push_str(&args[i].to_string());
                rest = &tail[close + 1..];
            }
            _ => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_templates() {
        let bundle = MessageBundle::new();
        assert_eq!(
            bundle.format(VALUES_NOT_COMPARABLE, &[&Value::Int(1), &Value::from("a")]),
            "Values 1 and a are not comparable"
        );
        assert_eq!(
            bundle.format(CANNOT_APPLY_MINUS, &[&Value::Boolean(true)]),
            "Cannot apply '-' operator to true"
        );
    }

    #[test]
    fn test_unknown_key_and_placeholders() {
        let bundle = MessageBundle::new().with_message("custom", "{1}-{0}-{5}");
        assert_eq!(
            bundle.format("custom", &[&Value::Int(1), &Value::Int(2)]),
            "2-1-{5}"
        );
        assert_eq!(bundle.format("missing", &[]), "missing");
        assert_eq!(bundle.format("missing", &[&Value::Int(7)]), "missing: 7");
    }

    #[test]
    fn test_json_overrides() {
        let bundle = MessageBundle::from_json(&json!({
            "el.errors.noSuchProperty": "Keine Eigenschaft {1}",
            "ignored": 5
        }));
        assert_eq!(
            bundle.format(NO_SUCH_PROPERTY, &[&Value::from("User"), &Value::from("x")]),
            "Keine Eigenschaft x"
        );
        assert!(bundle.template("ignored").is_none());
    }
}

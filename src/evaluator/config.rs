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

//! Configuration for the default evaluation context

use std::sync::Arc;

use super::messages::MessageBundle;

/// Default evaluation context configuration
///
/// # Examples
///
/// ```rust
/// use octofhir_spel::evaluator::{ContextConfig, MessageBundle};
///
/// let config = ContextConfig::default()
///     .with_false_string_is_falsy(false)
///     .with_messages(MessageBundle::new().with_message("el.errors.noSuchProperty", "no {1}"));
/// assert!(!config.false_string_is_falsy);
/// ```
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Message templates used for error text
    pub messages: Arc<MessageBundle>,

    /// Treat the string `"false"` (any case) as falsy. Default: true
    pub false_string_is_falsy: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            messages: Arc::new(MessageBundle::new()),
            false_string_is_falsy: true,
        }
    }
}

impl ContextConfig {
    /// Create new configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message bundle
    pub fn with_messages(mut self, messages: MessageBundle) -> Self {
        self.messages = Arc::new(messages);
        self
    }

    /// Set whether `"false"` is falsy
    pub fn with_false_string_is_falsy(mut self, enabled: bool) -> Self {
        self.false_string_is_falsy = enabled;
        self
    }
}

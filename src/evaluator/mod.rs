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

//! Expression evaluation support
//!
//! This module provides the evaluation context the tree runs against, the
//! coercion engine implementing operator semantics, property descriptors, and
//! the error types raised during evaluation.

pub mod coerce;
mod config;
mod context;
mod error;
pub mod messages;
pub mod operations;
mod property;

pub use config::ContextConfig;
pub use context::{DefaultEvalContext, ElEvalContext, is_truthy};
pub use error::{ElError, EvaluationError, EvaluationResult};
pub use messages::MessageBundle;
pub use property::{ElProperty, FnProperty, PropertyDescriptor, PropertyRegistry};

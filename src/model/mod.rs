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

//! Data model for expression values
//!
//! This module provides the runtime value type, the static class model with
//! its rank table, host object capabilities, and the conversion service.

pub mod object;
pub mod type_coercion;
pub mod types;
pub mod value;

pub use object::{DynamicGetter, ElComparable, ElObject, PropertyResolver};
pub use type_coercion::{CoercionError, CoercionResult, TypeCoercion};
pub use types::{ElClass, TypeRank};
pub use value::{EnumValue, Value, ValueMap};

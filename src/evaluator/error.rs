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

// Error types for expression evaluation

use thiserror::Error;

/// Result type for evaluation operations
pub type EvaluationResult<T> = Result<T, ElError>;

/// Top-level failure of an expression evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElError {
    /// Operator exists in the grammar but has no runtime semantics
    #[error("'{operator}' operator not supported now")]
    UnsupportedOperator {
        /// Operator literal
        operator: &'static str,
    },

    /// Data-dependent evaluation failure
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

impl ElError {
    /// Create an unsupported operator error
    pub fn unsupported(operator: &'static str) -> Self {
        Self::UnsupportedOperator { operator }
    }

    /// Check if this is an unsupported operator failure
    pub fn is_unsupported_operator(&self) -> bool {
        matches!(self, Self::UnsupportedOperator { .. })
    }

    /// Borrow the evaluation error, if any
    pub fn as_evaluation(&self) -> Option<&EvaluationError> {
        match self {
            Self::Evaluation(err) => Some(err),
            Self::UnsupportedOperator { .. } => None,
        }
    }
}

/// Errors that depend on the evaluated data
///
/// Messages are already localized through the context's message bundle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// Property resolution exhausted every strategy
    #[error("{message}")]
    NoSuchProperty {
        /// Owner class name
        class: String,
        /// Property name
        property: String,
        /// Localized message
        message: String,
    },

    /// Relational comparison of unordered operands
    #[error("{message}")]
    ValuesNotComparable {
        /// Localized message
        message: String,
    },

    /// Unary minus applied to a non-numeric value
    #[error("{message}")]
    CannotApplyMinus {
        /// Localized message
        message: String,
    },

    /// Property getter failed
    #[error("{message}")]
    PropertyAccess {
        /// Owner rendered as text
        owner: String,
        /// Property name
        property: String,
        /// Localized message
        message: String,
        /// Original failure
        #[source]
        source: Box<ElError>,
    },

    /// Value could not be converted to the requested class
    #[error("{message}")]
    Conversion {
        /// Localized message
        message: String,
    },

    /// Division or remainder by zero
    #[error("{message}")]
    Arithmetic {
        /// Localized message
        message: String,
    },

    /// Indexed access on a value that has no elements
    #[error("{message}")]
    NotIndexable {
        /// Localized message
        message: String,
    },
}

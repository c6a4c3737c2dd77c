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
//
// SPDX-License-Identifier: Apache-2.0
//! # Attribute mapping errors
use thiserror::Error;

/// The attribute mapper could not classify the data.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MappingError {
    /// Attributes of a resource must be a JSON object.
    #[error("expected the attributes of {kind} to be an object, got {found}")]
    InvalidInput { kind: &'static str, found: String },

    /// An object value arrived under a key without registered resource kind.
    #[error("no nested resource registered for `{key}` of {kind}")]
    UnknownNestedType { kind: &'static str, key: String },

    /// A path placeholder can not be substituted.
    #[error("missing prefix parameter `{0}`")]
    MissingScope(String),

    /// A required attribute is absent.
    #[error("attribute `{attribute}` of {kind} is missing")]
    MissingAttribute {
        kind: &'static str,
        attribute: String,
    },

    /// An attribute has a value of an unexpected shape.
    #[error("attribute `{attribute}` of {kind} is invalid: {reason}")]
    InvalidAttribute {
        kind: &'static str,
        attribute: String,
        reason: String,
    },
}

/// Short description of the JSON value type for error messages.
pub(crate) fn json_type(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
    .to_string()
}

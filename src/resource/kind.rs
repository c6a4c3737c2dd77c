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
//! # Resource kinds
//!
//! Static per-kind registry driving the path resolver and the attribute
//! mapper.
use std::fmt;

use serde_json::{Map, Value};

use super::error::MappingError;
use crate::path::prefix_parameters;
use crate::session::ServiceName;

/// Resolve the kind of nested objects found under an attribute.
pub type NestedLookup = fn(&str) -> Option<&'static ResourceKind>;

/// Rewrite the raw attributes of a resource into their canonical shape.
pub type Normalizer = fn(Map<String, Value>) -> Result<Map<String, Value>, MappingError>;

/// Description of a remote resource kind.
#[derive(Clone, Copy)]
pub struct ResourceKind {
    /// Service hosting the resource.
    pub service: ServiceName,
    /// Root key of a single element (`server`).
    pub element_name: &'static str,
    /// Path segment of the collection (`servers`, `os-keypairs`).
    pub collection_name: &'static str,
    /// Root key of a list response (`servers`, `keypairs`).
    pub collection_key: &'static str,
    /// Attribute identifying a persisted element.
    pub primary_key: &'static str,
    /// Path template placed between the service prefix and the collection
    /// (`servers/:server_id/`).
    pub prefix_template: &'static str,
    /// Whether listing uses `{collection}/detail`.
    pub detail: bool,
    pub key_to_nested_type: NestedLookup,
    pub decode_normalize: Normalizer,
}

impl ResourceKind {
    pub const fn new(
        service: ServiceName,
        element_name: &'static str,
        collection_name: &'static str,
    ) -> Self {
        Self {
            service,
            element_name,
            collection_name,
            collection_key: collection_name,
            primary_key: "id",
            prefix_template: "",
            detail: false,
            key_to_nested_type: no_nested,
            decode_normalize: keep_attributes,
        }
    }

    pub const fn with_collection_key(self, collection_key: &'static str) -> Self {
        Self {
            collection_key,
            ..self
        }
    }

    pub const fn with_primary_key(self, primary_key: &'static str) -> Self {
        Self {
            primary_key,
            ..self
        }
    }

    pub const fn with_prefix(self, prefix_template: &'static str) -> Self {
        Self {
            prefix_template,
            ..self
        }
    }

    pub const fn with_detail(self) -> Self {
        Self {
            detail: true,
            ..self
        }
    }

    pub const fn with_nested(self, key_to_nested_type: NestedLookup) -> Self {
        Self {
            key_to_nested_type,
            ..self
        }
    }

    pub const fn with_normalizer(self, decode_normalize: Normalizer) -> Self {
        Self {
            decode_normalize,
            ..self
        }
    }

    /// Kind of the nested objects under `key`.
    pub fn nested(&self, key: &str) -> Result<&'static ResourceKind, MappingError> {
        (self.key_to_nested_type)(key).ok_or_else(|| MappingError::UnknownNestedType {
            kind: self.element_name,
            key: key.to_string(),
        })
    }

    pub fn normalize(&self, raw: Map<String, Value>) -> Result<Map<String, Value>, MappingError> {
        (self.decode_normalize)(raw)
    }

    /// Placeholder names of the prefix template.
    pub fn prefix_parameters(&self) -> Vec<&'static str> {
        prefix_parameters(self.prefix_template)
    }
}

impl fmt::Debug for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceKind")
            .field("service", &self.service)
            .field("element_name", &self.element_name)
            .field("collection_name", &self.collection_name)
            .field("prefix_template", &self.prefix_template)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ResourceKind {
    fn eq(&self, other: &Self) -> bool {
        self.service == other.service
            && self.element_name == other.element_name
            && self.collection_name == other.collection_name
            && self.prefix_template == other.prefix_template
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name)
    }
}

/// Kind without nested resources.
pub fn no_nested(_key: &str) -> Option<&'static ResourceKind> {
    None
}

/// Normalizer keeping the attributes untouched.
pub fn keep_attributes(raw: Map<String, Value>) -> Result<Map<String, Value>, MappingError> {
    Ok(raw)
}

/// Move the value of `from` to `to` unless `to` is already present.
pub(crate) fn rename(map: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = map.remove(from) {
        if !map.contains_key(to) {
            map.insert(to.to_string(), value);
        }
    }
}

/// Replace the object under `key` with its `id` (stored under `to`).
///
/// `{"image": {"id": "i1", "links": [...]}}` becomes `{"image_id": "i1"}`.
pub(crate) fn flatten_id(map: &mut Map<String, Value>, key: &str, to: &str) {
    match map.remove(key) {
        Some(Value::Object(mut inner)) => {
            if let Some(id) = inner.remove("id") {
                map.insert(to.to_string(), id);
            }
        }
        Some(Value::Null) | None => {}
        Some(Value::String(s)) if s.is_empty() => {}
        Some(scalar @ (Value::String(_) | Value::Number(_))) => {
            map.insert(to.to_string(), scalar);
        }
        Some(_) => {}
    }
}

/// Keep only the listed attributes.
pub(crate) fn retain(map: &mut Map<String, Value>, keys: &[&str]) {
    map.retain(|key, _| keys.contains(&key.as_str()));
}

/// Kind of free form provider maps (metadata, addresses, links) which are
/// not resources on their own. Any nested object is free form as well.
pub static FREE_FORM: ResourceKind =
    ResourceKind::new(ServiceName::Compute, "attributes", "attributes")
        .with_nested(free_form_nested);

fn free_form_nested(_key: &str) -> Option<&'static ResourceKind> {
    Some(&FREE_FORM)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    static THING: ResourceKind = ResourceKind::new(ServiceName::Compute, "thing", "things")
        .with_prefix("servers/:server_id/")
        .with_detail();

    #[test]
    fn test_defaults() {
        let kind = ResourceKind::new(ServiceName::Volume, "volume", "volumes");
        assert_eq!("volumes", kind.collection_key);
        assert_eq!("id", kind.primary_key);
        assert!(!kind.detail);
        assert!(kind.prefix_parameters().is_empty());
        assert!(kind.nested("anything").is_err());
    }

    #[test]
    fn test_builder() {
        assert!(THING.detail);
        assert_eq!(vec!["server_id"], THING.prefix_parameters());
        assert_eq!("thing", THING.to_string());
    }

    #[test]
    fn test_flatten_id() {
        let mut map = json!({"image": {"id": "i1", "links": []}, "flavor": "f1", "key": null})
            .as_object()
            .cloned()
            .unwrap();
        flatten_id(&mut map, "image", "image_id");
        flatten_id(&mut map, "flavor", "flavor_id");
        flatten_id(&mut map, "key", "key_id");
        assert_eq!(json!({"image_id": "i1", "flavor_id": "f1"}), Value::Object(map));
    }

    #[test]
    fn test_rename_keeps_canonical() {
        let mut map = json!({"tenantId": "a", "tenant_id": "b"})
            .as_object()
            .cloned()
            .unwrap();
        rename(&mut map, "tenantId", "tenant_id");
        assert_eq!(json!({"tenant_id": "b"}), Value::Object(map));
    }
}

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
//! # Entity
//!
//! The generic in-memory shape of a remote resource and the loader turning
//! raw JSON into entity graphs.
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::trace;

use super::ResourceKind;
use super::error::{MappingError, json_type};
use crate::path::Scope;

/// Value of a single attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    /// Scalar JSON value.
    Value(Value),
    /// Nested resource.
    Resource(Entity),
    /// Sequence of scalars and/or nested resources.
    List(Vec<Attribute>),
}

impl Attribute {
    /// Back to plain JSON.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Resource(entity) => entity.to_json(),
            Self::List(items) => Value::Array(items.iter().map(Attribute::to_json).collect()),
        }
    }
}

/// Attributes in the order they arrived.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes(Vec<(String, Attribute)>);

impl Attributes {
    pub fn get(&self, key: &str) -> Option<&Attribute> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Set the attribute keeping the position of an existing key.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: Attribute) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Attribute> {
        let pos = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(pos).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Generic resource: attributes plus the identifiers of the parents.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    kind: &'static ResourceKind,
    attributes: Attributes,
    prefix_options: Scope,
}

impl Entity {
    /// New, not persisted entity.
    pub fn new(kind: &'static ResourceKind) -> Self {
        Self {
            kind,
            attributes: Attributes::default(),
            prefix_options: Scope::default(),
        }
    }

    /// Load raw JSON into an entity of the kind.
    ///
    /// With `remove_root` an object with exactly one key equal to the element
    /// name of the kind is unwrapped first. The kind normalizer runs before
    /// the prefix parameters are moved into the prefix options. Remaining
    /// values are classified: objects become nested entities of the kind
    /// registered for the key, arrays are classified element by element and
    /// scalars are copied.
    pub fn load(
        kind: &'static ResourceKind,
        raw: Value,
        remove_root: bool,
    ) -> Result<Self, MappingError> {
        let mut map = match raw {
            Value::Object(map) => map,
            other => {
                return Err(MappingError::InvalidInput {
                    kind: kind.element_name,
                    found: json_type(&other),
                });
            }
        };
        if remove_root && map.len() == 1 && map.contains_key(kind.element_name) {
            match map.remove(kind.element_name) {
                Some(Value::Object(inner)) => map = inner,
                Some(other) => {
                    return Err(MappingError::InvalidInput {
                        kind: kind.element_name,
                        found: json_type(&other),
                    });
                }
                None => {}
            }
        }

        let mut map = kind.normalize(map)?;
        let mut entity = Self::new(kind);
        for param in kind.prefix_parameters() {
            if let Some(value) = map.remove(param) {
                if let Some(value) = scalar_string(&value) {
                    entity.prefix_options.insert(param, value);
                }
            }
        }
        for (key, value) in map {
            let attribute = load_value(kind, &key, value)?;
            entity.attributes.insert(key, attribute);
        }
        trace!(kind = kind.element_name, id = ?entity.id(), "entity loaded");
        Ok(entity)
    }

    pub fn kind(&self) -> &'static ResourceKind {
        self.kind
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Value of the primary key.
    pub fn id(&self) -> Option<String> {
        match self.attributes.get(self.kind.primary_key)? {
            Attribute::Value(value) => scalar_string(value),
            _ => None,
        }
    }

    /// Whether the entity exists remotely.
    pub fn persisted(&self) -> bool {
        self.id().is_some()
    }

    pub fn prefix_options(&self) -> &Scope {
        &self.prefix_options
    }

    pub fn prefix_options_mut(&mut self) -> &mut Scope {
        &mut self.prefix_options
    }

    pub fn set<K: Into<String>>(&mut self, key: K, value: Attribute) {
        self.attributes.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&Attribute> {
        self.attributes.get(key)
    }

    /// Scalar value of the attribute. `null` is reported as absent.
    pub fn value(&self, key: &str) -> Option<&Value> {
        match self.attributes.get(key)? {
            Attribute::Value(Value::Null) => None,
            Attribute::Value(value) => Some(value),
            _ => None,
        }
    }

    /// String form of a scalar attribute.
    pub fn string(&self, key: &str) -> Option<String> {
        self.value(key).and_then(scalar_string)
    }

    pub fn integer(&self, key: &str) -> Result<Option<i64>, MappingError> {
        let Some(value) = self.value(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            }),
            Value::String(s) if s.trim().is_empty() => return Ok(None),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| self.invalid(key, format!("expected an integer, got {value}")))
    }

    pub fn float(&self, key: &str) -> Result<Option<f64>, MappingError> {
        let Some(value) = self.value(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if s.trim().is_empty() => return Ok(None),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| self.invalid(key, format!("expected a number, got {value}")))
    }

    pub fn boolean(&self, key: &str) -> Result<Option<bool>, MappingError> {
        let Some(value) = self.value(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| self.invalid(key, format!("expected a boolean, got {value}")))
    }

    pub fn datetime(&self, key: &str) -> Result<Option<DateTime<Utc>>, MappingError> {
        let Some(value) = self.value(key) else {
            return Ok(None);
        };
        match value {
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => parse_timestamp(s)
                .map(Some)
                .ok_or_else(|| self.invalid(key, format!("unparsable timestamp `{s}`"))),
            other => Err(self.invalid(key, format!("expected a timestamp, got {other}"))),
        }
    }

    /// Nested entity under the key.
    pub fn entity(&self, key: &str) -> Option<&Entity> {
        match self.attributes.get(key)? {
            Attribute::Resource(entity) => Some(entity),
            _ => None,
        }
    }

    /// Nested entities of a list (or of a single nested entity).
    pub fn entities(&self, key: &str) -> Vec<&Entity> {
        match self.attributes.get(key) {
            Some(Attribute::List(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Attribute::Resource(entity) => Some(entity),
                    _ => None,
                })
                .collect(),
            Some(Attribute::Resource(entity)) => vec![entity],
            _ => Vec::new(),
        }
    }

    /// Scalars of a list as strings.
    pub fn strings(&self, key: &str) -> Vec<String> {
        match self.attributes.get(key) {
            Some(Attribute::List(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Attribute::Value(value) => scalar_string(value),
                    _ => None,
                })
                .collect(),
            Some(Attribute::Value(value)) => scalar_string(value).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Required string attribute.
    pub fn require_string(&self, key: &str) -> Result<String, MappingError> {
        self.string(key)
            .ok_or_else(|| MappingError::MissingAttribute {
                kind: self.kind.element_name,
                attribute: key.to_string(),
            })
    }

    /// Attributes as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_json()))
                .collect::<Map<String, Value>>(),
        )
    }

    fn invalid(&self, key: &str, reason: String) -> MappingError {
        MappingError::InvalidAttribute {
            kind: self.kind.element_name,
            attribute: key.to_string(),
            reason,
        }
    }
}

fn load_value(
    kind: &'static ResourceKind,
    key: &str,
    value: Value,
) -> Result<Attribute, MappingError> {
    match value {
        Value::Array(items) => {
            let mut nested_kind = None;
            let mut loaded = Vec::with_capacity(items.len());
            for item in items {
                if item.is_object() {
                    let nested = match nested_kind {
                        Some(nested) => nested,
                        None => {
                            let nested = kind.nested(key)?;
                            nested_kind = Some(nested);
                            nested
                        }
                    };
                    loaded.push(Attribute::Resource(Entity::load(nested, item, false)?));
                } else {
                    loaded.push(Attribute::Value(item));
                }
            }
            Ok(Attribute::List(loaded))
        }
        Value::Object(_) => Ok(Attribute::Resource(Entity::load(
            kind.nested(key)?,
            value,
            false,
        )?)),
        scalar => Ok(Attribute::Value(scalar)),
    }
}

/// Identifier like representation of a scalar.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse the provider timestamps (`2012-10-08T20:10:44Z`,
/// `2012-10-08T20:10:44.587336`, `2012-10-08 20:10:44`, RFC 3339 with an
/// offset). Timestamps without offset are UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = value.trim_end_matches('Z');
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .map(|dt| dt.and_utc())
}

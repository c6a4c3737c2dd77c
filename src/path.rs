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
//! # Path resolution
//!
//! Collection, element and action paths of the resource kinds. Paths are
//! absolute (`/v2/t1/servers/detail`) and are joined with the base URL of the
//! service by the connection. No format suffix is ever appended.
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::error::OpenStackError;
use crate::resource::ResourceKind;
use crate::resource::error::MappingError;
use crate::session::Session;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":(\w+)").unwrap());

/// Names of the `:name` placeholders of a path template in order.
pub fn prefix_parameters(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
        .collect()
}

/// Identifiers of the parent resources (`server_id`, `tenant_id`, ...).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Scope(BTreeMap<String, String>);

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Add the entries of `other` which are not set yet.
    pub fn merge(&mut self, other: &Scope) {
        for (key, value) in other.iter() {
            self.0
                .entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Scope {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Query parameters. Keys are kept sorted.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Query(BTreeMap<String, String>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    pub fn insert<K: Into<String>, V: ToString>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `?a=1&b=2`, or an empty string without parameters.
    pub fn to_query_string(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish();
        format!("?{encoded}")
    }
}

impl<'a> IntoIterator for &'a Query {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Path builder bound to the endpoints of a session.
#[derive(Clone, Copy, Debug)]
pub struct PathResolver<'a> {
    session: &'a Session,
}

impl<'a> PathResolver<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Service prefix followed by the substituted template of the kind.
    pub fn prefix(&self, kind: &ResourceKind, scope: &Scope) -> Result<String, OpenStackError> {
        let mut prefix = self.session.prefix(kind.service)?.to_string();
        prefix.push_str(&substitute(kind.prefix_template, scope)?);
        Ok(prefix)
    }

    /// Listing path. Detail kinds are listed through `{collection}/detail`.
    pub fn collection_path(
        &self,
        kind: &ResourceKind,
        scope: &Scope,
        query: &Query,
    ) -> Result<String, OpenStackError> {
        let detail = if kind.detail { "/detail" } else { "" };
        let path = format!(
            "{}{}{}{}",
            self.prefix(kind, scope)?,
            kind.collection_name,
            detail,
            query.to_query_string()
        );
        trace!(%path, "collection path");
        Ok(path)
    }

    /// Creation path, always the plain collection.
    pub fn create_path(
        &self,
        kind: &ResourceKind,
        scope: &Scope,
        query: &Query,
    ) -> Result<String, OpenStackError> {
        Ok(format!(
            "{}{}{}",
            self.prefix(kind, scope)?,
            kind.collection_name,
            query.to_query_string()
        ))
    }

    pub fn element_path(
        &self,
        kind: &ResourceKind,
        id: &str,
        scope: &Scope,
        query: &Query,
    ) -> Result<String, OpenStackError> {
        let path = format!(
            "{}{}/{}{}",
            self.prefix(kind, scope)?,
            kind.collection_name,
            urlencoding::encode(id),
            query.to_query_string()
        );
        trace!(%path, "element path");
        Ok(path)
    }

    /// `{collection}/{action}` (e.g. `os-simple-tenant-usage` extras).
    pub fn custom_action_path(
        &self,
        kind: &ResourceKind,
        action: &str,
        scope: &Scope,
        query: &Query,
    ) -> Result<String, OpenStackError> {
        Ok(format!(
            "{}{}/{}{}",
            self.prefix(kind, scope)?,
            kind.collection_name,
            action,
            query.to_query_string()
        ))
    }

    /// `{collection}/{id}/{action}` (e.g. `servers/1/action`).
    pub fn element_action_path(
        &self,
        kind: &ResourceKind,
        id: &str,
        action: &str,
        scope: &Scope,
        query: &Query,
    ) -> Result<String, OpenStackError> {
        Ok(format!(
            "{}{}/{}/{}{}",
            self.prefix(kind, scope)?,
            kind.collection_name,
            urlencoding::encode(id),
            action,
            query.to_query_string()
        ))
    }

    /// `{collection}/new/{action}`.
    pub fn new_element_action_path(
        &self,
        kind: &ResourceKind,
        action: &str,
        scope: &Scope,
        query: &Query,
    ) -> Result<String, OpenStackError> {
        self.element_action_path(kind, "new", action, scope, query)
    }
}

/// Replace the `:name` placeholders of the template with escaped values.
fn substitute(template: &str, scope: &Scope) -> Result<String, MappingError> {
    let mut result = String::with_capacity(template.len());
    let mut last = 0;
    for cap in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let value = scope
            .get(name.as_str())
            .ok_or_else(|| MappingError::MissingScope(name.as_str().to_string()))?;
        result.push_str(&template[last..whole.start()]);
        result.push_str(&urlencoding::encode(value));
        last = whole.end();
    }
    result.push_str(&template[last..]);
    Ok(result)
}

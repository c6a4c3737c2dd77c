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
//! # Resources
//!
//! Generic part of every typed resource: the registry entry
//! ([`ResourceKind`]), the loaded shape ([`Entity`]) and the remote
//! operations shared by all kinds ([`Resource`]).
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use validator::Validate;

use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::path::{Query, Scope};
use crate::session::ServiceName;

pub mod entity;
pub mod error;
pub mod kind;

pub use entity::{Attribute, Attributes, Entity};
pub use error::MappingError;
pub use kind::ResourceKind;

/// Typed remote resource.
///
/// Implementors describe how an [`Entity`] maps onto the typed struct and
/// how the struct is written back; the remote operations come for free.
#[async_trait]
pub trait Resource: Clone + Send + Sync + Sized + Validate + 'static {
    const KIND: &'static ResourceKind;

    /// Typed view of a loaded entity.
    fn from_entity(entity: Entity) -> Result<Self, MappingError>;

    /// Write envelope of the resource.
    fn encode(&self) -> Result<Value, OpenStackError>;

    /// Value of the primary key.
    fn id(&self) -> Option<&str>;

    /// Identifiers of the parent resources.
    fn scope(&self) -> Scope {
        Scope::default()
    }

    /// Whether the resource exists remotely. Derived from the primary key
    /// unless the key is chosen by the caller (e.g. key pair names).
    fn persisted(&self) -> bool {
        self.id().is_some()
    }

    /// Primary key of a persisted resource.
    fn require_id(&self) -> Result<&str, MappingError> {
        self.id().ok_or_else(|| MappingError::MissingAttribute {
            kind: Self::KIND.element_name,
            attribute: Self::KIND.primary_key.to_string(),
        })
    }

    /// Load a single element response (the root is removed).
    fn load(raw: Value, scope: &Scope) -> Result<Self, MappingError> {
        let mut entity = Entity::load(Self::KIND, raw, true)?;
        entity.prefix_options_mut().merge(scope);
        Self::from_entity(entity)
    }

    /// Load a collection response.
    fn load_collection(raw: Value, scope: &Scope) -> Result<Vec<Self>, MappingError> {
        collection_items(Self::KIND, raw)?
            .into_iter()
            .map(|item| {
                let mut entity = Entity::load(Self::KIND, item, false)?;
                entity.prefix_options_mut().merge(scope);
                Self::from_entity(entity)
            })
            .collect()
    }

    /// List all elements.
    async fn all(conn: &Connection) -> Result<Vec<Self>, OpenStackError> {
        Self::all_in(conn, &Scope::default(), &Query::default()).await
    }

    /// List the elements of the scope matching the query. A missing
    /// collection is empty.
    #[tracing::instrument(level = "debug", skip(conn), fields(kind = %Self::KIND))]
    async fn all_in(
        conn: &Connection,
        scope: &Scope,
        query: &Query,
    ) -> Result<Vec<Self>, OpenStackError> {
        let path = conn.paths().collection_path(Self::KIND, scope, query)?;
        Self::all_from(conn, &path, scope).await
    }

    /// List the elements found under a custom path.
    async fn all_from(
        conn: &Connection,
        path: &str,
        scope: &Scope,
    ) -> Result<Vec<Self>, OpenStackError> {
        fetch_collection(conn, Self::KIND.service, path, scope).await
    }

    /// First element of the scope matching the query.
    async fn first(
        conn: &Connection,
        scope: &Scope,
        query: &Query,
    ) -> Result<Option<Self>, OpenStackError> {
        Ok(Self::all_in(conn, scope, query).await?.into_iter().next())
    }

    /// Fetch one element. A missing element is [`OpenStackError::NotFound`].
    async fn find(conn: &Connection, id: &str) -> Result<Self, OpenStackError> {
        Self::find_in(conn, id, &Scope::default()).await
    }

    #[tracing::instrument(level = "debug", skip(conn), fields(kind = %Self::KIND))]
    async fn find_in(conn: &Connection, id: &str, scope: &Scope) -> Result<Self, OpenStackError> {
        let path = conn
            .paths()
            .element_path(Self::KIND, id, scope, &Query::default())?;
        let body = conn.get(Self::KIND.service, &path).await?;
        Ok(Self::load(body, scope)?)
    }

    /// Create (not persisted) or update (persisted) the element.
    ///
    /// Local validation runs first; nothing is sent when it fails.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %Self::KIND, id = ?self.id()))]
    async fn save(&self, conn: &Connection) -> Result<Self, OpenStackError> {
        self.validate()?;
        let scope = self.scope();
        let body = self.encode()?;
        if !self.persisted() {
            let path = conn
                .paths()
                .create_path(Self::KIND, &scope, &Query::default())?;
            let rsp = conn.post(Self::KIND.service, &path, body).await?;
            return Ok(Self::load(rsp, &scope)?);
        }
        let path = conn
            .paths()
            .element_path(Self::KIND, self.require_id()?, &scope, &Query::default())?;
        let rsp = conn.put(Self::KIND.service, &path, Some(body)).await?;
        if rsp.is_null() {
            Ok(self.clone())
        } else {
            Ok(Self::load(rsp, &scope)?)
        }
    }

    /// Remove the element remotely.
    async fn destroy(&self, conn: &Connection) -> Result<(), OpenStackError> {
        Self::delete(conn, self.require_id()?, &self.scope()).await
    }

    #[tracing::instrument(level = "debug", skip(conn), fields(kind = %Self::KIND))]
    async fn delete(conn: &Connection, id: &str, scope: &Scope) -> Result<(), OpenStackError> {
        let path = conn
            .paths()
            .element_path(Self::KIND, id, scope, &Query::default())?;
        conn.delete(Self::KIND.service, &path).await
    }
}

/// Load the collection found under the path of the service. A missing
/// collection is empty.
pub async fn fetch_collection<R: Resource>(
    conn: &Connection,
    service: ServiceName,
    path: &str,
    scope: &Scope,
) -> Result<Vec<R>, OpenStackError> {
    match conn.get(service, path).await {
        Ok(body) => Ok(R::load_collection(body, scope)?),
        Err(err) if err.is_not_found() => {
            debug!(%path, "collection not found");
            Ok(Vec::new())
        }
        Err(err) => Err(err),
    }
}

/// Items of a list response.
///
/// The body is unwrapped by the collection key of the kind (falling back to
/// the single top level key). A missing collection is empty.
pub fn collection_items(kind: &ResourceKind, raw: Value) -> Result<Vec<Value>, MappingError> {
    let inner = match raw {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => return Ok(items),
        Value::Object(mut map) => match map.remove(kind.collection_key) {
            Some(inner) => inner,
            None if map.len() == 1 => map
                .into_iter()
                .next()
                .map(|(_, inner)| inner)
                .unwrap_or(Value::Null),
            None => Value::Null,
        },
        other => other,
    };
    match inner {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(MappingError::InvalidInput {
            kind: kind.element_name,
            found: error::json_type(&other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    static KEYPAIR: ResourceKind =
        ResourceKind::new(ServiceName::Compute, "keypair", "os-keypairs")
            .with_collection_key("keypairs");

    #[test]
    fn test_collection_items() {
        assert_eq!(
            2,
            collection_items(&KEYPAIR, json!({"keypairs": [{}, {}]}))
                .unwrap()
                .len()
        );
        assert_eq!(
            1,
            collection_items(&KEYPAIR, json!({"other": [{}]}))
                .unwrap()
                .len()
        );
        assert!(collection_items(&KEYPAIR, Value::Null).unwrap().is_empty());
        assert!(
            collection_items(&KEYPAIR, json!({"a": [], "b": []}))
                .unwrap()
                .is_empty()
        );
        assert!(collection_items(&KEYPAIR, json!({"keypairs": 1})).is_err());
        assert!(collection_items(&KEYPAIR, json!("x")).is_err());
    }
}

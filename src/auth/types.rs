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
//! # Authentication types
use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

use crate::config::AuthSection;
use crate::resource::kind::{FREE_FORM, rename, retain};
use crate::resource::{Entity, MappingError, ResourceKind};
use crate::session::ServiceName;
use crate::validators;

/// Body of a token response (`{"access": {...}}`).
pub(crate) static ACCESS: ResourceKind =
    ResourceKind::new(ServiceName::IdentityPublic, "access", "tokens")
        .with_nested(access_nested)
        .with_normalizer(normalize_access);

static TOKEN: ResourceKind = ResourceKind::new(ServiceName::IdentityPublic, "token", "tokens")
    .with_nested(token_nested);

static TOKEN_TENANT: ResourceKind =
    ResourceKind::new(ServiceName::IdentityPublic, "tenant", "tenants");

static CATALOG_ENTRY: ResourceKind =
    ResourceKind::new(ServiceName::IdentityPublic, "service", "serviceCatalog")
        .with_nested(catalog_entry_nested);

static ENDPOINT: ResourceKind =
    ResourceKind::new(ServiceName::IdentityPublic, "endpoint", "endpoints")
        .with_nested(free_form_nested)
        .with_normalizer(normalize_endpoint);

static ACCESS_USER: ResourceKind = ResourceKind::new(ServiceName::IdentityPublic, "user", "users")
    .with_nested(free_form_nested);

fn access_nested(key: &str) -> Option<&'static ResourceKind> {
    match key {
        "token" => Some(&TOKEN),
        "serviceCatalog" => Some(&CATALOG_ENTRY),
        "user" => Some(&ACCESS_USER),
        _ => None,
    }
}

fn normalize_access(mut raw: Map<String, Value>) -> Result<Map<String, Value>, MappingError> {
    retain(&mut raw, &["token", "serviceCatalog", "user"]);
    Ok(raw)
}

fn token_nested(key: &str) -> Option<&'static ResourceKind> {
    match key {
        "tenant" => Some(&TOKEN_TENANT),
        _ => None,
    }
}

fn catalog_entry_nested(key: &str) -> Option<&'static ResourceKind> {
    match key {
        "endpoints" => Some(&ENDPOINT),
        _ => Some(&FREE_FORM),
    }
}

fn free_form_nested(_key: &str) -> Option<&'static ResourceKind> {
    Some(&FREE_FORM)
}

fn normalize_endpoint(mut raw: Map<String, Value>) -> Result<Map<String, Value>, MappingError> {
    rename(&mut raw, "publicURL", "public_url");
    rename(&mut raw, "internalURL", "internal_url");
    rename(&mut raw, "adminURL", "admin_url");
    rename(&mut raw, "url", "public_url");
    Ok(raw)
}

/// Identity and secret of the principal, optionally scoped to a tenant.
#[derive(Clone)]
pub struct Credential {
    pub username: String,
    pub password: SecretString,
    pub tenant_id: Option<String>,
}

impl Credential {
    pub fn new<U: Into<String>, P: Into<SecretString>>(username: U, password: P) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            tenant_id: None,
        }
    }

    pub fn with_tenant_id<S: Into<String>>(mut self, tenant_id: S) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Scope to the tenant. A tenant without id leaves the scope unset.
    pub fn with_tenant(mut self, tenant: &crate::identity::Tenant) -> Self {
        self.tenant_id = tenant.id.clone();
        self
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

/// Username and password must be present. The secret is only exposed to
/// the presence check.
impl Validate for Credential {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.username.is_empty() {
            errors.add("username", validators::blank());
        }
        if let Err(err) = validators::secret_present(&self.password) {
            errors.add("password", err);
        }
        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<&AuthSection> for Credential {
    fn from(value: &AuthSection) -> Self {
        Self {
            username: value.username.clone(),
            password: value.password.clone(),
            tenant_id: value.tenant_id.clone(),
        }
    }
}

/// Tenant a token is scoped to.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenTenant {
    pub id: String,
    pub name: Option<String>,
}

/// Issued token.
#[derive(Clone, Debug)]
pub struct Token {
    id: SecretString,
    expires_at: DateTime<Utc>,
    tenant: Option<TokenTenant>,
}

impl Token {
    pub fn new<S: Into<SecretString>>(id: S, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            expires_at,
            tenant: None,
        }
    }

    pub fn id(&self) -> &SecretString {
        &self.id
    }

    pub fn expires_at(&self) -> &DateTime<Utc> {
        &self.expires_at
    }

    pub fn tenant(&self) -> Option<&TokenTenant> {
        self.tenant.as_ref()
    }

    /// Whether the token expired. Tokens are never renewed implicitly.
    pub fn expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    pub(crate) fn from_entity(entity: &Entity) -> Result<Self, MappingError> {
        let id = entity.require_string("id")?;
        let expires_at =
            entity
                .datetime("expires")?
                .ok_or_else(|| MappingError::MissingAttribute {
                    kind: "token",
                    attribute: "expires".into(),
                })?;
        let tenant = match entity.entity("tenant") {
            Some(tenant) => Some(TokenTenant {
                id: tenant.require_string("id")?,
                name: tenant.string("name"),
            }),
            None => None,
        };
        Ok(Self {
            id: id.into(),
            expires_at,
            tenant,
        })
    }
}

/// Endpoint of a service in one region.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Endpoint {
    pub id: Option<String>,
    pub region: Option<String>,
    pub public_url: Option<String>,
    pub internal_url: Option<String>,
    pub admin_url: Option<String>,
}

impl Endpoint {
    fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.string("id"),
            region: entity.string("region"),
            public_url: entity.string("public_url"),
            internal_url: entity.string("internal_url"),
            admin_url: entity.string("admin_url"),
        }
    }
}

/// Service of the catalog.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogEntry {
    pub service_type: String,
    pub name: Option<String>,
    pub endpoints: Vec<Endpoint>,
}

/// Services available to the token, in the order identity returned them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceCatalog(Vec<CatalogEntry>);

impl ServiceCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self(entries)
    }

    pub(crate) fn from_entities(entities: Vec<&Entity>) -> Result<Self, MappingError> {
        entities
            .into_iter()
            .map(|entry| {
                Ok(CatalogEntry {
                    service_type: entry.require_string("type")?,
                    name: entry.string("name"),
                    endpoints: entry
                        .entities("endpoints")
                        .into_iter()
                        .map(Endpoint::from_entity)
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, MappingError>>()
            .map(Self)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All endpoints of the service type (in the region), in catalog order.
    pub fn endpoints_for(&self, service_type: &str, region: Option<&str>) -> Vec<&Endpoint> {
        self.0
            .iter()
            .filter(|entry| entry.service_type == service_type)
            .flat_map(|entry| entry.endpoints.iter())
            .filter(|ep| region.is_none_or(|region| ep.region.as_deref() == Some(region)))
            .collect()
    }

    /// First endpoint of the service type (in the region).
    pub fn endpoint_for(&self, service_type: &str, region: Option<&str>) -> Option<&Endpoint> {
        self.endpoints_for(service_type, region).into_iter().next()
    }
}

/// User the token was issued to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccessUser {
    pub id: Option<String>,
    pub name: Option<String>,
    pub roles: Vec<String>,
}

impl AccessUser {
    pub(crate) fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.string("id"),
            name: entity.string("name"),
            roles: entity
                .entities("roles")
                .into_iter()
                .filter_map(|role| role.string("name"))
                .collect(),
        }
    }
}

/// Decoded token response.
#[derive(Clone, Debug)]
pub(crate) struct Access {
    pub token: Token,
    pub catalog: ServiceCatalog,
    pub user: Option<AccessUser>,
}

impl Access {
    pub(crate) fn load(raw: Value) -> Result<Self, MappingError> {
        let access = Entity::load(&ACCESS, raw, true)?;
        let token = access
            .entity("token")
            .ok_or_else(|| MappingError::MissingAttribute {
                kind: "access",
                attribute: "token".into(),
            })?;
        Ok(Self {
            token: Token::from_entity(token)?,
            catalog: ServiceCatalog::from_entities(access.entities("serviceCatalog"))?,
            user: access.entity("user").map(AccessUser::from_entity),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Timelike};
    use secrecy::ExposeSecret;
    use serde_json::json;

    use super::*;

    fn access_body() -> Value {
        json!({"access": {
            "token": {
                "id": "tok",
                "expires": "2030-01-01T10:00:00Z",
                "tenant": {"id": "t1", "name": "demo", "enabled": true}
            },
            "serviceCatalog": [
                {"type": "compute", "name": "nova", "endpoints": [
                    {"region": "A", "publicURL": "http://a:8774/v2/t1", "adminURL": "http://a-admin"},
                    {"region": "B", "publicURL": "http://b:8774/v2/t1"}
                ], "endpoints_links": []},
                {"type": "identity", "name": "keystone", "endpoints": [
                    {"region": "A", "publicURL": "http://k:5000/v2.0", "adminURL": "http://k:35357/v2.0"}
                ]}
            ],
            "user": {"id": "u1", "name": "demo", "roles": [{"name": "admin"}], "roles_links": []},
            "metadata": {"is_admin": 0, "roles": ["r1"]}
        }})
    }

    #[test]
    fn test_access_load() {
        let access = Access::load(access_body()).unwrap();
        assert_eq!("tok", access.token.id().expose_secret());
        assert_eq!(10, access.token.expires_at().hour());
        assert_eq!(Some("t1"), access.token.tenant().map(|t| t.id.as_str()));
        assert_eq!(2, access.catalog.entries().len());
        let user = access.user.unwrap();
        assert_eq!(vec!["admin".to_string()], user.roles);
    }

    #[test]
    fn test_endpoint_for() {
        let catalog = Access::load(access_body()).unwrap().catalog;
        assert_eq!(
            Some("http://b:8774/v2/t1"),
            catalog
                .endpoint_for("compute", Some("B"))
                .and_then(|ep| ep.public_url.as_deref())
        );
        assert_eq!(
            Some("http://a:8774/v2/t1"),
            catalog
                .endpoint_for("compute", None)
                .and_then(|ep| ep.public_url.as_deref())
        );
        assert_eq!(2, catalog.endpoints_for("compute", None).len());
        assert!(catalog.endpoint_for("compute", Some("C")).is_none());
        assert!(catalog.endpoint_for("volume", None).is_none());
    }

    #[test]
    fn test_catalog_with_plain_url() {
        let raw = json!({"access": {
            "token": {"id": "t", "expires": "2030-01-01T00:00:00"},
            "serviceCatalog": [{"type": "compute", "endpoints": [
                {"region": "A", "url": "u1"}, {"region": "B", "url": "u2"}
            ]}]
        }});
        let catalog = Access::load(raw).unwrap().catalog;
        assert_eq!(
            Some("u2"),
            catalog
                .endpoint_for("compute", Some("B"))
                .and_then(|ep| ep.public_url.as_deref())
        );
    }

    #[test]
    fn test_token_without_expiry() {
        let raw = json!({"access": {"token": {"id": "t"}}});
        assert!(matches!(
            Access::load(raw),
            Err(MappingError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_expired() {
        assert!(Token::new("t", Utc::now() - Duration::seconds(1)).expired());
        assert!(!Token::new("t", Utc::now() + Duration::hours(1)).expired());
    }

    #[test]
    fn test_credential_debug_hides_secret() {
        let credential = Credential::new("demo", "s3cr3t").with_tenant_id("t1");
        let debug = format!("{credential:?}");
        assert!(debug.contains("demo"));
        assert!(!debug.contains("s3cr3t"));
    }

    #[test]
    fn test_credential_validation() {
        assert!(Credential::new("demo", "secret").validate().is_ok());
        let errors = Credential::new("", "").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
        assert!(errors.field_errors().contains_key("password"));
    }
}

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
use async_trait::async_trait;
use openstack_resource_api_types::identity::{UserBuilder as UserDataBuilder, UserRequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

use super::{Tenant, UserRole};
use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::path::Query;
use crate::resource::kind::flatten_id;
use crate::resource::{Entity, MappingError, Resource, ResourceKind};
use crate::session::ServiceName;
use crate::validators;

pub static USER: ResourceKind = ResourceKind::new(ServiceName::IdentityAdmin, "user", "users")
    .with_normalizer(normalize_user);

/// The primary tenant arrives as `tenantId` or as an embedded `tenant`.
fn normalize_user(mut raw: Map<String, Value>) -> Result<Map<String, Value>, MappingError> {
    flatten_id(&mut raw, "tenant", "tenant_id");
    if let Some(tenant_id) = raw.remove("tenantId") {
        if !tenant_id.is_null() {
            raw.insert("tenant_id".into(), tenant_id);
        }
    }
    Ok(raw)
}

/// Keystone user.
///
/// The password is checked for presence and strength without leaving the
/// secret wrapper, so validation is written out by hand.
#[derive(Clone, Debug, Default)]
pub struct User {
    pub id: Option<String>,
    pub name: String,
    pub password: Option<SecretString>,
    pub email: Option<String>,
    pub enabled: Option<bool>,
    /// Primary tenant.
    pub tenant_id: Option<String>,
}

impl Validate for User {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for result in [
            validators::min_length(&self.name, 4),
            validators::account_name(&self.name),
        ] {
            if let Err(err) = result {
                errors.add("name", err);
            }
        }
        match &self.password {
            Some(password) => {
                if let Err(err) = validators::password_strength(password) {
                    errors.add("password", err);
                }
            }
            None => errors.add("password", validators::blank()),
        }
        match self.email.as_deref() {
            Some(email) => {
                if let Err(err) = validators::email(email) {
                    errors.add("email", err);
                }
            }
            None => errors.add("email", validators::blank()),
        }
        if self.enabled.is_none() {
            errors.add("enabled", validators::blank());
        }
        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl User {
    pub async fn find_by_name(
        conn: &Connection,
        name: &str,
    ) -> Result<Option<Self>, OpenStackError> {
        Ok(Self::all(conn).await?.into_iter().find(|u| u.name == name))
    }

    /// Users whose primary tenant is the tenant.
    pub async fn all_by_tenant(
        conn: &Connection,
        tenant_id: &str,
    ) -> Result<Vec<Self>, OpenStackError> {
        Ok(Self::all(conn)
            .await?
            .into_iter()
            .filter(|u| u.tenant_id.as_deref() == Some(tenant_id))
            .collect())
    }

    /// The user, when its primary tenant is the tenant.
    pub async fn find_by_tenant(
        conn: &Connection,
        id: &str,
        tenant_id: &str,
    ) -> Result<Option<Self>, OpenStackError> {
        let user = Self::find(conn, id).await?;
        Ok((user.tenant_id.as_deref() == Some(tenant_id)).then_some(user))
    }

    /// Primary tenant.
    pub async fn tenant(&self, conn: &Connection) -> Result<Option<Tenant>, OpenStackError> {
        match &self.tenant_id {
            Some(tenant_id) => Ok(Some(Tenant::find(conn, tenant_id).await?)),
            None => Ok(None),
        }
    }

    /// Roles of the user in the tenant (the primary tenant by default).
    pub async fn roles(
        &self,
        conn: &Connection,
        tenant_id: Option<&str>,
    ) -> Result<Vec<UserRole>, OpenStackError> {
        let tenant_id = tenant_id
            .or(self.tenant_id.as_deref())
            .ok_or_else(|| MappingError::MissingScope("tenant_id".into()))?;
        UserRole::all_in(
            conn,
            &UserRole::scope_of(tenant_id, self.require_id()?),
            &Query::default(),
        )
        .await
    }
}

#[async_trait]
impl Resource for User {
    const KIND: &'static ResourceKind = &USER;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        Ok(Self {
            id: entity.id(),
            name: entity.string("name").unwrap_or_default(),
            password: None,
            email: entity.string("email"),
            enabled: entity.boolean("enabled")?,
            tenant_id: entity.string("tenant_id"),
        })
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        let mut user = UserDataBuilder::default();
        user.name(self.name.clone());
        if let Some(password) = &self.password {
            user.password(password.expose_secret());
        }
        if let Some(email) = &self.email {
            user.email(email.clone());
        }
        if let Some(enabled) = self.enabled {
            user.enabled(enabled);
        }
        if let Some(tenant_id) = self.tenant_id.as_deref().filter(|t| !t.is_empty()) {
            user.tenant_id(tenant_id);
        }
        Ok(serde_json::to_value(
            UserRequestBuilder::default().user(user.build()?).build()?,
        )?)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::path::Scope;
    use crate::tests::{expect, expect_body, mocked_connection};
    use crate::transport::MockTransport;

    fn user() -> User {
        User {
            name: "demo_user".into(),
            password: Some("secret123".into()),
            email: Some("demo@example.com".into()),
            enabled: Some(true),
            tenant_id: Some("t1".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_tenant_id_on_read() {
        for raw in [
            json!({"user": {"id": "u1", "name": "demo", "tenantId": "t1"}}),
            json!({"user": {"id": "u1", "name": "demo", "tenant": {"id": "t1", "name": "x"}}}),
            json!({"user": {"id": "u1", "name": "demo", "tenant": {"id": "t0"}, "tenantId": "t1"}}),
        ] {
            let user = User::load(raw, &Scope::default()).unwrap();
            assert_eq!(Some("t1"), user.tenant_id.as_deref());
        }
    }

    #[test]
    fn test_encode() {
        assert_eq!(
            json!({"user": {"name": "demo_user", "password": "secret123", "email": "demo@example.com", "enabled": true, "tenantId": "t1"}}),
            user().encode().unwrap()
        );
        let user = User {
            tenant_id: Some(String::new()),
            password: None,
            ..user()
        };
        let encoded = user.encode().unwrap();
        assert!(encoded["user"].get("tenantId").is_none());
        assert!(encoded["user"].get("password").is_none());
    }

    #[test]
    fn test_validation() {
        assert!(user().validate().is_ok());
        let errors = User {
            name: "ab".into(),
            password: Some("password".into()),
            email: Some("nope".into()),
            ..user()
        }
        .validate()
        .unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("email"));
        assert!(!fields.contains_key("enabled"));
    }

    #[test]
    fn test_validation_of_blank_user() {
        let errors = User::default().validate().unwrap_err();
        let fields = errors.field_errors();
        for field in ["name", "password", "email", "enabled"] {
            assert!(fields.contains_key(field), "{field}");
        }
        let short = User {
            password: Some("abc1".into()),
            ..user()
        };
        let errors = short.validate().unwrap_err();
        assert_eq!(vec!["password"], errors.field_errors().into_keys().collect::<Vec<_>>());
    }

    #[test]
    fn test_debug_hides_password() {
        assert!(!format!("{:?}", user()).contains("secret123"));
    }

    #[tokio::test]
    async fn test_create() {
        let mut transport = MockTransport::default();
        expect_body(
            &mut transport,
            Method::POST,
            "http://keystone:35357/v2.0/users",
            user().encode().unwrap(),
            StatusCode::OK,
            r#"{"user": {"id": "u1", "name": "demo_user", "email": "demo@example.com", "enabled": true, "tenantId": "t1"}}"#,
        );
        let conn = mocked_connection(transport);
        let created = user().save(&conn).await.unwrap();
        assert_eq!(Some("u1"), created.id());
        assert!(created.password.is_none());
    }

    #[tokio::test]
    async fn test_by_tenant() {
        let mut transport = MockTransport::default();
        expect(
            &mut transport,
            Method::GET,
            "http://keystone:35357/v2.0/users",
            StatusCode::OK,
            r#"{"users": [{"id": "u1", "name": "a", "tenantId": "t1"}, {"id": "u2", "name": "b", "tenantId": "t2"}]}"#,
        );
        expect(
            &mut transport,
            Method::GET,
            "http://keystone:35357/v2.0/users/u2",
            StatusCode::OK,
            r#"{"user": {"id": "u2", "name": "b", "tenantId": "t2"}}"#,
        );
        let conn = mocked_connection(transport);
        let users = User::all_by_tenant(&conn, "t1").await.unwrap();
        assert_eq!(vec![Some("u1")], users.iter().map(|u| u.id()).collect::<Vec<_>>());
        assert!(User::find_by_tenant(&conn, "u2", "t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_missing() {
        let mut transport = MockTransport::default();
        expect(
            &mut transport,
            Method::GET,
            "http://keystone:35357/v2.0/users/nope",
            StatusCode::NOT_FOUND,
            r#"{"error": {"message": "Could not find user, nope.", "code": 404}}"#,
        );
        let conn = mocked_connection(transport);
        let err = User::find(&conn, "nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!("Could not find user, nope.", err.to_string());
    }
}

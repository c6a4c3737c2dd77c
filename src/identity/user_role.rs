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
use openstack_resource_api_types::identity::{RoleBuilder as RoleDataBuilder, RoleRequestBuilder};
use serde_json::Value;
use validator::Validate;

use super::Role;
use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::path::Scope;
use crate::resource::{Entity, MappingError, Resource, ResourceKind};
use crate::session::ServiceName;

/// Roles of a user in a tenant.
pub static USER_ROLE: ResourceKind =
    ResourceKind::new(ServiceName::IdentityAdmin, "role", "roles")
        .with_prefix("tenants/:tenant_id/users/:user_id/");

/// Role granted to a user in a tenant.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct UserRole {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    tenant_id: Option<String>,
    user_id: Option<String>,
}

impl UserRole {
    /// Scope of the roles of the user in the tenant.
    pub fn scope_of(tenant_id: &str, user_id: &str) -> Scope {
        Scope::new()
            .with("tenant_id", tenant_id)
            .with("user_id", user_id)
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// The role definition.
    pub async fn role(&self, conn: &Connection) -> Result<Option<Role>, OpenStackError> {
        match &self.id {
            Some(id) => Ok(Some(Role::find(conn, id).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Resource for UserRole {
    const KIND: &'static ResourceKind = &USER_ROLE;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        Ok(Self {
            id: entity.id(),
            name: entity.string("name").unwrap_or_default(),
            description: entity.string("description"),
            tenant_id: entity.prefix_options().get("tenant_id").map(Into::into),
            user_id: entity.prefix_options().get("user_id").map(Into::into),
        })
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        Ok(serde_json::to_value(
            RoleRequestBuilder::default()
                .role(RoleDataBuilder::default().name(self.name.clone()).build()?)
                .build()?,
        )?)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn scope(&self) -> Scope {
        let mut scope = Scope::new();
        if let Some(tenant_id) = &self.tenant_id {
            scope.insert("tenant_id", tenant_id.as_str());
        }
        if let Some(user_id) = &self.user_id {
            scope.insert("user_id", user_id.as_str());
        }
        scope
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{Method, StatusCode};

    use super::*;
    use crate::path::Query;
    use crate::tests::{expect, mocked_connection};
    use crate::transport::MockTransport;

    #[tokio::test]
    async fn test_roles_and_definition() {
        let mut transport = MockTransport::default();
        expect(
            &mut transport,
            Method::GET,
            "http://keystone:35357/v2.0/tenants/t%201/users/u1/roles",
            StatusCode::OK,
            r#"{"roles": [{"id": "r1", "name": "member", "description": "Default"}]}"#,
        );
        expect(
            &mut transport,
            Method::GET,
            "http://keystone:35357/v2.0/OS-KSADM/roles/r1",
            StatusCode::OK,
            r#"{"role": {"id": "r1", "name": "member"}}"#,
        );
        let conn = mocked_connection(transport);
        let roles = UserRole::all_in(&conn, &UserRole::scope_of("t 1", "u1"), &Query::new())
            .await
            .unwrap();
        assert_eq!(1, roles.len());
        assert_eq!(Some("u1"), roles[0].user_id());
        assert_eq!(UserRole::scope_of("t 1", "u1"), roles[0].scope());
        let role = roles[0].role(&conn).await.unwrap().unwrap();
        assert_eq!("member", role.name);
    }

    #[tokio::test]
    async fn test_missing_scope() {
        let transport = MockTransport::default();
        let conn = mocked_connection(transport);
        assert!(matches!(
            UserRole::all(&conn).await,
            Err(OpenStackError::Mapping {
                source: MappingError::MissingScope(_)
            })
        ));
    }

    #[tokio::test]
    async fn test_missing_roles_are_empty() {
        let mut transport = MockTransport::default();
        expect(
            &mut transport,
            Method::GET,
            "http://keystone:35357/v2.0/tenants/t1/users/u1/roles",
            StatusCode::NOT_FOUND,
            "",
        );
        let conn = mocked_connection(transport);
        assert!(
            UserRole::all_in(&conn, &UserRole::scope_of("t1", "u1"), &Query::new())
                .await
                .unwrap()
                .is_empty()
        );
    }
}

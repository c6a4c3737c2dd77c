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
use openstack_resource_api_types::identity::{
    TenantBuilder as TenantDataBuilder, TenantRequestBuilder,
};
use serde_json::Value;
use validator::Validate;

use super::{User, UserRole};
use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::path::{Query, Scope};
use crate::resource::{Entity, MappingError, Resource, ResourceKind, fetch_collection};
use crate::session::ServiceName;
use crate::validators;

/// Tenants managed on the admin endpoint.
pub static TENANT: ResourceKind =
    ResourceKind::new(ServiceName::IdentityAdmin, "tenant", "tenants");

/// Tenants of the token, listed on the public endpoint.
pub static PUBLIC_TENANT: ResourceKind =
    ResourceKind::new(ServiceName::IdentityPublic, "tenant", "tenants");

/// Keystone tenant.
///
/// The description is filtered on assignment: characters Keystone refuses
/// are replaced with `_`.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct Tenant {
    pub id: Option<String>,
    #[validate(
        length(min = 1, message = "can't be blank"),
        custom(function = "validators::tenant_name")
    )]
    pub name: String,
    #[validate(custom(function = "validators::free_text"))]
    description: Option<String>,
    #[validate(required(message = "can't be blank"))]
    pub enabled: Option<bool>,
}

impl Tenant {
    /// New enabled tenant.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            enabled: Some(true),
            ..Default::default()
        }
    }

    pub fn with_description<S: AsRef<str>>(mut self, description: S) -> Self {
        self.set_description(Some(description));
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description<S: AsRef<str>>(&mut self, description: Option<S>) {
        self.description = description.map(|d| validators::sanitize_free_text(d.as_ref()));
    }

    pub async fn find_by_name(
        conn: &Connection,
        name: &str,
    ) -> Result<Option<Self>, OpenStackError> {
        Ok(Self::all(conn).await?.into_iter().find(|t| t.name == name))
    }

    /// Tenants the current token has access to (public endpoint).
    pub async fn all_public(conn: &Connection) -> Result<Vec<Self>, OpenStackError> {
        let path = conn
            .paths()
            .collection_path(&PUBLIC_TENANT, &Scope::default(), &Query::default())?;
        fetch_collection(conn, ServiceName::IdentityPublic, &path, &Scope::default()).await
    }

    pub async fn find_all_public_by_name(
        conn: &Connection,
        name: &str,
    ) -> Result<Vec<Self>, OpenStackError> {
        Ok(Self::all_public(conn)
            .await?
            .into_iter()
            .filter(|t| t.name == name)
            .collect())
    }

    /// Users of the tenant.
    pub async fn users(&self, conn: &Connection) -> Result<Vec<User>, OpenStackError> {
        let path = conn.paths().element_action_path(
            &TENANT,
            self.require_id()?,
            "users",
            &Scope::default(),
            &Query::default(),
        )?;
        User::all_from(conn, &path, &Scope::default()).await
    }

    /// Roles the user has in the tenant.
    pub async fn user_roles(
        &self,
        conn: &Connection,
        user_id: &str,
    ) -> Result<Vec<UserRole>, OpenStackError> {
        UserRole::all_in(
            conn,
            &UserRole::scope_of(self.require_id()?, user_id),
            &Query::default(),
        )
        .await
    }

    /// Grant the role to the user in the tenant.
    pub async fn add_role_to_user(
        &self,
        conn: &Connection,
        role_id: &str,
        user_id: &str,
    ) -> Result<(), OpenStackError> {
        let path = self.user_role_path(conn, role_id, user_id)?;
        conn.put(ServiceName::IdentityAdmin, &path, None).await?;
        Ok(())
    }

    /// Revoke the role of the user in the tenant.
    pub async fn delete_role_from_user(
        &self,
        conn: &Connection,
        role_id: &str,
        user_id: &str,
    ) -> Result<(), OpenStackError> {
        let path = self.user_role_path(conn, role_id, user_id)?;
        conn.delete(ServiceName::IdentityAdmin, &path).await
    }

    fn user_role_path(
        &self,
        conn: &Connection,
        role_id: &str,
        user_id: &str,
    ) -> Result<String, OpenStackError> {
        let action = format!(
            "users/{}/roles/OS-KSADM/{}",
            urlencoding::encode(user_id),
            urlencoding::encode(role_id)
        );
        conn.paths().element_action_path(
            &TENANT,
            self.require_id()?,
            &action,
            &Scope::default(),
            &Query::default(),
        )
    }
}

#[async_trait]
impl Resource for Tenant {
    const KIND: &'static ResourceKind = &TENANT;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        let mut tenant = Self {
            id: entity.id(),
            name: entity.string("name").unwrap_or_default(),
            description: None,
            enabled: entity.boolean("enabled")?,
        };
        tenant.set_description(entity.string("description"));
        Ok(tenant)
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        let mut tenant = TenantDataBuilder::default();
        tenant.name(self.name.clone());
        if let Some(description) = &self.description {
            tenant.description(description.clone());
        }
        if let Some(enabled) = self.enabled {
            tenant.enabled(enabled);
        }
        Ok(serde_json::to_value(
            TenantRequestBuilder::default()
                .tenant(tenant.build()?)
                .build()?,
        )?)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

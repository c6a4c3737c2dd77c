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

use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::resource::{Entity, MappingError, Resource, ResourceKind};
use crate::session::ServiceName;
use crate::validators;

/// Roles of the `OS-KSADM` admin extension.
pub static ROLE: ResourceKind =
    ResourceKind::new(ServiceName::IdentityAdmin, "role", "OS-KSADM/roles")
        .with_collection_key("roles");

/// Keystone role.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct Role {
    pub id: Option<String>,
    #[validate(
        length(min = 4, message = "is too short (minimum is 4 characters)"),
        custom(function = "validators::account_name")
    )]
    pub name: String,
}

impl Role {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub async fn find_by_name(
        conn: &Connection,
        name: &str,
    ) -> Result<Option<Self>, OpenStackError> {
        Ok(Self::all(conn).await?.into_iter().find(|r| r.name == name))
    }
}

#[async_trait]
impl Resource for Role {
    const KIND: &'static ResourceKind = &ROLE;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        Ok(Self {
            id: entity.id(),
            name: entity.string("name").unwrap_or_default(),
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
}

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
use openstack_resource_api_types::compute::{QuotaSetRequestBuilder, QuotaSetUpdate};
use serde_json::Value;
use validator::Validate;

use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::path::{Query, Scope};
use crate::resource::{Entity, MappingError, Resource, ResourceKind};
use crate::session::ServiceName;

/// Quotas are addressed by tenant id.
pub static QUOTA_SET: ResourceKind =
    ResourceKind::new(ServiceName::Compute, "quota_set", "os-quota-sets");

/// Compute quotas of a tenant.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct QuotaSet {
    /// Tenant id.
    pub id: Option<String>,
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub instances: Option<i64>,
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub cores: Option<i64>,
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub ram: Option<i64>,
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub floating_ips: Option<i64>,
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub key_pairs: Option<i64>,
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub metadata_items: Option<i64>,
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub security_groups: Option<i64>,
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub security_group_rules: Option<i64>,
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub injected_files: Option<i64>,
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub injected_file_content_bytes: Option<i64>,
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub injected_file_path_bytes: Option<i64>,
}

impl QuotaSet {
    /// Default quotas applied to the tenant.
    pub async fn defaults(conn: &Connection, tenant_id: &str) -> Result<Self, OpenStackError> {
        let path = conn.paths().element_action_path(
            &QUOTA_SET,
            tenant_id,
            "defaults",
            &Scope::default(),
            &Query::default(),
        )?;
        let body = conn.get(ServiceName::Compute, &path).await?;
        Ok(Self::load(body, &Scope::default())?)
    }
}

#[async_trait]
impl Resource for QuotaSet {
    const KIND: &'static ResourceKind = &QUOTA_SET;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        Ok(Self {
            id: entity.id(),
            instances: entity.integer("instances")?,
            cores: entity.integer("cores")?,
            ram: entity.integer("ram")?,
            floating_ips: entity.integer("floating_ips")?,
            key_pairs: entity.integer("key_pairs")?,
            metadata_items: entity.integer("metadata_items")?,
            security_groups: entity.integer("security_groups")?,
            security_group_rules: entity.integer("security_group_rules")?,
            injected_files: entity.integer("injected_files")?,
            injected_file_content_bytes: entity.integer("injected_file_content_bytes")?,
            injected_file_path_bytes: entity.integer("injected_file_path_bytes")?,
        })
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        let quota_set = QuotaSetUpdate {
            instances: self.instances,
            cores: self.cores,
            ram: self.ram,
            floating_ips: self.floating_ips,
            key_pairs: self.key_pairs,
            metadata_items: self.metadata_items,
            security_groups: self.security_groups,
            security_group_rules: self.security_group_rules,
            injected_files: self.injected_files,
            injected_file_content_bytes: self.injected_file_content_bytes,
            injected_file_path_bytes: self.injected_file_path_bytes,
        };
        Ok(serde_json::to_value(
            QuotaSetRequestBuilder::default()
                .quota_set(quota_set)
                .build()?,
        )?)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

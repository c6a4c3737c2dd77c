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
use openstack_resource_api_types::compute::FloatingIpRequestBuilder;
use serde_json::Value;
use validator::Validate;

use super::Server;
use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::resource::{Entity, MappingError, Resource, ResourceKind};
use crate::session::ServiceName;

pub static FLOATING_IP: ResourceKind =
    ResourceKind::new(ServiceName::Compute, "floating_ip", "os-floating-ips")
        .with_collection_key("floating_ips");

pub static FLOATING_IP_POOL: ResourceKind =
    ResourceKind::new(ServiceName::Compute, "floating_ip_pool", "os-floating-ip-pools")
        .with_collection_key("floating_ip_pools")
        .with_primary_key("name");

/// Floating IP allocated to the tenant.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct FloatingIp {
    pub id: Option<String>,
    pub ip: Option<String>,
    pub fixed_ip: Option<String>,
    /// Pool to allocate from; the default pool when unset.
    pub pool: Option<String>,
    /// Server the address is assigned to.
    pub instance_id: Option<String>,
}

impl FloatingIp {
    /// Allocation request from the pool.
    pub fn from_pool<S: Into<String>>(pool: S) -> Self {
        Self {
            pool: Some(pool.into()),
            ..Default::default()
        }
    }

    pub async fn find_all_by_pool(
        conn: &Connection,
        pool: &str,
    ) -> Result<Vec<Self>, OpenStackError> {
        Ok(Self::all(conn)
            .await?
            .into_iter()
            .filter(|ip| ip.pool.as_deref() == Some(pool))
            .collect())
    }

    /// Server the address is assigned to.
    pub async fn instance(&self, conn: &Connection) -> Result<Option<Server>, OpenStackError> {
        match &self.instance_id {
            Some(id) => Ok(Some(Server::find(conn, id).await?)),
            None => Ok(None),
        }
    }

    /// Assign the address to the server.
    pub async fn assign(&mut self, conn: &Connection, server: &Server) -> Result<(), OpenStackError> {
        let ip = self.ip.clone().ok_or_else(|| MappingError::MissingAttribute {
            kind: FLOATING_IP.element_name,
            attribute: "ip".into(),
        })?;
        server.add_floating_ip(conn, ip).await?;
        self.instance_id = Some(server.require_id()?.to_string());
        Ok(())
    }
}

#[async_trait]
impl Resource for FloatingIp {
    const KIND: &'static ResourceKind = &FLOATING_IP;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        Ok(Self {
            id: entity.id(),
            ip: entity.string("ip"),
            fixed_ip: entity.string("fixed_ip"),
            pool: entity.string("pool"),
            instance_id: entity.string("instance_id"),
        })
    }

    /// The allocation request has no envelope: `{"pool": "public"}`.
    fn encode(&self) -> Result<Value, OpenStackError> {
        let mut request = FloatingIpRequestBuilder::default();
        if let Some(pool) = self.pool.as_deref().filter(|p| !p.is_empty()) {
            request.pool(pool);
        }
        Ok(serde_json::to_value(request.build()?)?)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Pool of floating IPs, identified by its name.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct FloatingIpPool {
    pub name: String,
}

impl FloatingIpPool {
    /// Addresses of the tenant allocated from the pool.
    pub async fn floating_ips(&self, conn: &Connection) -> Result<Vec<FloatingIp>, OpenStackError> {
        FloatingIp::find_all_by_pool(conn, &self.name).await
    }
}

#[async_trait]
impl Resource for FloatingIpPool {
    const KIND: &'static ResourceKind = &FLOATING_IP_POOL;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        Ok(Self {
            name: entity.require_string("name")?,
        })
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        Err(OpenStackError::ReadOnly {
            kind: FLOATING_IP_POOL.element_name,
        })
    }

    fn id(&self) -> Option<&str> {
        (!self.name.is_empty()).then_some(self.name.as_str())
    }
}

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
use chrono::{DateTime, Utc};
use serde_json::Value;
use validator::Validate;

use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::path::{Query, Scope};
use crate::resource::{Entity, MappingError, Resource, ResourceKind};
use crate::session::ServiceName;

/// Format of the `start` and `end` parameters.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub static SIMPLE_TENANT_USAGE: ResourceKind = ResourceKind::new(
    ServiceName::Compute,
    "tenant_usage",
    "os-simple-tenant-usage",
)
.with_collection_key("tenant_usages")
.with_primary_key("tenant_id")
.with_nested(usage_nested);

pub static SERVER_USAGE: ResourceKind =
    ResourceKind::new(ServiceName::Compute, "server_usage", "server_usages");

fn usage_nested(key: &str) -> Option<&'static ResourceKind> {
    (key == "server_usages").then_some(&SERVER_USAGE)
}

/// Usage report of a tenant over a period.
///
/// Reports are always requested with their server details. Entries without
/// a tenant (returned by Nova for periods without activity) are dropped.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct SimpleTenantUsage {
    pub tenant_id: Option<String>,
    pub total_hours: Option<f64>,
    pub total_vcpus_usage: Option<f64>,
    pub total_memory_mb_usage: Option<f64>,
    pub total_local_gb_usage: Option<f64>,
    pub start: Option<DateTime<Utc>>,
    pub stop: Option<DateTime<Utc>>,
    pub server_usages: Vec<ServerUsage>,
}

/// Usage of a single server within a tenant report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServerUsage {
    pub name: Option<String>,
    pub instance_id: Option<String>,
    pub tenant_id: Option<String>,
    pub flavor: Option<String>,
    pub state: Option<String>,
    pub vcpus: Option<i64>,
    pub memory_mb: Option<i64>,
    pub local_gb: Option<i64>,
    pub hours: Option<f64>,
    /// Seconds.
    pub uptime: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ServerUsage {
    fn from_entity(entity: &Entity) -> Result<Self, MappingError> {
        Ok(Self {
            name: entity.string("name"),
            instance_id: entity.string("instance_id"),
            tenant_id: entity.string("tenant_id"),
            flavor: entity.string("flavor"),
            state: entity.string("state"),
            vcpus: entity.integer("vcpus")?,
            memory_mb: entity.integer("memory_mb")?,
            local_gb: entity.integer("local_gb")?,
            hours: entity.float("hours")?,
            uptime: entity.integer("uptime")?,
            started_at: entity.datetime("started_at")?,
            ended_at: entity.datetime("ended_at")?,
        })
    }

    /// Whether the server is still running at the end of the period.
    pub fn running(&self) -> bool {
        self.ended_at.is_none()
    }
}

fn period(from: &DateTime<Utc>, to: &DateTime<Utc>) -> Query {
    Query::new()
        .with("start", from.format(DATETIME_FORMAT))
        .with("end", to.format(DATETIME_FORMAT))
}

impl SimpleTenantUsage {
    /// Usage of every tenant from the date until now.
    pub async fn find_from_date(
        conn: &Connection,
        from: &DateTime<Utc>,
    ) -> Result<Vec<Self>, OpenStackError> {
        Self::find_between_dates(conn, from, &Utc::now()).await
    }

    /// Usage of every tenant between the dates.
    pub async fn find_between_dates(
        conn: &Connection,
        from: &DateTime<Utc>,
        to: &DateTime<Utc>,
    ) -> Result<Vec<Self>, OpenStackError> {
        Self::all_in(conn, &Scope::default(), &period(from, to)).await
    }

    /// Usage of the tenant between the dates, `None` without activity.
    pub async fn find_for_tenant(
        conn: &Connection,
        tenant_id: &str,
        from: &DateTime<Utc>,
        to: &DateTime<Utc>,
    ) -> Result<Option<Self>, OpenStackError> {
        let query = period(from, to).with("detailed", 1);
        let path =
            conn.paths()
                .element_path(&SIMPLE_TENANT_USAGE, tenant_id, &Scope::default(), &query)?;
        let body = conn.get(ServiceName::Compute, &path).await?;
        let usage = Self::load(body, &Scope::default())?;
        Ok(usage.tenant_id.is_some().then_some(usage))
    }
}

#[async_trait]
impl Resource for SimpleTenantUsage {
    const KIND: &'static ResourceKind = &SIMPLE_TENANT_USAGE;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        let server_usages = entity
            .entities("server_usages")
            .into_iter()
            .map(ServerUsage::from_entity)
            .collect::<Result<_, _>>()?;
        Ok(Self {
            tenant_id: entity.string("tenant_id"),
            total_hours: entity.float("total_hours")?,
            total_vcpus_usage: entity.float("total_vcpus_usage")?,
            total_memory_mb_usage: entity.float("total_memory_mb_usage")?,
            total_local_gb_usage: entity.float("total_local_gb_usage")?,
            start: entity.datetime("start")?,
            stop: entity.datetime("stop")?,
            server_usages,
        })
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        Err(OpenStackError::ReadOnly {
            kind: SIMPLE_TENANT_USAGE.element_name,
        })
    }

    fn id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Detailed reports of the tenants with activity.
    async fn all_in(
        conn: &Connection,
        scope: &Scope,
        query: &Query,
    ) -> Result<Vec<Self>, OpenStackError> {
        let query = query.clone().with("detailed", 1);
        let path = conn
            .paths()
            .collection_path(&SIMPLE_TENANT_USAGE, scope, &query)?;
        Ok(Self::all_from(conn, &path, scope)
            .await?
            .into_iter()
            .filter(|usage| usage.tenant_id.is_some())
            .collect())
    }
}

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
use openstack_resource_api_types::compute::{FlavorCreateBuilder, FlavorRequestBuilder};
use serde_json::{Map, Value};
use validator::Validate;

use super::Image;
use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::resource::kind::{rename, retain};
use crate::resource::{Entity, MappingError, Resource, ResourceKind};
use crate::session::ServiceName;
use crate::validators;

pub static FLAVOR: ResourceKind = ResourceKind::new(ServiceName::Compute, "flavor", "flavors")
    .with_detail()
    .with_normalizer(normalize_flavor);

/// Extension attributes are read under their namespaced names, anything
/// else outside the model is dropped.
fn normalize_flavor(mut raw: Map<String, Value>) -> Result<Map<String, Value>, MappingError> {
    rename(&mut raw, "OS-FLV-EXT-DATA:ephemeral", "ephemeral_disk");
    rename(&mut raw, "os-flavor-access:is_public", "is_public");
    retain(
        &mut raw,
        &[
            "id",
            "name",
            "ram",
            "disk",
            "swap",
            "vcpus",
            "rxtx_factor",
            "ephemeral_disk",
            "is_public",
        ],
    );
    Ok(raw)
}

/// Nova flavor.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct Flavor {
    pub id: Option<String>,
    #[validate(
        length(min = 2, max = 255, message = "must have 2 to 255 characters"),
        custom(function = "validators::resource_name")
    )]
    pub name: String,
    /// RAM (MB).
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub ram: Option<i64>,
    /// Root disk (GB).
    #[validate(required(message = "can't be blank"), range(min = 10))]
    pub disk: Option<i64>,
    /// Swap (MB).
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub swap: Option<i64>,
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub vcpus: Option<i64>,
    #[validate(required(message = "can't be blank"))]
    pub rxtx_factor: Option<f64>,
    /// Ephemeral disk (GB).
    #[validate(required(message = "can't be blank"), range(min = 0))]
    pub ephemeral_disk: Option<i64>,
    pub is_public: Option<bool>,
}

impl Flavor {
    pub async fn find_by_name(
        conn: &Connection,
        name: &str,
    ) -> Result<Option<Self>, OpenStackError> {
        Ok(Self::all(conn).await?.into_iter().find(|f| f.name == name))
    }

    pub async fn find_all_by_name(
        conn: &Connection,
        name: &str,
    ) -> Result<Vec<Self>, OpenStackError> {
        Ok(Self::all(conn)
            .await?
            .into_iter()
            .filter(|f| f.name == name)
            .collect())
    }

    /// Flavors providing at least the given resources. Unset constraints
    /// match every flavor.
    pub async fn find_by_constraints(
        conn: &Connection,
        ram: Option<i64>,
        vcpus: Option<i64>,
        disk: Option<i64>,
    ) -> Result<Vec<Self>, OpenStackError> {
        Ok(Self::all(conn)
            .await?
            .into_iter()
            .filter(|f| f.satisfies(ram, vcpus, disk))
            .collect())
    }

    /// Flavors large enough for the image.
    pub async fn applicable_for_image(
        conn: &Connection,
        image: &Image,
    ) -> Result<Vec<Self>, OpenStackError> {
        let positive = |value: Option<i64>| value.filter(|v| *v > 0);
        Self::find_by_constraints(conn, positive(image.min_ram), None, positive(image.min_disk))
            .await
    }

    /// `1 vCPU - 512 MB RAM - 10 GB Disk`.
    pub fn description(&self) -> String {
        format!(
            "{} vCPU - {} MB RAM - {} GB Disk",
            self.vcpus.unwrap_or_default(),
            self.ram.unwrap_or_default(),
            self.disk.unwrap_or_default()
        )
    }

    fn satisfies(&self, ram: Option<i64>, vcpus: Option<i64>, disk: Option<i64>) -> bool {
        let at_least =
            |value: Option<i64>, min: Option<i64>| min.is_none_or(|min| value.unwrap_or(0) >= min);
        at_least(self.ram, ram) && at_least(self.vcpus, vcpus) && at_least(self.disk, disk)
    }
}

#[async_trait]
impl Resource for Flavor {
    const KIND: &'static ResourceKind = &FLAVOR;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        Ok(Self {
            id: entity.id(),
            name: entity.string("name").unwrap_or_default(),
            ram: entity.integer("ram")?,
            disk: entity.integer("disk")?,
            swap: entity.integer("swap")?,
            vcpus: entity.integer("vcpus")?,
            rxtx_factor: entity.float("rxtx_factor")?,
            ephemeral_disk: entity.integer("ephemeral_disk")?,
            is_public: entity.boolean("is_public")?,
        })
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        let mut flavor = FlavorCreateBuilder::default();
        flavor
            .name(self.name.clone())
            .ram(self.ram.unwrap_or_default())
            .disk(self.disk.unwrap_or_default())
            .vcpus(self.vcpus.unwrap_or_default());
        if let Some(swap) = self.swap {
            flavor.swap(swap);
        }
        if let Some(ephemeral) = self.ephemeral_disk {
            flavor.ephemeral(ephemeral);
        }
        if let Some(is_public) = self.is_public {
            flavor.is_public(is_public);
        }
        if let Some(rxtx_factor) = self.rxtx_factor {
            flavor.rxtx_factor(rxtx_factor);
        }
        Ok(serde_json::to_value(
            FlavorRequestBuilder::default()
                .flavor(flavor.build()?)
                .build()?,
        )?)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

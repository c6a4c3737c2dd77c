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
use openstack_resource_api_types::compute::{NetworkCreateBuilder, NetworkRequestBuilder};
use serde_json::{Map, Value};
use validator::Validate;

use crate::error::OpenStackError;
use crate::resource::kind::retain;
use crate::resource::{Entity, MappingError, Resource, ResourceKind};
use crate::session::ServiceName;
use crate::validators;

pub static NETWORK: ResourceKind =
    ResourceKind::new(ServiceName::Compute, "network", "os-networks")
        .with_collection_key("networks")
        .with_normalizer(normalize_network);

fn normalize_network(mut raw: Map<String, Value>) -> Result<Map<String, Value>, MappingError> {
    retain(
        &mut raw,
        &[
            "id",
            "label",
            "cidr",
            "bridge",
            "bridge_interface",
            "multi_host",
            "vlan",
            "project_id",
        ],
    );
    Ok(raw)
}

/// Nova managed network.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct Network {
    pub id: Option<String>,
    #[validate(
        length(min = 1, message = "can't be blank"),
        custom(function = "validators::network_label")
    )]
    pub label: String,
    #[validate(
        length(min = 1, message = "can't be blank"),
        custom(function = "validators::ipv4_cidr")
    )]
    pub cidr: String,
    #[validate(custom(function = "validators::bridge"))]
    pub bridge: Option<String>,
    #[validate(custom(function = "validators::bridge_interface"))]
    pub bridge_interface: Option<String>,
    pub multi_host: Option<bool>,
    #[validate(required(message = "can't be blank"), range(min = 2, max = 4096))]
    pub vlan: Option<i64>,
    pub project_id: Option<String>,
}

impl Network {
    pub fn new<L: Into<String>, C: Into<String>>(label: L, cidr: C, vlan: i64) -> Self {
        Self {
            label: label.into(),
            cidr: cidr.into(),
            vlan: Some(vlan),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Resource for Network {
    const KIND: &'static ResourceKind = &NETWORK;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        Ok(Self {
            id: entity.id(),
            label: entity.string("label").unwrap_or_default(),
            cidr: entity.string("cidr").unwrap_or_default(),
            bridge: entity.string("bridge"),
            bridge_interface: entity.string("bridge_interface"),
            multi_host: entity.boolean("multi_host")?,
            vlan: entity.integer("vlan")?,
            project_id: entity.string("project_id"),
        })
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        let mut network = NetworkCreateBuilder::default();
        network.label(self.label.clone()).cidr(self.cidr.clone());
        if let Some(bridge) = &self.bridge {
            network.bridge(bridge.clone());
        }
        if let Some(bridge_interface) = &self.bridge_interface {
            network.bridge_interface(bridge_interface.clone());
        }
        if let Some(multi_host) = self.multi_host {
            network.multi_host(multi_host);
        }
        if let Some(vlan) = self.vlan {
            network.vlan(vlan);
        }
        if let Some(project_id) = &self.project_id {
            network.project_id(project_id.clone());
        }
        Ok(serde_json::to_value(
            NetworkRequestBuilder::default()
                .network(network.build()?)
                .build()?,
        )?)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

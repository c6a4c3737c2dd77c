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
use openstack_resource_api_types::compute::{
    SecurityGroupCreateBuilder, SecurityGroupRequestBuilder, SecurityGroupRuleCreateBuilder,
    SecurityGroupRuleRequestBuilder,
};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::resource::kind::{flatten_id, retain};
use crate::resource::{Entity, MappingError, Resource, ResourceKind};
use crate::session::ServiceName;
use crate::validators;

pub static SECURITY_GROUP: ResourceKind =
    ResourceKind::new(ServiceName::Compute, "security_group", "os-security-groups")
        .with_collection_key("security_groups")
        .with_nested(security_group_nested);

pub static SECURITY_GROUP_RULE: ResourceKind = ResourceKind::new(
    ServiceName::Compute,
    "security_group_rule",
    "os-security-group-rules",
)
.with_collection_key("security_group_rules")
.with_normalizer(normalize_rule);

fn security_group_nested(key: &str) -> Option<&'static ResourceKind> {
    (key == "rules").then_some(&SECURITY_GROUP_RULE)
}

/// Rules carry their cidr in `ip_range` and may embed the parent group.
fn normalize_rule(mut raw: Map<String, Value>) -> Result<Map<String, Value>, MappingError> {
    if !raw.contains_key("cidr") {
        if let Some(cidr) = raw
            .get("ip_range")
            .and_then(|range| range.get("cidr"))
            .cloned()
        {
            raw.insert("cidr".into(), cidr);
        }
    }
    flatten_id(&mut raw, "parent_group", "parent_group_id");
    retain(
        &mut raw,
        &[
            "id",
            "ip_protocol",
            "from_port",
            "to_port",
            "cidr",
            "parent_group_id",
        ],
    );
    Ok(raw)
}

/// Nova security group with its rules.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct SecurityGroup {
    pub id: Option<String>,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub name: String,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub description: String,
    pub tenant_id: Option<String>,
    pub rules: Vec<SecurityGroupRule>,
}

impl SecurityGroup {
    pub fn new<N: Into<String>, D: Into<String>>(name: N, description: D) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub async fn find_by_name(
        conn: &Connection,
        name: &str,
    ) -> Result<Option<Self>, OpenStackError> {
        Ok(Self::all(conn).await?.into_iter().find(|g| g.name == name))
    }
}

#[async_trait]
impl Resource for SecurityGroup {
    const KIND: &'static ResourceKind = &SECURITY_GROUP;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        let rules = entity
            .entities("rules")
            .into_iter()
            .map(|rule| SecurityGroupRule::from_entity(rule.clone()))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            id: entity.id(),
            name: entity.string("name").unwrap_or_default(),
            description: entity.string("description").unwrap_or_default(),
            tenant_id: entity.string("tenant_id"),
            rules,
        })
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        Ok(serde_json::to_value(
            SecurityGroupRequestBuilder::default()
                .security_group(
                    SecurityGroupCreateBuilder::default()
                        .name(self.name.clone())
                        .description(self.description.clone())
                        .build()?,
                )
                .build()?,
        )?)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Ingress rule of a security group.
///
/// ICMP rules use the ports as type and code (`-1..=255`), TCP and UDP rules
/// a port range (`1..=65535`, `from_port <= to_port`).
#[derive(Clone, Debug, Default, PartialEq, Validate)]
#[validate(schema(function = "validate_ports"))]
pub struct SecurityGroupRule {
    pub id: Option<String>,
    #[validate(
        length(min = 1, message = "can't be blank"),
        custom(function = "validators::ip_protocol")
    )]
    pub ip_protocol: String,
    #[validate(required(message = "can't be blank"))]
    pub from_port: Option<i64>,
    #[validate(required(message = "can't be blank"))]
    pub to_port: Option<i64>,
    #[validate(
        length(min = 1, message = "can't be blank"),
        custom(function = "validators::ipv4_cidr")
    )]
    pub cidr: String,
    #[validate(required(message = "can't be blank"))]
    parent_group_id: Option<String>,
}

fn validate_ports(rule: &SecurityGroupRule) -> Result<(), ValidationError> {
    let (Some(from), Some(to)) = (rule.from_port, rule.to_port) else {
        return Ok(());
    };
    let range = if rule.icmp() {
        -1..=255
    } else if rule.tcp() || rule.udp() {
        1..=65535
    } else {
        return Ok(());
    };
    let mut err = ValidationError::new("range");
    if !range.contains(&from) || !range.contains(&to) {
        err.message = Some(
            format!(
                "ports must be between {} and {}",
                range.start(),
                range.end()
            )
            .into(),
        );
        return Err(err);
    }
    if !rule.icmp() && to < from {
        err.message = Some("to_port must be greater than or equal to from_port".into());
        return Err(err);
    }
    Ok(())
}

impl SecurityGroupRule {
    pub fn new<P, C>(ip_protocol: P, from_port: i64, to_port: i64, cidr: C) -> Self
    where
        P: Into<String>,
        C: Into<String>,
    {
        Self {
            ip_protocol: ip_protocol.into(),
            from_port: Some(from_port),
            to_port: Some(to_port),
            cidr: cidr.into(),
            ..Default::default()
        }
    }

    pub fn with_parent_group<S: Into<String>>(mut self, group_id: S) -> Self {
        self.set_parent_group(group_id);
        self
    }

    pub fn parent_group_id(&self) -> Option<&str> {
        self.parent_group_id.as_deref()
    }

    /// Choose the group of the rule. Returns `false` (and changes nothing)
    /// once the rule exists.
    pub fn set_parent_group<S: Into<String>>(&mut self, group_id: S) -> bool {
        if self.persisted() {
            return false;
        }
        self.parent_group_id = Some(group_id.into());
        true
    }

    pub async fn parent_group(
        &self,
        conn: &Connection,
    ) -> Result<Option<SecurityGroup>, OpenStackError> {
        match &self.parent_group_id {
            Some(id) => Ok(Some(SecurityGroup::find(conn, id).await?)),
            None => Ok(None),
        }
    }

    pub fn icmp(&self) -> bool {
        self.ip_protocol == "icmp"
    }

    pub fn tcp(&self) -> bool {
        self.ip_protocol == "tcp"
    }

    pub fn udp(&self) -> bool {
        self.ip_protocol == "udp"
    }
}

#[async_trait]
impl Resource for SecurityGroupRule {
    const KIND: &'static ResourceKind = &SECURITY_GROUP_RULE;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        Ok(Self {
            id: entity.id(),
            ip_protocol: entity.string("ip_protocol").unwrap_or_default(),
            from_port: entity.integer("from_port")?,
            to_port: entity.integer("to_port")?,
            cidr: entity.string("cidr").unwrap_or_default(),
            parent_group_id: entity.string("parent_group_id"),
        })
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        Ok(serde_json::to_value(
            SecurityGroupRuleRequestBuilder::default()
                .security_group_rule(
                    SecurityGroupRuleCreateBuilder::default()
                        .ip_protocol(self.ip_protocol.clone())
                        .from_port(self.from_port.unwrap_or_default())
                        .to_port(self.to_port.unwrap_or_default())
                        .cidr(self.cidr.clone())
                        .parent_group_id(self.parent_group_id.clone().unwrap_or_default())
                        .build()?,
                )
                .build()?,
        )?)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

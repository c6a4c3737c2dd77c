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
use openstack_resource_api_types::block_storage::{VolumeCreateBuilder, VolumeRequestBuilder};
use serde_json::{Map, Value};
use validator::Validate;

use crate::compute::Server;
use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::resource::kind::{rename, retain};
use crate::resource::{Entity, MappingError, Resource, ResourceKind};
use crate::session::ServiceName;
use crate::validators;

pub static VOLUME: ResourceKind = ResourceKind::new(ServiceName::Volume, "volume", "volumes")
    .with_nested(volume_nested)
    .with_normalizer(normalize_volume);

/// Attachment as embedded in a volume.
pub static ATTACHMENT: ResourceKind =
    ResourceKind::new(ServiceName::Volume, "attachment", "attachments")
        .with_normalizer(normalize_attachment);

fn volume_nested(key: &str) -> Option<&'static ResourceKind> {
    match key {
        "attachments" => Some(&ATTACHMENT),
        _ => None,
    }
}

/// Both the snake case and the camel case (compute extension) forms are
/// accepted. Extension attributes (`volume_image_metadata`, `links`, ...) are
/// dropped.
fn normalize_volume(mut raw: Map<String, Value>) -> Result<Map<String, Value>, MappingError> {
    for (from, to) in [
        ("displayName", "display_name"),
        ("displayDescription", "display_description"),
        ("volumeType", "volume_type"),
        ("availabilityZone", "availability_zone"),
        ("snapshotId", "snapshot_id"),
        ("createdAt", "created_at"),
        ("created", "created_at"),
    ] {
        rename(&mut raw, from, to);
    }
    retain(&mut raw, VOLUME_ATTRIBUTES);
    Ok(raw)
}

const VOLUME_ATTRIBUTES: &[&str] = &[
    "id",
    "display_name",
    "display_description",
    "size",
    "volume_type",
    "availability_zone",
    "snapshot_id",
    "status",
    "created_at",
    "attachments",
];

fn normalize_attachment(mut raw: Map<String, Value>) -> Result<Map<String, Value>, MappingError> {
    rename(&mut raw, "serverId", "server_id");
    rename(&mut raw, "volumeId", "volume_id");
    retain(&mut raw, &["id", "server_id", "volume_id", "device"]);
    Ok(raw)
}

/// Server a volume is attached to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attachment {
    pub id: Option<String>,
    pub server_id: Option<String>,
    pub volume_id: Option<String>,
    pub device: Option<String>,
}

impl Attachment {
    fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.id(),
            server_id: entity.string("server_id"),
            volume_id: entity.string("volume_id"),
            device: entity.string("device"),
        }
    }
}

/// Block storage volume.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct Volume {
    pub id: Option<String>,
    #[validate(
        length(min = 2, max = 255, message = "must have 2 to 255 characters"),
        custom(function = "validators::resource_name")
    )]
    pub display_name: String,
    pub display_description: Option<String>,
    /// Size (GB).
    #[validate(required(message = "can't be blank"), range(min = 1))]
    pub size: Option<i64>,
    pub volume_type: Option<String>,
    pub availability_zone: Option<String>,
    /// Snapshot the volume was created from.
    pub snapshot_id: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub attachments: Vec<Attachment>,
}

impl Volume {
    pub fn new<S: Into<String>>(display_name: S, size: i64) -> Self {
        Self {
            display_name: display_name.into(),
            size: Some(size),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.display_name
    }

    /// Whether the volume was created from a snapshot.
    pub fn snapshot(&self) -> bool {
        self.persisted() && self.snapshot_id.is_some()
    }

    pub fn attached(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Server the volume is attached to.
    pub async fn server(&self, conn: &Connection) -> Result<Option<Server>, OpenStackError> {
        match self.attachments.first().and_then(|a| a.server_id.as_deref()) {
            Some(server_id) => Ok(Some(Server::find(conn, server_id).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Resource for Volume {
    const KIND: &'static ResourceKind = &VOLUME;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        Ok(Self {
            id: entity.id(),
            display_name: entity.string("display_name").unwrap_or_default(),
            display_description: entity.string("display_description"),
            size: entity.integer("size")?,
            volume_type: entity.string("volume_type"),
            availability_zone: entity.string("availability_zone"),
            snapshot_id: entity.string("snapshot_id"),
            status: entity.string("status"),
            created_at: entity.datetime("created_at")?,
            attachments: entity
                .entities("attachments")
                .into_iter()
                .map(Attachment::from_entity)
                .filter(|a| a.server_id.is_some())
                .collect(),
        })
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        let mut volume = VolumeCreateBuilder::default();
        volume
            .size(self.size.unwrap_or_default())
            .display_name(self.display_name.clone());
        if let Some(description) = &self.display_description {
            volume.display_description(description.clone());
        }
        if let Some(volume_type) = &self.volume_type {
            volume.volume_type(volume_type.clone());
        }
        if let Some(zone) = &self.availability_zone {
            volume.availability_zone(zone.clone());
        }
        if let Some(snapshot_id) = &self.snapshot_id {
            volume.snapshot_id(snapshot_id.clone());
        }
        Ok(serde_json::to_value(
            VolumeRequestBuilder::default()
                .volume(volume.build()?)
                .build()?,
        )?)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

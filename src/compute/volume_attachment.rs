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
    VolumeAttachmentCreateBuilder, VolumeAttachmentRequestBuilder,
};
use serde_json::{Map, Value};
use validator::Validate;

use super::Server;
use crate::block_storage::Volume;
use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::path::Scope;
use crate::resource::kind::{rename, retain};
use crate::resource::{Entity, MappingError, Resource, ResourceKind};
use crate::session::ServiceName;
use crate::validators;

pub static VOLUME_ATTACHMENT: ResourceKind = ResourceKind::new(
    ServiceName::Compute,
    "volumeAttachment",
    "os-volume_attachments",
)
.with_collection_key("volumeAttachments")
.with_prefix("servers/:server_id/")
.with_normalizer(normalize_attachment);

fn normalize_attachment(mut raw: Map<String, Value>) -> Result<Map<String, Value>, MappingError> {
    rename(&mut raw, "volumeId", "volume_id");
    rename(&mut raw, "serverId", "server_id");
    retain(&mut raw, &["id", "device", "volume_id", "server_id"]);
    Ok(raw)
}

/// Volume attached to a server as a device.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct VolumeAttachment {
    pub id: Option<String>,
    #[validate(
        length(min = 1, message = "can't be blank"),
        custom(function = "validators::device")
    )]
    pub device: String,
    #[validate(required(message = "can't be blank"))]
    volume_id: Option<String>,
    #[validate(required(message = "can't be blank"))]
    server_id: Option<String>,
}

impl VolumeAttachment {
    pub fn new<S, V, D>(server_id: S, volume_id: V, device: D) -> Self
    where
        S: Into<String>,
        V: Into<String>,
        D: Into<String>,
    {
        Self {
            device: device.into(),
            volume_id: Some(volume_id.into()),
            server_id: Some(server_id.into()),
            ..Default::default()
        }
    }

    /// Scope of the attachments of the server.
    pub fn scope_of(server_id: &str) -> Scope {
        Scope::new().with("server_id", server_id)
    }

    pub fn server_id(&self) -> Option<&str> {
        self.server_id.as_deref()
    }

    pub fn volume_id(&self) -> Option<&str> {
        self.volume_id.as_deref()
    }

    /// Choose the server. Returns `false` (and changes nothing) once the
    /// attachment exists.
    pub fn set_server<S: Into<String>>(&mut self, server_id: S) -> bool {
        if self.persisted() {
            return false;
        }
        self.server_id = Some(server_id.into());
        true
    }

    pub fn set_volume<S: Into<String>>(&mut self, volume_id: S) -> bool {
        if self.persisted() {
            return false;
        }
        self.volume_id = Some(volume_id.into());
        true
    }

    pub async fn server(&self, conn: &Connection) -> Result<Option<Server>, OpenStackError> {
        match &self.server_id {
            Some(id) => Ok(Some(Server::find(conn, id).await?)),
            None => Ok(None),
        }
    }

    pub async fn volume(&self, conn: &Connection) -> Result<Volume, OpenStackError> {
        let volume_id = self
            .volume_id
            .as_deref()
            .ok_or_else(|| MappingError::MissingAttribute {
                kind: VOLUME_ATTACHMENT.element_name,
                attribute: "volume_id".into(),
            })?;
        Volume::find(conn, volume_id).await
    }
}

#[async_trait]
impl Resource for VolumeAttachment {
    const KIND: &'static ResourceKind = &VOLUME_ATTACHMENT;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        Ok(Self {
            id: entity.id(),
            device: entity.string("device").unwrap_or_default(),
            volume_id: entity.string("volume_id"),
            server_id: entity.prefix_options().get("server_id").map(Into::into),
        })
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        Ok(serde_json::to_value(
            VolumeAttachmentRequestBuilder::default()
                .volume_attachment(
                    VolumeAttachmentCreateBuilder::default()
                        .device(self.device.clone())
                        .volume_id(self.volume_id.clone().unwrap_or_default())
                        .server_id(self.server_id.clone().unwrap_or_default())
                        .build()?,
                )
                .build()?,
        )?)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn scope(&self) -> Scope {
        self.server_id
            .as_deref()
            .map(Self::scope_of)
            .unwrap_or_default()
    }
}

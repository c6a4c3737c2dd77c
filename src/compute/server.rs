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
use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use openstack_resource_api_types::compute::{
    RebootType, SecurityGroupRef, ServerAction, ServerCreateBuilder, ServerRequestBuilder,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use validator::Validate;

use super::{Flavor, Image, KeyPair, SECURITY_GROUP, SecurityGroup, VolumeAttachment};
use crate::block_storage::Volume;
use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::path::{Query, Scope};
use crate::resource::kind::{flatten_id, rename, retain};
use crate::resource::{Entity, MappingError, Resource, ResourceKind};
use crate::session::ServiceName;
use crate::validators;

pub static SERVER: ResourceKind = ResourceKind::new(ServiceName::Compute, "server", "servers")
    .with_detail()
    .with_nested(server_nested)
    .with_normalizer(normalize_server);

fn server_nested(key: &str) -> Option<&'static ResourceKind> {
    match key {
        "security_groups" => Some(&SECURITY_GROUP),
        _ => None,
    }
}

const SERVER_ATTRIBUTES: &[&str] = &[
    "id",
    "name",
    "status",
    "progress",
    "updated_at",
    "created_at",
    "vm_state",
    "task",
    "power_state",
    "host_id",
    "tenant_id",
    "user_id",
    "user_data",
    "key_pair_id",
    "image_id",
    "flavor_id",
    "security_groups",
];

/// Extended status attributes are namespaced, image and flavor are embedded
/// objects (or the `imageRef`/`flavorRef` of a write envelope). Addresses,
/// links and metadata are not part of the model.
fn normalize_server(mut raw: Map<String, Value>) -> Result<Map<String, Value>, MappingError> {
    for (from, to) in [
        ("OS-EXT-STS:vm_state", "vm_state"),
        ("OS-EXT-STS:task_state", "task"),
        ("OS-EXT-STS:power_state", "power_state"),
        ("hostId", "host_id"),
        ("updated", "updated_at"),
        ("created", "created_at"),
        ("key_name", "key_pair_id"),
        ("imageRef", "image_id"),
        ("flavorRef", "flavor_id"),
    ] {
        rename(&mut raw, from, to);
    }
    flatten_id(&mut raw, "image", "image_id");
    flatten_id(&mut raw, "flavor", "flavor_id");
    retain(&mut raw, SERVER_ATTRIBUTES);
    Ok(raw)
}

/// Address of a server on one of its networks.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Address {
    pub addr: String,
    pub version: u8,
}

#[derive(Deserialize)]
struct Ips {
    #[serde(default)]
    addresses: BTreeMap<String, Vec<Address>>,
}

/// Nova server.
///
/// Image, flavor, key pair and security groups can only be chosen before the
/// server is created; the setters are no-ops afterwards and report it.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct Server {
    pub id: Option<String>,
    #[validate(
        length(min = 1, max = 255, message = "is blank or too long"),
        custom(function = "validators::server_name")
    )]
    pub name: String,
    pub status: Option<String>,
    pub progress: Option<i64>,
    pub vm_state: Option<String>,
    /// Task in progress, if any.
    pub task: Option<String>,
    pub power_state: Option<i64>,
    pub host_id: Option<String>,
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Plain text user data, encoded on creation.
    pub user_data: Option<String>,
    #[validate(required(message = "can't be blank"))]
    image_id: Option<String>,
    #[validate(required(message = "can't be blank"))]
    flavor_id: Option<String>,
    key_pair_id: Option<String>,
    security_group_names: Vec<String>,
}

impl Server {
    pub fn new<N, I, F>(name: N, image_id: I, flavor_id: F) -> Self
    where
        N: Into<String>,
        I: Into<String>,
        F: Into<String>,
    {
        Self {
            name: name.into(),
            image_id: Some(image_id.into()),
            flavor_id: Some(flavor_id.into()),
            ..Default::default()
        }
    }

    pub fn with_key_pair<S: Into<String>>(mut self, key_pair_id: S) -> Self {
        self.set_key_pair(key_pair_id);
        self
    }

    pub fn with_security_groups<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.persisted() {
            self.security_group_names = names.into_iter().map(Into::into).collect();
        }
        self
    }

    pub fn with_user_data<S: Into<String>>(mut self, user_data: S) -> Self {
        self.user_data = Some(user_data.into());
        self
    }

    pub fn image_id(&self) -> Option<&str> {
        self.image_id.as_deref()
    }

    pub fn flavor_id(&self) -> Option<&str> {
        self.flavor_id.as_deref()
    }

    pub fn key_pair_id(&self) -> Option<&str> {
        self.key_pair_id.as_deref()
    }

    /// Names of the security groups requested on creation.
    pub fn security_group_names(&self) -> &[String] {
        &self.security_group_names
    }

    /// Choose the image. Returns `false` (and changes nothing) once the
    /// server exists.
    pub fn set_image<S: Into<String>>(&mut self, image_id: S) -> bool {
        if self.persisted() {
            return false;
        }
        self.image_id = Some(image_id.into());
        true
    }

    pub fn set_flavor<S: Into<String>>(&mut self, flavor_id: S) -> bool {
        if self.persisted() {
            return false;
        }
        self.flavor_id = Some(flavor_id.into());
        true
    }

    pub fn set_key_pair<S: Into<String>>(&mut self, key_pair_id: S) -> bool {
        if self.persisted() {
            return false;
        }
        self.key_pair_id = Some(key_pair_id.into());
        true
    }

    pub fn set_security_groups(&mut self, groups: &[SecurityGroup]) -> bool {
        if self.persisted() {
            return false;
        }
        self.security_group_names = groups.iter().map(|g| g.name.clone()).collect();
        true
    }

    /// Servers of the tenant (admin access required).
    pub async fn all_by_tenant(
        conn: &Connection,
        tenant_id: &str,
    ) -> Result<Vec<Self>, OpenStackError> {
        Self::all_in(
            conn,
            &Scope::default(),
            &Query::new().with("tenant_id", tenant_id),
        )
        .await
    }

    pub async fn image(&self, conn: &Connection) -> Result<Option<Image>, OpenStackError> {
        match &self.image_id {
            Some(id) => Ok(Some(Image::find(conn, id).await?)),
            None => Ok(None),
        }
    }

    pub async fn flavor(&self, conn: &Connection) -> Result<Option<Flavor>, OpenStackError> {
        match &self.flavor_id {
            Some(id) => Ok(Some(Flavor::find(conn, id).await?)),
            None => Ok(None),
        }
    }

    pub async fn key_pair(&self, conn: &Connection) -> Result<Option<KeyPair>, OpenStackError> {
        match &self.key_pair_id {
            Some(name) => Ok(Some(KeyPair::find(conn, name).await?)),
            None => Ok(None),
        }
    }

    /// Security groups of the server. Before creation these are the
    /// requested groups looked up by name.
    pub async fn security_groups(
        &self,
        conn: &Connection,
    ) -> Result<Vec<SecurityGroup>, OpenStackError> {
        match self.id() {
            Some(id) => {
                let path = conn.paths().element_action_path(
                    &SERVER,
                    id,
                    "os-security-groups",
                    &Scope::default(),
                    &Query::default(),
                )?;
                SecurityGroup::all_from(conn, &path, &Scope::default()).await
            }
            None => Ok(SecurityGroup::all(conn)
                .await?
                .into_iter()
                .filter(|g| self.security_group_names.contains(&g.name))
                .collect()),
        }
    }

    /// Addresses per network. Empty until the server exists.
    pub async fn addresses(
        &self,
        conn: &Connection,
    ) -> Result<BTreeMap<String, Vec<Address>>, OpenStackError> {
        let Some(id) = self.id() else {
            return Ok(BTreeMap::new());
        };
        let path = conn.paths().element_action_path(
            &SERVER,
            id,
            "ips",
            &Scope::default(),
            &Query::default(),
        )?;
        let body = conn.get(ServiceName::Compute, &path).await?;
        if body.is_null() {
            return Ok(BTreeMap::new());
        }
        let ips: Ips = serde_json::from_value(body)?;
        Ok(ips.addresses)
    }

    pub async fn volume_attachments(
        &self,
        conn: &Connection,
    ) -> Result<Vec<VolumeAttachment>, OpenStackError> {
        VolumeAttachment::all_in(
            conn,
            &VolumeAttachment::scope_of(self.require_id()?),
            &Query::default(),
        )
        .await
    }

    /// Volumes attached to the server.
    pub async fn attached_volumes(&self, conn: &Connection) -> Result<Vec<Volume>, OpenStackError> {
        let mut volumes = Vec::new();
        for attachment in self.volume_attachments(conn).await? {
            volumes.push(attachment.volume(conn).await?);
        }
        Ok(volumes)
    }

    /// Attach the volume as `device` (e.g. `/dev/vdc`).
    pub async fn attach_volume(
        &self,
        conn: &Connection,
        volume_id: &str,
        device: &str,
    ) -> Result<VolumeAttachment, OpenStackError> {
        VolumeAttachment::new(self.require_id()?, volume_id, device)
            .save(conn)
            .await
    }

    /// Reload the status related attributes.
    pub async fn refresh_status(&mut self, conn: &Connection) -> Result<(), OpenStackError> {
        let Some(id) = self.id() else {
            return Ok(());
        };
        let updated = Self::find(conn, id).await?;
        self.progress = updated.progress;
        self.status = updated.status;
        self.task = updated.task;
        self.power_state = updated.power_state;
        self.vm_state = updated.vm_state;
        Ok(())
    }

    /// Run an action on the server and return the decoded response.
    #[tracing::instrument(level = "debug", skip(self, conn), fields(id = ?self.id))]
    pub async fn action(
        &self,
        conn: &Connection,
        action: ServerAction,
    ) -> Result<Value, OpenStackError> {
        let path = conn.paths().element_action_path(
            &SERVER,
            self.require_id()?,
            "action",
            &Scope::default(),
            &Query::default(),
        )?;
        let body = conn
            .post(ServiceName::Compute, &path, serde_json::to_value(&action)?)
            .await?;
        debug!("server action done");
        Ok(body)
    }

    pub async fn reboot(
        &self,
        conn: &Connection,
        reboot_type: RebootType,
    ) -> Result<(), OpenStackError> {
        self.action(conn, ServerAction::Reboot { reboot_type })
            .await?;
        Ok(())
    }

    /// Snapshot the server into a new image.
    pub async fn create_image<S: Into<String>>(
        &self,
        conn: &Connection,
        name: S,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), OpenStackError> {
        self.action(
            conn,
            ServerAction::CreateImage {
                name: name.into(),
                metadata,
            },
        )
        .await?;
        Ok(())
    }

    /// Last `length` lines of the console log.
    pub async fn console_output(
        &self,
        conn: &Connection,
        length: u32,
    ) -> Result<Option<String>, OpenStackError> {
        let body = self
            .action(conn, ServerAction::GetConsoleOutput { length })
            .await?;
        Ok(body
            .get("output")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// URL of a VNC console (`novnc` or `xvpvnc`).
    pub async fn vnc_console<S: Into<String>>(
        &self,
        conn: &Connection,
        console_type: S,
    ) -> Result<Option<String>, OpenStackError> {
        let body = self
            .action(
                conn,
                ServerAction::GetVncConsole {
                    console_type: console_type.into(),
                },
            )
            .await?;
        Ok(body
            .pointer("/console/url")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    pub async fn start(&self, conn: &Connection) -> Result<(), OpenStackError> {
        self.action(conn, ServerAction::Start(())).await?;
        Ok(())
    }

    pub async fn stop(&self, conn: &Connection) -> Result<(), OpenStackError> {
        self.action(conn, ServerAction::Stop(())).await?;
        Ok(())
    }

    pub async fn pause(&self, conn: &Connection) -> Result<(), OpenStackError> {
        self.action(conn, ServerAction::Pause(())).await?;
        Ok(())
    }

    pub async fn unpause(&self, conn: &Connection) -> Result<(), OpenStackError> {
        self.action(conn, ServerAction::Unpause(())).await?;
        Ok(())
    }

    pub async fn suspend(&self, conn: &Connection) -> Result<(), OpenStackError> {
        self.action(conn, ServerAction::Suspend(())).await?;
        Ok(())
    }

    pub async fn resume(&self, conn: &Connection) -> Result<(), OpenStackError> {
        self.action(conn, ServerAction::Resume(())).await?;
        Ok(())
    }

    pub async fn add_floating_ip<S: Into<String>>(
        &self,
        conn: &Connection,
        address: S,
    ) -> Result<(), OpenStackError> {
        self.action(
            conn,
            ServerAction::AddFloatingIp {
                address: address.into(),
            },
        )
        .await?;
        Ok(())
    }

    fn has_status(&self, status: &str) -> bool {
        self.status.as_deref() == Some(status)
    }

    pub fn active(&self) -> bool {
        self.has_status("ACTIVE")
    }

    pub fn paused(&self) -> bool {
        self.has_status("PAUSED")
    }

    pub fn shutoff(&self) -> bool {
        self.has_status("SHUTOFF")
    }

    pub fn deleted(&self) -> bool {
        self.has_status("DELETED")
    }
}

#[async_trait]
impl Resource for Server {
    const KIND: &'static ResourceKind = &SERVER;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        Ok(Self {
            id: entity.id(),
            name: entity.string("name").unwrap_or_default(),
            status: entity.string("status"),
            progress: entity.integer("progress")?,
            vm_state: entity.string("vm_state"),
            task: entity.string("task"),
            power_state: entity.integer("power_state")?,
            host_id: entity.string("host_id"),
            tenant_id: entity.string("tenant_id"),
            user_id: entity.string("user_id"),
            created_at: entity.datetime("created_at")?,
            updated_at: entity.datetime("updated_at")?,
            user_data: entity.string("user_data"),
            image_id: entity.string("image_id"),
            flavor_id: entity.string("flavor_id"),
            key_pair_id: entity.string("key_pair_id"),
            security_group_names: entity
                .entities("security_groups")
                .into_iter()
                .filter_map(|group| group.string("name"))
                .chain(entity.strings("security_groups"))
                .collect(),
        })
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        let mut server = ServerCreateBuilder::default();
        server
            .name(self.name.clone())
            .image_ref(self.image_id.clone().unwrap_or_default())
            .flavor_ref(self.flavor_id.clone().unwrap_or_default())
            .security_groups(
                self.security_group_names
                    .iter()
                    .map(SecurityGroupRef::new)
                    .collect::<Vec<_>>(),
            );
        if let Some(user_data) = self.user_data.as_deref().filter(|d| !d.is_empty()) {
            server.user_data(STANDARD.encode(user_data));
        }
        if let Some(key_name) = self.key_pair_id.as_deref().filter(|k| !k.is_empty()) {
            server.key_name(key_name);
        }
        Ok(serde_json::to_value(
            ServerRequestBuilder::default()
                .server(server.build()?)
                .build()?,
        )?)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

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
//! # Compute v2 request types
//!
//! Nova accepts a narrower (and differently named) set of attributes on
//! write than it returns on read: `imageRef`/`flavorRef` instead of the
//! embedded image and flavor, extension-prefixed flavor fields, `volumeId`
//! and `serverId` on the attachments. Unset optional attributes are never
//! sent since the API rejects `null` for several numeric fields.
use std::collections::BTreeMap;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::BuilderError;

/// Server create request (`POST /servers`).
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
pub struct ServerRequest {
    pub server: ServerCreate,
}

/// Server data.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct ServerCreate {
    /// Server name.
    pub name: String,
    /// Image reference.
    #[serde(rename = "imageRef")]
    pub image_ref: String,
    /// Flavor reference.
    #[serde(rename = "flavorRef")]
    pub flavor_ref: String,
    /// Base64 encoded user data.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    /// Key pair name.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    /// Security groups (by name).
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<SecurityGroupRef>,
}

/// Reference to a security group by name.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SecurityGroupRef {
    pub name: String,
}

impl SecurityGroupRef {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

/// Server action (`POST /servers/{id}/action`).
///
/// Actions without arguments are sent as `{"<action>": null}`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum ServerAction {
    #[serde(rename = "reboot")]
    Reboot {
        #[serde(rename = "type")]
        reboot_type: RebootType,
    },
    #[serde(rename = "createImage")]
    CreateImage {
        name: String,
        #[serde(default)]
        metadata: BTreeMap<String, String>,
    },
    #[serde(rename = "os-getConsoleOutput")]
    GetConsoleOutput { length: u32 },
    #[serde(rename = "os-getVNCConsole")]
    GetVncConsole {
        #[serde(rename = "type")]
        console_type: String,
    },
    #[serde(rename = "os-start")]
    Start(()),
    #[serde(rename = "os-stop")]
    Stop(()),
    #[serde(rename = "pause")]
    Pause(()),
    #[serde(rename = "unpause")]
    Unpause(()),
    #[serde(rename = "suspend")]
    Suspend(()),
    #[serde(rename = "resume")]
    Resume(()),
    #[serde(rename = "addFloatingIp")]
    AddFloatingIp { address: String },
}

/// Reboot flavor.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RebootType {
    #[default]
    Hard,
    Soft,
}

/// Image update request (`PUT /images/{id}`). Images are created through
/// the `createImage` server action.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
pub struct ImageRequest {
    pub image: ImageUpdate,
}

/// Image data.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(into))]
pub struct ImageUpdate {
    pub name: String,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Flavor create request (`POST /flavors`).
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
pub struct FlavorRequest {
    pub flavor: FlavorCreate,
}

/// Flavor data.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct FlavorCreate {
    /// Flavor name.
    pub name: String,
    /// RAM (MB).
    pub ram: i64,
    /// Root disk (GB).
    pub disk: i64,
    /// Virtual CPUs.
    pub vcpus: i64,
    /// Swap (MB).
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap: Option<i64>,
    /// Ephemeral disk (GB).
    #[builder(default)]
    #[serde(
        rename = "OS-FLV-EXT-DATA:ephemeral",
        skip_serializing_if = "Option::is_none"
    )]
    pub ephemeral: Option<i64>,
    /// Whether the flavor is public.
    #[builder(default)]
    #[serde(
        rename = "os-flavor-access:is_public",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_public: Option<bool>,
    /// Traffic shaping factor.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rxtx_factor: Option<f64>,
}

/// Network create request (`POST /os-networks`).
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
pub struct NetworkRequest {
    pub network: NetworkCreate,
}

/// Network data.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct NetworkCreate {
    pub label: String,
    pub cidr: String,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge_interface: Option<String>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_host: Option<bool>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<i64>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// Security group create request (`POST /os-security-groups`).
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
pub struct SecurityGroupRequest {
    pub security_group: SecurityGroupCreate,
}

/// Security group data.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(into))]
pub struct SecurityGroupCreate {
    pub name: String,
    pub description: String,
}

/// Security group rule create request (`POST /os-security-group-rules`).
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
pub struct SecurityGroupRuleRequest {
    pub security_group_rule: SecurityGroupRuleCreate,
}

/// Security group rule data.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(into))]
pub struct SecurityGroupRuleCreate {
    pub ip_protocol: String,
    pub from_port: i64,
    pub to_port: i64,
    pub cidr: String,
    pub parent_group_id: String,
}

/// Key pair create request (`POST /os-keypairs`).
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
pub struct KeyPairRequest {
    pub keypair: KeyPairCreate,
}

/// Key pair data. Without a public key Nova generates the pair.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct KeyPairCreate {
    pub name: String,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// Floating IP allocation request (`POST /os-floating-ips`). It has no
/// element envelope.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct FloatingIpRequest {
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
}

/// Volume attachment request (`POST /servers/{id}/os-volume_attachments`).
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
pub struct VolumeAttachmentRequest {
    #[serde(rename = "volumeAttachment")]
    pub volume_attachment: VolumeAttachmentCreate,
}

/// Volume attachment data.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(into))]
pub struct VolumeAttachmentCreate {
    pub device: String,
    #[serde(rename = "volumeId")]
    pub volume_id: String,
    #[serde(rename = "serverId")]
    pub server_id: String,
}

/// Quota set update request (`PUT /os-quota-sets/{tenant_id}`).
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
pub struct QuotaSetRequest {
    pub quota_set: QuotaSetUpdate,
}

/// Quota set data.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option))]
pub struct QuotaSetUpdate {
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances: Option<i64>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores: Option<i64>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram: Option<i64>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floating_ips: Option<i64>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_pairs: Option<i64>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_items: Option<i64>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<i64>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_group_rules: Option<i64>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_files: Option<i64>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_file_content_bytes: Option<i64>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_file_path_bytes: Option<i64>,
}

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
//! # Compute (Nova v2) resources
//!
//! Servers, images and flavors are "detail" kinds: they are listed through
//! `{collection}/detail` but created on the plain collection.
mod flavor;
mod floating_ip;
mod image;
mod key_pair;
mod network;
mod quota_set;
mod security_group;
mod server;
mod usage;
mod volume_attachment;

pub use flavor::{FLAVOR, Flavor};
pub use floating_ip::{FLOATING_IP, FLOATING_IP_POOL, FloatingIp, FloatingIpPool};
pub use image::{IMAGE, Image};
pub use key_pair::{KEY_PAIR, KeyPair};
pub use network::{NETWORK, Network};
pub use openstack_resource_api_types::compute::RebootType;
pub use quota_set::{QUOTA_SET, QuotaSet};
pub use security_group::{
    SECURITY_GROUP, SECURITY_GROUP_RULE, SecurityGroup, SecurityGroupRule,
};
pub use server::{Address, SERVER, Server};
pub use usage::{SERVER_USAGE, SIMPLE_TENANT_USAGE, ServerUsage, SimpleTenantUsage};
pub use volume_attachment::{VOLUME_ATTACHMENT, VolumeAttachment};

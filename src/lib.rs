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

//! # Typed OpenStack resources
//!
//! A client layer over the OpenStack control plane (Keystone v2 identity,
//! Nova v2 compute and the block storage service). It authenticates a
//! principal, discovers the per-service endpoints from the returned service
//! catalog and exposes strongly typed resources (tenants, users, roles,
//! servers, images, flavors, networks, security groups, volumes, ...)
//! translating between the wire JSON and in-memory entities.
//!
//! The crate is organized in layers:
//!
//! - [`session`] holds the token and the per-service endpoints of one
//!   logical session.
//!
//! - [`transport`] is the HTTP seam. [`transport::HttpTransport`] implements
//!   it on top of `reqwest`, tests replace it with a mock.
//!
//! - [`path`] computes the collection, element and action paths of every
//!   resource kind, including the API quirks (detail listings, nested owner
//!   resources, no format suffix).
//!
//! - [`resource`] is the attribute mapper: it loads heterogeneous nested JSON
//!   into [`resource::Entity`] graphs driven by a per-kind registry and hosts
//!   the generic remote operations of every typed resource.
//!
//! - [`auth`] implements the token acquisition and the service catalog
//!   lookup.
//!
//! - [`identity`], [`compute`] and [`block_storage`] contain the typed
//!   resources with their encode/decode rules.
//!
//! A typical flow:
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use openstack_resource::auth::Credential;
//! use openstack_resource::compute::Server;
//! use openstack_resource::connection::Connection;
//! use openstack_resource::resource::Resource;
//! use openstack_resource::session::ServiceName;
//! use openstack_resource::transport::HttpTransport;
//!
//! let mut conn = Connection::new(Arc::new(HttpTransport::default()));
//! conn.session_mut()
//!     .set_endpoint(ServiceName::IdentityPublic, "http://keystone:5000/v2.0/")?;
//! conn.authenticate(Credential::new("demo", "secret").with_tenant_id("t1"))
//!     .await?;
//! for server in Server::all(&conn).await? {
//!     println!("{}: {:?}", server.name, server.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod block_storage;
pub mod compute;
pub mod config;
pub mod connection;
pub mod error;
pub mod identity;
pub mod path;
pub mod resource;
pub mod session;
pub mod transport;
pub mod validators;

#[cfg(test)]
mod tests;

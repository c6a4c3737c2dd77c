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
//! # Identity
//!
//! Keystone v2 resources. Tenants, users and roles live on the admin
//! endpoint; the tenants a token has access to are listed on the public one.
mod role;
mod tenant;
mod user;
mod user_role;

pub use role::{ROLE, Role};
pub use tenant::{PUBLIC_TENANT, TENANT, Tenant};
pub use user::{USER, User};
pub use user_role::{USER_ROLE, UserRole};

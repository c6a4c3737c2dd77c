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
//! # Identity v2 request types
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::BuilderError;

/// Token request (`POST /tokens`).
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
pub struct AuthRequest {
    /// Authentication data.
    pub auth: AuthRequestInner,
}

/// Authentication data: either the password credentials or an existing token,
/// optionally scoped to a tenant.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError", validate = "Self::validate"))]
#[builder(setter(strip_option, into))]
pub struct AuthRequestInner {
    /// Password credentials.
    #[builder(default)]
    #[serde(rename = "passwordCredentials", skip_serializing_if = "Option::is_none")]
    pub password_credentials: Option<PasswordCredentials>,

    /// Existing token used for the renewal.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenAuth>,

    /// Tenant to scope the token to.
    #[builder(default)]
    #[serde(rename = "tenantId", skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl AuthRequestInnerBuilder {
    fn validate(&self) -> Result<(), String> {
        match (&self.password_credentials, &self.token) {
            (Some(Some(_)), Some(Some(_))) => {
                Err("password credentials and token are mutually exclusive".into())
            }
            (None | Some(None), None | Some(None)) => {
                Err("either password credentials or token must be set".into())
            }
            _ => Ok(()),
        }
    }
}

/// Username and password.
#[derive(Builder, Clone, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(into))]
pub struct PasswordCredentials {
    /// User name.
    pub username: String,
    /// User password.
    pub password: String,
}

impl std::fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Token identity.
#[derive(Builder, Clone, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(into))]
pub struct TokenAuth {
    /// Token ID.
    pub id: String,
}

impl std::fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuth").field("id", &"[REDACTED]").finish()
    }
}

/// Tenant create/update request.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
pub struct TenantRequest {
    pub tenant: Tenant,
}

/// Tenant data.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct Tenant {
    /// Tenant name.
    pub name: String,
    /// Tenant description.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the tenant is enabled.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// User create/update request.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
pub struct UserRequest {
    pub user: User,
}

/// User data. The primary tenant travels as `tenantId`.
#[derive(Builder, Clone, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct User {
    /// User name.
    pub name: String,
    /// User password.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// E-mail address.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Whether the user is enabled.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Primary tenant.
    #[builder(default)]
    #[serde(rename = "tenantId", skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("enabled", &self.enabled)
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

/// Role create request (`POST /OS-KSADM/roles`).
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
pub struct RoleRequest {
    pub role: Role,
}

/// Role data.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(into))]
pub struct Role {
    /// Role name.
    pub name: String,
}

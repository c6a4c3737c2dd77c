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
//! # Session
//!
//! The per-session state shared by every request: the authentication token
//! and the base URL of each OpenStack service. A session is owned by a
//! [`Connection`](crate::connection::Connection), so independent connections
//! never share a token.
use std::collections::HashMap;
use std::fmt;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::auth::Token;
use crate::error::OpenStackError;

/// Header carrying the token.
pub static X_AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");

/// Logical OpenStack service reachable through the session.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ServiceName {
    /// Keystone public endpoint (token acquisition).
    IdentityPublic,
    /// Keystone admin endpoint (tenants, users, roles).
    IdentityAdmin,
    /// Nova.
    Compute,
    /// Block storage.
    Volume,
}

impl ServiceName {
    /// Service type as found in the service catalog.
    pub fn catalog_type(&self) -> &'static str {
        match self {
            Self::IdentityPublic | Self::IdentityAdmin => "identity",
            Self::Compute => "compute",
            Self::Volume => "volume",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdentityPublic => write!(f, "identity (public)"),
            Self::IdentityAdmin => write!(f, "identity (admin)"),
            Self::Compute => write!(f, "compute"),
            Self::Volume => write!(f, "volume"),
        }
    }
}

/// Configured endpoint of a service.
#[derive(Clone, Debug, PartialEq)]
struct Site {
    url: Url,
    /// Path of the site with a trailing slash.
    prefix: String,
}

impl Site {
    fn new(url: Url) -> Self {
        let mut prefix = url.path().to_string();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self { url, prefix }
    }
}

/// Token and per-service endpoints of one logical session.
#[derive(Clone, Debug, Default)]
pub struct Session {
    token: Option<Token>,
    sites: HashMap<ServiceName, Site>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the token sent with every subsequent request.
    pub fn set_token(&mut self, token: Token) {
        debug!("session token replaced");
        self.token = Some(token);
    }

    pub fn current_token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Drop the token (logout). Subsequent requests are unauthenticated.
    pub fn clear_token(&mut self) -> Option<Token> {
        self.token.take()
    }

    /// Set the base URL of the service.
    pub fn set_endpoint<U: AsRef<str>>(
        &mut self,
        service: ServiceName,
        url: U,
    ) -> Result<(), OpenStackError> {
        let url = Url::parse(url.as_ref())?;
        debug!(%service, %url, "service endpoint configured");
        self.sites.insert(service, Site::new(url));
        Ok(())
    }

    /// Whether the endpoint of the service is known.
    pub fn has_endpoint(&self, service: ServiceName) -> bool {
        self.sites.contains_key(&service)
    }

    /// Base URL of the service.
    pub fn get_endpoint(&self, service: ServiceName) -> Result<&Url, OpenStackError> {
        self.sites
            .get(&service)
            .map(|site| &site.url)
            .ok_or(OpenStackError::NotConfigured(service))
    }

    /// Path component of the service URL, always ending with `/`.
    pub fn prefix(&self, service: ServiceName) -> Result<&str, OpenStackError> {
        self.sites
            .get(&service)
            .map(|site| site.prefix.as_str())
            .ok_or(OpenStackError::NotConfigured(service))
    }

    /// Headers carrying the current token. Empty when no token is set.
    pub fn auth_headers(&self) -> Result<HeaderMap, OpenStackError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(token.id().expose_secret())?;
            value.set_sensitive(true);
            headers.insert(X_AUTH_TOKEN.clone(), value);
        }
        Ok(headers)
    }
}

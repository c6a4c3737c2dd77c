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
//! # Connection
//!
//! A [`Session`] together with the [`Transport`] used to reach the services.
//! Every resource operation takes the connection by reference.
use std::fmt;
use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::{AuthFailure, Authentication, Credential};
use crate::config::Config;
use crate::error::OpenStackError;
use crate::path::PathResolver;
use crate::session::{ServiceName, Session};
use crate::transport::{HttpTransport, Request, Transport, TransportError};

/// Session bound to a transport.
#[derive(Clone)]
pub struct Connection {
    session: Session,
    transport: Arc<dyn Transport>,
    region: Option<String>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("session", &self.session)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_session(transport, Session::new())
    }

    pub fn with_session(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self {
            session,
            transport,
            region: None,
        }
    }

    /// Connection with an HTTP transport and the identity endpoints from
    /// the configuration.
    pub fn with_config(config: &Config) -> Result<Self, OpenStackError> {
        let transport = HttpTransport::new(&config.http)?;
        let mut conn = Self::new(Arc::new(transport));
        conn.session
            .set_endpoint(ServiceName::IdentityPublic, config.auth.auth_url.as_str())?;
        if let Some(admin_url) = &config.auth.admin_url {
            conn.session
                .set_endpoint(ServiceName::IdentityAdmin, admin_url.as_str())?;
        }
        conn.region = config.auth.region.clone();
        Ok(conn)
    }

    /// Restrict the endpoints taken from the service catalog to a region.
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn paths(&self) -> PathResolver<'_> {
        PathResolver::new(&self.session)
    }

    /// Authenticate with the credential and record the token and the
    /// service endpoints in the session.
    pub async fn authenticate(
        &mut self,
        credential: Credential,
    ) -> Result<Authentication, AuthFailure> {
        let mut auth = Authentication::new(credential);
        auth.authenticate(self).await?;
        self.apply(&auth)?;
        Ok(auth)
    }

    /// Renew the token of an authenticated object (or authenticate it) and
    /// record the outcome in the session.
    pub async fn reauthenticate(&mut self, auth: &mut Authentication) -> Result<(), AuthFailure> {
        auth.authenticate(self).await?;
        self.apply(auth)?;
        Ok(())
    }

    /// Drop the token of the session and of the authentication.
    pub fn logout(&mut self, auth: &mut Authentication) {
        auth.logout();
        self.session.clear_token();
        info!("logged out");
    }

    /// Record token and catalog endpoints in the session.
    fn apply(&mut self, auth: &Authentication) -> Result<(), OpenStackError> {
        if let Some(token) = auth.token() {
            self.session.set_token(token.clone());
        }
        let region = self.region.as_deref();
        for service in [
            ServiceName::IdentityPublic,
            ServiceName::Compute,
            ServiceName::Volume,
        ] {
            if let Some(url) = auth
                .endpoint_for(service.catalog_type(), region)
                .and_then(|ep| ep.public_url.as_deref())
            {
                self.session.set_endpoint(service, url)?;
            }
        }
        if !self.session.has_endpoint(ServiceName::IdentityAdmin) {
            if let Some(url) = auth
                .endpoint_for(ServiceName::IdentityAdmin.catalog_type(), region)
                .and_then(|ep| ep.admin_url.as_deref())
            {
                self.session.set_endpoint(ServiceName::IdentityAdmin, url)?;
            }
        }
        Ok(())
    }

    /// Send the request and decode the JSON response.
    ///
    /// `404` is reported as [`OpenStackError::NotFound`], other non success
    /// statuses as decorated transport errors.
    #[tracing::instrument(level = "debug", skip(self, body))]
    pub async fn request(
        &self,
        method: Method,
        service: ServiceName,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, OpenStackError> {
        let url = self.session.get_endpoint(service)?.join(path)?;
        let request = Request::new(method, url)
            .with_headers(self.session.auth_headers()?)
            .with_body(body);
        let response = self.transport.request(request).await?;
        debug!(status = %response.status, "response");
        if !response.status.is_success() {
            let err = TransportError::from_response(response.status, response.body);
            if response.status == StatusCode::NOT_FOUND {
                return Err(OpenStackError::NotFound {
                    message: err.to_string(),
                });
            }
            return Err(err.into());
        }
        Ok(response.json()?)
    }

    pub async fn get(&self, service: ServiceName, path: &str) -> Result<Value, OpenStackError> {
        self.request(Method::GET, service, path, None).await
    }

    pub async fn post(
        &self,
        service: ServiceName,
        path: &str,
        body: Value,
    ) -> Result<Value, OpenStackError> {
        self.request(Method::POST, service, path, Some(body)).await
    }

    pub async fn put(
        &self,
        service: ServiceName,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, OpenStackError> {
        self.request(Method::PUT, service, path, body).await
    }

    pub async fn delete(&self, service: ServiceName, path: &str) -> Result<(), OpenStackError> {
        self.request(Method::DELETE, service, path, None).await?;
        Ok(())
    }
}

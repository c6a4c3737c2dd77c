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
//! # Authentication
//!
//! Token acquisition against the Keystone v2 public endpoint.
//!
//! An [`Authentication`] starts `Unauthenticated`. A successful
//! [`Authentication::authenticate`] makes it `Authenticated` and keeps the
//! token with the service catalog; calling it again renews the token using
//! the token itself. Rejected credentials are reported as a field failure on
//! `password` and leave the state as it was.
use openstack_resource_api_types::identity::{
    AuthRequest, AuthRequestBuilder, AuthRequestInnerBuilder, PasswordCredentialsBuilder,
    TokenAuthBuilder,
};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::path::{Query, Scope};
use crate::session::ServiceName;

pub mod error;
mod types;

pub use error::AuthFailure;
pub use types::{
    AccessUser, CatalogEntry, Credential, Endpoint, ServiceCatalog, Token, TokenTenant,
};
use types::{ACCESS, Access};

/// State of an [`Authentication`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// Authentication of a principal and its outcome.
#[derive(Clone, Debug)]
pub struct Authentication {
    credential: Option<Credential>,
    tenant_id: Option<String>,
    state: AuthState,
    token: Option<Token>,
    catalog: ServiceCatalog,
    user: Option<AccessUser>,
}

impl Authentication {
    pub fn new(credential: Credential) -> Self {
        Self {
            tenant_id: credential.tenant_id.clone(),
            credential: Some(credential),
            state: AuthState::Unauthenticated,
            token: None,
            catalog: ServiceCatalog::default(),
            user: None,
        }
    }

    /// Authentication renewing an existing token (e.g. to scope an
    /// unscoped token to a tenant).
    pub fn with_token(token: Token) -> Self {
        Self {
            credential: None,
            tenant_id: None,
            state: AuthState::Unauthenticated,
            token: Some(token),
            catalog: ServiceCatalog::default(),
            user: None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn service_catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn user(&self) -> Option<&AccessUser> {
        self.user.as_ref()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Scope the next (re)authentication to the tenant.
    pub fn set_tenant_id<S: Into<String>>(&mut self, tenant_id: Option<S>) {
        self.tenant_id = tenant_id.map(Into::into);
    }

    /// Body of the token request: the held token when there is one,
    /// the password credentials otherwise.
    pub fn request_body(&self) -> Result<AuthRequest, OpenStackError> {
        let mut inner = AuthRequestInnerBuilder::default();
        if let Some(token) = &self.token {
            inner.token(
                TokenAuthBuilder::default()
                    .id(token.id().expose_secret())
                    .build()?,
            );
        } else if let Some(credential) = &self.credential {
            inner.password_credentials(
                PasswordCredentialsBuilder::default()
                    .username(credential.username.clone())
                    .password(credential.password.expose_secret())
                    .build()?,
            );
        }
        if let Some(tenant_id) = &self.tenant_id {
            inner.tenant_id(tenant_id.clone());
        }
        Ok(AuthRequestBuilder::default().auth(inner.build()?).build()?)
    }

    fn validate(&self) -> Result<(), AuthFailure> {
        if self.token.is_some() {
            return Ok(());
        }
        match &self.credential {
            Some(credential) => Ok(credential.validate()?),
            None => Err(AuthFailure::invalid_password()),
        }
    }

    /// Request a token.
    ///
    /// Returns [`AuthFailure::InvalidCredentials`] on `401`; the state is
    /// restored in that case and on every other failure.
    #[tracing::instrument(level = "debug", skip_all, fields(tenant_id = ?self.tenant_id))]
    pub async fn authenticate(&mut self, conn: &Connection) -> Result<&Token, AuthFailure> {
        self.validate()?;
        let body = serde_json::to_value(self.request_body()?)?;
        let path = conn
            .paths()
            .create_path(&ACCESS, &Scope::default(), &Query::default())?;

        let previous = self.state;
        self.state = AuthState::Authenticating;
        debug!(renewal = self.token.is_some(), "requesting token");
        let result = match conn.post(ServiceName::IdentityPublic, &path, body).await {
            Ok(rsp) => Access::load(rsp).map_err(OpenStackError::from),
            Err(err) => Err(err),
        };
        match result {
            Ok(access) => {
                self.state = AuthState::Authenticated;
                self.catalog = access.catalog;
                self.user = access.user;
                info!(
                    expires_at = %access.token.expires_at(),
                    services = self.catalog.entries().len(),
                    "authenticated"
                );
                Ok(&*self.token.insert(access.token))
            }
            Err(err) if err.status() == Some(StatusCode::UNAUTHORIZED) => {
                warn!("identity rejected the credentials");
                self.state = previous;
                Err(AuthFailure::invalid_password())
            }
            Err(err) => {
                self.state = previous;
                Err(err.into())
            }
        }
    }

    /// Forget the token and the catalog.
    pub fn logout(&mut self) {
        self.token = None;
        self.catalog = ServiceCatalog::default();
        self.user = None;
        self.state = AuthState::Unauthenticated;
    }

    /// All endpoints of the service type (optionally in the region).
    pub fn endpoints_for(&self, service_type: &str, region: Option<&str>) -> Vec<&Endpoint> {
        self.catalog.endpoints_for(service_type, region)
    }

    /// First endpoint of the service type (optionally in the region).
    pub fn endpoint_for(&self, service_type: &str, region: Option<&str>) -> Option<&Endpoint> {
        self.catalog.endpoint_for(service_type, region)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use serde_json::{Value, json};
    use tracing_test::traced_test;

    use super::*;
    use crate::transport::{MockTransport, Request, Response};

    const ACCESS_BODY: &str = r#"{"access": {
        "token": {"id": "tok", "expires": "2030-01-01T00:00:00Z", "tenant": {"id": "t1", "name": "demo"}},
        "serviceCatalog": [
            {"type": "compute", "name": "nova", "endpoints": [
                {"region": "A", "publicURL": "http://nova-a:8774/v2/t1"},
                {"region": "B", "publicURL": "http://nova-b:8774/v2/t1"}
            ]},
            {"type": "volume", "name": "cinder", "endpoints": [
                {"region": "B", "publicURL": "http://cinder-b:8776/v1/t1"}
            ]},
            {"type": "identity", "name": "keystone", "endpoints": [
                {"region": "B", "publicURL": "http://keystone:5000/v2.0", "adminURL": "http://keystone:35357/v2.0"}
            ]}
        ]
    }}"#;

    fn connection(transport: MockTransport) -> Connection {
        let mut conn = Connection::new(Arc::new(transport));
        conn.session_mut()
            .set_endpoint(ServiceName::IdentityPublic, "http://keystone:5000/v2.0/")
            .unwrap();
        conn
    }

    #[test]
    fn test_password_body() {
        let auth = Authentication::new(Credential::new("demo", "secret"));
        assert_eq!(
            json!({"auth": {"passwordCredentials": {"username": "demo", "password": "secret"}}}),
            serde_json::to_value(auth.request_body().unwrap()).unwrap()
        );
        let auth = Authentication::new(Credential::new("demo", "secret").with_tenant_id("t1"));
        assert_eq!(
            json!({"auth": {"passwordCredentials": {"username": "demo", "password": "secret"}, "tenantId": "t1"}}),
            serde_json::to_value(auth.request_body().unwrap()).unwrap()
        );
    }

    #[test]
    fn test_token_body() {
        let mut auth = Authentication::with_token(Token::new("T", Utc::now() + Duration::hours(1)));
        assert_eq!(
            json!({"auth": {"token": {"id": "T"}}}),
            serde_json::to_value(auth.request_body().unwrap()).unwrap()
        );
        auth.set_tenant_id(Some("t2"));
        let body = serde_json::to_value(auth.request_body().unwrap()).unwrap();
        assert_eq!(json!("t2"), body["auth"]["tenantId"]);
        assert_eq!(Value::Null, body["auth"]["passwordCredentials"]);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_authenticate() {
        let mut transport = MockTransport::default();
        transport
            .expect_request()
            .withf(|req: &Request| {
                req.url.as_str() == "http://keystone:5000/v2.0/tokens"
                    && req.headers.get("x-auth-token").is_none()
            })
            .returning(|_| Ok(Response::new(StatusCode::OK, ACCESS_BODY)));
        let mut conn = connection(transport).with_region("B");
        let auth = conn
            .authenticate(Credential::new("demo", "secret").with_tenant_id("t1"))
            .await
            .unwrap();

        assert_eq!(AuthState::Authenticated, auth.state());
        assert_eq!(
            "tok",
            conn.session().current_token().unwrap().id().expose_secret()
        );
        assert_eq!(
            "http://nova-b:8774/v2/t1",
            conn.session()
                .get_endpoint(ServiceName::Compute)
                .unwrap()
                .as_str()
        );
        assert_eq!("/v1/t1/", conn.session().prefix(ServiceName::Volume).unwrap());
        assert_eq!(
            "/v2.0/",
            conn.session().prefix(ServiceName::IdentityAdmin).unwrap()
        );
        assert!(logs_contain("authenticated"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_unauthorized_is_password_failure() {
        let mut transport = MockTransport::default();
        transport.expect_request().returning(|_| {
            Ok(Response::new(
                StatusCode::UNAUTHORIZED,
                r#"{"error": {"message": "Invalid user / password", "code": 401}}"#,
            ))
        });
        let conn = connection(transport);
        let mut auth = Authentication::new(Credential::new("demo", "wrong"));
        match auth.authenticate(&conn).await {
            Err(AuthFailure::InvalidCredentials(errors)) => {
                assert!(errors.field_errors().contains_key("password"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(AuthState::Unauthenticated, auth.state());
        assert!(auth.token().is_none());
        assert!(logs_contain("rejected"));
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let mut transport = MockTransport::default();
        transport
            .expect_request()
            .returning(|_| Ok(Response::new(StatusCode::SERVICE_UNAVAILABLE, "")));
        let conn = connection(transport);
        let mut auth = Authentication::new(Credential::new("demo", "secret"));
        match auth.authenticate(&conn).await {
            Err(AuthFailure::Transport(err)) => {
                assert_eq!(Some(StatusCode::SERVICE_UNAVAILABLE), err.status())
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_local_validation_sends_nothing() {
        let transport = MockTransport::default();
        let conn = connection(transport);
        let mut auth = Authentication::new(Credential::new("", "secret"));
        assert!(matches!(
            auth.authenticate(&conn).await,
            Err(AuthFailure::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_reauthenticate_uses_token() {
        let mut transport = MockTransport::default();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_request()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req: &Request| {
                req.body
                    .as_ref()
                    .is_some_and(|b| b["auth"]["passwordCredentials"].is_object())
            })
            .returning(|_| Ok(Response::new(StatusCode::OK, ACCESS_BODY)));
        transport
            .expect_request()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req: &Request| {
                req.body
                    .as_ref()
                    .is_some_and(|b| b["auth"]["token"]["id"] == "tok")
            })
            .returning(|_| Ok(Response::new(StatusCode::OK, ACCESS_BODY)));
        let mut conn = connection(transport);
        let mut auth = conn
            .authenticate(Credential::new("demo", "secret"))
            .await
            .unwrap();
        conn.reauthenticate(&mut auth).await.unwrap();
        assert_eq!(AuthState::Authenticated, auth.state());

        conn.logout(&mut auth);
        assert_eq!(AuthState::Unauthenticated, auth.state());
        assert!(conn.session().current_token().is_none());
        assert!(auth.service_catalog().is_empty());
    }
}

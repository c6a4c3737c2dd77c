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
use eyre::Result;
use httpmock::prelude::*;
use secrecy::ExposeSecret;
use serde_json::json;

use openstack_resource::auth::{AuthFailure, Authentication, Credential};
use openstack_resource::config::{AuthSection, Config, HttpSection};
use openstack_resource::connection::Connection;
use openstack_resource::error::OpenStackError;
use openstack_resource::session::ServiceName;

use crate::common::{TOKEN, access, authenticated, connection, url};

#[tokio::test]
async fn test_authenticate_records_catalog() -> Result<()> {
    let server = MockServer::start_async().await;
    let tokens = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v2.0/tokens")
                .header("content-type", "application/json")
                .json_body(json!({
                    "auth": {
                        "passwordCredentials": {"username": "demo", "password": "secret"},
                        "tenantId": "t1"
                    }
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(access(&server));
        })
        .await;

    let mut conn = connection(&server)?;
    let auth = conn
        .authenticate(Credential::new("demo", "secret").with_tenant_id("t1"))
        .await?;
    tokens.assert_async().await;

    let token = auth.token().expect("token");
    assert_eq!(TOKEN, token.id().expose_secret());
    assert_eq!(Some("t1"), token.tenant().map(|t| t.id.as_str()));
    assert_eq!(3, auth.service_catalog().entries().len());
    assert_eq!(
        Some(vec!["member".to_string()]),
        auth.user().map(|u| u.roles.clone())
    );

    let session = conn.session();
    assert!(session.current_token().is_some());
    assert_eq!(
        url(&server, "/compute/v2/t1"),
        session.get_endpoint(ServiceName::Compute)?.as_str()
    );
    assert_eq!(
        url(&server, "/volume/v1/t1"),
        session.get_endpoint(ServiceName::Volume)?.as_str()
    );
    assert_eq!(
        url(&server, "/admin/v2.0"),
        session.get_endpoint(ServiceName::IdentityAdmin)?.as_str()
    );
    Ok(())
}

#[tokio::test]
async fn test_authenticate_rejected() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2.0/tokens");
            then.status(401)
                .header("content-type", "application/json")
                .json_body(json!({
                    "unauthorized": {"message": "Invalid user / password", "code": 401}
                }));
        })
        .await;

    let mut conn = connection(&server)?;
    let err = conn
        .authenticate(Credential::new("demo", "wrong"))
        .await
        .expect_err("rejected");
    match err {
        AuthFailure::InvalidCredentials(errors) => {
            assert!(errors.field_errors().contains_key("password"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(conn.session().current_token().is_none());
    assert!(!conn.session().has_endpoint(ServiceName::Compute));
    Ok(())
}

#[tokio::test]
async fn test_authenticate_server_failure() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2.0/tokens");
            then.status(503).body("maintenance");
        })
        .await;

    let mut conn = connection(&server)?;
    let err = conn
        .authenticate(Credential::new("demo", "secret"))
        .await
        .expect_err("unavailable");
    match err {
        AuthFailure::Transport(err) => {
            assert_eq!(Some(503), err.status().map(|s| s.as_u16()));
        }
        other => panic!("unexpected error {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_connection_from_config() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2.0/tokens");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(access(&server));
        })
        .await;

    let config = Config {
        auth: AuthSection {
            auth_url: url(&server, "/v2.0/"),
            username: "demo".into(),
            password: "secret".to_string().into(),
            tenant_id: Some("t1".into()),
            region: Some("RegionTwo".into()),
            ..Default::default()
        },
        http: HttpSection::default(),
    };
    let mut conn = Connection::with_config(&config)?;
    assert_eq!(Some("RegionTwo"), conn.region());

    let credential = Credential::new(
        config.auth.username.clone(),
        config.auth.password.expose_secret().to_string(),
    );
    conn.authenticate(credential).await?;

    // Every catalog endpoint lives in RegionOne.
    assert!(!conn.session().has_endpoint(ServiceName::Compute));
    match conn.get(ServiceName::Compute, "/servers").await {
        Err(OpenStackError::NotConfigured(ServiceName::Compute)) => {}
        other => panic!("unexpected result {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_logout_drops_token() -> Result<()> {
    let server = MockServer::start_async().await;
    let mut conn = authenticated(&server).await?;
    let mut auth = Authentication::with_token(
        conn.session().current_token().expect("token").clone(),
    );
    conn.logout(&mut auth);
    assert!(auth.token().is_none());
    assert!(conn.session().current_token().is_none());
    Ok(())
}

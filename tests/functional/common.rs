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
use std::sync::Arc;

use eyre::Result;
use httpmock::prelude::*;
use serde_json::{Value, json};

use openstack_resource::auth::Credential;
use openstack_resource::connection::Connection;
use openstack_resource::session::ServiceName;
use openstack_resource::transport::HttpTransport;

pub const TOKEN: &str = "0123456789abcdef";

/// Base URL of the mock server with the path appended.
pub fn url(server: &MockServer, path: &str) -> String {
    format!("http://{}:{}{}", server.host(), server.port(), path)
}

/// Token response with the compute and volume endpoints on the mock server.
pub fn access(server: &MockServer) -> Value {
    json!({
        "access": {
            "token": {
                "id": TOKEN,
                "expires": "2099-01-01T00:00:00Z",
                "tenant": {"id": "t1", "name": "demo"}
            },
            "serviceCatalog": [
                {
                    "type": "compute",
                    "name": "nova",
                    "endpoints": [{
                        "region": "RegionOne",
                        "publicURL": url(server, "/compute/v2/t1"),
                        "internalURL": url(server, "/compute/v2/t1"),
                        "adminURL": url(server, "/compute/v2/t1")
                    }],
                    "endpoints_links": []
                },
                {
                    "type": "volume",
                    "name": "cinder",
                    "endpoints": [{
                        "region": "RegionOne",
                        "publicURL": url(server, "/volume/v1/t1")
                    }]
                },
                {
                    "type": "identity",
                    "name": "keystone",
                    "endpoints": [{
                        "region": "RegionOne",
                        "publicURL": url(server, "/v2.0"),
                        "adminURL": url(server, "/admin/v2.0")
                    }]
                }
            ],
            "user": {
                "id": "u1",
                "name": "demo",
                "roles": [{"name": "member"}]
            }
        }
    })
}

/// Connection with only the public identity endpoint configured.
pub fn connection(server: &MockServer) -> Result<Connection> {
    let mut conn = Connection::new(Arc::new(HttpTransport::default()));
    conn.session_mut()
        .set_endpoint(ServiceName::IdentityPublic, url(server, "/v2.0/"))?;
    Ok(conn)
}

/// Mock the token endpoint and authenticate the connection against it.
pub async fn authenticated(server: &MockServer) -> Result<Connection> {
    let body = access(server);
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2.0/tokens");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(body);
        })
        .await;
    let mut conn = connection(server)?;
    conn.authenticate(Credential::new("demo", "secret").with_tenant_id("t1"))
        .await?;
    Ok(conn)
}

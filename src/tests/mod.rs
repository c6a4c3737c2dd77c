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

use chrono::{Duration, Utc};
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::auth::Token;
use crate::connection::Connection;
use crate::session::ServiceName;
use crate::transport::{MockTransport, Request, Response};

/// Connection with all the service endpoints and a token over the mocked
/// transport.
pub(crate) fn mocked_connection(transport: MockTransport) -> Connection {
    let mut conn = Connection::new(Arc::new(transport));
    let session = conn.session_mut();
    for (service, url) in [
        (ServiceName::IdentityPublic, "http://keystone:5000/v2.0/"),
        (ServiceName::IdentityAdmin, "http://keystone:35357/v2.0/"),
        (ServiceName::Compute, "http://nova:8774/v2/t1/"),
        (ServiceName::Volume, "http://cinder:8776/v1/t1/"),
    ] {
        session.set_endpoint(service, url).unwrap();
    }
    session.set_token(Token::new("tok", Utc::now() + Duration::hours(1)));
    conn
}

/// Expect a single request to the url and answer it.
pub(crate) fn expect(
    transport: &mut MockTransport,
    method: Method,
    url: &'static str,
    status: StatusCode,
    body: &'static str,
) {
    transport
        .expect_request()
        .withf(move |req: &Request| req.method == method && req.url.as_str() == url)
        .times(1)
        .returning(move |_| Ok(Response::new(status, body)));
}

/// Expect a single request to the url with the JSON body and answer it.
pub(crate) fn expect_body(
    transport: &mut MockTransport,
    method: Method,
    url: &'static str,
    sent: Value,
    status: StatusCode,
    body: &'static str,
) {
    transport
        .expect_request()
        .withf(move |req: &Request| {
            req.method == method && req.url.as_str() == url && req.body.as_ref() == Some(&sent)
        })
        .times(1)
        .returning(move |_| Ok(Response::new(status, body)));
}

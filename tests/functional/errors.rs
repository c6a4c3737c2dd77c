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
use serde_json::json;

use openstack_resource::compute::{KeyPair, Server};
use openstack_resource::error::OpenStackError;
use openstack_resource::resource::Resource;

use crate::common::authenticated;

#[tokio::test]
async fn test_client_error_carries_provider_message() -> Result<()> {
    let server = MockServer::start_async().await;
    let conn = authenticated(&server).await?;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/compute/v2/t1/servers");
            then.status(400)
                .header("content-type", "application/json")
                .json_body(json!({
                    "badRequest": {"message": "Invalid imageRef provided.", "code": 400}
                }));
        })
        .await;

    let err = Server::new("web", "missing", "2")
        .save(&conn)
        .await
        .expect_err("bad request");
    assert_eq!(Some(400), err.status().map(|s| s.as_u16()));
    assert_eq!("Invalid imageRef provided.", err.to_string());
    Ok(())
}

#[tokio::test]
async fn test_server_error_keeps_generic_message() -> Result<()> {
    let server = MockServer::start_async().await;
    let conn = authenticated(&server).await?;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/compute/v2/t1/servers/detail");
            then.status(500)
                .header("content-type", "application/json")
                .json_body(json!({"computeFault": {"message": "boom"}}));
        })
        .await;

    let err = Server::all(&conn).await.expect_err("fault");
    assert_eq!(
        "Failed. Response code = 500. Response message = Internal Server Error.",
        err.to_string()
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_collection_is_empty() -> Result<()> {
    let server = MockServer::start_async().await;
    let conn = authenticated(&server).await?;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET).path("/compute/v2/t1/os-keypairs");
            then.status(404)
                .header("content-type", "application/json")
                .json_body(json!({
                    "itemNotFound": {"message": "The resource could not be found.", "code": 404}
                }));
        })
        .await;

    let key_pairs = KeyPair::all(&conn).await?;
    listing.assert_async().await;
    assert!(key_pairs.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_element_is_not_found() -> Result<()> {
    let server = MockServer::start_async().await;
    let conn = authenticated(&server).await?;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/compute/v2/t1/servers/gone");
            then.status(404)
                .header("content-type", "application/json")
                .json_body(json!({
                    "itemNotFound": {"message": "Instance could not be found", "code": 404}
                }));
        })
        .await;

    match Server::find(&conn, "gone").await {
        Err(OpenStackError::NotFound { message }) => {
            assert_eq!("Instance could not be found", message)
        }
        other => panic!("unexpected result {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_invalid_resource_is_not_sent() -> Result<()> {
    let server = MockServer::start_async().await;
    let conn = authenticated(&server).await?;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/compute/v2/t1/servers");
            then.status(202);
        })
        .await;

    let err = Server::new("", "img1", "2")
        .save(&conn)
        .await
        .expect_err("invalid");
    assert!(matches!(err, OpenStackError::Validation { .. }));
    assert_eq!(0, create.hits_async().await);
    Ok(())
}

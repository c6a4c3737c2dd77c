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

use openstack_resource::block_storage::Volume;
use openstack_resource::compute::{Flavor, RebootType, Server};
use openstack_resource::resource::Resource;

use crate::common::{TOKEN, authenticated};

#[tokio::test]
async fn test_list_servers() -> Result<()> {
    let server = MockServer::start_async().await;
    let conn = authenticated(&server).await?;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/compute/v2/t1/servers/detail")
                .header("x-auth-token", TOKEN);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "servers": [
                        {
                            "id": "s1",
                            "name": "web",
                            "status": "ACTIVE",
                            "OS-EXT-STS:vm_state": "active",
                            "hostId": "h1",
                            "tenant_id": "t1",
                            "image": {"id": "img1", "links": []},
                            "flavor": {"id": "2", "links": []},
                            "key_name": "ops",
                            "created": "2012-10-08T10:00:00Z",
                            "links": [{"rel": "self", "href": "http://nova/servers/s1"}]
                        },
                        {
                            "id": "s2",
                            "name": "db",
                            "status": "SHUTOFF",
                            "image": {"id": "img1"},
                            "flavor": {"id": "3"}
                        }
                    ]
                }));
        })
        .await;

    let servers = Server::all(&conn).await?;
    listing.assert_async().await;

    assert_eq!(2, servers.len());
    let web = &servers[0];
    assert_eq!(Some("s1"), web.id.as_deref());
    assert_eq!("web", web.name);
    assert!(web.active());
    assert_eq!(Some("active"), web.vm_state.as_deref());
    assert_eq!(Some("h1"), web.host_id.as_deref());
    assert_eq!(Some("img1"), web.image_id());
    assert_eq!(Some("2"), web.flavor_id());
    assert_eq!(Some("ops"), web.key_pair_id());
    assert!(web.created_at.is_some());
    assert!(servers[1].shutoff());
    Ok(())
}

#[tokio::test]
async fn test_create_server() -> Result<()> {
    let server = MockServer::start_async().await;
    let conn = authenticated(&server).await?;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/compute/v2/t1/servers")
                .header("x-auth-token", TOKEN)
                .json_body_partial(
                    json!({
                        "server": {"name": "web", "imageRef": "img1", "flavorRef": "2"}
                    })
                    .to_string(),
                );
            then.status(202)
                .header("content-type", "application/json")
                .json_body(json!({
                    "server": {"id": "s9", "adminPass": "generated"}
                }));
        })
        .await;

    let created = Server::new("web", "img1", "2").save(&conn).await?;
    create.assert_async().await;
    assert_eq!(Some("s9"), created.id.as_deref());
    assert!(created.persisted());
    Ok(())
}

#[tokio::test]
async fn test_reboot_server() -> Result<()> {
    let server = MockServer::start_async().await;
    let conn = authenticated(&server).await?;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/compute/v2/t1/servers/s1");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "server": {
                        "id": "s1",
                        "name": "web",
                        "status": "ACTIVE",
                        "image": {"id": "img1"},
                        "flavor": {"id": "2"}
                    }
                }));
        })
        .await;
    let reboot = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/compute/v2/t1/servers/s1/action")
                .json_body(json!({"reboot": {"type": "SOFT"}}));
            then.status(202);
        })
        .await;

    let web = Server::find(&conn, "s1").await?;
    web.reboot(&conn, RebootType::Soft).await?;
    reboot.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_find_flavor() -> Result<()> {
    let server = MockServer::start_async().await;
    let conn = authenticated(&server).await?;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/compute/v2/t1/flavors/2");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "flavor": {
                        "id": "2",
                        "name": "m1.small",
                        "ram": 2048,
                        "disk": 20,
                        "swap": "",
                        "vcpus": 1,
                        "rxtx_factor": 1.0,
                        "OS-FLV-EXT-DATA:ephemeral": 0,
                        "os-flavor-access:is_public": true,
                        "links": [{"rel": "self", "href": "http://nova/flavors/2"}]
                    }
                }));
        })
        .await;

    let flavor = Flavor::find(&conn, "2").await?;
    assert_eq!("m1.small", flavor.name);
    assert_eq!(Some(2048), flavor.ram);
    assert_eq!(None, flavor.swap);
    assert_eq!(Some(0), flavor.ephemeral_disk);
    assert_eq!(Some(true), flavor.is_public);
    Ok(())
}

#[tokio::test]
async fn test_list_volumes() -> Result<()> {
    let server = MockServer::start_async().await;
    let conn = authenticated(&server).await?;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/volume/v1/t1/volumes")
                .header("x-auth-token", TOKEN);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "volumes": [{
                        "id": "v1",
                        "display_name": "data",
                        "size": 10,
                        "status": "in-use",
                        "attachments": [
                            {"id": "a1", "server_id": "s1", "volume_id": "v1", "device": "/dev/vdb"}
                        ],
                        "metadata": {}
                    }]
                }));
        })
        .await;

    let volumes = Volume::all(&conn).await?;
    assert_eq!(1, volumes.len());
    assert_eq!("data", volumes[0].name());
    assert!(volumes[0].attached());
    assert_eq!(
        Some("s1"),
        volumes[0].attachments[0].server_id.as_deref()
    );
    Ok(())
}

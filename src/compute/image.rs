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
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use openstack_resource_api_types::compute::{ImageRequestBuilder, ImageUpdateBuilder};
use serde_json::{Map, Value};
use validator::Validate;

use super::Server;
use crate::connection::Connection;
use crate::error::OpenStackError;
use crate::resource::entity::scalar_string;
use crate::resource::kind::{FREE_FORM, flatten_id, rename, retain};
use crate::resource::{Attribute, Entity, MappingError, Resource, ResourceKind};
use crate::session::ServiceName;

pub static IMAGE: ResourceKind = ResourceKind::new(ServiceName::Compute, "image", "images")
    .with_detail()
    .with_nested(image_nested)
    .with_normalizer(normalize_image);

fn image_nested(key: &str) -> Option<&'static ResourceKind> {
    match key {
        "metadata" => Some(&FREE_FORM),
        _ => None,
    }
}

fn normalize_image(mut raw: Map<String, Value>) -> Result<Map<String, Value>, MappingError> {
    for (from, to) in [
        ("minRam", "min_ram"),
        ("minDisk", "min_disk"),
        ("updated", "updated_at"),
        ("created", "created_at"),
    ] {
        rename(&mut raw, from, to);
    }
    flatten_id(&mut raw, "server", "server_id");
    retain(
        &mut raw,
        &[
            "id",
            "name",
            "status",
            "progress",
            "min_ram",
            "min_disk",
            "tenant_id",
            "user_id",
            "server_id",
            "metadata",
            "created_at",
            "updated_at",
        ],
    );
    Ok(raw)
}

/// Nova image (or snapshot of a server).
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct Image {
    pub id: Option<String>,
    pub name: String,
    pub status: Option<String>,
    pub progress: Option<i64>,
    /// Minimum RAM (MB).
    pub min_ram: Option<i64>,
    /// Minimum disk (GB).
    pub min_disk: Option<i64>,
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
    /// Server the snapshot was taken from.
    pub server_id: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Image {
    pub async fn find_by_name(
        conn: &Connection,
        name: &str,
    ) -> Result<Option<Self>, OpenStackError> {
        Ok(Self::all(conn).await?.into_iter().find(|i| i.name == name))
    }

    pub async fn find_all_by_name(
        conn: &Connection,
        name: &str,
    ) -> Result<Vec<Self>, OpenStackError> {
        Ok(Self::all(conn)
            .await?
            .into_iter()
            .filter(|i| i.name == name)
            .collect())
    }

    /// Server the snapshot was taken from.
    pub async fn server(&self, conn: &Connection) -> Result<Option<Server>, OpenStackError> {
        match &self.server_id {
            Some(id) => Ok(Some(Server::find(conn, id).await?)),
            None => Ok(None),
        }
    }

    /// `image_type` metadata, `image` when absent.
    pub fn image_type(&self) -> &str {
        self.metadata
            .get("image_type")
            .map(String::as_str)
            .unwrap_or("image")
    }

    pub fn snapshot(&self) -> bool {
        self.image_type() != "image"
    }
}

#[async_trait]
impl Resource for Image {
    const KIND: &'static ResourceKind = &IMAGE;

    fn from_entity(entity: Entity) -> Result<Self, MappingError> {
        let metadata = entity
            .entity("metadata")
            .map(|metadata| {
                metadata
                    .attributes()
                    .iter()
                    .filter_map(|(key, value)| match value {
                        Attribute::Value(value) => {
                            scalar_string(value).map(|value| (key.to_string(), value))
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            id: entity.id(),
            name: entity.string("name").unwrap_or_default(),
            status: entity.string("status"),
            progress: entity.integer("progress")?,
            min_ram: entity.integer("min_ram")?,
            min_disk: entity.integer("min_disk")?,
            tenant_id: entity.string("tenant_id"),
            user_id: entity.string("user_id"),
            server_id: entity.string("server_id"),
            metadata,
            created_at: entity.datetime("created_at")?,
            updated_at: entity.datetime("updated_at")?,
        })
    }

    fn encode(&self) -> Result<Value, OpenStackError> {
        Ok(serde_json::to_value(
            ImageRequestBuilder::default()
                .image(
                    ImageUpdateBuilder::default()
                        .name(self.name.clone())
                        .metadata(self.metadata.clone())
                        .build()?,
                )
                .build()?,
        )?)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::path::Scope;
    use crate::tests::{expect, mocked_connection};
    use crate::transport::MockTransport;

    const IMAGES: &str = r#"{"images": [
        {"id": "i1", "name": "cirros", "status": "ACTIVE", "progress": 100,
         "minRam": 0, "minDisk": 1, "created": "2012-08-20T21:11:09Z",
         "metadata": {"kernel_id": "k1"}, "links": [{"rel": "self", "href": "http://nova/images/i1"}]},
        {"id": "i2", "name": "web-snap", "status": "SAVING", "minRam": 512, "minDisk": 20,
         "server": {"id": "s1", "links": []},
         "metadata": {"image_type": "snapshot", "instance_uuid": "s1"}},
        {"id": "i3", "name": "cirros", "status": "ACTIVE",
         "properties": {"architecture": "x86_64"}}
    ]}"#;

    #[test]
    fn test_decode() {
        let images =
            Image::load_collection(serde_json::from_str(IMAGES).unwrap(), &Scope::default())
                .unwrap();
        assert_eq!(3, images.len());
        assert_eq!(Some(1), images[0].min_disk);
        assert_eq!(Some(0), images[0].min_ram);
        assert_eq!(Some("k1"), images[0].metadata.get("kernel_id").map(String::as_str));
        assert_eq!("image", images[0].image_type());
        assert!(!images[0].snapshot());
        assert_eq!(Some("s1"), images[1].server_id.as_deref());
        assert!(images[1].snapshot());
        assert!(images[2].metadata.is_empty());
    }

    #[test]
    fn test_encode() {
        let image = Image {
            name: "renamed".into(),
            ..Default::default()
        };
        assert_eq!(json!({"image": {"name": "renamed"}}), image.encode().unwrap());
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let mut transport = MockTransport::default();
        expect(
            &mut transport,
            Method::GET,
            "http://nova:8774/v2/t1/images/detail",
            StatusCode::OK,
            IMAGES,
        );
        expect(
            &mut transport,
            Method::GET,
            "http://nova:8774/v2/t1/images/detail",
            StatusCode::OK,
            IMAGES,
        );
        expect(
            &mut transport,
            Method::GET,
            "http://nova:8774/v2/t1/servers/s1",
            StatusCode::OK,
            r#"{"server": {"id": "s1", "name": "web-1"}}"#,
        );
        let conn = mocked_connection(transport);
        let image = Image::find_by_name(&conn, "web-snap").await.unwrap().unwrap();
        assert_eq!(Some("i2"), image.id());
        assert_eq!(2, Image::find_all_by_name(&conn, "cirros").await.unwrap().len());
        let server = image.server(&conn).await.unwrap().unwrap();
        assert_eq!("web-1", server.name);
    }

    #[tokio::test]
    async fn test_find_missing() {
        let mut transport = MockTransport::default();
        expect(
            &mut transport,
            Method::GET,
            "http://nova:8774/v2/t1/images/nope",
            StatusCode::NOT_FOUND,
            r#"{"itemNotFound": {"message": "Image not found.", "code": 404}}"#,
        );
        let conn = mocked_connection(transport);
        let err = Image::find(&conn, "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
